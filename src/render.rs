//! Display resources handed to layers: textures with a single owner, the
//! shared texture-coordinate quad and the selection overlay texture.

use crate::buffer::PixelBuffer;
use crate::error::ResourceError;
use crate::pixel::Pixel;
use egui::Pos2;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureId(pub u64);

/// Creates and frees textures on behalf of the layers.
pub trait TextureAllocator {
    fn allocate(&self, name: &str, image: &PixelBuffer) -> Result<TextureId, ResourceError>;
    fn release(&self, id: TextureId);
}

/// A texture with exactly one owner. Dropping it frees the texture.
pub struct OwnedTexture {
    id: TextureId,
    width: u32,
    height: u32,
    allocator: Rc<dyn TextureAllocator>,
}

impl OwnedTexture {
    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for OwnedTexture {
    fn drop(&mut self) {
        self.allocator.release(self.id);
    }
}

impl std::fmt::Debug for OwnedTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedTexture")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Texture coordinates of a layer quad, in left-top, right-top,
/// right-bottom, left-bottom order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexQuad {
    pub corners: [Pos2; 4],
}

impl TexQuad {
    pub fn new(corners: [Pos2; 4]) -> Self {
        Self { corners }
    }
}

impl Default for TexQuad {
    fn default() -> Self {
        Self::new([
            Pos2::new(0.0, 0.0),
            Pos2::new(1.0, 0.0),
            Pos2::new(1.0, 1.0),
            Pos2::new(0.0, 1.0),
        ])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    Dark,
    Light,
}

impl Overlay {
    pub fn color(self) -> Pixel {
        match self {
            Overlay::Dark => Pixel::from_argb(0x80, 0x00, 0x00, 0x00),
            Overlay::Light => Pixel::from_argb(0x80, 0xbc, 0xbc, 0xbc),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Overlay::Dark => "Dark",
            Overlay::Light => "Light",
        }
    }
}

/// Everything layers need from the rendering side.
pub struct RenderContext {
    allocator: Rc<dyn TextureAllocator>,
    default_quad: Rc<TexQuad>,
    overlay: OwnedTexture,
}

impl RenderContext {
    pub fn new(allocator: Rc<dyn TextureAllocator>, overlay: Overlay) -> Result<Self, ResourceError> {
        let overlay = Self::allocate(&allocator, "overlay", &PixelBuffer::filled(1, 1, overlay.color()))?;
        Ok(Self {
            allocator,
            default_quad: Rc::new(TexQuad::default()),
            overlay,
        })
    }

    fn allocate(
        allocator: &Rc<dyn TextureAllocator>,
        name: &str,
        image: &PixelBuffer,
    ) -> Result<OwnedTexture, ResourceError> {
        if image.is_empty() {
            return Err(ResourceError::EmptyImage {
                name: name.to_string(),
                width: image.width(),
                height: image.height(),
            });
        }
        let id = allocator.allocate(name, image)?;
        Ok(OwnedTexture {
            id,
            width: image.width(),
            height: image.height(),
            allocator: Rc::clone(allocator),
        })
    }

    pub fn make_texture(&self, name: &str, image: &PixelBuffer) -> Result<OwnedTexture, ResourceError> {
        Self::allocate(&self.allocator, name, image)
    }

    pub fn default_quad(&self) -> Rc<TexQuad> {
        Rc::clone(&self.default_quad)
    }

    pub fn overlay(&self) -> TextureId {
        self.overlay.id()
    }

    /// The old overlay texture is freed only once its replacement exists.
    pub fn set_overlay(&mut self, overlay: Overlay) -> Result<(), ResourceError> {
        let replacement = self.make_texture("overlay", &PixelBuffer::filled(1, 1, overlay.color()))?;
        let previous = std::mem::replace(&mut self.overlay, replacement);
        drop(previous);
        log::debug!("overlay switched to {}", overlay.label());
        Ok(())
    }
}

/// Keeps track of textures without a GPU, for batch use and tests.
#[derive(Default)]
pub struct HeadlessTextures {
    next_id: Cell<u64>,
    live: RefCell<HashMap<TextureId, (String, Vec<u32>)>>,
    released: RefCell<Vec<TextureId>>,
    fail_next: Cell<bool>,
}

impl HeadlessTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn is_live(&self, id: TextureId) -> bool {
        self.live.borrow().contains_key(&id)
    }

    /// Packed pixels uploaded for a live texture.
    pub fn contents(&self, id: TextureId) -> Option<Vec<u32>> {
        self.live.borrow().get(&id).map(|(_, words)| words.clone())
    }

    pub fn released(&self) -> Vec<TextureId> {
        self.released.borrow().clone()
    }

    /// Makes the next allocation fail.
    pub fn fail_next_allocation(&self) {
        self.fail_next.set(true);
    }
}

impl TextureAllocator for HeadlessTextures {
    fn allocate(&self, name: &str, image: &PixelBuffer) -> Result<TextureId, ResourceError> {
        if self.fail_next.replace(false) {
            return Err(ResourceError::Allocation {
                name: name.to_string(),
                reason: "allocation refused".to_string(),
            });
        }
        let id = TextureId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.live
            .borrow_mut()
            .insert(id, (name.to_string(), image.as_words().to_vec()));
        Ok(id)
    }

    fn release(&self, id: TextureId) {
        if self.live.borrow_mut().remove(&id).is_none() {
            log::warn!("texture {:?} released twice", id);
        }
        self.released.borrow_mut().push(id);
    }
}
