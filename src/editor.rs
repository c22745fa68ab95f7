use crate::buffer::PixelBuffer;
use crate::compositor::Compositor;
use crate::geometry::IRect;
use crate::image_store::ImageStore;
use crate::interpolator::InterpMethod;
use anyhow::Result;
use std::path::Path;

/// Document storage plus the compositor, the surface the display works
/// against.
#[derive(Debug, Default)]
pub struct Editor {
    store: ImageStore,
    compositor: Compositor,
}

impl Editor {
    pub fn new(method: InterpMethod) -> Self {
        Self {
            store: ImageStore::new(),
            compositor: Compositor::new(method),
        }
    }

    pub fn load_image(&mut self, path: &Path) -> Result<PixelBuffer> {
        self.store.load_image(path)
    }

    pub fn open_buffer(&mut self, image: PixelBuffer) {
        self.store.open_buffer(image);
    }

    pub fn save_image(&self, path: &Path) -> Result<()> {
        self.store.save_image(path)
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn current_image(&self) -> Option<&PixelBuffer> {
        self.store.current_image()
    }

    pub fn append_history(&mut self, image: PixelBuffer) {
        self.store.append_history(image);
    }

    pub fn undo(&mut self) -> Option<&PixelBuffer> {
        self.store.undo()
    }

    pub fn redo(&mut self) -> Option<&PixelBuffer> {
        self.store.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.store.history().is_some_and(|h| h.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.store.history().is_some_and(|h| h.can_redo())
    }

    pub fn set_interpolation_method(&mut self, method: InterpMethod) {
        self.compositor.set_interpolation_method(method);
    }

    pub fn interpolation_method(&self) -> InterpMethod {
        self.compositor.interpolation_method()
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn merge_images(&self, lower: PixelBuffer, upper: &PixelBuffer, upper_rect: IRect, upper_angle: f32) -> PixelBuffer {
        self.compositor.merge_images(lower, upper, upper_rect, upper_angle)
    }
}
