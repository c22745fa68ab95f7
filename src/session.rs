//! One open document: the editor, what the canvas shows of it and the color
//! sliders. Every toolbar action of the application lands here.

use crate::buffer::PixelBuffer;
use crate::color::{grayscale, ColorLevels, ColorSliders};
use crate::coords::View;
use crate::display::{DisplayState, LayerId};
use crate::editor::Editor;
use crate::error::ResourceError;
use crate::geometry::IPoint;
use crate::interpolator::InterpMethod;
use crate::layers::Layer;
use crate::render::{OwnedTexture, Overlay, RenderContext, TextureAllocator, TextureId};
use anyhow::Result;
use egui::{Modifiers, PointerButton};
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

pub struct Session {
    editor: Editor,
    display: DisplayState,
    ctx: RenderContext,
    sliders: ColorSliders,
    // background with the slider levels applied, while they are not neutral
    preview: Option<OwnedTexture>,
}

impl Session {
    pub fn new(
        allocator: Rc<dyn TextureAllocator>,
        overlay: Overlay,
        method: InterpMethod,
        view: View,
    ) -> Result<Self, ResourceError> {
        Ok(Self {
            editor: Editor::new(method),
            display: DisplayState::new(view),
            ctx: RenderContext::new(allocator, overlay)?,
            sliders: ColorSliders::default(),
            preview: None,
        })
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayState {
        &mut self.display
    }

    pub fn render_context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn has_image(&self) -> bool {
        self.display.has_image()
    }

    // -- documents ---------------------------------------------------------

    pub fn open(&mut self, path: &Path) -> Result<()> {
        let image = self.editor.load_image(path)?;
        self.show_new_document(image)
    }

    pub fn open_image(&mut self, image: PixelBuffer) -> Result<()> {
        self.editor.open_buffer(image.clone());
        self.show_new_document(image)
    }

    fn show_new_document(&mut self, image: PixelBuffer) -> Result<()> {
        self.display.display_image(&self.ctx, image)?;
        self.display.reset_zoom();
        self.sliders.reset();
        self.preview = None;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.editor.save_image(path)
    }

    // -- commits -----------------------------------------------------------

    /// Moved layers, copied or cut pixels, or off-centre sliders.
    pub fn has_pending_changes(&self) -> bool {
        self.display.has_pending_transform() || !self.sliders.levels().is_identity()
    }

    /// Bakes pending transforms and the slider levels into a new history
    /// entry. Does nothing while no change is pending.
    pub fn confirm(&mut self) -> Result<bool> {
        if !self.has_pending_changes() {
            log::debug!("confirm skipped: nothing pending");
            return Ok(false);
        }
        let start = Instant::now();
        let Some(merged) = self.display.merge_layers(self.editor.compositor()) else {
            return Ok(false);
        };
        let image = self.sliders.levels().apply(&merged);
        log::info!("merged layers in {:?}", start.elapsed());

        self.commit(image)?;
        self.sliders.reset();
        self.preview = None;
        Ok(true)
    }

    /// Drops pending transforms, selections and slider changes.
    pub fn cancel(&mut self) -> Result<bool> {
        let reverted = self.display.revert(&self.ctx)?;
        self.sliders.reset();
        self.preview = None;
        Ok(reverted)
    }

    pub fn mirror(&mut self, horizontal: bool, vertical: bool) -> Result<bool> {
        let Some(image) = self.display.background_image() else {
            return Ok(false);
        };
        let mirrored = image.mirrored(horizontal, vertical);
        self.commit(mirrored)?;
        self.display.reset_zoom();
        self.refresh_preview()?;
        Ok(true)
    }

    /// Commits the merged layers in gray. Slider levels are not applied.
    pub fn grayscale(&mut self) -> Result<bool> {
        let Some(merged) = self.display.merge_layers(self.editor.compositor()) else {
            return Ok(false);
        };
        self.commit(grayscale(&merged))?;
        self.refresh_preview()?;
        Ok(true)
    }

    fn commit(&mut self, image: PixelBuffer) -> Result<()> {
        self.display.display_image(&self.ctx, image.clone())?;
        self.editor.append_history(image);
        log::info!("edit committed");
        Ok(())
    }

    pub fn undo(&mut self) -> Result<bool> {
        let Some(image) = self.editor.undo().cloned() else {
            return Ok(false);
        };
        self.display.display_image(&self.ctx, image)?;
        self.refresh_preview()?;
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool> {
        let Some(image) = self.editor.redo().cloned() else {
            return Ok(false);
        };
        self.display.display_image(&self.ctx, image)?;
        self.refresh_preview()?;
        Ok(true)
    }

    // -- selection ---------------------------------------------------------

    pub fn copy(&mut self) -> bool {
        let Some(source) = self.editor.current_image() else {
            return false;
        };
        self.display.copy(&self.ctx, source)
    }

    /// On a failed texture swap the display is put back the way it was.
    pub fn cut(&mut self) -> Result<bool> {
        let Some(source) = self.editor.current_image() else {
            return Ok(false);
        };
        match self.display.cut(&self.ctx, source) {
            Ok(cut) => {
                self.refresh_preview()?;
                Ok(cut)
            }
            Err(e) => {
                log::error!("cut failed: {}", e);
                self.display.revert(&self.ctx)?;
                Err(e.into())
            }
        }
    }

    pub fn rotate(&mut self, angle: f32) -> bool {
        self.display.rotate(angle)
    }

    // -- view --------------------------------------------------------------

    pub fn zoom_in(&mut self) -> Option<f32> {
        self.display.zoom_in()
    }

    pub fn zoom_out(&mut self) -> Option<f32> {
        self.display.zoom_out()
    }

    pub fn reset_zoom(&mut self) -> Option<f32> {
        self.display.reset_zoom()
    }

    pub fn set_overlay(&mut self, overlay: Overlay) -> Result<(), ResourceError> {
        self.ctx.set_overlay(overlay)
    }

    pub fn set_interpolation_method(&mut self, method: InterpMethod) {
        self.editor.set_interpolation_method(method);
    }

    pub fn interpolation_method(&self) -> InterpMethod {
        self.editor.interpolation_method()
    }

    pub fn press(&mut self, button: PointerButton, win_pos: IPoint) -> bool {
        self.display.press(button, win_pos)
    }

    pub fn drag(&mut self, button: PointerButton, win_pos: IPoint, modifiers: Modifiers) -> bool {
        self.display.drag(&self.ctx, button, win_pos, modifiers)
    }

    pub fn release(&mut self) {
        self.display.release();
    }

    pub fn cursor_layer_coord(&self, win_pos: IPoint) -> Option<IPoint> {
        self.display.cursor_layer_coord(win_pos)
    }

    // -- color -------------------------------------------------------------

    pub fn sliders(&self) -> &ColorSliders {
        &self.sliders
    }

    pub fn color_levels(&self) -> ColorLevels {
        self.sliders.levels()
    }

    /// Moves the sliders and rebuilds the preview.
    pub fn set_sliders(&mut self, sliders: ColorSliders) -> Result<(), ResourceError> {
        if sliders == self.sliders {
            return Ok(());
        }
        self.sliders = sliders;
        self.refresh_preview()
    }

    fn refresh_preview(&mut self) -> Result<(), ResourceError> {
        let levels = self.sliders.levels();
        let image = match self.display.background_image() {
            Some(image) if !levels.is_identity() => image,
            _ => {
                self.preview = None;
                return Ok(());
            }
        };
        let texture = self.ctx.make_texture("color preview", &levels.apply(image))?;
        self.preview = Some(texture);
        Ok(())
    }

    /// Texture to draw for a layer: the color preview stands in for the
    /// background while the sliders are off centre.
    pub fn layer_texture(&self, id: LayerId, layer: &Layer) -> TextureId {
        match (id, &self.preview) {
            (LayerId::Background, Some(preview)) => preview.id(),
            _ => layer.texture_id(self.ctx.overlay()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Pixel;
    use crate::render::HeadlessTextures;

    fn session() -> (Rc<HeadlessTextures>, Session) {
        let textures = Rc::new(HeadlessTextures::new());
        let session = Session::new(
            textures.clone(),
            Overlay::Dark,
            InterpMethod::Nearest,
            View::new(800.0, 600.0, 1.0),
        )
        .unwrap();
        (textures, session)
    }

    #[test]
    fn nothing_happens_without_an_image() {
        let (_t, mut s) = session();
        assert!(!s.confirm().unwrap());
        assert!(!s.mirror(true, false).unwrap());
        assert!(!s.grayscale().unwrap());
        assert!(!s.undo().unwrap());
        assert!(!s.copy());
        assert!(!s.cut().unwrap());
        assert!(!s.rotate(10.0));
    }

    #[test]
    fn opening_resets_zoom_and_sliders() {
        let (_t, mut s) = session();
        s.set_sliders(ColorSliders {
            red: 0.2,
            ..Default::default()
        })
        .unwrap();
        s.open_image(PixelBuffer::filled(10, 20, Pixel::gray(9))).unwrap();
        assert_eq!(s.display().zoom(), 22.5);
        assert_eq!(*s.sliders(), ColorSliders::default());
    }

    #[test]
    fn slider_preview_replaces_the_background_texture() {
        let (textures, mut s) = session();
        s.open_image(PixelBuffer::filled(4, 4, Pixel::gray(100))).unwrap();
        let background = s.display().background().unwrap();
        let plain = background.texture_id(s.render_context().overlay());
        assert_eq!(s.layer_texture(LayerId::Background, background), plain);

        s.set_sliders(ColorSliders {
            brightness: 0.8,
            ..Default::default()
        })
        .unwrap();
        let background = s.display().background().unwrap();
        let preview = s.layer_texture(LayerId::Background, background);
        assert_ne!(preview, plain);
        let expected = s.color_levels().apply_pixel(Pixel::gray(100));
        assert_eq!(textures.contents(preview), Some(vec![expected.0; 16]));

        s.cancel().unwrap();
        assert!(!textures.is_live(preview));
    }

    #[test]
    fn confirm_applies_levels_and_records_history() {
        let (_t, mut s) = session();
        s.open_image(PixelBuffer::filled(4, 4, Pixel::gray(100))).unwrap();
        s.set_sliders(ColorSliders {
            brightness: 0.7,
            ..Default::default()
        })
        .unwrap();

        assert!(s.confirm().unwrap());
        let committed = s.editor().current_image().unwrap().pixel(0, 0);
        assert!(committed.red() > 140, "{committed:?}");
        assert_eq!(s.display().background_image().unwrap().pixel(0, 0), committed);
        assert!(s.sliders().levels().is_identity());

        assert!(s.undo().unwrap());
        assert_eq!(s.display().background_image().unwrap().pixel(0, 0), Pixel::gray(100));
        assert!(s.redo().unwrap());
        assert_eq!(s.display().background_image().unwrap().pixel(0, 0), committed);
    }

    #[test]
    fn idle_confirm_keeps_the_history() {
        let (_t, mut s) = session();
        let image = PixelBuffer::from_fn(4, 4, |x, y| Pixel::gray((x + 4 * y) as u8 * 10));
        s.open_image(image.clone()).unwrap();
        assert!(s.mirror(true, false).unwrap());
        assert!(!s.has_pending_changes());

        for _ in 0..10 {
            assert!(!s.confirm().unwrap());
        }
        assert_eq!(s.editor().store().history().unwrap().len(), 2);

        for _ in 0..20 {
            s.undo().unwrap();
        }
        assert_eq!(s.editor().current_image(), Some(&image));

        assert!(s.rotate(90.0));
        assert!(s.has_pending_changes());
        assert!(s.confirm().unwrap());
        assert_eq!(s.editor().store().history().unwrap().len(), 2);
    }

    #[test]
    fn mirror_and_grayscale_are_undoable() {
        let (_t, mut s) = session();
        let image = PixelBuffer::from_fn(3, 2, |x, y| Pixel::from_rgba(x as u8 * 80, y as u8 * 80, 0, 255));
        s.open_image(image.clone()).unwrap();

        assert!(s.mirror(true, false).unwrap());
        assert_eq!(s.editor().current_image().unwrap(), &image.mirrored(true, false));

        assert!(s.grayscale().unwrap());
        assert_eq!(s.editor().current_image().unwrap(), &grayscale(&image.mirrored(true, false)));

        s.undo().unwrap();
        s.undo().unwrap();
        assert_eq!(s.display().background_image().unwrap(), &image);
    }
}
