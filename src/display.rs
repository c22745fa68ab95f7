//! The layer stack shown on the canvas and the pointer interactions that
//! move, rotate, select, copy and cut.
//!
//! Window positions handed to this module have their origin at the top-left
//! corner of the canvas, as reported by the windowing toolkit. They are
//! flipped to the bottom-left pixel convention before any geometry runs.

use crate::buffer::PixelBuffer;
use crate::compositor::Compositor;
use crate::coords::View;
use crate::error::ResourceError;
use crate::geometry::{rotate_degrees, round_i32, IPoint, IRect, ISize};
use crate::layers::{CopyData, CutData, Layer};
use crate::pixel::Pixel;
use crate::render::{RenderContext, TexQuad};
use egui::{Modifiers, PointerButton, Vec2};
use std::rc::Rc;

pub const ZOOM_STEP: f32 = 0.25;

/// Share of the viewport height a freshly displayed image fills.
pub const DEFAULT_SCALE: f32 = 0.75;

pub fn next_zoom_level(level: f32) -> f32 {
    let a = ZOOM_STEP / 2.0;
    let b = 1.0 / ZOOM_STEP;
    ((level + a) * b).round() / b
}

pub fn prev_zoom_level(level: f32) -> f32 {
    let a = ZOOM_STEP / 2.0;
    let b = 1.0 / ZOOM_STEP;
    // rounding would keep levels that sit exactly on a step
    ((level - a) * b - 0.5).ceil() / b
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LayerId {
    Frame,
    Background,
    Upper,
}

/// Pointer origins remembered between press and drag, plus the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewSettings {
    orig_layer_click: Vec2,
    orig_layer_rotate: f32,
    orig_select_click: Vec2,
    orig_cam_click: Vec2,
    cam_offset: Vec2,
    orig_cam_offset: Vec2,
}

impl ViewSettings {
    pub fn begin_rotation(&mut self, origin: Vec2, layer_translate: Vec2, angle: f32) {
        self.orig_layer_click = origin - layer_translate;
        self.orig_layer_rotate = angle;
    }

    /// The press point relative to the layer centre, with the layer's
    /// rotation at press time taken out.
    pub fn rotation_vector(&self) -> Vec2 {
        rotate_degrees(self.orig_layer_click, -self.orig_layer_rotate)
    }

    pub fn begin_layer_movement(&mut self, origin: Vec2, layer_translate: Vec2) {
        self.orig_layer_click = origin - layer_translate;
    }

    pub fn layer_movement_origin(&self) -> Vec2 {
        self.orig_layer_click
    }

    /// Raw press point; the selection applies the camera itself.
    pub fn begin_selection(&mut self, origin: Vec2) {
        self.orig_select_click = origin;
    }

    pub fn selection_origin(&self) -> Vec2 {
        self.orig_select_click
    }

    pub fn begin_camera_movement(&mut self, origin: Vec2) {
        self.orig_cam_click = origin;
    }

    pub fn move_camera_from_origin(&mut self, click: Vec2) {
        self.cam_offset = self.orig_cam_click - click;
    }

    pub fn end_camera_movement(&mut self) {
        self.orig_cam_offset += self.cam_offset;
        self.cam_offset = Vec2::ZERO;
    }

    pub fn camera_translate(&self, zoom: f32) -> Vec2 {
        (-self.orig_cam_offset - self.cam_offset) * zoom
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub struct DisplayState {
    view: View,
    settings: ViewSettings,
    frame: Option<Layer>,
    background: Option<Layer>,
    upper: Option<Layer>,
    selected: Option<LayerId>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new(View::default())
    }
}

impl DisplayState {
    pub fn new(view: View) -> Self {
        Self {
            view,
            settings: ViewSettings::default(),
            frame: None,
            background: None,
            upper: None,
            selected: None,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn zoom(&self) -> f32 {
        self.view.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.view.zoom = zoom;
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.view.width = width;
        self.view.height = height;
    }

    pub fn has_image(&self) -> bool {
        self.background.is_some()
    }

    pub fn frame(&self) -> Option<&Layer> {
        self.frame.as_ref()
    }

    pub fn background(&self) -> Option<&Layer> {
        self.background.as_ref()
    }

    pub fn upper(&self) -> Option<&Layer> {
        self.upper.as_ref()
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn background_image(&self) -> Option<&PixelBuffer> {
        self.background.as_ref().and_then(Layer::image)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        match id {
            LayerId::Frame => self.frame.as_ref(),
            LayerId::Background => self.background.as_ref(),
            LayerId::Upper => self.upper.as_ref(),
        }
    }

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        match id {
            LayerId::Frame => self.frame.as_mut(),
            LayerId::Background => self.background.as_mut(),
            LayerId::Upper => self.upper.as_mut(),
        }
    }

    /// Layers in drawing order.
    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &Layer)> {
        [
            (LayerId::Frame, self.frame.as_ref()),
            (LayerId::Background, self.background.as_ref()),
            (LayerId::Upper, self.upper.as_ref()),
        ]
        .into_iter()
        .filter_map(|(id, layer)| layer.map(|l| (id, l)))
    }

    /// True while there is something for a confirm to commit.
    pub fn has_pending_transform(&self) -> bool {
        let background_moved = self
            .background
            .as_ref()
            .is_some_and(|bg| bg.is_translated() || bg.is_rotated());
        background_moved || self.upper.as_ref().is_some_and(|u| u.payload().is_some())
    }

    /// Shows `image` as the new background. The frame is only rebuilt when
    /// the image size changed. Any selection is dropped.
    pub fn display_image(&mut self, ctx: &RenderContext, image: PixelBuffer) -> Result<(), ResourceError> {
        let (width, height) = (image.width(), image.height());
        let frame = match &self.frame {
            Some(frame) if frame.width() == width as i32 && frame.height() == height as i32 => None,
            _ => Some(Layer::frame(ctx, width, height)?),
        };
        let background = Layer::background(ctx, image)?;

        if let Some(frame) = frame {
            self.frame = Some(frame);
        }
        self.background = Some(background);
        self.upper = None;
        self.selected = Some(LayerId::Background);

        log::debug!("displaying {}x{} image", width, height);
        Ok(())
    }

    pub fn default_zoom(&self) -> Option<f32> {
        let background = self.background.as_ref()?;
        Some(self.view.height * DEFAULT_SCALE / background.height_f())
    }

    pub fn reset_zoom(&mut self) -> Option<f32> {
        let zoom = self.default_zoom()?;
        self.set_zoom(zoom);
        Some(zoom)
    }

    pub fn zoom_in(&mut self) -> Option<f32> {
        self.background.as_ref()?;
        let z = next_zoom_level(self.view.zoom);
        self.set_zoom(z);
        log::debug!("zoom in: {}", z);
        Some(z)
    }

    pub fn zoom_out(&mut self) -> Option<f32> {
        if self.view.zoom <= ZOOM_STEP || self.background.is_none() {
            return None;
        }
        let z = prev_zoom_level(self.view.zoom);
        self.set_zoom(z);
        log::debug!("zoom out: {}", z);
        Some(z)
    }

    // -- camera ------------------------------------------------------------

    pub fn camera_translate(&self) -> Vec2 {
        self.settings.camera_translate(self.view.zoom)
    }

    /// Moves a window pixel into the space the layers live in.
    pub fn adjust_pixel_to_camera(&self, pixel: IPoint) -> IPoint {
        let display_center = self.view.normalized_to_pixel(Vec2::ZERO);
        let camera_offset = display_center - self.view.normalized_to_pixel(self.camera_translate());
        pixel + camera_offset
    }

    pub fn adjust_norm_to_camera(&self, norm: Vec2) -> Vec2 {
        norm - self.camera_translate()
    }

    /// Upper layer first, then background. `point` is a bottom-left origin
    /// pixel already adjusted to the camera.
    pub fn layer_at_point(&self, point: IPoint) -> Option<LayerId> {
        [
            (LayerId::Upper, self.upper.as_ref()),
            (LayerId::Background, self.background.as_ref()),
        ]
        .into_iter()
        .find_map(|(id, layer)| {
            layer
                .filter(|l| l.contains_win_point(&self.view, point))
                .map(|_| id)
        })
    }

    // -- pointer -----------------------------------------------------------

    /// Returns false when the press was ignored.
    pub fn press(&mut self, button: PointerButton, win_pos: IPoint) -> bool {
        if self.background.is_none() {
            return false;
        }

        // pressing anywhere cancels a selection that was never copied or cut
        if self.upper.as_ref().is_some_and(Layer::in_select_mode) {
            self.discard_changes();
            return true;
        }

        let click = self.view.to_pixel_coord(win_pos);
        let norm_click = self.view.pixel_to_normalized(click);

        let hit = self.layer_at_point(self.adjust_pixel_to_camera(click));
        if self.upper.is_some() && hit == Some(LayerId::Background) {
            return false;
        }
        self.selected = hit;

        let Some(target) = hit.and_then(|id| self.layer(id)).or(self.background.as_ref()) else {
            return false;
        };
        let translate = target.translate(&self.view);
        let rotate = target.rotate();
        let camera_click = self.adjust_norm_to_camera(norm_click);

        self.settings.begin_selection(norm_click);
        match (hit, button) {
            (Some(_), PointerButton::Primary) => self.settings.begin_layer_movement(norm_click, translate),
            (Some(_), PointerButton::Middle) => self.settings.begin_camera_movement(norm_click),
            (Some(_), PointerButton::Secondary) | (None, _) => {
                self.settings.begin_rotation(camera_click, translate, rotate)
            }
            _ => {}
        }
        true
    }

    /// Returns true when the drag changed a layer or the camera.
    pub fn drag(&mut self, ctx: &RenderContext, button: PointerButton, win_pos: IPoint, modifiers: Modifiers) -> bool {
        if self.background.is_none() {
            return false;
        }

        let pixel = self.view.to_pixel_coord(win_pos);
        let norm = self.view.pixel_to_normalized(pixel);

        match button {
            PointerButton::Primary if modifiers.shift_only() => self.drag_selection(ctx, norm),
            PointerButton::Primary => {
                let origin = self.settings.layer_movement_origin();
                let view = self.view;
                let Some(layer) = self.selected.and_then(|id| self.layer_mut(id)) else {
                    return false;
                };
                layer.translate_to(&view, norm - origin);
                true
            }
            PointerButton::Middle if self.selected.is_some() => {
                self.settings.move_camera_from_origin(norm);
                true
            }
            PointerButton::Secondary => self.drag_rotation(pixel),
            _ => false,
        }
    }

    pub fn release(&mut self) {
        self.settings.end_camera_movement();
    }

    fn drag_selection(&mut self, ctx: &RenderContext, norm: Vec2) -> bool {
        let last = self.adjust_norm_to_camera(self.settings.selection_origin());
        let norm = self.adjust_norm_to_camera(norm);
        let view = self.view;

        let Some(background) = self.background.as_ref() else {
            return false;
        };
        if background.is_rotated()
            || background.is_translated()
            || self.upper.as_ref().is_some_and(|u| u.payload().is_some())
        {
            log::debug!("selection refused while the image is transformed or a selection is in use");
            return false;
        }

        // image extents and one image pixel, in normalized units
        let aspect = view.aspect();
        let image_width = 2.0 * aspect * background.width_f() / view.width * view.zoom;
        let image_height = 2.0 * background.height_f() / view.height * view.zoom;
        let pixel_size = image_width / background.width_f();
        let image_left_top = Vec2::new(
            (2.0 * aspect - image_width) / 2.0 - aspect,
            (2.0 - image_height) / 2.0 - 1.0,
        );

        let snap = |p: Vec2, to_grid: fn(f32) -> f32| {
            let cells = (p - image_left_top) / pixel_size;
            Vec2::new(to_grid(cells.x), to_grid(cells.y)) * pixel_size + image_left_top
        };
        let left_top = snap(last.min(norm), f32::floor);
        let right_bottom = snap(last.max(norm), f32::ceil);
        let center = (left_top + right_bottom) / 2.0;

        let size = ISize::new(
            round_i32((left_top.x - right_bottom.x).abs() / pixel_size),
            round_i32((left_top.y - right_bottom.y).abs() / pixel_size),
        );

        let upper = self.upper.get_or_insert_with(|| Layer::upper(ctx));
        upper.translate_to(&view, center);
        upper.set_select_size(size);

        log::debug!(
            "selection from {:?} to {:?}, centre {:?}, size {:?}",
            left_top,
            right_bottom,
            view.normalized_to_pixel(center),
            size
        );
        true
    }

    fn drag_rotation(&mut self, pixel: IPoint) -> bool {
        let view = self.view;
        let rotation_vector = self.settings.rotation_vector();
        let b = self.adjust_pixel_to_camera(pixel);

        let id = self.selected.unwrap_or(LayerId::Background);
        let Some(layer) = self.layer_mut(id) else {
            return false;
        };

        let translate = layer.translate(&view);
        let a = view.normalized_to_pixel(translate + rotation_vector);
        let c = view.normalized_to_pixel(translate);

        let alpha = ((b.x - c.x) as f32).atan2((b.y - c.y) as f32);
        let beta = ((a.x - c.x) as f32).atan2((a.y - c.y) as f32);
        let gamma = beta - alpha;

        log::debug!("rotation: a {:?}, b {:?}, c {:?}, {} deg", a, b, c, gamma.to_degrees());
        layer.rotate_to(gamma.to_degrees());
        true
    }

    /// Background pixel under the pointer, for the status read-out.
    pub fn cursor_layer_coord(&self, win_pos: IPoint) -> Option<IPoint> {
        let background = self.background.as_ref()?;
        let pixel = self.adjust_pixel_to_camera(self.view.to_pixel_coord(win_pos));
        Some(background.layer_coord_from_win_coord(&self.view, pixel))
    }

    // -- editing -----------------------------------------------------------

    fn selection_rect(view: &View, frame: &Layer, background: &Layer, upper: &Layer) -> IRect {
        let lower_rect = frame.layer_rect_from_win_rect(view, background.win_rect(view));
        let upper_rect = frame.layer_rect_from_win_rect(view, upper.win_rect(view));
        lower_rect.intersected(&upper_rect)
    }

    /// Copies the selected part of `source` into the upper layer. The copy
    /// keeps showing the background texture through its own texture quad.
    pub fn copy(&mut self, ctx: &RenderContext, source: &PixelBuffer) -> bool {
        let view = self.view;
        let (Some(background), Some(frame), Some(upper)) =
            (self.background.as_ref(), self.frame.as_ref(), self.upper.as_mut())
        else {
            return false;
        };
        if upper.cut_data().is_some() {
            log::warn!("copy refused: the selection already holds cut pixels");
            return false;
        }

        let zoomed = background
            .zoomed_win_rect(&view)
            .intersected(&upper.zoomed_win_rect(&view));
        let select_rect = Self::selection_rect(&view, frame, background, upper);
        if zoomed.is_empty() || select_rect.is_empty() {
            log::debug!("copy skipped: selection is outside the image");
            return false;
        }

        let quad = TexQuad::new(
            [
                zoomed.top_left(),
                zoomed.top_right(),
                zoomed.bottom_right(),
                zoomed.bottom_left(),
            ]
            .map(|p| background.tex_coord_from_win_coord(&view, p)),
        );

        upper.set_copy_data(
            Rc::new(quad),
            CopyData {
                image: source.copy_region(select_rect),
                source: select_rect,
                texture: background.texture_id(ctx.overlay()),
            },
        );
        upper.set_select_size(select_rect.size());
        self.selected = Some(LayerId::Upper);
        true
    }

    /// Moves the selected part of `source` into the upper layer and paints
    /// the hole in the background black.
    pub fn cut(&mut self, ctx: &RenderContext, source: &PixelBuffer) -> Result<bool, ResourceError> {
        let view = self.view;
        let (Some(background), Some(frame), Some(upper)) =
            (self.background.as_mut(), self.frame.as_ref(), self.upper.as_mut())
        else {
            return Ok(false);
        };
        if upper.cut_data().is_some() {
            return Ok(false);
        }

        let select_rect = Self::selection_rect(&view, frame, background, upper);
        if select_rect.is_empty() {
            log::debug!("cut skipped: selection is outside the image");
            return Ok(false);
        }

        let image = source.copy_region(select_rect);
        let texture = ctx.make_texture("cut", &image)?;
        background.erase_area(ctx, select_rect)?;

        upper.set_cut_data(
            ctx,
            CutData {
                image,
                source: select_rect,
                texture,
            },
        );
        upper.set_select_size(select_rect.size());
        self.selected = Some(LayerId::Upper);
        Ok(true)
    }

    /// Puts cut pixels back, drops the selection and resets every transform.
    pub fn revert(&mut self, ctx: &RenderContext) -> Result<bool, ResourceError> {
        let Some(background) = self.background.as_mut() else {
            return Ok(false);
        };
        if let Some(cut) = self.upper.as_ref().and_then(Layer::cut_data) {
            background.fill_area(ctx, cut)?;
        }
        self.discard_changes();
        Ok(true)
    }

    fn discard_changes(&mut self) {
        self.upper = None;
        if let Some(background) = self.background.as_mut() {
            background.reset_transform();
        }
        self.settings.reset();
        self.selected = Some(LayerId::Background);
    }

    /// Refused without an image or while a selection is being drawn.
    pub fn rotate(&mut self, angle: f32) -> bool {
        if self.background.is_none() || self.upper.as_ref().is_some_and(Layer::in_select_mode) {
            return false;
        }
        let id = self.selected.unwrap_or(LayerId::Background);
        match self.layer_mut(id) {
            Some(layer) => {
                layer.rotate_to(angle);
                true
            }
            None => false,
        }
    }

    /// Bakes the current transforms into a new image. A moved background is
    /// merged onto black; otherwise copied or cut pixels are merged onto the
    /// background; otherwise the background comes back as is.
    pub fn merge_layers(&self, compositor: &Compositor) -> Option<PixelBuffer> {
        let frame = self.frame.as_ref()?;
        let background = self.background.as_ref()?;
        let image = background.image()?;

        if background.is_translated() || background.is_rotated() {
            let lower = PixelBuffer::filled(image.width(), image.height(), Pixel::BLACK);
            let rect = frame.layer_rect_from_win_rect(&self.view, background.win_rect(&self.view));
            return Some(compositor.merge_images(lower, image, rect, background.rotate()));
        }

        if let Some(upper) = &self.upper {
            if let Some(payload) = upper.payload() {
                let rect = frame.layer_rect_from_win_rect(&self.view, upper.win_rect(&self.view));
                return Some(compositor.merge_images(image.clone(), payload.image(), rect, upper.rotate()));
            }
        }

        Some(image.clone())
    }
}
