use crate::buffer::PixelBuffer;
use crate::coords::View;
use crate::error::ResourceError;
use crate::geometry::{floor_i32, point_in_polygon, rotate_degrees, round_i32, IPoint, IRect, ISize};
use crate::pixel::Pixel;
use crate::render::{OwnedTexture, RenderContext, TexQuad, TextureId};
use egui::{Pos2, Vec2};
use std::rc::Rc;

pub const FRAME_BORDER_COLOR: Pixel = Pixel::from_argb(0xff, 0x80, 0x80, 0x80);
const FRAME_BORDER_WIDTH: u32 = 3;

/// Translation and rotation of a layer in normalized space.
///
/// The translation is stored divided by the zoom level and the rotation is
/// stored negated; the accessors on [`Layer`] undo both.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayerTransform {
    translate_delta: Vec2,
    rotate_delta: f32,
}

/// Pixels copied out of the background. Displays the background texture
/// through a custom texture quad.
#[derive(Debug)]
pub struct CopyData {
    pub image: PixelBuffer,
    pub source: IRect,
    pub texture: TextureId,
}

/// Pixels cut out of the background, with a texture of their own.
#[derive(Debug)]
pub struct CutData {
    pub image: PixelBuffer,
    pub source: IRect,
    pub texture: OwnedTexture,
}

#[derive(Debug)]
pub enum SelectionPayload {
    Copy(CopyData),
    Cut(CutData),
}

impl SelectionPayload {
    pub fn image(&self) -> &PixelBuffer {
        match self {
            SelectionPayload::Copy(data) => &data.image,
            SelectionPayload::Cut(data) => &data.image,
        }
    }

    pub fn source(&self) -> IRect {
        match self {
            SelectionPayload::Copy(data) => data.source,
            SelectionPayload::Cut(data) => data.source,
        }
    }
}

#[derive(Debug, Default)]
pub struct Selection {
    pub size: ISize,
    pub payload: Option<SelectionPayload>,
}

#[derive(Debug)]
pub enum LayerKind {
    Background {
        image: PixelBuffer,
        texture: OwnedTexture,
    },
    Upper(Selection),
    Frame {
        texture: OwnedTexture,
    },
}

#[derive(Debug)]
pub struct Layer {
    transform: LayerTransform,
    quad: Rc<TexQuad>,
    kind: LayerKind,
}

impl Layer {
    pub fn background(ctx: &RenderContext, image: PixelBuffer) -> Result<Self, ResourceError> {
        let texture = ctx.make_texture("background", &image)?;
        Ok(Self {
            transform: LayerTransform::default(),
            quad: ctx.default_quad(),
            kind: LayerKind::Background { image, texture },
        })
    }

    /// A transparent image of the document size with a gray border.
    pub fn frame(ctx: &RenderContext, width: u32, height: u32) -> Result<Self, ResourceError> {
        let b = FRAME_BORDER_WIDTH;
        let border = PixelBuffer::from_fn(width, height, |x, y| {
            if x < b || y < b || x + b >= width || y + b >= height {
                FRAME_BORDER_COLOR
            } else {
                Pixel::TRANSPARENT
            }
        });
        let texture = ctx.make_texture("frame", &border)?;
        Ok(Self {
            transform: LayerTransform::default(),
            quad: ctx.default_quad(),
            kind: LayerKind::Frame { texture },
        })
    }

    /// An empty selection; it is drawn with the overlay texture.
    pub fn upper(ctx: &RenderContext) -> Self {
        Self {
            transform: LayerTransform::default(),
            quad: ctx.default_quad(),
            kind: LayerKind::Upper(Selection::default()),
        }
    }

    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            LayerKind::Background { .. } => "background",
            LayerKind::Upper(_) => "upper",
            LayerKind::Frame { .. } => "frame",
        }
    }

    pub fn width(&self) -> i32 {
        match &self.kind {
            LayerKind::Background { image, .. } => image.width() as i32,
            LayerKind::Upper(selection) => selection.size.width,
            LayerKind::Frame { texture } => texture.width() as i32,
        }
    }

    pub fn height(&self) -> i32 {
        match &self.kind {
            LayerKind::Background { image, .. } => image.height() as i32,
            LayerKind::Upper(selection) => selection.size.height,
            LayerKind::Frame { texture } => texture.height() as i32,
        }
    }

    pub fn width_f(&self) -> f32 {
        self.width() as f32
    }

    pub fn height_f(&self) -> f32 {
        self.height() as f32
    }

    pub fn aspect(&self) -> f32 {
        self.width_f() / self.height_f()
    }

    pub fn quad(&self) -> &TexQuad {
        &self.quad
    }

    /// Texture to draw with; selections without a payload use `overlay`.
    pub fn texture_id(&self, overlay: TextureId) -> TextureId {
        match &self.kind {
            LayerKind::Background { texture, .. } | LayerKind::Frame { texture } => texture.id(),
            LayerKind::Upper(selection) => match &selection.payload {
                Some(SelectionPayload::Copy(data)) => data.texture,
                Some(SelectionPayload::Cut(data)) => data.texture.id(),
                None => overlay,
            },
        }
    }

    // -- transform ---------------------------------------------------------

    pub fn translate(&self, view: &View) -> Vec2 {
        self.transform.translate_delta * view.zoom
    }

    pub fn translate_by(&mut self, amount: Vec2) {
        self.transform.translate_delta += amount;
    }

    pub fn translate_to(&mut self, view: &View, dest: Vec2) {
        self.transform.translate_delta = dest / view.zoom;
    }

    pub fn rotate(&self) -> f32 {
        -self.transform.rotate_delta
    }

    pub fn rotate_to(&mut self, angle: f32) {
        self.transform.rotate_delta = -angle;
    }

    pub fn is_translated(&self) -> bool {
        self.transform.translate_delta != Vec2::ZERO
    }

    pub fn is_rotated(&self) -> bool {
        self.transform.rotate_delta != 0.0
    }

    pub fn reset_transform(&mut self) {
        self.transform = LayerTransform::default();
    }

    /// Half extents of the layer quad in normalized units.
    pub fn scale(&self, view: &View) -> Vec2 {
        match self.kind {
            LayerKind::Background { .. } => {
                let visible_height_ratio = (self.height_f() * view.zoom) / view.height;
                Vec2::new(self.aspect() * visible_height_ratio, visible_height_ratio)
            }
            LayerKind::Upper(_) | LayerKind::Frame { .. } => {
                Vec2::new(self.width_f(), self.height_f()) * view.zoom / view.height
            }
        }
    }

    // -- coordinate mapping ------------------------------------------------

    /// Maps a point in layer pixels to normalized display space: scale,
    /// then rotate, then translate. This is the transform used to draw the
    /// layer.
    pub fn normalized_from_layer_coord(&self, view: &View, p: Pos2) -> Vec2 {
        let local = Vec2::new(p.x * 2.0 / self.width_f() - 1.0, p.y * 2.0 / self.height_f() - 1.0);
        let scaled = local * self.scale(view);
        rotate_degrees(scaled, self.rotate()) + self.translate(view)
    }

    /// Maps a window pixel (bottom-left origin) to the layer pixel under it.
    pub fn layer_coord_from_win_coord(&self, view: &View, win: IPoint) -> IPoint {
        let norm = view.pixel_to_normalized(win);

        // undo translate, rotate and scale, in that order
        let centred = norm - self.translate(view);
        let unrotated = rotate_degrees(centred, -self.rotate());
        let local = unrotated / self.scale(view);

        // size of one layer pixel in normalized units
        let sx = 2.0 / self.width_f();
        let sy = 2.0 / self.height_f();

        IPoint::new(floor_i32((local.x + 1.0) / sx), floor_i32((local.y + 1.0) / sy))
    }

    pub fn layer_rect_from_win_rect(&self, view: &View, win: IRect) -> IRect {
        IRect::from_point_size(self.layer_coord_from_win_coord(view, win.top_left()), win.size())
    }

    pub fn tex_coord_from_win_coord(&self, view: &View, win: IPoint) -> Pos2 {
        let p = self.layer_coord_from_win_coord(view, win);
        Pos2::new(p.x as f32 / self.width_f(), p.y as f32 / self.height_f())
    }

    // TODO: only add the one-pixel correction when the translation is negative
    // and one image pixel spans two or more window pixels; at zoom 1 it
    // shifts the anchor by a pixel.
    pub fn win_rect(&self, view: &View) -> IRect {
        let win_center = view.normalized_to_pixel(self.translate(view));

        let half_width = floor_i32(self.width_f() * view.zoom / 2.0);
        let half_height = floor_i32(self.height_f() * view.zoom / 2.0);

        let left_top = IPoint::new(win_center.x - half_width, win_center.y - half_height) + IPoint::new(1, 1);

        IRect::from_point_size(left_top, ISize::new(self.width(), self.height()))
    }

    pub fn zoomed_win_rect(&self, view: &View) -> IRect {
        let rect = self.win_rect(view);
        IRect::from_point_size(
            rect.top_left(),
            ISize::new(
                round_i32(self.width_f() * view.zoom),
                round_i32(self.height_f() * view.zoom),
            ),
        )
    }

    /// Window-space outline of the layer, rotated around its centre.
    pub fn win_outline(&self, view: &View) -> [Pos2; 4] {
        let half_w = round_i32(self.width_f() * view.zoom / 2.0) as f32;
        let half_h = round_i32(self.height_f() * view.zoom / 2.0) as f32;
        let center = view.normalized_to_pixel(self.translate(view)).to_vec2();
        let angle = self.rotate();

        [
            Vec2::new(-half_w, -half_h),
            Vec2::new(half_w, -half_h),
            Vec2::new(half_w, half_h),
            Vec2::new(-half_w, half_h),
        ]
        .map(|corner| Pos2::ZERO + rotate_degrees(corner, angle) + center)
    }

    pub fn contains_win_point(&self, view: &View, p: IPoint) -> bool {
        point_in_polygon(&self.win_outline(view), p.to_pos2())
    }

    // -- selection (upper layer) -------------------------------------------

    pub fn selection(&self) -> Option<&Selection> {
        match &self.kind {
            LayerKind::Upper(selection) => Some(selection),
            _ => None,
        }
    }

    fn selection_mut(&mut self) -> Option<&mut Selection> {
        match &mut self.kind {
            LayerKind::Upper(selection) => Some(selection),
            _ => None,
        }
    }

    /// True for an upper layer that holds neither copied nor cut pixels.
    pub fn in_select_mode(&self) -> bool {
        self.selection().is_some_and(|s| s.payload.is_none())
    }

    pub fn payload(&self) -> Option<&SelectionPayload> {
        self.selection().and_then(|s| s.payload.as_ref())
    }

    pub fn cut_data(&self) -> Option<&CutData> {
        match self.payload() {
            Some(SelectionPayload::Cut(data)) => Some(data),
            _ => None,
        }
    }

    pub fn set_select_size(&mut self, size: ISize) {
        match self.selection_mut() {
            Some(selection) => selection.size = size,
            None => log::warn!("set_select_size called on the {} layer", self.name()),
        }
    }

    pub fn set_copy_data(&mut self, quad: Rc<TexQuad>, data: CopyData) {
        let Some(selection) = self.selection_mut() else {
            log::warn!("copy data can only be attached to the upper layer");
            return;
        };
        selection.payload = Some(SelectionPayload::Copy(data));
        self.quad = quad;
    }

    /// Cut pixels carry their own texture and are drawn with the default quad.
    pub fn set_cut_data(&mut self, ctx: &RenderContext, data: CutData) {
        let Some(selection) = self.selection_mut() else {
            log::warn!("cut data can only be attached to the upper layer");
            return;
        };
        selection.payload = Some(SelectionPayload::Cut(data));
        self.quad = ctx.default_quad();
    }

    // -- background --------------------------------------------------------

    pub fn image(&self) -> Option<&PixelBuffer> {
        match &self.kind {
            LayerKind::Background { image, .. } => Some(image),
            _ => None,
        }
    }

    fn replace_image(&mut self, ctx: &RenderContext, updated: PixelBuffer) -> Result<(), ResourceError> {
        let LayerKind::Background { image, texture } = &mut self.kind else {
            log::warn!("the {} layer has no image to edit", self.name());
            return Ok(());
        };
        let replacement = ctx.make_texture("background", &updated)?;
        *texture = replacement;
        *image = updated;
        Ok(())
    }

    /// Paints `rect` opaque black.
    pub fn erase_area(&mut self, ctx: &RenderContext, rect: IRect) -> Result<(), ResourceError> {
        let Some(mut updated) = self.image().cloned() else {
            return Ok(());
        };
        updated.fill_rect(rect, Pixel::BLACK);
        self.replace_image(ctx, updated)
    }

    /// Puts previously cut pixels back where they came from.
    pub fn fill_area(&mut self, ctx: &RenderContext, data: &CutData) -> Result<(), ResourceError> {
        let Some(mut updated) = self.image().cloned() else {
            return Ok(());
        };
        updated.draw_image(data.source.top_left(), &data.image);
        self.replace_image(ctx, updated)
    }
}
