//! Conversions between window pixels and normalized device coordinates.
//!
//! Window pixels handed to the core have their origin at the bottom-left
//! corner (see [`to_pixel_coord`]). Normalized space has its origin at the
//! viewport centre and spans `[-aspect, aspect] x [-1, 1]`.

use crate::geometry::{round_i32, IPoint};
use egui::Vec2;

/// Flips the vertical axis. Applying it twice gives back the input.
pub fn to_pixel_coord(height: i32, p: IPoint) -> IPoint {
    IPoint::new(p.x, height - 1 - p.y)
}

fn half_extents(width: f32, height: f32) -> (f32, f32) {
    ((width / 2.0).floor(), (height / 2.0).floor())
}

pub fn pixel_to_normalized(width: f32, height: f32, pixel: IPoint) -> Vec2 {
    let (hw, hh) = half_extents(width, height);
    let aspect = width / height;

    let xn = (pixel.x as f32 - hw) / hw;
    let yn = (pixel.y as f32 - hh) / hh;

    Vec2::new(aspect * xn, yn)
}

pub fn normalized_to_pixel(width: f32, height: f32, norm: Vec2) -> IPoint {
    let (hw, hh) = half_extents(width, height);
    let aspect = width / height;

    IPoint::new(
        round_i32(norm.x / aspect * hw + hw),
        round_i32(norm.y * hh + hh),
    )
}

/// Viewport size in pixels plus the current zoom level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    pub width: f32,
    pub height: f32,
    pub zoom: f32,
}

impl View {
    pub fn new(width: f32, height: f32, zoom: f32) -> Self {
        Self {
            width,
            height,
            zoom,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn pixel_to_normalized(&self, pixel: IPoint) -> Vec2 {
        pixel_to_normalized(self.width, self.height, pixel)
    }

    pub fn normalized_to_pixel(&self, norm: Vec2) -> IPoint {
        normalized_to_pixel(self.width, self.height, norm)
    }

    pub fn to_pixel_coord(&self, p: IPoint) -> IPoint {
        to_pixel_coord(self.height as i32, p)
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new(1200.0, 800.0, 1.0)
    }
}
