//! Color and intensity adjustment.
//!
//! The five sliders of the color panel map to [`ColorLevels`], which drive
//! a per-channel curve followed by a YCbCr contrast and brightness pass.

use crate::buffer::PixelBuffer;
use crate::pixel::Pixel;
use rayon::prelude::*;

const CHROMA_OFFSET: f32 = 128.0 / 255.0;

/// Slider positions, each in `[0, 1]`. The middle position changes nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorSliders {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub brightness: f32,
    pub contrast: f32,
}

impl Default for ColorSliders {
    fn default() -> Self {
        Self {
            red: 0.5,
            green: 0.5,
            blue: 0.5,
            brightness: 0.5,
            contrast: 0.5,
        }
    }
}

impl ColorSliders {
    pub fn levels(&self) -> ColorLevels {
        let contrast = if self.contrast <= 0.5 {
            2.0 * self.contrast
        } else {
            8.0 * self.contrast - 3.0
        };
        ColorLevels {
            red: self.red,
            green: self.green,
            blue: self.blue,
            brightness: self.brightness - 0.5,
            contrast,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Parameters of the color pass. Contrast is an exponent in `[0, 5]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorLevels {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub brightness: f32,
    pub contrast: f32,
}

impl Default for ColorLevels {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorLevels {
    pub const IDENTITY: ColorLevels = ColorLevels {
        red: 0.5,
        green: 0.5,
        blue: 0.5,
        brightness: 0.0,
        contrast: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    fn channel_curve(level: f32, ch: f32) -> f32 {
        if level < 0.5 {
            2.0 * ch * level
        } else {
            2.0 * (1.0 - ch) * level + 2.0 * ch - 1.0
        }
    }

    fn contrast_curve(&self, ch: f32) -> f32 {
        let c = self.contrast;
        // scales both halves so they meet at 0.5
        let a = 0.5f32.powf(1.0 - c);
        if ch < 0.5 {
            a * ch.powf(c)
        } else if ch > 0.5 {
            1.0 - a * (1.0 - ch).powf(c)
        } else {
            ch
        }
    }

    /// Adjusts one pixel; channels are in `[0, 1]`, alpha is kept.
    pub fn apply_rgb(&self, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
        let r = Self::channel_curve(self.red, r);
        let g = Self::channel_curve(self.green, g);
        let b = Self::channel_curve(self.blue, b);

        let (y, cb, cr) = to_ycbcr(r, g, b);
        let y = self.contrast_curve(y) + self.brightness;
        let cb = self.contrast_curve(cb);
        let cr = self.contrast_curve(cr);

        to_rgb(y, cb, cr)
    }

    pub fn apply_pixel(&self, p: Pixel) -> Pixel {
        let (r, g, b) = self.apply_rgb(unit(p.red()), unit(p.green()), unit(p.blue()));
        Pixel::from_argb(p.alpha(), byte(r), byte(g), byte(b))
    }

    /// Returns a copy of `image` with the levels applied. Identity levels
    /// return the pixels unchanged.
    pub fn apply(&self, image: &PixelBuffer) -> PixelBuffer {
        let mut out = image.clone();
        if self.is_identity() {
            return out;
        }
        map_pixels(&mut out, |p| self.apply_pixel(p));
        out
    }
}

fn unit(v: u8) -> f32 {
    v as f32 / 255.0
}

fn byte(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

pub fn to_ycbcr(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let y = (0.299 * r + 0.587 * g + 0.114 * b).clamp(0.0, 1.0);
    let cb = (-0.1687 * r - 0.3313 * g + 0.5 * b + CHROMA_OFFSET).clamp(0.0, 1.0);
    let cr = (0.5 * r - 0.4187 * g - 0.0813 * b + CHROMA_OFFSET).clamp(0.0, 1.0);
    (y, cb, cr)
}

pub fn to_rgb(y: f32, cb: f32, cr: f32) -> (f32, f32, f32) {
    let r = (y + 1.402 * (cr - CHROMA_OFFSET)).clamp(0.0, 1.0);
    let g = (y - 0.3441 * (cb - CHROMA_OFFSET) - 0.7141 * (cr - CHROMA_OFFSET)).clamp(0.0, 1.0);
    let b = (y + 1.722 * (cb - CHROMA_OFFSET)).clamp(0.0, 1.0);
    (r, g, b)
}

/// Replaces every color with its luma; alpha is kept.
pub fn grayscale(image: &PixelBuffer) -> PixelBuffer {
    let mut out = image.clone();
    map_pixels(&mut out, |p| {
        let (y, _, _) = to_ycbcr(unit(p.red()), unit(p.green()), unit(p.blue()));
        let k = byte(y);
        Pixel::from_argb(p.alpha(), k, k, k)
    });
    out
}

fn map_pixels<F>(image: &mut PixelBuffer, f: F)
where
    F: Fn(Pixel) -> Pixel + Sync,
{
    let width = image.width() as usize;
    if width == 0 {
        return;
    }
    image.pixels_mut().par_chunks_mut(width).for_each(|row| {
        for p in row.iter_mut() {
            *p = f(*p);
        }
    });
}
