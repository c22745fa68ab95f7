use crate::buffer::PixelBuffer;
use crate::geometry::{rotate_degrees, round_point, IPoint, IRect};
use crate::interpolator::{Cell, InterpMethod};
use egui::{Pos2, Vec2};
use rayon::prelude::*;
use std::time::Instant;

/// Merges a rotated upper image into a lower one.
#[derive(Clone, Copy, Debug, Default)]
pub struct Compositor {
    method: InterpMethod,
}

impl Compositor {
    pub fn new(method: InterpMethod) -> Self {
        Self { method }
    }

    pub fn set_interpolation_method(&mut self, method: InterpMethod) {
        log::debug!("interpolation method set to {}", method.label());
        self.method = method;
    }

    pub fn interpolation_method(&self) -> InterpMethod {
        self.method
    }

    /// Places `upper` at `upper_rect`, rotated by `upper_angle` degrees
    /// around the rect's centre, and samples it into `lower`.
    ///
    /// `lower` is modified in place and returned. Pixels of `lower` outside
    /// the rotated footprint keep their value; samples that fall off the
    /// edge of `upper` blend with the destination pixel they replace.
    pub fn merge_images(
        &self,
        mut lower: PixelBuffer,
        upper: &PixelBuffer,
        upper_rect: IRect,
        upper_angle: f32,
    ) -> PixelBuffer {
        if upper_rect.is_empty() || lower.is_empty() {
            log::debug!("merge skipped: empty placement {:?}", upper_rect);
            return lower;
        }

        let start = Instant::now();
        let sample = self.method.sampler();
        let offset = upper_rect.top_left().to_vec2();
        let width = lower.width() as usize;

        // Rows are independent: sampling only ever reads `upper`.
        lower
            .pixels_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(i, row)| {
                for (j, pixel) in row.iter_mut().enumerate() {
                    let revp = reverse_rotate(IPoint::new(j as i32, i as i32), &upper_rect, upper_angle);
                    if upper_rect.contains(round_point(revp)) {
                        *pixel = sample(&Cell::new(revp - offset, upper, *pixel));
                    }
                }
            });

        log::info!(
            "merged {}x{} onto {}x{} at {:?}, {} deg, in {} ms",
            upper.width(),
            upper.height(),
            lower.width(),
            lower.height(),
            upper_rect,
            upper_angle,
            start.elapsed().as_millis()
        );

        lower
    }
}

/// Rotates `p` by `-angle` degrees around the centre of `rect`.
pub fn reverse_rotate(p: IPoint, rect: &IRect, angle: f32) -> Pos2 {
    let center: Vec2 = rect.center().to_vec2();
    let q = rotate_degrees(p.to_vec2() - center, -angle);
    Pos2::ZERO + q + center
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Pixel;

    fn numbered(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::from_fn(w, h, |x, y| Pixel::from_rgba(x as u8, y as u8, 7, 200))
    }

    fn background(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::filled(w, h, Pixel::gray(0x33))
    }

    #[test]
    fn rect_outside_lower_leaves_it_unchanged() {
        let comp = Compositor::new(InterpMethod::Bilinear);
        let lower = background(8, 8);
        let upper = numbered(4, 4);

        for rect in [IRect::new(20, 20, 4, 4), IRect::new(-10, 2, 4, 4)] {
            for angle in [0.0, 33.0, 90.0] {
                let merged = comp.merge_images(lower.clone(), &upper, rect, angle);
                assert_eq!(merged, lower);
            }
        }
    }

    #[test]
    fn empty_rect_touches_nothing() {
        let comp = Compositor::default();
        let lower = background(8, 8);
        let merged = comp.merge_images(lower.clone(), &numbered(4, 4), IRect::new(2, 2, 0, 4), 0.0);
        assert_eq!(merged, lower);
    }

    #[test]
    fn zero_angle_reproduces_upper_exactly() {
        let comp = Compositor::new(InterpMethod::Nearest);
        let lower = background(10, 10);
        let upper = numbered(4, 3);
        let rect = IRect::new(2, 5, 4, 3);

        let merged = comp.merge_images(lower.clone(), &upper, rect, 0.0);

        for y in 0..10 {
            for x in 0..10 {
                let p = IPoint::new(x, y);
                let expected = if rect.contains(p) {
                    upper.get(p - rect.top_left()).unwrap()
                } else {
                    lower.get(p).unwrap()
                };
                assert_eq!(merged.get(p).unwrap(), expected, "at {:?}", p);
            }
        }
    }

    #[test]
    fn half_turn_mirrors_both_axes() {
        let comp = Compositor::new(InterpMethod::Nearest);
        let upper = numbered(3, 3);
        let merged = comp.merge_images(background(3, 3), &upper, IRect::new(0, 0, 3, 3), 180.0);

        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(merged.pixel(j, i), upper.pixel(2 - j, 2 - i));
            }
        }
    }

    #[test]
    fn quarter_turn_moves_columns_into_rows() {
        let comp = Compositor::new(InterpMethod::Nearest);
        let upper = numbered(3, 3);
        let merged = comp.merge_images(background(3, 3), &upper, IRect::new(0, 0, 3, 3), 90.0);

        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(merged.pixel(j, i), upper.pixel(i, 2 - j));
            }
        }
    }

    #[test]
    fn partially_outside_rect_only_touches_overlap() {
        let comp = Compositor::new(InterpMethod::Nearest);
        let upper = numbered(3, 3);
        let lower = background(4, 4);
        let merged = comp.merge_images(lower.clone(), &upper, IRect::new(-1, -1, 3, 3), 0.0);

        assert_eq!(merged.pixel(0, 0), upper.pixel(1, 1));
        assert_eq!(merged.pixel(1, 1), upper.pixel(2, 2));
        assert_eq!(merged.pixel(2, 0), lower.pixel(2, 0));
        assert_eq!(merged.pixel(0, 2), lower.pixel(0, 2));
    }

    #[test]
    fn bilinear_edges_blend_with_destination() {
        let comp = Compositor::new(InterpMethod::Bilinear);
        let upper = PixelBuffer::filled(4, 4, Pixel::gray(200));
        let lower = PixelBuffer::filled(12, 12, Pixel::gray(0));
        let merged = comp.merge_images(lower, &upper, IRect::new(4, 4, 4, 4), 45.0);

        // Interior samples see only upper pixels.
        assert_eq!(merged.pixel(5, 5), Pixel::gray(200));
        // Far corners stay untouched.
        assert_eq!(merged.pixel(0, 0), Pixel::gray(0));
        assert_eq!(merged.pixel(11, 11), Pixel::gray(0));
        // Everything written is a blend of 0 and 200 and fully opaque.
        for p in merged.pixels() {
            assert!(p.red() <= 200);
            assert!(p.alpha() == 0xff);
        }
    }

    #[test]
    fn reverse_rotate_is_identity_at_zero() {
        let rect = IRect::new(3, 4, 5, 6);
        assert_eq!(reverse_rotate(IPoint::new(7, 1), &rect, 0.0), Pos2::new(7.0, 1.0));
    }

    #[test]
    fn method_is_stateful() {
        let mut comp = Compositor::default();
        assert_eq!(comp.interpolation_method(), InterpMethod::Nearest);
        comp.set_interpolation_method(InterpMethod::Bilinear);
        assert_eq!(comp.interpolation_method(), InterpMethod::Bilinear);
    }
}
