use crate::buffer::PixelBuffer;
use crate::geometry::{ceil_i32, floor_i32, IPoint};
use crate::pixel::Pixel;
use egui::Pos2;

/// The 2x2 neighbourhood around a fractional source point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    /// `[row][column]`: left-top, right-top, left-bottom, right-bottom.
    pub corners: [[Pixel; 2]; 2],
    /// Fractional offsets in `[0, 1)`.
    pub x: f32,
    pub y: f32,
}

impl Cell {
    /// Samples the neighbours of `p` in `image`; neighbours outside the
    /// image take `extrapolation` instead.
    pub fn new(p: Pos2, image: &PixelBuffer, extrapolation: Pixel) -> Self {
        let color = |x: i32, y: i32| image.get(IPoint::new(x, y)).unwrap_or(extrapolation);

        let (fx, cx) = (floor_i32(p.x), ceil_i32(p.x));
        let (fy, cy) = (floor_i32(p.y), ceil_i32(p.y));

        Self {
            corners: [[color(fx, fy), color(cx, fy)], [color(fx, cy), color(cx, cy)]],
            x: p.x - p.x.floor(),
            y: p.y - p.y.floor(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InterpMethod {
    #[default]
    Nearest,
    Bilinear,
}

impl InterpMethod {
    pub fn label(&self) -> &'static str {
        match self {
            InterpMethod::Nearest => "Nearest",
            InterpMethod::Bilinear => "Bilinear",
        }
    }

    pub fn all() -> &'static [InterpMethod] {
        &[InterpMethod::Nearest, InterpMethod::Bilinear]
    }

    pub fn sampler(&self) -> fn(&Cell) -> Pixel {
        match self {
            InterpMethod::Nearest => nearest,
            InterpMethod::Bilinear => bilinear,
        }
    }
}

fn blend_channel(a: u8, b: u8, q: f32) -> u8 {
    (a as f32 * (1.0 - q) + b as f32 * q).round().clamp(0.0, 255.0) as u8
}

/// Blends two colors channel by channel. The result is always opaque.
pub fn linear(a: Pixel, b: Pixel, q: f32) -> Pixel {
    Pixel::from_argb(
        0xff,
        blend_channel(a.red(), b.red(), q),
        blend_channel(a.green(), b.green(), q),
        blend_channel(a.blue(), b.blue(), q),
    )
}

pub fn nearest(cell: &Cell) -> Pixel {
    let i = cell.x.round() as usize;
    let j = cell.y.round() as usize;
    cell.corners[j.min(1)][i.min(1)]
}

pub fn bilinear(cell: &Cell) -> Pixel {
    let top = linear(cell.corners[0][0], cell.corners[0][1], cell.x);
    let bottom = linear(cell.corners[1][0], cell.corners[1][1], cell.x);
    linear(top, bottom, cell.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two(values: [u8; 4]) -> PixelBuffer {
        PixelBuffer::from_fn(2, 2, |x, y| Pixel::gray(values[(y * 2 + x) as usize]))
    }

    #[test]
    fn linear_matches_rounded_blend() {
        let cases = [
            (0.00, 100),
            (0.25, 125),
            (0.33, 133),
            (0.50, 150),
            (0.66, 166),
            (0.75, 175),
            (1.00, 200),
        ];
        for (q, expected) in cases {
            assert_eq!(
                linear(Pixel::gray(100), Pixel::gray(200), q),
                Pixel::gray(expected),
                "q = {q}"
            );
        }
    }

    #[test]
    fn linear_output_is_opaque() {
        let a = Pixel::from_rgba(10, 20, 30, 0);
        let b = Pixel::from_rgba(10, 20, 30, 5);
        assert_eq!(linear(a, b, 0.5).alpha(), 0xff);
    }

    #[test]
    fn nearest_picks_closest_corner() {
        let img = two_by_two([10, 20, 30, 40]);
        let sample = |x, y| nearest(&Cell::new(Pos2::new(x, y), &img, Pixel(0)));

        assert_eq!(sample(0.25, 0.25), Pixel::gray(10));
        assert_eq!(sample(0.75, 0.25), Pixel::gray(20));
        assert_eq!(sample(0.25, 0.75), Pixel::gray(30));
        assert_eq!(sample(0.75, 0.75), Pixel::gray(40));
    }

    #[test]
    fn bilinear_blends_all_four_corners() {
        let img = two_by_two([0, 100, 100, 200]);
        let sample = |x, y| bilinear(&Cell::new(Pos2::new(x, y), &img, Pixel(0)));

        assert_eq!(sample(0.25, 0.25), Pixel::gray(50));
        assert_eq!(sample(0.75, 0.25), Pixel::gray(100));
        assert_eq!(sample(0.25, 0.75), Pixel::gray(100));
        assert_eq!(sample(0.75, 0.75), Pixel::gray(150));
    }

    #[test]
    fn cell_extrapolates_outside_the_image() {
        let img = two_by_two([10, 20, 30, 40]);
        let fallback = Pixel::gray(99);
        let cell = Cell::new(Pos2::new(1.5, -0.5), &img, fallback);

        assert_eq!(cell.corners[0], [fallback, fallback]);
        assert_eq!(cell.corners[1], [Pixel::gray(20), fallback]);
        assert_eq!((cell.x, cell.y), (0.5, 0.5));
    }

    #[test]
    fn integer_points_collapse_to_one_pixel() {
        let img = two_by_two([10, 20, 30, 40]);
        let cell = Cell::new(Pos2::new(1.0, 1.0), &img, Pixel(0));
        assert_eq!(cell.corners, [[Pixel::gray(40); 2]; 2]);
        assert_eq!(nearest(&cell), Pixel::gray(40));
        assert_eq!(bilinear(&cell), Pixel::gray(40));
    }

    #[test]
    fn method_selects_sampler() {
        let img = two_by_two([0, 100, 100, 200]);
        let cell = Cell::new(Pos2::new(0.25, 0.25), &img, Pixel(0));
        assert_eq!(InterpMethod::Nearest.sampler()(&cell), Pixel::gray(0));
        assert_eq!(InterpMethod::Bilinear.sampler()(&cell), Pixel::gray(50));
    }
}
