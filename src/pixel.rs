use bytemuck::{Pod, Zeroable};
use image::Rgba;

/// A packed `0xAARRGGBB` pixel.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Pod, Zeroable)]
pub struct Pixel(pub u32);

impl Pixel {
    pub const TRANSPARENT: Pixel = Pixel(0);
    pub const BLACK: Pixel = Pixel::from_argb(0xff, 0x00, 0x00, 0x00);

    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_argb(a, r, g, b)
    }

    /// Opaque gray with all three color channels set to `k`.
    pub const fn gray(k: u8) -> Self {
        Self::from_argb(0xff, k, k, k)
    }

    pub const fn alpha(self) -> u8 {
        ((self.0 >> 24) & 0xff) as u8
    }

    pub const fn red(self) -> u8 {
        ((self.0 >> 16) & 0xff) as u8
    }

    pub const fn green(self) -> u8 {
        ((self.0 >> 8) & 0xff) as u8
    }

    pub const fn blue(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self((self.0 & 0x00ff_ffff) | ((a as u32) << 24))
    }

    pub const fn to_rgba_array(self) -> [u8; 4] {
        [self.red(), self.green(), self.blue(), self.alpha()]
    }
}

impl From<Rgba<u8>> for Pixel {
    fn from(p: Rgba<u8>) -> Self {
        Pixel::from_rgba(p[0], p[1], p[2], p[3])
    }
}

impl From<Pixel> for Rgba<u8> {
    fn from(p: Pixel) -> Self {
        Rgba(p.to_rgba_array())
    }
}

impl From<u32> for Pixel {
    fn from(v: u32) -> Self {
        Pixel(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_round_trip_through_packing() {
        for r in (0..=255u16).step_by(15) {
            for g in (0..=255u16).step_by(17) {
                for (b, a) in [(0u8, 255u8), (1, 0), (128, 127), (255, 1)] {
                    let p = Pixel::from_rgba(r as u8, g as u8, b, a);
                    assert_eq!(
                        (p.red(), p.green(), p.blue(), p.alpha()),
                        (r as u8, g as u8, b, a)
                    );
                }
            }
        }
    }

    #[test]
    fn packing_layout_is_argb() {
        assert_eq!(Pixel::from_argb(0x11, 0x22, 0x33, 0x44).0, 0x1122_3344);
        assert_eq!(Pixel::gray(0x80).0, 0xff80_8080);
        assert_eq!(Pixel::gray(7).with_alpha(0).0, 0x0007_0707);
    }

    #[test]
    fn converts_to_and_from_image_rgba() {
        let p = Pixel::from_rgba(1, 2, 3, 4);
        let rgba: Rgba<u8> = p.into();
        assert_eq!(rgba, Rgba([1, 2, 3, 4]));
        assert_eq!(Pixel::from(rgba), p);
    }
}
