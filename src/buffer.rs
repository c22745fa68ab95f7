use crate::geometry::{IPoint, IRect};
use crate::pixel::Pixel;
use image::{Rgba, RgbaImage};

/// Row-major grid of packed ARGB pixels.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PixelBuffer {
    /// A transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Pixel::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Pixel) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Returns `None` when the pixel count does not match the dimensions.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Pixel>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Pixel) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn rect(&self) -> IRect {
        IRect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// The raw packed words, for hashing and texture upload.
    pub fn as_words(&self) -> &[u32] {
        bytemuck::cast_slice(&self.pixels)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, p: IPoint) -> Option<Pixel> {
        self.index(p.x, p.y).map(|i| self.pixels[i])
    }

    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, p: IPoint, color: Pixel) {
        if let Some(i) = self.index(p.x, p.y) {
            self.pixels[i] = color;
        }
    }

    /// Copies `rect` out of the buffer; parts outside the buffer come back transparent.
    pub fn copy_region(&self, rect: IRect) -> PixelBuffer {
        if rect.is_empty() {
            return PixelBuffer::default();
        }
        PixelBuffer::from_fn(rect.width as u32, rect.height as u32, |x, y| {
            self.get(IPoint::new(rect.x + x as i32, rect.y + y as i32))
                .unwrap_or(Pixel::TRANSPARENT)
        })
    }

    pub fn fill_rect(&mut self, rect: IRect, color: Pixel) {
        let area = rect.intersected(&self.rect());
        for y in area.top()..=area.bottom() {
            for x in area.left()..=area.right() {
                self.set(IPoint::new(x, y), color);
            }
        }
        if area.is_empty() {
            log::debug!("fill_rect: {:?} is outside the buffer", rect);
        }
    }

    /// Writes `src` with its top-left corner at `at`, clipped to the buffer.
    pub fn draw_image(&mut self, at: IPoint, src: &PixelBuffer) {
        for y in 0..src.height as i32 {
            for x in 0..src.width as i32 {
                self.set(at + IPoint::new(x, y), src.pixel(x as u32, y as u32));
            }
        }
    }

    pub fn mirrored(&self, horizontal: bool, vertical: bool) -> PixelBuffer {
        let (w, h) = (self.width, self.height);
        PixelBuffer::from_fn(w, h, |x, y| {
            let sx = if horizontal { w - 1 - x } else { x };
            let sy = if vertical { h - 1 - y } else { y };
            self.pixel(sx, sy)
        })
    }

    pub fn from_rgba_image(img: &RgbaImage) -> PixelBuffer {
        let pixels = img.pixels().map(|p| Pixel::from(*p)).collect();
        PixelBuffer {
            width: img.width(),
            height: img.height(),
            pixels,
        }
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| Rgba::from(self.pixel(x, y)))
    }

    /// Interleaved RGBA bytes, row 0 first.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_rgba_array()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::from_fn(w, h, |x, y| Pixel::gray((y * w + x) as u8))
    }

    #[test]
    fn out_of_bounds_reads_are_none() {
        let buf = numbered(3, 2);
        assert_eq!(buf.get(IPoint::new(2, 1)), Some(Pixel::gray(5)));
        assert_eq!(buf.get(IPoint::new(3, 0)), None);
        assert_eq!(buf.get(IPoint::new(-1, 0)), None);
    }

    #[test]
    fn copy_region_pads_outside_with_transparent() {
        let buf = numbered(3, 3);
        let part = buf.copy_region(IRect::new(2, 2, 2, 2));
        assert_eq!(part.pixel(0, 0), Pixel::gray(8));
        assert_eq!(part.pixel(1, 0), Pixel::TRANSPARENT);
        assert_eq!(part.pixel(1, 1), Pixel::TRANSPARENT);
    }

    #[test]
    fn fill_and_draw_are_clipped() {
        let mut buf = PixelBuffer::new(4, 4);
        buf.fill_rect(IRect::new(-2, -2, 4, 4), Pixel::BLACK);
        assert_eq!(buf.pixel(1, 1), Pixel::BLACK);
        assert_eq!(buf.pixel(2, 2), Pixel::TRANSPARENT);

        buf.draw_image(IPoint::new(3, 3), &numbered(2, 2));
        assert_eq!(buf.pixel(3, 3), Pixel::gray(0));
    }

    #[test]
    fn mirroring_flips_rows_and_columns() {
        let buf = numbered(3, 2);
        let v = buf.mirrored(false, true);
        assert_eq!(v.pixel(0, 0), Pixel::gray(3));
        let h = buf.mirrored(true, false);
        assert_eq!(h.pixel(0, 0), Pixel::gray(2));
        assert_eq!(buf.mirrored(true, true).mirrored(true, true), buf);
    }

    #[test]
    fn rgba_image_conversion_keeps_pixels() {
        let buf = numbered(4, 3);
        assert_eq!(PixelBuffer::from_rgba_image(&buf.to_rgba_image()), buf);
        assert_eq!(buf.to_rgba_bytes().len(), 4 * 3 * 4);
        assert_eq!(buf.as_words()[5], Pixel::gray(5).0);
    }

    #[test]
    fn from_pixels_checks_length() {
        assert!(PixelBuffer::from_pixels(2, 2, vec![Pixel::BLACK; 3]).is_none());
        assert!(PixelBuffer::from_pixels(2, 2, vec![Pixel::BLACK; 4]).is_some());
    }
}
