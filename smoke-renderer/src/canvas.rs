use anyhow::Result;
use image::{Rgb, RgbImage};

/// A mutable RGB pixel surface. Callers only pass in-bounds coordinates.
pub trait Canvas {
    fn dimensions(&self) -> (u32, u32);
    fn get_rgb(&self, x: u32, y: u32) -> [u8; 3];
    fn put_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]);
}

impl Canvas for RgbImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn get_rgb(&self, x: u32, y: u32) -> [u8; 3] {
        self.get_pixel(x, y).0
    }

    fn put_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        self.put_pixel(x, y, Rgb(rgb));
    }
}

/// Borrowed interleaved RGB bytes, row-major, 3 bytes per pixel.
#[derive(Debug)]
pub struct FrameBuffer<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> FrameBuffer<'a> {
    pub fn new(data: &'a mut [u8], width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            anyhow::bail!(
                "Frame buffer holds {} bytes, expected {} for {}x{} RGB.",
                data.len(),
                expected,
                width,
                height
            );
        }
        Ok(Self { data, width, height })
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }
}

impl Canvas for FrameBuffer<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn get_rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    fn put_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = self.offset(x, y);
        self.data[i..i + 3].copy_from_slice(&rgb);
    }
}

/// Linear blend of `overlay` onto `base`: `base * (1 - f) + overlay * f` per
/// channel, with `f` clamped to `[0, 1]`.
pub fn mix(base: [u8; 3], overlay: [u8; 3], factor: f32) -> [u8; 3] {
    let f = if factor.is_nan() { 0.0 } else { factor.clamp(0.0, 1.0) };
    let mut out = [0u8; 3];
    for c in 0..3 {
        let value = base[c] as f32 * (1.0 - f) + overlay[c] as f32 * f;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out
}
