//! Pixel kernels behind the CPU filter engine.
//!
//! Kernels work on straight-alpha RGBA8 buffers. Color kernels leave alpha
//! untouched; spatial kernels (blur, distortion) resample it with the color.

pub(crate) mod blur;
pub(crate) mod color;
pub(crate) mod distort;
pub(crate) mod stylize;

use image::{Rgba, RgbaImage};

/// ITU-R BT.709 coefficient for red channel in luminance calculation.
pub(crate) const LUMINANCE_R: f32 = 0.2126;

/// ITU-R BT.709 coefficient for green channel in luminance calculation.
pub(crate) const LUMINANCE_G: f32 = 0.7152;

/// ITU-R BT.709 coefficient for blue channel in luminance calculation.
pub(crate) const LUMINANCE_B: f32 = 0.0722;

/// Luminance of normalized RGB values (0.0 to 1.0).
#[inline]
pub(crate) fn luminance(r: f32, g: f32, b: f32) -> f32 {
    LUMINANCE_R * r + LUMINANCE_G * g + LUMINANCE_B * b
}

/// Smooth interpolation function.
///
/// Returns 0 for x <= edge0, 1 for x >= edge1,
/// and smoothly interpolates between.
#[inline]
pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub(crate) fn to_unit(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
pub(crate) fn from_unit(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Map every pixel's RGB through `f`, keeping alpha.
///
/// `f` receives the pixel coordinates and normalized channels.
pub(crate) fn map_rgb<F>(input: &RgbaImage, mut f: F) -> RgbaImage
where
    F: FnMut(u32, u32, f32, f32, f32) -> (f32, f32, f32),
{
    let mut out = input.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let (r, g, b) = f(x, y, to_unit(pixel[0]), to_unit(pixel[1]), to_unit(pixel[2]));
        pixel[0] = from_unit(r);
        pixel[1] = from_unit(g);
        pixel[2] = from_unit(b);
    }
    out
}

/// Surround `input` with `margin` transparent pixels on every side.
pub(crate) fn pad(input: &RgbaImage, margin: u32) -> RgbaImage {
    if margin == 0 {
        return input.clone();
    }
    let (w, h) = input.dimensions();
    let mut out = RgbaImage::new(w + 2 * margin, h + 2 * margin);
    image::imageops::replace(&mut out, input, margin as i64, margin as i64);
    out
}

/// Pixel at `(x, y)`, or transparent outside the image.
#[inline]
pub(crate) fn pixel_or_clear(image: &RgbaImage, x: i64, y: i64) -> Rgba<u8> {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        Rgba([0, 0, 0, 0])
    } else {
        *image.get_pixel(x as u32, y as u32)
    }
}

/// Pixel at `(x, y)` with coordinates clamped to the edges.
#[inline]
pub(crate) fn pixel_clamped(image: &RgbaImage, x: i64, y: i64) -> Rgba<u8> {
    let x = x.clamp(0, image.width() as i64 - 1);
    let y = y.clamp(0, image.height() as i64 - 1);
    *image.get_pixel(x as u32, y as u32)
}

/// Premultiplied accumulator for averaging straight-alpha pixels.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Accumulator {
    sum: [f32; 4],
    weight: f32,
}

impl Accumulator {
    #[inline]
    pub(crate) fn add(&mut self, pixel: Rgba<u8>, weight: f32) {
        let a = to_unit(pixel[3]) * weight;
        self.sum[0] += pixel[0] as f32 * a;
        self.sum[1] += pixel[1] as f32 * a;
        self.sum[2] += pixel[2] as f32 * a;
        self.sum[3] += a;
        self.weight += weight;
    }

    /// Weighted average, un-premultiplied.
    pub(crate) fn average(&self) -> Rgba<u8> {
        if self.weight <= 0.0 || self.sum[3] <= f32::EPSILON {
            return Rgba([0, 0, 0, 0]);
        }
        let alpha = self.sum[3] / self.weight;
        let channel = |c: f32| (c / self.sum[3]).clamp(0.0, 255.0).round() as u8;
        Rgba([
            channel(self.sum[0]),
            channel(self.sum[1]),
            channel(self.sum[2]),
            from_unit(alpha),
        ])
    }
}
