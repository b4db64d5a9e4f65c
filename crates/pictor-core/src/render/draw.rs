//! Affine image drawing with bilinear sampling.
//!
//! Drawing uses inverse mapping: for every canvas pixel inside the
//! destination footprint, the pixel center is mapped back into source space
//! and the source is sampled there.
//!
//! ```text
//! src = M⁻¹ · (dst_x + 0.5, dst_y + 0.5)
//! ```
//!
//! Sample positions that land exactly on source pixel centers return that
//! pixel unchanged, which keeps identity, flip and integer-offset draws
//! lossless.

use image::{Rgba, RgbaImage};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

/// How drawn pixels combine with what is already on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Replace the destination pixel.
    Copy,
    /// Straight-alpha "over" compositing.
    #[default]
    SourceOver,
}

/// Integer pixel region `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy)]
struct PixelRegion {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelRegion {
    /// Pixels of `image` touched by `rect`, or `None` if the overlap is empty.
    fn covering(rect: Rect, image: &RgbaImage) -> Option<Self> {
        let (w, h) = image.dimensions();
        let x0 = rect.x0.floor().max(0.0);
        let y0 = rect.y0.floor().max(0.0);
        let x1 = rect.x1.ceil().min(w as f64);
        let y1 = rect.y1.ceil().min(h as f64);
        if !(x1 > x0 && y1 > y0) {
            return None;
        }
        Some(Self {
            x0: x0 as u32,
            y0: y0 as u32,
            x1: x1 as u32,
            y1: y1 as u32,
        })
    }
}

/// Affine map taking `src` onto `dst` (translate + non-uniform scale).
pub(crate) fn rect_to_rect(src: Rect, dst: Rect) -> Affine {
    let sx = dst.width() / src.width();
    let sy = dst.height() / src.height();
    Affine::translate((dst.x0, dst.y0))
        * Affine::scale_non_uniform(sx, sy)
        * Affine::translate((-src.x0, -src.y0))
}

pub(crate) fn draw_image(
    target: &mut RgbaImage,
    source: &RgbaImage,
    src_rect: Rect,
    matrix: Affine,
    blend: BlendMode,
) {
    let src_bounds = Rect::new(0.0, 0.0, source.width() as f64, source.height() as f64);
    let src_rect = src_rect.intersect(src_bounds);
    let Some(region) = PixelRegion::covering(src_rect, source) else {
        return;
    };

    if matrix.determinant().abs() < 1e-12 {
        return;
    }
    let inverse = matrix.inverse();

    // Destination footprint of the source rectangle, clipped to the canvas
    let footprint = matrix.transform_rect_bbox(src_rect);
    let Some(dst_region) = PixelRegion::covering(footprint, target) else {
        return;
    };

    for dst_y in dst_region.y0..dst_region.y1 {
        for dst_x in dst_region.x0..dst_region.x1 {
            let p = inverse * Point::new(dst_x as f64 + 0.5, dst_y as f64 + 0.5);
            if p.x < src_rect.x0 || p.x >= src_rect.x1 || p.y < src_rect.y0 || p.y >= src_rect.y1 {
                continue;
            }

            let pixel = sample_bilinear(source, region, p.x - 0.5, p.y - 0.5);
            let dst = target.get_pixel_mut(dst_x, dst_y);
            *dst = blend_pixel(*dst, pixel, blend);
        }
    }
}

pub(crate) fn fill_rect(target: &mut RgbaImage, rect: Rect, color: Rgba<u8>, blend: BlendMode) {
    // Pixels whose centers fall inside the rectangle
    let snapped = Rect::new(
        (rect.x0 - 0.5).ceil(),
        (rect.y0 - 0.5).ceil(),
        (rect.x1 - 0.5).ceil(),
        (rect.y1 - 0.5).ceil(),
    );
    let Some(region) = PixelRegion::covering(snapped, target) else {
        return;
    };
    for y in region.y0..region.y1 {
        for x in region.x0..region.x1 {
            let dst = target.get_pixel_mut(x, y);
            *dst = blend_pixel(*dst, color, blend);
        }
    }
}

/// Sample a pixel using bilinear interpolation.
///
/// `x` and `y` are in pixel-index space (the center of pixel `i` is at `i`).
/// Coordinates are clamped to `region`, so edges extend instead of fading
/// to black. Interpolation is done on premultiplied values.
fn sample_bilinear(image: &RgbaImage, region: PixelRegion, x: f64, y: f64) -> Rgba<u8> {
    let x = x.clamp(region.x0 as f64, (region.x1 - 1) as f64);
    let y = y.clamp(region.y0 as f64, (region.y1 - 1) as f64);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    // Exact pixel center: no resampling
    if fx < 1e-9 && fy < 1e-9 {
        return *image.get_pixel(x0, y0);
    }

    let x1 = (x0 + 1).min(region.x1 - 1);
    let y1 = (y0 + 1).min(region.y1 - 1);

    let taps = [
        (image.get_pixel(x0, y0), (1.0 - fx) * (1.0 - fy)),
        (image.get_pixel(x1, y0), fx * (1.0 - fy)),
        (image.get_pixel(x0, y1), (1.0 - fx) * fy),
        (image.get_pixel(x1, y1), fx * fy),
    ];

    let mut sum = [0.0f64; 4];
    for (pixel, weight) in taps {
        let a = pixel[3] as f64 / 255.0;
        sum[0] += pixel[0] as f64 * a * weight;
        sum[1] += pixel[1] as f64 * a * weight;
        sum[2] += pixel[2] as f64 * a * weight;
        sum[3] += a * weight;
    }

    if sum[3] <= f64::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }

    let unpremultiply = |c: f64| (c / sum[3]).clamp(0.0, 255.0).round() as u8;
    Rgba([
        unpremultiply(sum[0]),
        unpremultiply(sum[1]),
        unpremultiply(sum[2]),
        (sum[3] * 255.0).clamp(0.0, 255.0).round() as u8,
    ])
}

/// Bilinear sample of the whole image in pixel-index space.
///
/// Returns transparent when `(x, y)` lies more than half a pixel outside
/// the image.
pub(crate) fn sample_or_clear(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || !x.is_finite() || !y.is_finite() {
        return Rgba([0, 0, 0, 0]);
    }
    if x < -0.5 || y < -0.5 || x > w as f64 - 0.5 || y > h as f64 - 0.5 {
        return Rgba([0, 0, 0, 0]);
    }
    let region = PixelRegion {
        x0: 0,
        y0: 0,
        x1: w,
        y1: h,
    };
    sample_bilinear(image, region, x, y)
}

/// Combine a straight-alpha source pixel with a destination pixel.
pub(crate) fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>, blend: BlendMode) -> Rgba<u8> {
    match blend {
        BlendMode::Copy => src,
        BlendMode::SourceOver => source_over(dst, src),
    }
}

fn source_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    if src[3] == 255 || dst[3] == 0 {
        return src;
    }
    if src[3] == 0 {
        return dst;
    }

    let sa = src[3] as f64 / 255.0;
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src[i] as f64 * sa + dst[i] as f64 * da * (1.0 - sa)) / out_a;
        out[i] = c.clamp(0.0, 255.0).round() as u8;
    }
    out[3] = (out_a * 255.0).clamp(0.0, 255.0).round() as u8;
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test image where each pixel has a unique value based on position.
    fn test_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let v = ((y * width + x) % 256) as u8;
            Rgba([v, 255 - v, (x * 7 % 256) as u8, 255])
        })
    }

    fn full_rect(image: &RgbaImage) -> Rect {
        Rect::new(0.0, 0.0, image.width() as f64, image.height() as f64)
    }

    #[test]
    fn test_identity_draw_is_lossless() {
        let src = test_image(17, 9);
        let mut dst = RgbaImage::new(17, 9);
        draw_image(&mut dst, &src, full_rect(&src), Affine::IDENTITY, BlendMode::Copy);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_mirror_draw_is_lossless() {
        let src = test_image(8, 5);
        let mirror = Affine::translate((8.0, 0.0)) * Affine::scale_non_uniform(-1.0, 1.0);

        let mut once = RgbaImage::new(8, 5);
        draw_image(&mut once, &src, full_rect(&src), mirror, BlendMode::Copy);
        assert_eq!(once.get_pixel(0, 0), src.get_pixel(7, 0));
        assert_eq!(once.get_pixel(7, 4), src.get_pixel(0, 4));

        let mut twice = RgbaImage::new(8, 5);
        draw_image(&mut twice, &once, full_rect(&once), mirror, BlendMode::Copy);
        assert_eq!(twice, src);
    }

    #[test]
    fn test_translated_draw_leaves_outside_untouched() {
        let src = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let mut dst = RgbaImage::new(10, 10);
        draw_image(
            &mut dst,
            &src,
            full_rect(&src),
            Affine::translate((3.0, 2.0)),
            BlendMode::SourceOver,
        );
        assert_eq!(dst.get_pixel(3, 2).0, [255, 0, 0, 255]);
        assert_eq!(dst.get_pixel(6, 5).0, [255, 0, 0, 255]);
        assert_eq!(dst.get_pixel(7, 5).0, [0, 0, 0, 0]);
        assert_eq!(dst.get_pixel(2, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_source_rect_limits_sampling() {
        let src = test_image(10, 10);
        let mut dst = RgbaImage::new(4, 4);
        // Crop-style draw: sample (3,3)-(7,7) into the origin
        draw_image(
            &mut dst,
            &src,
            Rect::new(3.0, 3.0, 7.0, 7.0),
            Affine::translate((-3.0, -3.0)),
            BlendMode::Copy,
        );
        assert_eq!(dst.get_pixel(0, 0), src.get_pixel(3, 3));
        assert_eq!(dst.get_pixel(3, 3), src.get_pixel(6, 6));
    }

    #[test]
    fn test_singular_matrix_is_noop() {
        let src = test_image(4, 4);
        let mut dst = RgbaImage::new(4, 4);
        draw_image(
            &mut dst,
            &src,
            full_rect(&src),
            Affine::scale_non_uniform(0.0, 1.0),
            BlendMode::Copy,
        );
        assert!(dst.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_upscale_interpolates_between_pixels() {
        let src = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([200, 200, 200, 255])
            }
        });
        let mut dst = RgbaImage::new(4, 1);
        draw_image(
            &mut dst,
            &src,
            full_rect(&src),
            Affine::scale_non_uniform(2.0, 1.0),
            BlendMode::Copy,
        );
        // Edges clamp, interior pixels blend
        assert_eq!(dst.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(dst.get_pixel(3, 0).0, [200, 200, 200, 255]);
        assert_eq!(dst.get_pixel(1, 0).0, [50, 50, 50, 255]);
        assert_eq!(dst.get_pixel(2, 0).0, [150, 150, 150, 255]);
    }

    #[test]
    fn test_source_over_blending() {
        let dst = Rgba([0, 0, 255, 255]);
        assert_eq!(source_over(dst, Rgba([255, 0, 0, 255])), Rgba([255, 0, 0, 255]));
        assert_eq!(source_over(dst, Rgba([255, 0, 0, 0])), dst);

        let half = source_over(dst, Rgba([255, 0, 0, 128]));
        assert_eq!(half[3], 255);
        assert!(half[0] > 120 && half[0] < 135);
        assert!(half[2] > 120 && half[2] < 135);

        // Onto transparent canvas the source is copied exactly
        assert_eq!(
            source_over(Rgba([0, 0, 0, 0]), Rgba([10, 20, 30, 40])),
            Rgba([10, 20, 30, 40])
        );
    }

    #[test]
    fn test_sample_or_clear() {
        let src = test_image(4, 4);
        assert_eq!(sample_or_clear(&src, 2.0, 1.0), *src.get_pixel(2, 1));
        assert_eq!(sample_or_clear(&src, -0.4, 0.0), *src.get_pixel(0, 0));
        assert_eq!(sample_or_clear(&src, -1.0, 0.0).0, [0, 0, 0, 0]);
        assert_eq!(sample_or_clear(&src, 0.0, 3.6).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_rect_to_rect() {
        let m = rect_to_rect(Rect::new(0.0, 0.0, 10.0, 20.0), Rect::new(5.0, 5.0, 25.0, 15.0));
        let p = m * Point::new(10.0, 20.0);
        assert!((p.x - 25.0).abs() < 1e-12);
        assert!((p.y - 15.0).abs() < 1e-12);
    }
}
