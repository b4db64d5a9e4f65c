//! Blur kernels.
//!
//! Spreading blurs (gaussian, box, disc, motion) pad the input with
//! transparent pixels before filtering and return the padded result, so the
//! soft edge that bleeds past the frame survives until the caller crops.
//! Convolution runs on premultiplied values to avoid dark fringes at
//! transparent borders.

use image::{imageops, Rgba, RgbaImage};
use kurbo::Point;

use super::{from_unit, luminance, pad, pixel_clamped, pixel_or_clear, smoothstep, to_unit, Accumulator};
use crate::render::draw::sample_or_clear;
use crate::render::engine::Overscan;

/// Tap count along the zoom ray.
const ZOOM_SAMPLES: u32 = 16;

/// Radii above this are clamped to keep padding bounded.
const MAX_RADIUS: f64 = 500.0;

/// Premultiplied RGBA plane.
struct Plane {
    width: u32,
    height: u32,
    data: Vec<[f32; 4]>,
}

impl Plane {
    fn premultiplied(image: &RgbaImage) -> Self {
        let data = image
            .pixels()
            .map(|p| {
                let a = to_unit(p[3]);
                [p[0] as f32 * a, p[1] as f32 * a, p[2] as f32 * a, a]
            })
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            data,
        }
    }

    #[inline]
    fn get(&self, x: i64, y: i64) -> [f32; 4] {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return [0.0; 4];
        }
        self.data[(y as usize) * self.width as usize + x as usize]
    }

    /// Weighted sum of taps around every pixel; outside reads as transparent.
    fn convolve(&self, taps: &[(i64, i64, f32)]) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for y in 0..self.height as i64 {
            for x in 0..self.width as i64 {
                let mut sum = [0.0f32; 4];
                for &(dx, dy, w) in taps {
                    let p = self.get(x + dx, y + dy);
                    for c in 0..4 {
                        sum[c] += p[c] * w;
                    }
                }
                data.push(sum);
            }
        }
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    fn unpremultiplied(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let [r, g, b, a] = self.data[(y as usize) * self.width as usize + x as usize];
            if a <= f32::EPSILON {
                return Rgba([0, 0, 0, 0]);
            }
            let channel = |c: f32| (c / a).clamp(0.0, 255.0).round() as u8;
            Rgba([channel(r), channel(g), channel(b), from_unit(a)])
        })
    }
}

fn radius_px(radius: f64) -> u32 {
    if !radius.is_finite() || radius <= 0.0 {
        return 0;
    }
    radius.min(MAX_RADIUS).round() as u32
}

/// Normalize tap weights so they sum to one.
fn normalized(mut taps: Vec<(i64, i64, f32)>) -> Vec<(i64, i64, f32)> {
    let total: f32 = taps.iter().map(|t| t.2).sum();
    if total > 0.0 {
        for tap in &mut taps {
            tap.2 /= total;
        }
    }
    taps
}

fn padded_convolution(input: &RgbaImage, margin: u32, passes: &[Vec<(i64, i64, f32)>]) -> Overscan {
    let mut plane = Plane::premultiplied(&pad(input, margin));
    for taps in passes {
        plane = plane.convolve(taps);
    }
    Overscan {
        image: plane.unpremultiplied(),
        origin: (-(margin as i64), -(margin as i64)),
    }
}

/// Gaussian blur where `radius` is the standard deviation in pixels.
pub(crate) fn gaussian(input: &RgbaImage, radius: f64) -> Overscan {
    if radius_px(radius) == 0 {
        return Overscan::aligned(input.clone());
    }
    let sigma = radius.min(MAX_RADIUS);
    let margin = (3.0 * sigma).ceil() as u32;

    let padded = pad(input, margin);
    let premultiplied = premultiply(&padded);
    let blurred = imageops::blur(&premultiplied, sigma as f32);

    Overscan {
        image: unpremultiply(&blurred),
        origin: (-(margin as i64), -(margin as i64)),
    }
}

/// Mean over a square window of side `2r + 1`.
pub(crate) fn box_blur(input: &RgbaImage, radius: f64) -> Overscan {
    let r = radius_px(radius);
    if r == 0 {
        return Overscan::aligned(input.clone());
    }
    let r = r as i64;
    let horizontal = normalized((-r..=r).map(|d| (d, 0, 1.0)).collect());
    let vertical = normalized((-r..=r).map(|d| (0, d, 1.0)).collect());
    padded_convolution(input, r as u32, &[horizontal, vertical])
}

/// Mean over a circular window.
pub(crate) fn disc(input: &RgbaImage, radius: f64) -> Overscan {
    let r = radius_px(radius);
    if r == 0 {
        return Overscan::aligned(input.clone());
    }
    let ri = r as i64;
    let limit = (r as f64 + 0.5).powi(2);
    let mut taps = Vec::new();
    for dy in -ri..=ri {
        for dx in -ri..=ri {
            if ((dx * dx + dy * dy) as f64) <= limit {
                taps.push((dx, dy, 1.0));
            }
        }
    }
    padded_convolution(input, r, &[normalized(taps)])
}

/// Disc blur whose outer `ring_size` pixels weigh `1 + ring_amount`, so
/// bright spots spread into rings. `softness` in `[0, 1]` feathers the
/// ring's inner edge.
pub(crate) fn bokeh(input: &RgbaImage, radius: f64, ring_amount: f64, ring_size: f64, softness: f64) -> Overscan {
    let r = radius_px(radius);
    if r == 0 {
        return Overscan::aligned(input.clone());
    }
    let ri = r as i64;
    let outer = r as f32 + 0.5;
    let inner = (outer - ring_size.max(0.0) as f32).max(0.0);
    let feather = softness.clamp(0.0, 1.0) as f32 * (outer - inner).max(1.0);
    let ring = ring_amount.max(0.0) as f32;

    let mut taps = Vec::new();
    for dy in -ri..=ri {
        for dx in -ri..=ri {
            let d = ((dx * dx + dy * dy) as f32).sqrt();
            if d > outer {
                continue;
            }
            let in_ring = if feather > 0.0 {
                smoothstep(inner - feather, inner, d)
            } else if d >= inner {
                1.0
            } else {
                0.0
            };
            taps.push((dx, dy, 1.0 + ring * in_ring));
        }
    }
    padded_convolution(input, r, &[normalized(taps)])
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let length2 = ab.hypot2();
    let t = if length2 > 0.0 {
        ((p - a).dot(ab) / length2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (a + ab * t)).hypot()
}

/// Keep a band around the segment `p0`-`p1` sharp, with its saturation
/// scaled by `saturation`, and fade into a gaussian of `radius` beyond
/// half the segment's length.
pub(crate) fn depth_of_field(input: &RgbaImage, p0: Point, p1: Point, radius: f64, saturation: f64) -> RgbaImage {
    let blurred = gaussian(input, radius);
    let reach = ((p1 - p0).hypot() / 2.0).max(1.0);
    let boost = saturation.max(0.0) as f32 - 1.0;

    RgbaImage::from_fn(input.width(), input.height(), |x, y| {
        let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
        let t = smoothstep(0.25, 1.0, (distance_to_segment(p, p0, p1) / reach) as f32);

        let src = input.get_pixel(x, y);
        let (r, g, b) = (to_unit(src[0]), to_unit(src[1]), to_unit(src[2]));
        let l = luminance(r, g, b);
        let factor = 1.0 + boost * (1.0 - t);
        let sharp = Rgba([
            from_unit(l + (r - l) * factor),
            from_unit(l + (g - l) * factor),
            from_unit(l + (b - l) * factor),
            src[3],
        ]);
        let soft = pixel_or_clear(
            &blurred.image,
            x as i64 - blurred.origin.0,
            y as i64 - blurred.origin.1,
        );

        let mut acc = Accumulator::default();
        acc.add(sharp, 1.0 - t);
        acc.add(soft, t);
        acc.average()
    })
}

/// Mean along a line of length `2r + 1` at `angle` radians.
pub(crate) fn motion(input: &RgbaImage, radius: f64, angle: f64) -> Overscan {
    let r = radius_px(radius);
    if r == 0 {
        return Overscan::aligned(input.clone());
    }
    let (sin, cos) = angle.sin_cos();
    let ri = r as i64;
    let mut taps: Vec<(i64, i64, f32)> = Vec::new();
    for t in -ri..=ri {
        let dx = (t as f64 * cos).round() as i64;
        let dy = (t as f64 * sin).round() as i64;
        match taps.iter_mut().find(|tap| tap.0 == dx && tap.1 == dy) {
            Some(tap) => tap.2 += 1.0,
            None => taps.push((dx, dy, 1.0)),
        }
    }
    padded_convolution(input, r, &[normalized(taps)])
}

/// Radial blur toward `center`; `amount` is the travel in pixels at the
/// image corners.
pub(crate) fn zoom(input: &RgbaImage, center: Point, amount: f64) -> RgbaImage {
    let (w, h) = input.dimensions();
    let half_diagonal = ((w as f64).hypot(h as f64) / 2.0).max(1.0);
    if amount.abs() < 1e-6 {
        return input.clone();
    }
    let strength = amount / half_diagonal;

    RgbaImage::from_fn(w, h, |x, y| {
        let px = x as f64 + 0.5;
        let py = y as f64 + 0.5;
        let mut acc = Accumulator::default();
        for i in 0..ZOOM_SAMPLES {
            let t = strength * i as f64 / (ZOOM_SAMPLES - 1) as f64;
            let qx = px - (px - center.x) * t;
            let qy = py - (py - center.y) * t;
            acc.add(sample_or_clear(input, qx - 0.5, qy - 0.5), 1.0);
        }
        acc.average()
    })
}

/// 3x3 per-channel median with clamped edges.
pub(crate) fn median(input: &RgbaImage) -> RgbaImage {
    let (w, h) = input.dimensions();
    RgbaImage::from_fn(w, h, |x, y| {
        let mut window = [[0u8; 9]; 4];
        let mut i = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let p = pixel_clamped(input, x as i64 + dx, y as i64 + dy);
                for c in 0..4 {
                    window[c][i] = p[c];
                }
                i += 1;
            }
        }
        let mut out = [0u8; 4];
        for c in 0..4 {
            window[c].sort_unstable();
            out[c] = window[c][4];
        }
        Rgba(out)
    })
}

/// Smooth with a gaussian scaled by `noise_level`, then restore edges with
/// an unsharp mask of strength `sharpness`.
pub(crate) fn noise_reduction(input: &RgbaImage, noise_level: f64, sharpness: f64) -> RgbaImage {
    let sigma = (noise_level * 50.0).clamp(0.0, 10.0) as f32;
    let smoothed = if sigma > 0.05 {
        imageops::blur(input, sigma)
    } else {
        input.clone()
    };
    if sharpness <= 0.0 {
        return smoothed;
    }

    let detail = imageops::blur(&smoothed, 1.0);
    let amount = sharpness as f32;
    let mut out = smoothed.clone();
    for (dst, soft) in out.pixels_mut().zip(detail.pixels()) {
        for c in 0..3 {
            let base = to_unit(dst[c]);
            dst[c] = from_unit(base + amount * (base - to_unit(soft[c])));
        }
    }
    out
}

fn premultiply(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        let a = to_unit(p[3]);
        for c in 0..3 {
            p[c] = (p[c] as f32 * a).round() as u8;
        }
    }
    out
}

fn unpremultiply(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        if p[3] == 0 {
            p.0 = [0, 0, 0, 0];
            continue;
        }
        let a = to_unit(p[3]);
        for c in 0..3 {
            p[c] = (p[c] as f32 / a).clamp(0.0, 255.0).round() as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn test_zero_radius_is_identity() {
        let input = checker(6, 6);
        for out in [
            gaussian(&input, 0.0),
            box_blur(&input, 0.0),
            disc(&input, 0.0),
            motion(&input, 0.0, 1.0),
        ] {
            assert_eq!(out.origin, (0, 0));
            assert_eq!(out.image, input);
        }
    }

    #[test]
    fn test_gaussian_pads_by_three_sigma() {
        let out = gaussian(&solid(10, 10, 200), 2.0);
        assert_eq!(out.origin, (-6, -6));
        assert_eq!(out.image.dimensions(), (22, 22));
        // Soft edge bleeds outward
        assert!(out.image.get_pixel(5, 11)[3] > 0);
        // Interior color is preserved (no dark fringe from premultiplication)
        let center = out.image.get_pixel(11, 11);
        assert!((center[0] as i32 - 200).abs() <= 1);
    }

    #[test]
    fn test_box_blur_averages_checker() {
        let out = box_blur(&checker(9, 9), 1.0);
        assert_eq!(out.origin, (-1, -1));
        let center = out.image.get_pixel(5, 5);
        // 3x3 window on a checkerboard: 4 or 5 white of 9
        assert!(center[0] > 100 && center[0] < 155);
        assert_eq!(center[3], 255);
    }

    #[test]
    fn test_disc_blur_keeps_flat_regions() {
        let out = disc(&solid(12, 12, 90), 3.0);
        assert_eq!(out.origin, (-3, -3));
        assert_eq!(out.image.get_pixel(9, 9).0, [90, 90, 90, 255]);
    }

    #[test]
    fn test_horizontal_motion_blur_leaves_rows_independent() {
        let input = RgbaImage::from_fn(10, 4, |_, y| {
            if y % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let out = motion(&input, 3.0, 0.0);
        assert_eq!(out.image.get_pixel(8, 3).0, [255, 0, 0, 255]);
        assert_eq!(out.image.get_pixel(8, 4).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_zoom_blur_keeps_center_pixel() {
        let input = checker(9, 9);
        let out = zoom(&input, Point::new(4.5, 4.5), 20.0);
        assert_eq!(out.dimensions(), (9, 9));
        assert_eq!(out.get_pixel(4, 4), input.get_pixel(4, 4));
        assert_ne!(out.get_pixel(0, 0), input.get_pixel(0, 0));
    }

    #[test]
    fn test_median_removes_salt_noise() {
        let mut input = solid(5, 5, 50);
        input.put_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let out = median(&input);
        assert_eq!(out.get_pixel(2, 2).0, [50, 50, 50, 255]);
    }

    #[test]
    fn test_noise_reduction_smooths_checker() {
        let input = checker(16, 16);
        let out = noise_reduction(&input, 0.02, 0.0);
        let p = out.get_pixel(8, 8);
        assert!(p[0] > 40 && p[0] < 215);
    }

    #[test]
    fn test_bokeh_brightens_the_rim() {
        let mut input = solid(21, 21, 0);
        input.put_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let out = bokeh(&input, 2.0, 3.0, 1.0, 0.0);
        assert_eq!(out.origin, (-2, -2));
        // The dot lands at (12, 12) in the padded result
        let rim = out.image.get_pixel(14, 12)[0];
        let inside = out.image.get_pixel(13, 12)[0];
        assert!(rim > inside, "rim {rim} inside {inside}");

        let flat = bokeh(&solid(12, 12, 90), 3.0, 0.5, 1.0, 0.5);
        assert_eq!(flat.image.get_pixel(9, 9).0, [90, 90, 90, 255]);
    }

    #[test]
    fn test_depth_of_field_keeps_the_focal_band_sharp() {
        let input = checker(30, 40);
        let out = depth_of_field(&input, Point::new(5.0, 5.0), Point::new(25.0, 5.0), 2.0, 1.0);
        assert_eq!(out.dimensions(), (30, 40));
        assert_eq!(out.get_pixel(15, 5), input.get_pixel(15, 5));
        assert_eq!(out.get_pixel(16, 5), input.get_pixel(16, 5));
        let far = out.get_pixel(15, 39)[0];
        assert!(far > 60 && far < 195, "far pixel {far}");
    }

    #[test]
    fn test_depth_of_field_saturates_in_focus() {
        let input = RgbaImage::from_pixel(20, 20, Rgba([180, 90, 60, 255]));
        let out = depth_of_field(&input, Point::new(0.0, 10.0), Point::new(20.0, 10.0), 1.0, 1.5);
        let p = out.get_pixel(10, 10);
        assert!(p[0] > 180 && p[2] < 60);
    }
}
