//! Stylizing kernels.

use std::collections::HashMap;

use image::{imageops, Rgba, RgbaImage};
use kurbo::{Point, Vec2};

use super::blur::noise_reduction;
use super::color::{mono, posterize};
use super::{from_unit, pad, pixel_clamped, smoothstep, to_unit, Accumulator};
use crate::render::engine::Overscan;

/// Replace square cells with their average color.
///
/// Cells are `scale` pixels wide and one of them is centered on `center`.
pub(crate) fn pixellate(input: &RgbaImage, scale: f64, center: Point) -> RgbaImage {
    let (w, h) = input.dimensions();
    let size = scale.max(1.0);
    let offset_x = center.x - size / 2.0;
    let offset_y = center.y - size / 2.0;

    let cell = |v: u32, offset: f64| ((v as f64 + 0.5 - offset) / size).floor() as i64;
    let (min_cx, max_cx) = (cell(0, offset_x), cell(w - 1, offset_x));
    let (min_cy, max_cy) = (cell(0, offset_y), cell(h - 1, offset_y));
    let cols = (max_cx - min_cx + 1) as usize;
    let rows = (max_cy - min_cy + 1) as usize;

    let mut cells = vec![Accumulator::default(); cols * rows];
    let index = |x: u32, y: u32| {
        let cx = (cell(x, offset_x) - min_cx) as usize;
        let cy = (cell(y, offset_y) - min_cy) as usize;
        cy * cols + cx
    };

    for (x, y, pixel) in input.enumerate_pixels() {
        cells[index(x, y)].add(*pixel, 1.0);
    }
    let averages: Vec<Rgba<u8>> = cells.iter().map(Accumulator::average).collect();

    RgbaImage::from_fn(w, h, |x, y| averages[index(x, y)])
}

/// Sobel edge magnitude per channel, scaled by `intensity`.
pub(crate) fn edges(input: &RgbaImage, intensity: f64) -> RgbaImage {
    let (w, h) = input.dimensions();
    let k = intensity as f32;
    RgbaImage::from_fn(w, h, |x, y| {
        let at = |dx: i64, dy: i64| pixel_clamped(input, x as i64 + dx, y as i64 + dy);
        let mut out = [0u8; 4];
        for c in 0..3 {
            let v = |dx, dy| to_unit(at(dx, dy)[c]);
            let gx = (v(1, -1) + 2.0 * v(1, 0) + v(1, 1)) - (v(-1, -1) + 2.0 * v(-1, 0) + v(-1, 1));
            let gy = (v(-1, 1) + 2.0 * v(0, 1) + v(1, 1)) - (v(-1, -1) + 2.0 * v(0, -1) + v(1, -1));
            out[c] = from_unit(gx.hypot(gy) * k);
        }
        out[3] = input.get_pixel(x, y)[3];
        Rgba(out)
    })
}

/// Screen a blurred copy over the image.
pub(crate) fn bloom(input: &RgbaImage, radius: f64, intensity: f64) -> Overscan {
    glow(input, radius, intensity, |base, soft, k| {
        1.0 - (1.0 - base) * (1.0 - soft * k)
    })
}

/// Multiply a blurred copy into the image.
pub(crate) fn gloom(input: &RgbaImage, radius: f64, intensity: f64) -> Overscan {
    glow(input, radius, intensity, |base, soft, k| {
        base * (1.0 - k * (1.0 - soft))
    })
}

/// Combine the padded input with its gaussian blur through `combine`.
fn glow<F>(input: &RgbaImage, radius: f64, intensity: f64, combine: F) -> Overscan
where
    F: Fn(f32, f32, f32) -> f32,
{
    let sigma = radius.clamp(0.0, 500.0) as f32;
    if sigma <= 0.0 {
        return Overscan::aligned(input.clone());
    }
    let margin = (3.0 * sigma).ceil() as u32;
    let padded = pad(input, margin);
    let soft = imageops::blur(&padded, sigma);
    let k = (intensity as f32).clamp(0.0, 1.0);

    let mut out = padded;
    for (dst, halo) in out.pixels_mut().zip(soft.pixels()) {
        let halo_alpha = to_unit(halo[3]);
        if dst[3] == 0 {
            // Outside the frame only the halo contributes
            *dst = Rgba([halo[0], halo[1], halo[2], from_unit(halo_alpha * k)]);
            continue;
        }
        for c in 0..3 {
            dst[c] = from_unit(combine(to_unit(dst[c]), to_unit(halo[c]) * halo_alpha, k));
        }
    }

    Overscan {
        image: out,
        origin: (-(margin as i64), -(margin as i64)),
    }
}

/// Flat posterized color with black ink where the luminance has edges.
pub(crate) fn comic(input: &RgbaImage) -> RgbaImage {
    let ink = edges(&mono(input), 1.0);
    let mut out = posterize(input, 4.0);
    for (dst, edge) in out.pixels_mut().zip(ink.pixels()) {
        let keep = 1.0 - smoothstep(0.25, 0.6, to_unit(edge[0]));
        for c in 0..3 {
            dst[c] = from_unit(to_unit(dst[c]) * keep);
        }
    }
    out
}

/// Jitter in `[0.15, 0.85)` for grid cell `(i, j)`, stable across calls.
fn jitter(i: i64, j: i64, salt: u64) -> f64 {
    let mut h = (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (j as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ salt;
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    0.15 + 0.7 * (h >> 11) as f64 / (1u64 << 53) as f64
}

/// One jittered seed per `spacing` square, for Voronoi-style cells.
struct Seeds {
    spacing: f64,
}

impl Seeds {
    fn new(spacing: f64) -> Self {
        Self {
            spacing: spacing.max(1.0),
        }
    }

    fn seed(&self, i: i64, j: i64) -> Point {
        Point::new(
            (i as f64 + jitter(i, j, 1)) * self.spacing,
            (j as f64 + jitter(i, j, 2)) * self.spacing,
        )
    }

    /// Nearest seed to `p` among the surrounding cells, and its distance.
    fn nearest(&self, p: Point) -> (Point, f64) {
        let ci = (p.x / self.spacing).floor() as i64;
        let cj = (p.y / self.spacing).floor() as i64;
        let mut best = (p, f64::INFINITY);
        for dj in -1..=1 {
            for di in -1..=1 {
                let seed = self.seed(ci + di, cj + dj);
                let distance = (p - seed).hypot();
                if distance < best.1 {
                    best = (seed, distance);
                }
            }
        }
        best
    }
}

fn color_under(input: &RgbaImage, p: Point) -> Rgba<u8> {
    pixel_clamped(input, p.x.floor() as i64, p.y.floor() as i64)
}

/// Fill each Voronoi cell with the color under its seed.
pub(crate) fn crystallize(input: &RgbaImage, radius: f64) -> RgbaImage {
    let seeds = Seeds::new(radius);
    let (w, h) = input.dimensions();
    RgbaImage::from_fn(w, h, |x, y| {
        let (seed, _) = seeds.nearest(Point::new(x as f64 + 0.5, y as f64 + 0.5));
        color_under(input, seed)
    })
}

/// Dots of `radius` in the color under their centers, on white.
pub(crate) fn pointillize(input: &RgbaImage, radius: f64) -> RgbaImage {
    let radius = radius.max(0.5);
    let seeds = Seeds::new(radius * 2.0);
    let (w, h) = input.dimensions();
    RgbaImage::from_fn(w, h, |x, y| {
        let (seed, distance) = seeds.nearest(Point::new(x as f64 + 0.5, y as f64 + 0.5));
        if distance <= radius {
            color_under(input, seed)
        } else {
            Rgba([255, 255, 255, input.get_pixel(x, y)[3]])
        }
    })
}

/// Axial coordinates of the pointy-top hexagon of circumradius `size`
/// containing offset `d`.
fn hex_cell(d: Vec2, size: f64) -> (i64, i64) {
    let q = (3f64.sqrt() / 3.0 * d.x - d.y / 3.0) / size;
    let r = (2.0 / 3.0 * d.y) / size;
    let s = -q - r;
    let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
    let (dq, dr, ds) = ((rq - q).abs(), (rr - r).abs(), (rs - s).abs());
    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }
    (rq as i64, rr as i64)
}

/// Replace hexagonal cells `scale` pixels across with their average color.
/// One cell is centered on `center`.
pub(crate) fn hexagonal_pixellate(input: &RgbaImage, scale: f64, center: Point) -> RgbaImage {
    let size = scale.max(1.0) / 3f64.sqrt();
    let (w, h) = input.dimensions();
    let cell_of = |x: u32, y: u32| hex_cell(Point::new(x as f64 + 0.5, y as f64 + 0.5) - center, size);

    let mut cells: HashMap<(i64, i64), Accumulator> = HashMap::new();
    for (x, y, pixel) in input.enumerate_pixels() {
        cells.entry(cell_of(x, y)).or_default().add(*pixel, 1.0);
    }
    let averages: HashMap<(i64, i64), Rgba<u8>> =
        cells.into_iter().map(|(cell, acc)| (cell, acc.average())).collect();

    RgbaImage::from_fn(w, h, |x, y| {
        averages
            .get(&cell_of(x, y))
            .copied()
            .unwrap_or(Rgba([0, 0, 0, 0]))
    })
}

/// White woodcut strokes on black, traced from the luminance after a
/// gaussian of `radius`.
pub(crate) fn edge_work(input: &RgbaImage, radius: f64) -> RgbaImage {
    let gray = mono(input);
    let sigma = radius.clamp(0.0, 50.0) as f32;
    let soft = if sigma > 0.0 { imageops::blur(&gray, sigma) } else { gray };
    let mut out = edges(&soft, 1.0);
    for (dst, src) in out.pixels_mut().zip(input.pixels()) {
        let v = from_unit(smoothstep(0.05, 0.2, to_unit(dst[0])));
        *dst = Rgba([v, v, v, src[3]]);
    }
    out
}

/// Black lines on transparency. The image is denoised first; lines appear
/// where the edge strength exceeds `threshold`, with `contrast` setting how
/// quickly they turn opaque.
pub(crate) fn line_overlay(
    input: &RgbaImage,
    noise_level: f64,
    sharpness: f64,
    edge_intensity: f64,
    threshold: f64,
    contrast: f64,
) -> RgbaImage {
    let smoothed = noise_reduction(input, noise_level, sharpness);
    let ink = edges(&mono(&smoothed), edge_intensity);
    let (threshold, contrast) = (threshold as f32, contrast as f32);
    let mut out = RgbaImage::new(input.width(), input.height());
    for ((dst, edge), src) in out.pixels_mut().zip(ink.pixels()).zip(input.pixels()) {
        let coverage = ((to_unit(edge[0]) - threshold) * contrast).clamp(0.0, 1.0);
        *dst = Rgba([0, 0, 0, from_unit(coverage * to_unit(src[3]))]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 10 % 256) as u8, (y * 10 % 256) as u8, 50, 255])
        })
    }

    #[test]
    fn test_pixellate_cells_are_uniform() {
        let out = pixellate(&gradient(16, 16), 4.0, Point::new(2.0, 2.0));
        // Cell covering [0, 4) x [0, 4)
        let first = *out.get_pixel(0, 0);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(*out.get_pixel(x, y), first);
            }
        }
        assert_ne!(*out.get_pixel(4, 0), first);
    }

    #[test]
    fn test_pixellate_scale_one_is_identity() {
        let input = gradient(7, 5);
        assert_eq!(pixellate(&input, 1.0, Point::new(0.5, 0.5)), input);
    }

    #[test]
    fn test_edges_flat_image_is_black() {
        let input = RgbaImage::from_pixel(6, 6, Rgba([120, 40, 200, 255]));
        let out = edges(&input, 1.0);
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_edges_detects_step() {
        let input = RgbaImage::from_fn(6, 6, |x, _| {
            if x < 3 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let out = edges(&input, 1.0);
        assert_eq!(out.get_pixel(3, 3)[0], 255);
        assert_eq!(out.get_pixel(0, 3)[0], 0);
    }

    #[test]
    fn test_bloom_brightens_and_overscans() {
        let input = gradient(10, 10);
        let out = bloom(&input, 2.0, 0.5);
        assert_eq!(out.origin, (-6, -6));
        let cropped = out.crop_to(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        for (after, before) in cropped.pixels().zip(input.pixels()) {
            assert!(after[0] >= before[0]);
        }
    }

    #[test]
    fn test_gloom_darkens() {
        let input = gradient(10, 10);
        let out = gloom(&input, 2.0, 0.5);
        let cropped = out.crop_to(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        for (after, before) in cropped.pixels().zip(input.pixels()) {
            assert!(after[1] <= before[1]);
        }
    }

    fn step(width: u32, height: u32, left: Rgba<u8>, right: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| if x < width / 2 { left } else { right })
    }

    #[test]
    fn test_comic_inks_edges_and_keeps_flat_color() {
        let input = step(12, 6, Rgba([255, 0, 0, 255]), Rgba([255, 255, 255, 255]));
        let out = comic(&input);
        assert_eq!(out.get_pixel(0, 3).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(5, 3).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(11, 3).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_crystallize_keeps_flat_images_and_merges_cells() {
        let flat = RgbaImage::from_pixel(20, 20, Rgba([30, 60, 90, 255]));
        assert_eq!(crystallize(&flat, 5.0), flat);

        let input = gradient(40, 40);
        let out = crystallize(&input, 10.0);
        let colors: std::collections::HashSet<[u8; 4]> = out.pixels().map(|p| p.0).collect();
        assert!(colors.len() < 100, "{} cells", colors.len());
        assert_eq!(crystallize(&input, 10.0), out);
    }

    #[test]
    fn test_pointillize_draws_dots_on_white() {
        let input = RgbaImage::from_pixel(24, 24, Rgba([200, 0, 0, 255]));
        let out = pointillize(&input, 3.0);
        let red = out.pixels().filter(|p| p.0 == [200, 0, 0, 255]).count();
        let white = out.pixels().filter(|p| p.0 == [255, 255, 255, 255]).count();
        assert_eq!(red + white, 24 * 24);
        assert!(red > 0 && white > 0);
    }

    #[test]
    fn test_hexagonal_pixellate_cells() {
        let flat = RgbaImage::from_pixel(9, 7, Rgba([10, 20, 30, 255]));
        assert_eq!(hexagonal_pixellate(&flat, 4.0, Point::new(4.5, 3.5)), flat);

        let out = hexagonal_pixellate(&gradient(8, 8), 100.0, Point::new(4.0, 4.0));
        let first = *out.get_pixel(0, 0);
        assert!(out.pixels().all(|p| *p == first));
    }

    #[test]
    fn test_edge_work_is_white_on_black() {
        let flat = RgbaImage::from_pixel(8, 8, Rgba([90, 90, 90, 255]));
        assert!(edge_work(&flat, 0.0).pixels().all(|p| p.0 == [0, 0, 0, 255]));

        let input = step(8, 8, Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 255]));
        let out = edge_work(&input, 0.0);
        assert_eq!(out.get_pixel(4, 4).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(0, 4).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_line_overlay_leaves_flat_areas_transparent() {
        let input = step(12, 6, Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 255]));
        let out = line_overlay(&input, 0.0, 0.0, 1.0, 0.1, 50.0);
        assert_eq!(out.get_pixel(6, 3).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(0, 3)[3], 0);
        assert_eq!(out.get_pixel(11, 3)[3], 0);

        let strict = line_overlay(&input, 0.0, 0.0, 1.0, 2.0, 50.0);
        assert!(strict.pixels().all(|p| p[3] == 0));
    }
}
