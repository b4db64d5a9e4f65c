//! Radial distortion kernels.
//!
//! Every distortion is an inverse warp around a center point: each output
//! pixel center is displaced to the source position it should show, then
//! sampled bilinearly. Positions outside the source read as transparent.
//!
//! Coordinates are in image space (origin top-left, y down). With `d` the
//! offset from the center and `r = |d|`:
//!
//! | Effect        | Inside radius                    | Outside radius          |
//! |---------------|----------------------------------|-------------------------|
//! | Bump          | `r * (1 - scale * (1 - r/R)^2)`  | unchanged               |
//! | Pinch         | `R * (r/R)^(1 - scale)`          | unchanged               |
//! | Twirl         | rotate by `angle * (1 - r/R)^2`  | unchanged               |
//! | Hole          | transparent                      | `r - R^2 / r`           |
//! | Circle splash | unchanged                        | clamp to the circle     |
//! | Light tunnel  | unchanged                        | circle point, spiraled  |
//! | Vortex        | rotate by `angle * (1 - r/R)`    | unchanged               |
//! | Torus lens    | refracted within the ring        | unchanged               |
//!
//! Circular wrap and linear bump do not fit the table: the first maps polar
//! coordinates back to the image rows and columns, the second measures
//! distance across a line instead of from a point.

use std::f64::consts::{PI, TAU};

use image::RgbaImage;
use kurbo::{Point, Vec2};

use crate::render::draw::sample_or_clear;

/// Warp `input` through `source_of`, which maps an offset from `center` to
/// the source offset to sample, or `None` for a transparent pixel.
fn warp<F>(input: &RgbaImage, center: Point, source_of: F) -> RgbaImage
where
    F: Fn(Vec2) -> Option<Vec2>,
{
    let (w, h) = input.dimensions();
    RgbaImage::from_fn(w, h, |x, y| {
        let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
        match source_of(p - center) {
            Some(d) => {
                let q = center + d;
                sample_or_clear(input, q.x - 0.5, q.y - 0.5)
            }
            None => image::Rgba([0, 0, 0, 0]),
        }
    })
}

fn usable_radius(radius: f64) -> Option<f64> {
    (radius.is_finite() && radius > 0.0).then_some(radius)
}

/// Magnify (`scale > 0`) or shrink (`scale < 0`) a disc.
pub(crate) fn bump(input: &RgbaImage, center: Point, radius: f64, scale: f64) -> RgbaImage {
    let Some(radius) = usable_radius(radius) else {
        return input.clone();
    };
    let scale = scale.clamp(-1.0, 1.0);
    warp(input, center, |d| {
        let r = d.hypot();
        if r >= radius {
            return Some(d);
        }
        let falloff = 1.0 - r / radius;
        Some(d * (1.0 - scale * falloff * falloff))
    })
}

/// Pull pixels toward (`scale > 0`) or push them away from the center.
pub(crate) fn pinch(input: &RgbaImage, center: Point, radius: f64, scale: f64) -> RgbaImage {
    let Some(radius) = usable_radius(radius) else {
        return input.clone();
    };
    let exponent = 1.0 - scale.clamp(-1.0, 0.95);
    warp(input, center, |d| {
        let r = d.hypot();
        if r >= radius || r < 1e-9 {
            return Some(d);
        }
        let source_r = radius * (r / radius).powf(exponent);
        Some(d * (source_r / r))
    })
}

/// Rotate each pixel inside `radius` by `turn(1 - r/R)` radians.
fn swirl<F>(input: &RgbaImage, center: Point, radius: f64, turn: F) -> RgbaImage
where
    F: Fn(f64) -> f64,
{
    let Some(radius) = usable_radius(radius) else {
        return input.clone();
    };
    warp(input, center, |d| {
        let r = d.hypot();
        if r >= radius {
            return Some(d);
        }
        let (sin, cos) = turn(1.0 - r / radius).sin_cos();
        Some(Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos))
    })
}

/// Rotate pixels around the center, strongest at the center.
pub(crate) fn twirl(input: &RgbaImage, center: Point, radius: f64, angle: f64) -> RgbaImage {
    swirl(input, center, radius, |falloff| angle * falloff * falloff)
}

pub(crate) fn vortex(input: &RgbaImage, center: Point, radius: f64, angle: f64) -> RgbaImage {
    swirl(input, center, radius, |falloff| angle * falloff)
}

/// Punch a transparent hole and push the image outward around it.
pub(crate) fn hole(input: &RgbaImage, center: Point, radius: f64) -> RgbaImage {
    let Some(radius) = usable_radius(radius) else {
        return input.clone();
    };
    warp(input, center, |d| {
        let r = d.hypot();
        if r < radius {
            return None;
        }
        Some(d * ((r - radius * radius / r) / r))
    })
}

/// Keep the disc and smear its boundary color outward.
pub(crate) fn circle_splash(input: &RgbaImage, center: Point, radius: f64) -> RgbaImage {
    let Some(radius) = usable_radius(radius) else {
        return input.clone();
    };
    warp(input, center, |d| {
        let r = d.hypot();
        if r <= radius {
            return Some(d);
        }
        Some(d * (radius / r))
    })
}

/// Keep the disc and wrap its boundary into a spiral tunnel outside.
///
/// `rotation` is the extra turn, in radians, per radius of distance.
pub(crate) fn light_tunnel(input: &RgbaImage, center: Point, radius: f64, rotation: f64) -> RgbaImage {
    let Some(radius) = usable_radius(radius) else {
        return input.clone();
    };
    warp(input, center, |d| {
        let r = d.hypot();
        if r <= radius {
            return Some(d);
        }
        let theta = d.y.atan2(d.x) + rotation * (r / radius - 1.0);
        let (sin, cos) = theta.sin_cos();
        Some(Vec2::new(cos * radius, sin * radius))
    })
}

/// Wrap the image around a transparent circle of `radius`. Row 0 lies on
/// the circle and later rows move outward; the image's center column sits
/// at `angle` radians.
pub(crate) fn circular_wrap(input: &RgbaImage, center: Point, radius: f64, angle: f64) -> RgbaImage {
    let Some(radius) = usable_radius(radius) else {
        return input.clone();
    };
    warp(input, center, |d| {
        let r = d.hypot();
        if r < radius {
            return None;
        }
        let theta = (d.y.atan2(d.x) - angle + PI).rem_euclid(TAU) - PI;
        Some(Vec2::new(theta * radius, r - radius - center.y))
    })
}

/// Bump across the line through `center` at `angle` radians.
pub(crate) fn linear_bump(
    input: &RgbaImage,
    center: Point,
    radius: f64,
    angle: f64,
    scale: f64,
) -> RgbaImage {
    let Some(radius) = usable_radius(radius) else {
        return input.clone();
    };
    let scale = scale.clamp(-1.0, 1.0);
    let (sin, cos) = angle.sin_cos();
    let normal = Vec2::new(-sin, cos);
    warp(input, center, |d| {
        let across = d.dot(normal);
        if across.abs() >= radius {
            return Some(d);
        }
        let falloff = 1.0 - across.abs() / radius;
        Some(d - normal * (across * scale * falloff * falloff))
    })
}

/// Magnify through a ring lens `width` wide centered `radius` from the
/// center, bending by `refraction - 1`.
pub(crate) fn torus_lens(
    input: &RgbaImage,
    center: Point,
    radius: f64,
    width: f64,
    refraction: f64,
) -> RgbaImage {
    let (Some(radius), Some(half)) = (usable_radius(radius), usable_radius(width / 2.0)) else {
        return input.clone();
    };
    let bend = (refraction - 1.0).max(0.0);
    warp(input, center, |d| {
        let r = d.hypot();
        let t = (r - radius) / half;
        if t.abs() >= 1.0 || r < 1e-9 {
            return Some(d);
        }
        let source_r = r - bend * half * t * (1.0 - t * t).sqrt();
        Some(d * (source_r / r))
    })
}
