//! Per-pixel color kernels.
//!
//! All kernels operate on normalized straight RGB and keep alpha.

use image::RgbaImage;
use kurbo::Point;

use super::{luminance, map_rgb, smoothstep};
use crate::color::Color;

/// Temperature span mapped to a full warm/cool shift.
const KELVIN_SPAN: f32 = 6500.0;

/// Tint span mapped to a full green/magenta shift.
const TINT_SPAN: f32 = 100.0;

#[inline]
fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Contrast around mid-gray.
#[inline]
fn contrast(v: f32, factor: f32) -> f32 {
    (v - 0.5) * factor + 0.5
}

/// Classic sepia matrix blended with the original by `intensity`.
pub(crate) fn sepia(input: &RgbaImage, intensity: f64) -> RgbaImage {
    let t = intensity.clamp(0.0, 1.0) as f32;
    map_rgb(input, |_, _, r, g, b| {
        let sr = 0.393 * r + 0.769 * g + 0.189 * b;
        let sg = 0.349 * r + 0.686 * g + 0.168 * b;
        let sb = 0.272 * r + 0.534 * g + 0.131 * b;
        (mix(r, sr, t), mix(g, sg, t), mix(b, sb, t))
    })
}

pub(crate) fn invert(input: &RgbaImage) -> RgbaImage {
    map_rgb(input, |_, _, r, g, b| (1.0 - r, 1.0 - g, 1.0 - b))
}

/// Neutral black and white.
pub(crate) fn mono(input: &RgbaImage) -> RgbaImage {
    map_rgb(input, |_, _, r, g, b| {
        let l = luminance(r, g, b);
        (l, l, l)
    })
}

/// Black and white with boosted contrast.
pub(crate) fn noir(input: &RgbaImage) -> RgbaImage {
    map_rgb(input, |_, _, r, g, b| {
        let l = contrast(luminance(r, g, b), 1.4);
        (l, l, l)
    })
}

/// Black and white with softened contrast.
pub(crate) fn tonal(input: &RgbaImage) -> RgbaImage {
    map_rgb(input, |_, _, r, g, b| {
        let l = contrast(luminance(r, g, b), 0.85);
        (l, l, l)
    })
}

/// Tint the luminance with `color`, blended by `intensity`.
pub(crate) fn monochrome(input: &RgbaImage, color: Color, intensity: f64) -> RgbaImage {
    let t = intensity.clamp(0.0, 1.0) as f32;
    let (cr, cg, cb) = (color.red_value() as f32, color.green_value() as f32, color.blue_value() as f32);
    map_rgb(input, |_, _, r, g, b| {
        let l = luminance(r, g, b);
        (mix(r, l * cr, t), mix(g, l * cg, t), mix(b, l * cb, t))
    })
}

/// Darken toward the corners.
///
/// `radius` scales the falloff relative to the half diagonal; `intensity`
/// is the darkening at the falloff's end.
pub(crate) fn vignette(input: &RgbaImage, intensity: f64, radius: f64) -> RgbaImage {
    let (w, h) = input.dimensions();
    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let half_diagonal = cx.hypot(cy).max(1.0);
    let reach = (radius as f32).max(1e-3);
    let strength = intensity as f32;

    map_rgb(input, |x, y, r, g, b| {
        let d = (x as f32 + 0.5 - cx).hypot(y as f32 + 0.5 - cy) / half_diagonal;
        let falloff = smoothstep(0.0, 1.0, d / reach);
        let factor = (1.0 - strength * falloff).clamp(0.0, 2.0);
        (r * factor, g * factor, b * factor)
    })
}

/// Inverted luminance with a cool cast.
pub(crate) fn xray(input: &RgbaImage) -> RgbaImage {
    map_rgb(input, |_, _, r, g, b| {
        let v = 1.0 - luminance(r, g, b);
        (v * 0.88, v * 0.94, v)
    })
}

/// False-color heat map of luminance.
pub(crate) fn thermal(input: &RgbaImage) -> RgbaImage {
    const STOPS: [(f32, f32, f32); 6] = [
        (0.0, 0.0, 0.0),
        (0.0, 0.0, 0.8),
        (0.7, 0.0, 0.7),
        (1.0, 0.0, 0.0),
        (1.0, 0.9, 0.0),
        (1.0, 1.0, 1.0),
    ];
    map_rgb(input, |_, _, r, g, b| {
        let l = luminance(r, g, b).clamp(0.0, 1.0) * (STOPS.len() - 1) as f32;
        let i = (l.floor() as usize).min(STOPS.len() - 2);
        let t = l - i as f32;
        let (a, z) = (STOPS[i], STOPS[i + 1]);
        (mix(a.0, z.0, t), mix(a.1, z.1, t), mix(a.2, z.2, t))
    })
}

/// Raise every channel to `power`.
pub(crate) fn gamma(input: &RgbaImage, power: f64) -> RgbaImage {
    let p = power.max(0.0) as f32;
    map_rgb(input, |_, _, r, g, b| (r.powf(p), g.powf(p), b.powf(p)))
}

/// Saturation boost that spares already-saturated colors.
///
/// `amount` ranges from -1 to +1.
pub(crate) fn vibrance(input: &RgbaImage, amount: f64) -> RgbaImage {
    let vibrance = amount.clamp(-1.0, 1.0) as f32;
    if vibrance == 0.0 {
        return input.clone();
    }
    map_rgb(input, |_, _, r, g, b| {
        let max_c = r.max(g).max(b);
        let min_c = r.min(g).min(b);
        let current_sat = if max_c > 0.0 {
            (max_c - min_c) / max_c
        } else {
            0.0
        };

        // Detect skin tones (simplified: R > G > B with specific ratios)
        let is_skin = r > g && g > b && (r - g) > 0.06;
        let skin_protection = if is_skin { 0.5 } else { 1.0 };

        let factor = 1.0 + vibrance * skin_protection * (1.0 - current_sat);
        let gray = luminance(r, g, b);
        (
            gray + (r - gray) * factor,
            gray + (g - gray) * factor,
            gray + (b - gray) * factor,
        )
    })
}

/// White-balance shift from `neutral` to `target`, both `(kelvin, tint)`.
///
/// A target warmer than the neutral boosts red and cuts blue; a positive
/// tint difference pushes toward magenta.
pub(crate) fn temperature_and_tint(input: &RgbaImage, neutral: Point, target: Point) -> RgbaImage {
    let warmth = (((target.x - neutral.x) as f32) / KELVIN_SPAN).clamp(-1.0, 1.0);
    let tint = (((target.y - neutral.y) as f32) / TINT_SPAN).clamp(-1.0, 1.0);
    if warmth == 0.0 && tint == 0.0 {
        return input.clone();
    }
    let shift = warmth * 0.3;
    let magenta = tint * 0.2;
    map_rgb(input, |_, _, r, g, b| {
        let (r, g, b) = (r * (1.0 + shift), g, b * (1.0 - shift));
        if magenta >= 0.0 {
            (r * (1.0 + magenta), g * (1.0 - magenta), b * (1.0 + magenta))
        } else {
            (r, g * (1.0 - magenta), b)
        }
    })
}

/// Remap white to `color` (channel-wise multiply).
pub(crate) fn white_point(input: &RgbaImage, color: Color) -> RgbaImage {
    let (wr, wg, wb) = (color.red_value() as f32, color.green_value() as f32, color.blue_value() as f32);
    map_rgb(input, |_, _, r, g, b| (r * wr, g * wg, b * wb))
}

/// Compress highlights and lift or deepen shadows.
///
/// `highlight` of 1 leaves highlights alone; lower values pull them down.
/// `shadow` ranges from -1 (deepen) to +1 (lift).
pub(crate) fn highlight_shadow(input: &RgbaImage, highlight: f64, shadow: f64) -> RgbaImage {
    let highlight = highlight.clamp(0.0, 1.0) as f32;
    let shadow = shadow.clamp(-1.0, 1.0) as f32;
    if highlight == 1.0 && shadow == 0.0 {
        return input.clone();
    }
    map_rgb(input, |_, _, r, g, b| {
        let l = luminance(r, g, b);
        // Mask: 1 for bright areas, 0 for dark areas, smooth transition in between
        let highlight_mask = smoothstep(0.5, 1.0, l);
        let shadow_mask = smoothstep(0.5, 0.0, l);

        let factor = 1.0 - (1.0 - highlight) * highlight_mask * 0.5;
        let (r, g, b) = (r * factor, g * factor, b * factor);

        if shadow < 0.0 {
            let deepen = 1.0 + shadow * shadow_mask;
            (r * deepen, g * deepen, b * deepen)
        } else {
            let boost = shadow * shadow_mask * 0.5;
            (r + boost, g + boost, b + boost)
        }
    })
}

/// Quantize each channel to `levels` values.
pub(crate) fn posterize(input: &RgbaImage, levels: f64) -> RgbaImage {
    let steps = (levels.round().max(2.0) - 1.0) as f32;
    map_rgb(input, |_, _, r, g, b| {
        (
            (r * steps).round() / steps,
            (g * steps).round() / steps,
            (b * steps).round() / steps,
        )
    })
}

/// A film-style grade: saturation, contrast and black lift, then an RGB
/// offset weighted toward the shadows and another toward the highlights.
struct Grade {
    saturation: f32,
    contrast: f32,
    lift: f32,
    shadows: [f32; 3],
    highlights: [f32; 3],
}

const CHROME: Grade = Grade {
    saturation: 1.25,
    contrast: 1.15,
    lift: 0.0,
    shadows: [0.0, 0.0, 0.02],
    highlights: [0.02, 0.01, 0.0],
};

const FADE: Grade = Grade {
    saturation: 0.7,
    contrast: 0.85,
    lift: 0.08,
    shadows: [0.02, 0.02, 0.03],
    highlights: [0.0, 0.0, 0.0],
};

const INSTANT: Grade = Grade {
    saturation: 0.85,
    contrast: 0.95,
    lift: 0.04,
    shadows: [0.0, 0.01, 0.03],
    highlights: [0.05, 0.03, -0.03],
};

const PROCESS: Grade = Grade {
    saturation: 0.9,
    contrast: 1.1,
    lift: 0.02,
    shadows: [-0.02, 0.02, 0.06],
    highlights: [0.04, 0.02, -0.02],
};

const TRANSFER: Grade = Grade {
    saturation: 1.1,
    contrast: 1.05,
    lift: 0.03,
    shadows: [0.03, 0.0, -0.02],
    highlights: [0.06, 0.03, -0.04],
};

fn grade(input: &RgbaImage, grade: &Grade) -> RgbaImage {
    map_rgb(input, |_, _, r, g, b| {
        let l = luminance(r, g, b);
        let tone = |v: f32, channel: usize| {
            let v = contrast(mix(l, v, grade.saturation), grade.contrast);
            let v = grade.lift + v * (1.0 - grade.lift);
            v + grade.shadows[channel] * (1.0 - l) + grade.highlights[channel] * l
        };
        (tone(r, 0), tone(g, 1), tone(b, 2))
    })
}

pub(crate) fn chrome(input: &RgbaImage) -> RgbaImage {
    grade(input, &CHROME)
}

pub(crate) fn fade(input: &RgbaImage) -> RgbaImage {
    grade(input, &FADE)
}

pub(crate) fn instant(input: &RgbaImage) -> RgbaImage {
    grade(input, &INSTANT)
}

/// Cool shadows, warm highlights.
pub(crate) fn process(input: &RgbaImage) -> RgbaImage {
    grade(input, &PROCESS)
}

pub(crate) fn transfer(input: &RgbaImage) -> RgbaImage {
    grade(input, &TRANSFER)
}
