//! Procedural rasterizers.
//!
//! Every function here produces a canvas of exactly the requested size.

use image::Rgba;
use kurbo::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::Canvas;
use crate::color::Color;
use crate::error::{Error, Result};

/// Parameters shared by the periodic pattern generators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveParams {
    /// Color of the band containing `center`.
    pub color0: Color,
    pub color1: Color,
    /// Band width in pixels.
    pub width: f64,
    /// Edge hardness from 0 (fully soft) to 1 (hard).
    pub sharpness: f64,
    /// Band origin.
    pub center: Point,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            color0: Color::white(),
            color1: Color::black(),
            width: 10.0,
            sharpness: 1.0,
            center: Point::ZERO,
        }
    }
}

impl WaveParams {
    /// Fraction of `color1` at offset `pos` along one axis.
    ///
    /// The wave is 0 on `[0, w)` and 1 on `[w, 2w)`, repeating, with linear
    /// transitions of half-width `(1 - sharpness) * w / 2` at every edge.
    fn square_wave(&self, pos: f64) -> f64 {
        let w = self.width;
        let phase = pos.rem_euclid(2.0 * w);
        let depth = if phase < w {
            -phase.min(w - phase)
        } else {
            (phase - w).min(2.0 * w - phase)
        };

        let half = (1.0 - self.sharpness.clamp(0.0, 1.0)) * w / 2.0;
        if half <= f64::EPSILON {
            return if depth > 0.0 { 1.0 } else { 0.0 };
        }
        (0.5 + depth / (2.0 * half)).clamp(0.0, 1.0)
    }

    fn validate(&self) -> Result<()> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(Error::invalid_image(format!(
                "pattern band width must be positive, got {}",
                self.width
            )));
        }
        Ok(())
    }
}

/// Two-color checkerboard.
pub fn checkerboard(width: u32, height: u32, params: &WaveParams) -> Result<Canvas> {
    params.validate()?;
    let mut canvas = Canvas::new(width, height)?;
    canvas.begin_drawing().fill_with(|x, y| {
        let vx = params.square_wave(x as f64 + 0.5 - params.center.x);
        let vy = params.square_wave(y as f64 + 0.5 - params.center.y);
        // Soft XOR
        let t = vx + vy - 2.0 * vx * vy;
        params.color0.mix_with(&params.color1, t).to_rgba8()
    });
    Ok(canvas)
}

/// Two-color vertical stripes.
pub fn stripes(width: u32, height: u32, params: &WaveParams) -> Result<Canvas> {
    params.validate()?;
    let mut canvas = Canvas::new(width, height)?;
    canvas.begin_drawing().fill_with(|x, _| {
        let t = params.square_wave(x as f64 + 0.5 - params.center.x);
        params.color0.mix_with(&params.color1, t).to_rgba8()
    });
    Ok(canvas)
}

/// Opaque uniform color noise, reproducible for a given seed.
pub fn noise(width: u32, height: u32, seed: u64) -> Result<Canvas> {
    let mut canvas = Canvas::new(width, height)?;
    let mut rng = StdRng::seed_from_u64(seed);
    canvas
        .begin_drawing()
        .fill_with(|_, _| Rgba([rng.random(), rng.random(), rng.random(), 255]));
    Ok(canvas)
}

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QrCorrectionLevel {
    /// ~7% recovery
    L,
    /// ~15% recovery
    #[default]
    M,
    /// ~25% recovery
    Q,
    /// ~30% recovery
    H,
}

impl From<QrCorrectionLevel> for qrcode::EcLevel {
    fn from(level: QrCorrectionLevel) -> Self {
        match level {
            QrCorrectionLevel::L => qrcode::EcLevel::L,
            QrCorrectionLevel::M => qrcode::EcLevel::M,
            QrCorrectionLevel::Q => qrcode::EcLevel::Q,
            QrCorrectionLevel::H => qrcode::EcLevel::H,
        }
    }
}

/// Quiet-zone width in modules around the symbol.
const QR_QUIET_ZONE: usize = 1;

/// Black-on-white QR code of `data` in a `size` x `size` canvas.
///
/// Modules are scaled by the largest integer factor that fits and the
/// symbol is centered, so modules stay crisp.
///
/// # Errors
///
/// Returns [`Error::QrCode`] if `data` does not fit a QR symbol at `level`.
pub fn qr_code(data: &[u8], level: QrCorrectionLevel, size: u32) -> Result<Canvas> {
    let code = qrcode::QrCode::with_error_correction_level(data, level.into())
        .map_err(|e| Error::QrCode(e.to_string()))?;
    let modules = code.width();
    let colors = code.to_colors();

    let span = (modules + 2 * QR_QUIET_ZONE) as u32;
    if size < span {
        return Err(Error::QrCode(format!(
            "{size}px is too small for a {modules}-module symbol"
        )));
    }
    let scale = size / span;
    let offset = (size - scale * span) / 2 + scale * QR_QUIET_ZONE as u32;

    let mut canvas = Canvas::filled(size, size, Color::white())?;
    canvas.begin_drawing().fill_with(|x, y| {
        let (Some(mx), Some(my)) = (module_at(x, offset, scale), module_at(y, offset, scale)) else {
            return Rgba([255, 255, 255, 255]);
        };
        if mx < modules && my < modules && colors[my * modules + mx] == qrcode::Color::Dark {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    Ok(canvas)
}

fn module_at(v: u32, offset: u32, scale: u32) -> Option<usize> {
    v.checked_sub(offset).map(|d| (d / scale) as usize)
}

/// Anti-aliased filled rectangle with rounded corners on a transparent
/// canvas.
pub fn rounded_rectangle(width: u32, height: u32, radius: f64, color: Color) -> Result<Canvas> {
    let mut canvas = Canvas::new(width, height)?;
    let (w, h) = (width as f64, height as f64);
    let r = radius.max(0.0).min(w / 2.0).min(h / 2.0);
    let base = color.to_rgba8();

    canvas.begin_drawing().fill_with(|x, y| {
        let coverage = rounded_rect_coverage(x as f64 + 0.5, y as f64 + 0.5, w, h, r);
        let alpha = (base[3] as f64 * coverage).round() as u8;
        if alpha == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([base[0], base[1], base[2], alpha])
        }
    });
    Ok(canvas)
}

/// Approximate pixel coverage from the signed distance to the shape edge.
fn rounded_rect_coverage(px: f64, py: f64, w: f64, h: f64, r: f64) -> f64 {
    // Distance from the nearest corner-circle center, when in a corner zone
    let cx = px.clamp(r, w - r);
    let cy = py.clamp(r, h - r);
    let (dx, dy) = (px - cx, py - cy);
    if dx == 0.0 || dy == 0.0 {
        return 1.0;
    }
    let distance = dx.hypot(dy) - r;
    (0.5 - distance).clamp(0.0, 1.0)
}
