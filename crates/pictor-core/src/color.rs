//! RGBA color values with HSB conversions.
//!
//! All channels are stored as `f64` in the range 0.0 to 1.0. Every setter
//! and constructor clamps its input into that range, so a `Color` can never
//! hold an out-of-range channel.
//!
//! # Example
//!
//! ```ignore
//! use pictor_core::Color;
//!
//! let purple = Color::red().mix_with(&Color::blue(), 0.5);
//! let swatch = purple.make_swatch(64, 64)?;
//! ```

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::image::Image;
use crate::render::Canvas;

/// An RGBA color with channels normalized to 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    red: f64,
    green: f64,
    blue: f64,
    #[serde(default = "opaque")]
    alpha: f64,
}

fn opaque() -> f64 {
    1.0
}

#[inline]
fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl Default for Color {
    /// Opaque white.
    fn default() -> Self {
        Self::white()
    }
}

impl Color {
    /// Create an opaque color from red, green and blue components.
    pub fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    /// Create a color from red, green, blue and alpha components.
    pub fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red: unit(red),
            green: unit(green),
            blue: unit(blue),
            alpha: unit(alpha),
        }
    }

    /// Create a color from hue, saturation, brightness and alpha.
    ///
    /// Hue is a fraction of a full turn (0.0 and 1.0 are both red).
    pub fn from_hsba(hue: f64, saturation: f64, brightness: f64, alpha: f64) -> Self {
        let (r, g, b) = hsb_to_rgb(hue, unit(saturation), unit(brightness));
        Self::rgba(r, g, b, alpha)
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() || (digits.len() != 6 && digits.len() != 8) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        let alpha = if digits.len() == 8 { channel(6)? } else { 255 };
        Some(Self::from_rgba8(Rgba([
            channel(0)?,
            channel(2)?,
            channel(4)?,
            alpha,
        ])))
    }

    /// Create a color from an 8-bit RGBA pixel.
    pub fn from_rgba8(pixel: Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        Self::rgba(
            r as f64 / 255.0,
            g as f64 / 255.0,
            b as f64 / 255.0,
            a as f64 / 255.0,
        )
    }

    /// Convert to an 8-bit RGBA pixel.
    pub fn to_rgba8(&self) -> Rgba<u8> {
        let q = |v: f64| (v * 255.0).round() as u8;
        Rgba([q(self.red), q(self.green), q(self.blue), q(self.alpha)])
    }

    pub fn red() -> Self {
        Self::rgb(1.0, 0.0, 0.0)
    }

    pub fn orange() -> Self {
        Self::rgb(1.0, 0.5, 0.0)
    }

    pub fn yellow() -> Self {
        Self::rgb(1.0, 1.0, 0.0)
    }

    pub fn green() -> Self {
        Self::rgb(0.0, 1.0, 0.0)
    }

    pub fn cyan() -> Self {
        Self::rgb(0.0, 1.0, 1.0)
    }

    pub fn blue() -> Self {
        Self::rgb(0.0, 0.0, 1.0)
    }

    pub fn magenta() -> Self {
        Self::rgb(1.0, 0.0, 1.0)
    }

    pub fn purple() -> Self {
        Self::rgb(0.5, 0.0, 0.5)
    }

    pub fn brown() -> Self {
        Self::rgb(0.6, 0.4, 0.2)
    }

    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    pub fn gray() -> Self {
        Self::rgb(0.5, 0.5, 0.5)
    }

    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Fully transparent black.
    pub fn clear() -> Self {
        Self::rgba(0.0, 0.0, 0.0, 0.0)
    }

    /// Hex string `#RRGGBB` (alpha is not included).
    pub fn hex_value(&self) -> String {
        let [r, g, b, _] = self.to_rgba8().0;
        format!("#{r:02X}{g:02X}{b:02X}")
    }

    pub fn red_value(&self) -> f64 {
        self.red
    }

    pub fn green_value(&self) -> f64 {
        self.green
    }

    pub fn blue_value(&self) -> f64 {
        self.blue
    }

    pub fn alpha_value(&self) -> f64 {
        self.alpha
    }

    pub fn set_red(&mut self, value: f64) {
        self.red = unit(value);
    }

    pub fn set_green(&mut self, value: f64) {
        self.green = unit(value);
    }

    pub fn set_blue(&mut self, value: f64) {
        self.blue = unit(value);
    }

    pub fn set_alpha(&mut self, value: f64) {
        self.alpha = unit(value);
    }

    /// Hue as a fraction of a full turn (0.0..1.0).
    pub fn hue_value(&self) -> f64 {
        self.hsb().0
    }

    pub fn saturation_value(&self) -> f64 {
        self.hsb().1
    }

    pub fn brightness_value(&self) -> f64 {
        self.hsb().2
    }

    pub fn set_hue(&mut self, hue: f64) {
        let (_, s, b) = self.hsb();
        self.set_hsba(hue, s, b, self.alpha);
    }

    pub fn set_saturation(&mut self, saturation: f64) {
        let (h, _, b) = self.hsb();
        self.set_hsba(h, saturation, b, self.alpha);
    }

    pub fn set_brightness(&mut self, brightness: f64) {
        let (h, s, _) = self.hsb();
        self.set_hsba(h, s, brightness, self.alpha);
    }

    /// Replace all four RGBA channels.
    pub fn set_rgba(&mut self, red: f64, green: f64, blue: f64, alpha: f64) -> &mut Self {
        *self = Self::rgba(red, green, blue, alpha);
        self
    }

    /// Replace the color using hue, saturation, brightness and alpha.
    pub fn set_hsba(&mut self, hue: f64, saturation: f64, brightness: f64, alpha: f64) -> &mut Self {
        *self = Self::from_hsba(hue, saturation, brightness, alpha);
        self
    }

    /// Linearly interpolate towards `other`.
    ///
    /// `fraction` is clamped to 0.0..=1.0; 0.0 returns `self`, 1.0 returns
    /// `other`. All four channels are interpolated.
    pub fn mix_with(&self, other: &Color, fraction: f64) -> Color {
        let t = unit(fraction);
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        Color::rgba(
            lerp(self.red, other.red),
            lerp(self.green, other.green),
            lerp(self.blue, other.blue),
            lerp(self.alpha, other.alpha),
        )
    }

    /// Move the color towards white by `fraction` (clamped). Alpha is kept.
    pub fn brighten(&mut self, fraction: f64) -> &mut Self {
        let alpha = self.alpha;
        *self = self.mix_with(&Color::white(), fraction);
        self.alpha = alpha;
        self
    }

    /// Move the color towards black by `fraction` (clamped). Alpha is kept.
    pub fn darken(&mut self, fraction: f64) -> &mut Self {
        let alpha = self.alpha;
        *self = self.mix_with(&Color::black(), fraction);
        self.alpha = alpha;
        self
    }

    /// Render a solid `width` x `height` image filled with this color.
    pub fn make_swatch(&self, width: u32, height: u32) -> Result<Image> {
        let canvas = Canvas::filled(width, height, *self)?;
        Ok(Image::from_pixels(canvas.into_pixels()))
    }

    fn hsb(&self) -> (f64, f64, f64) {
        rgb_to_hsb(self.red, self.green, self.blue)
    }
}

impl From<Rgba<u8>> for Color {
    fn from(pixel: Rgba<u8>) -> Self {
        Self::from_rgba8(pixel)
    }
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        color.to_rgba8()
    }
}

/// Convert RGB (0..=1) to hue (0..1 turns), saturation and brightness.
fn rgb_to_hsb(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let brightness = max;
    let saturation = if max > 0.0 { delta / max } else { 0.0 };

    if delta <= f64::EPSILON {
        return (0.0, saturation, brightness);
    }

    let sector = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    (sector / 6.0 % 1.0, saturation, brightness)
}

/// Convert hue (turns), saturation and brightness to RGB (0..=1).
fn hsb_to_rgb(hue: f64, saturation: f64, brightness: f64) -> (f64, f64, f64) {
    if saturation <= 0.0 {
        return (brightness, brightness, brightness);
    }

    let mut h = hue.rem_euclid(1.0) * 6.0;
    // rem_euclid rounds tiny negative hues up to exactly one turn
    if h >= 6.0 {
        h = 0.0;
    }
    let sector = h.floor();
    let f = h - sector;

    let p = brightness * (1.0 - saturation);
    let q = brightness * (1.0 - saturation * f);
    let t = brightness * (1.0 - saturation * (1.0 - f));

    match sector as u8 {
        0 => (brightness, t, p),
        1 => (q, brightness, p),
        2 => (p, brightness, t),
        3 => (p, q, brightness),
        4 => (t, p, brightness),
        _ => (brightness, p, q),
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: RGB -> HSB -> RGB round-trips within tolerance.
        #[test]
        fn prop_hsb_round_trip(r in 0.0f64..=1.0, g in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let c = Color::rgb(r, g, b);
            let back = Color::from_hsba(c.hue_value(), c.saturation_value(), c.brightness_value(), 1.0);
            prop_assert!((back.red_value() - r).abs() < 1e-9);
            prop_assert!((back.green_value() - g).abs() < 1e-9);
            prop_assert!((back.blue_value() - b).abs() < 1e-9);
        }

        /// Property: Mixing never leaves the unit range.
        #[test]
        fn prop_mix_stays_in_range(
            a in (0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0),
            b in (0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0),
            t in -2.0f64..=2.0,
        ) {
            let mixed = Color::rgb(a.0, a.1, a.2).mix_with(&Color::rgb(b.0, b.1, b.2), t);
            for v in [mixed.red_value(), mixed.green_value(), mixed.blue_value(), mixed.alpha_value()] {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}
