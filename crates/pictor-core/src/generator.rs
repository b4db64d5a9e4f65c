//! Image generators.
//!
//! Generators need no input image: each one rasterizes a brand-new
//! [`Image`] of an explicit size from its parameters alone.

use std::path::PathBuf;

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::Result;
use crate::image::Image;
use crate::render::{self, Canvas, QrCorrectionLevel, TextRenderer, WaveParams};

/// Produces a new image from parameters alone.
pub trait Generator {
    fn generate(&self) -> Result<Image>;
}

fn band_10() -> f64 {
    10.0
}

fn one() -> f64 {
    1.0
}

const DEFAULT_QR_SIZE: u32 = 100;

fn red() -> Color {
    Color::red()
}

fn black() -> Color {
    Color::black()
}

/// Two-color checkerboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckerboardGenerator {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub color0: Color,
    #[serde(default = "black")]
    pub color1: Color,
    #[serde(default = "band_10")]
    pub square_width: f64,
    #[serde(default = "one")]
    pub sharpness: f64,
    #[serde(default)]
    pub center: Point,
}

impl CheckerboardGenerator {
    /// White and black 10 pixel squares.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color0: Color::white(),
            color1: Color::black(),
            square_width: 10.0,
            sharpness: 1.0,
            center: Point::ZERO,
        }
    }
}

impl Generator for CheckerboardGenerator {
    fn generate(&self) -> Result<Image> {
        let params = WaveParams {
            color0: self.color0,
            color1: self.color1,
            width: self.square_width,
            sharpness: self.sharpness,
            center: self.center,
        };
        let canvas = render::checkerboard(self.width, self.height, &params)?;
        tracing::debug!(width = self.width, height = self.height, "generate checkerboard");
        Ok(Image::from_canvas(canvas))
    }
}

/// Vertical two-color stripes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StripesGenerator {
    pub width: u32,
    pub height: u32,
    #[serde(default = "red")]
    pub color0: Color,
    #[serde(default = "black")]
    pub color1: Color,
    #[serde(default = "band_10")]
    pub stripe_width: f64,
    #[serde(default = "one")]
    pub sharpness: f64,
    #[serde(default)]
    pub center: Point,
}

impl StripesGenerator {
    /// Red and black 10 pixel stripes.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color0: Color::red(),
            color1: Color::black(),
            stripe_width: 10.0,
            sharpness: 1.0,
            center: Point::ZERO,
        }
    }
}

impl Generator for StripesGenerator {
    fn generate(&self) -> Result<Image> {
        let params = WaveParams {
            color0: self.color0,
            color1: self.color1,
            width: self.stripe_width,
            sharpness: self.sharpness,
            center: self.center,
        };
        let canvas = render::stripes(self.width, self.height, &params)?;
        tracing::debug!(width = self.width, height = self.height, "generate stripes");
        Ok(Image::from_canvas(canvas))
    }
}

/// Opaque uniform noise; the same seed always yields the same pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomGenerator {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub seed: u64,
}

impl RandomGenerator {
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        Self { width, height, seed }
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> Result<Image> {
        let canvas = render::noise(self.width, self.height, self.seed)?;
        tracing::debug!(width = self.width, height = self.height, seed = self.seed, "generate noise");
        Ok(Image::from_canvas(canvas))
    }
}

/// Payload of a QR code.
#[derive(Debug, Clone)]
pub enum QrContent {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes of a file, read on every `generate`.
    File(PathBuf),
    /// TIFF encoding of an image.
    Image(Image),
}

impl QrContent {
    fn bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Text(text) => Ok(text.as_bytes().to_vec()),
            Self::File(path) => Ok(std::fs::read(path)?),
            Self::Image(image) => image.data(),
        }
    }
}

/// Square black-on-white QR code.
#[derive(Debug, Clone)]
pub struct QrCodeGenerator {
    pub content: QrContent,
    pub correction_level: QrCorrectionLevel,
    /// Side length in pixels.
    pub size: u32,
}

impl QrCodeGenerator {
    pub fn new(content: QrContent) -> Self {
        Self {
            content,
            correction_level: QrCorrectionLevel::default(),
            size: DEFAULT_QR_SIZE,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(QrContent::Text(text.into()))
    }
}

impl Generator for QrCodeGenerator {
    fn generate(&self) -> Result<Image> {
        let data = self.content.bytes()?;
        let canvas = render::qr_code(&data, self.correction_level, self.size)?;
        tracing::debug!(bytes = data.len(), size = self.size, level = ?self.correction_level, "generate qr code");
        Ok(Image::from_canvas(canvas))
    }
}

/// Filled rectangle with rounded corners on a transparent background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundedRectangleGenerator {
    pub color: Color,
    pub width: u32,
    pub height: u32,
    pub radius: f64,
}

impl Generator for RoundedRectangleGenerator {
    fn generate(&self) -> Result<Image> {
        let canvas = render::rounded_rectangle(self.width, self.height, self.radius, self.color)?;
        Ok(Image::from_canvas(canvas))
    }
}

/// Text on a transparent background, sized to fit.
///
/// `scale_factor` renders at a higher pixel density: the output is
/// `scale_factor` times larger than the text measured at `font_size`.
pub struct TextImageGenerator<'r> {
    pub text: String,
    pub font_size: f64,
    pub scale_factor: f64,
    pub color: Color,
    renderer: &'r dyn TextRenderer,
}

impl<'r> TextImageGenerator<'r> {
    /// 12 point black text at scale 1.
    pub fn new(text: impl Into<String>, renderer: &'r dyn TextRenderer) -> Self {
        Self {
            text: text.into(),
            font_size: 12.0,
            scale_factor: 1.0,
            color: Color::black(),
            renderer,
        }
    }
}

impl Generator for TextImageGenerator<'_> {
    fn generate(&self) -> Result<Image> {
        let size = self.font_size * self.scale_factor;
        let measured = self.renderer.measure_text(&self.text, size);
        let mut canvas = Canvas::new(
            render::pixel_extent(measured.width)?,
            render::pixel_extent(measured.height)?,
        )?;
        self.renderer
            .draw_text(&mut canvas.begin_drawing(), &self.text, Point::ZERO, size, self.color)?;
        Ok(Image::from_canvas(canvas))
    }
}
