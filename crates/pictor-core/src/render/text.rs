//! Text measurement and rasterization.
//!
//! Layout is minimal: one line per `\n`-separated segment, no
//! wrapping, no shaping beyond per-glyph advances.

use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use image::Rgba;
use kurbo::{Point, Size};

use super::{BlendMode, DrawingContext};
use crate::color::Color;
use crate::error::{Error, Result};

/// Environment variable naming a font file for [`FontdueRenderer::discover`].
pub const FONT_ENV: &str = "PICTOR_FONT";

/// Font files tried by [`FontdueRenderer::discover`], in order.
const FALLBACK_FONTS: &[&str] = &[
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Something that can measure and draw text onto a canvas.
pub trait TextRenderer {
    /// Size of the block `text` occupies at `font_size` pixels.
    fn measure_text(&self, text: &str, font_size: f64) -> Size;

    /// Draw `text` with its block's top-left corner at `origin`.
    fn draw_text(
        &self,
        ctx: &mut DrawingContext<'_>,
        text: &str,
        origin: Point,
        font_size: f64,
        color: Color,
    ) -> Result<()>;
}

/// [`TextRenderer`] backed by a `fontdue` font.
pub struct FontdueRenderer {
    font: Font,
}

impl std::fmt::Debug for FontdueRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontdueRenderer")
            .field("name", &self.font.name())
            .finish()
    }
}

impl FontdueRenderer {
    /// Parse a TrueType/OpenType font from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| Error::Font(e.to_string()))?;
        Ok(Self { font })
    }

    /// Load a font file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        tracing::debug!(path = %path.display(), "loading font");
        Self::from_bytes(&bytes)
    }

    /// Load the font named by `PICTOR_FONT`, else the first common system
    /// font found.
    pub fn discover() -> Result<Self> {
        let candidates = std::env::var_os(FONT_ENV)
            .map(PathBuf::from)
            .into_iter()
            .chain(FALLBACK_FONTS.iter().map(PathBuf::from));

        for candidate in candidates {
            if candidate.is_file() {
                match Self::from_path(&candidate) {
                    Ok(renderer) => return Ok(renderer),
                    Err(e) => {
                        tracing::warn!(path = %candidate.display(), error = %e, "unusable font")
                    }
                }
            }
        }
        Err(Error::Font(format!(
            "no usable font found; set {FONT_ENV} to a .ttf/.otf file"
        )))
    }

    fn line_height(&self, px: f32) -> (f32, f32) {
        match self.font.horizontal_line_metrics(px) {
            Some(m) => (m.ascent, m.new_line_size),
            None => (px, px * 1.2),
        }
    }

    fn line_width(&self, line: &str, px: f32) -> f32 {
        line.chars().map(|c| self.font.metrics(c, px).advance_width).sum()
    }
}

impl TextRenderer for FontdueRenderer {
    fn measure_text(&self, text: &str, font_size: f64) -> Size {
        let px = font_size.max(0.0) as f32;
        let (_, line_height) = self.line_height(px);
        let lines: Vec<&str> = text.split('\n').collect();
        let width = lines
            .iter()
            .map(|line| self.line_width(line, px))
            .fold(0.0f32, f32::max);
        Size::new(width.ceil() as f64, (line_height * lines.len() as f32).ceil() as f64)
    }

    fn draw_text(
        &self,
        ctx: &mut DrawingContext<'_>,
        text: &str,
        origin: Point,
        font_size: f64,
        color: Color,
    ) -> Result<()> {
        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(Error::Font(format!("invalid font size {font_size}")));
        }
        let px = font_size as f32;
        let (ascent, line_height) = self.line_height(px);
        let ink = color.to_rgba8();

        for (row, line) in text.split('\n').enumerate() {
            let baseline = origin.y as f32 + ascent + row as f32 * line_height;
            let mut pen_x = origin.x as f32;

            for ch in line.chars() {
                let (metrics, coverage) = self.font.rasterize(ch, px);
                let left = (pen_x + metrics.xmin as f32).round() as i64;
                let top = (baseline - (metrics.height as i32 + metrics.ymin) as f32).round() as i64;

                for gy in 0..metrics.height {
                    for gx in 0..metrics.width {
                        let c = coverage[gy * metrics.width + gx];
                        if c == 0 {
                            continue;
                        }
                        let alpha = (ink[3] as u32 * c as u32 / 255) as u8;
                        ctx.blend_pixel(
                            left + gx as i64,
                            top + gy as i64,
                            Rgba([ink[0], ink[1], ink[2], alpha]),
                            BlendMode::SourceOver,
                        );
                    }
                }
                pen_x += metrics.advance_width;
            }
        }
        Ok(())
    }
}
