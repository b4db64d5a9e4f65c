//! CPU rendering backend.
//!
//! Everything that touches pixels lives here: canvases and scoped drawing,
//! the named filter engine, procedural generators, text rasterization and
//! the container codec. The operation layer above (`filter`, `transform`,
//! `generator`, `composition`) only computes geometry and parameters and
//! hands them to this module.
//!
//! # Drawing Model
//!
//! A [`Canvas`] owns an RGBA8 buffer. Drawing requires a [`DrawingContext`],
//! obtained with [`Canvas::begin_drawing`]. The context mutably borrows the
//! canvas, so at most one context can exist per canvas and the borrow is
//! released on every exit path, including early returns through `?`.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner, y grows downward
//! - Pixel `(i, j)` covers the square `[i, i+1) x [j, j+1)`
//! - Sampling happens at pixel centers

mod codec;
mod draw;
mod engine;
mod kernels;
mod procedural;
mod text;

use image::{Rgba, RgbaImage};
use kurbo::{Affine, Rect};

use crate::color::Color;
use crate::error::{Error, Result};

pub use codec::{decode, encode, encode_as};
pub use draw::BlendMode;
pub use engine::{CpuBackend, FilterBackend, FilterInvocation, FilterParams, Overscan, ParamValue};
pub use procedural::{
    checkerboard, noise, qr_code, rounded_rectangle, stripes, QrCorrectionLevel, WaveParams,
};
pub use text::{FontdueRenderer, TextRenderer};

/// A freshly allocated pixel buffer that drawing operations target.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    /// Allocate a fully transparent canvas.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        ensure_area(width, height)?;
        Ok(Self {
            pixels: RgbaImage::new(width, height),
        })
    }

    /// Allocate a canvas filled with a solid color.
    pub fn filled(width: u32, height: u32, color: Color) -> Result<Self> {
        ensure_area(width, height)?;
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, color.to_rgba8()),
        })
    }

    /// Start drawing onto an existing pixel buffer.
    pub fn from_pixels(pixels: RgbaImage) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        ensure_area(width, height)?;
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }

    /// Acquire the exclusive drawing context for this canvas.
    pub fn begin_drawing(&mut self) -> DrawingContext<'_> {
        tracing::trace!(
            width = self.pixels.width(),
            height = self.pixels.height(),
            "begin drawing"
        );
        DrawingContext {
            target: &mut self.pixels,
        }
    }
}

/// Scoped exclusive access to a canvas for drawing.
///
/// Dropping the context ends the drawing session.
pub struct DrawingContext<'a> {
    target: &'a mut RgbaImage,
}

impl DrawingContext<'_> {
    pub fn width(&self) -> u32 {
        self.target.width()
    }

    pub fn height(&self) -> u32 {
        self.target.height()
    }

    /// Bounds of the target canvas.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.target.width() as f64, self.target.height() as f64)
    }

    /// Draw the `src_rect` region of `source` through `matrix`.
    ///
    /// `matrix` maps source coordinates to canvas coordinates. Canvas pixels
    /// whose inverse-mapped center falls outside `src_rect` are untouched.
    pub fn draw_image(&mut self, source: &RgbaImage, src_rect: Rect, matrix: Affine, blend: BlendMode) {
        draw::draw_image(self.target, source, src_rect, matrix, blend);
    }

    /// Stretch the whole of `source` into `dest` on the canvas.
    pub fn draw_image_in_rect(&mut self, source: &RgbaImage, dest: Rect, blend: BlendMode) {
        let (w, h) = source.dimensions();
        if w == 0 || h == 0 || dest.width() <= 0.0 || dest.height() <= 0.0 {
            return;
        }
        let src_rect = Rect::new(0.0, 0.0, w as f64, h as f64);
        let matrix = draw::rect_to_rect(src_rect, dest);
        draw::draw_image(self.target, source, src_rect, matrix, blend);
    }

    /// Fill an axis-aligned rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, rect: Rect, color: Color, blend: BlendMode) {
        draw::fill_rect(self.target, rect, color.to_rgba8(), blend);
    }

    /// Overwrite every canvas pixel with `f(x, y)`.
    pub fn fill_with<F>(&mut self, mut f: F)
    where
        F: FnMut(u32, u32) -> Rgba<u8>,
    {
        for (x, y, pixel) in self.target.enumerate_pixels_mut() {
            *pixel = f(x, y);
        }
    }

    /// Blend a single straight-alpha pixel onto the canvas; out-of-range
    /// coordinates are ignored.
    pub fn blend_pixel(&mut self, x: i64, y: i64, pixel: Rgba<u8>, blend: BlendMode) {
        if x < 0 || y < 0 || x >= self.target.width() as i64 || y >= self.target.height() as i64 {
            return;
        }
        let dst = self.target.get_pixel_mut(x as u32, y as u32);
        *dst = draw::blend_pixel(*dst, pixel, blend);
    }
}

impl Drop for DrawingContext<'_> {
    fn drop(&mut self) {
        tracing::trace!("end drawing");
    }
}

/// Largest canvas, in pixels, the backend will allocate (1 GiB of RGBA8).
pub const MAX_CANVAS_PIXELS: usize = 1 << 28;

/// Fail with [`Error::InvalidImage`] unless `width x height` is non-empty
/// and within [`MAX_CANVAS_PIXELS`].
pub(crate) fn ensure_area(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_image(format!(
            "canvas must have non-zero area, got {width}x{height}"
        )));
    }
    let fits = (width as usize)
        .checked_mul(height as usize)
        .is_some_and(|pixels| pixels <= MAX_CANVAS_PIXELS);
    if !fits {
        return Err(Error::invalid_image(format!(
            "canvas {width}x{height} exceeds {MAX_CANVAS_PIXELS} pixels"
        )));
    }
    Ok(())
}

/// Round a floating-point extent to a canvas dimension (at least 1).
pub(crate) fn pixel_extent(value: f64) -> Result<u32> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::invalid_image(format!("invalid canvas extent {value}")));
    }
    let rounded = value.round();
    if rounded > u32::MAX as f64 {
        return Err(Error::invalid_image(format!("canvas extent {value} is too large")));
    }
    Ok((rounded as u32).max(1))
}
