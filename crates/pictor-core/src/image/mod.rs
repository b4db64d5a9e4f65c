//! The central image value.
//!
//! An [`Image`] owns a shared, copy-on-write RGBA8 buffer plus its
//! provenance. Cloning is cheap and shares pixels; every mutation either
//! swaps in a freshly computed buffer or deep-copies a shared one first, so
//! clones never observe each other's edits.
//!
//! Mutating methods compute their result into a temporary buffer and only
//! commit it on success, leaving the image untouched when they fail.

mod adjust;

pub use adjust::Adjustments;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::image::{ImageFormat, RgbaImage};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::render::{self, BlendMode, Canvas, TextRenderer};

/// Default text position for [`Image::overlay_text`].
pub const DEFAULT_TEXT_LOCATION: Point = Point::new(5.0, 5.0);

/// Appearance of text rendered by [`Image::text_image`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_size: f64,
    pub font_color: Color,
    pub background_color: Color,
    /// Space between the text block and the image edge.
    pub inset: u32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 15.0,
            font_color: Color::black(),
            background_color: Color::white(),
            inset: 10,
        }
    }
}

/// An RGBA image with copy-on-write pixel storage.
#[derive(Debug, Clone)]
pub struct Image {
    canvas: Arc<RgbaImage>,
    source_path: Option<PathBuf>,
    modified: bool,
    adjustments: Adjustments,
}

impl Image {
    /// Wrap an existing pixel buffer. The buffer may have zero area.
    pub fn from_pixels(pixels: RgbaImage) -> Self {
        Self {
            canvas: Arc::new(pixels),
            source_path: None,
            modified: false,
            adjustments: Adjustments::default(),
        }
    }

    pub(crate) fn from_canvas(canvas: Canvas) -> Self {
        Self::from_pixels(canvas.into_pixels())
    }

    /// Decode an image from encoded bytes of any supported format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] if the bytes cannot be decoded.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_pixels(render::decode(bytes)?))
    }

    /// Load an image file, remembering its path as the save destination.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut image = Self::from_bytes(&bytes)?;
        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "loaded image"
        );
        image.source_path = Some(path.to_path_buf());
        Ok(image)
    }

    /// Load an image from a URL.
    ///
    /// `file://` URLs are read from disk. HTTP(S) requires the `remote`
    /// feature.
    pub fn from_url(url: &str) -> Result<Self> {
        if let Some(path) = url.strip_prefix("file://") {
            return Self::from_path(path);
        }
        Self::fetch(url)
    }

    #[cfg(feature = "remote")]
    fn fetch(url: &str) -> Result<Self> {
        tracing::debug!(url, "fetching image");
        let response = reqwest::blocking::get(url)
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Fetch(e.to_string()))?;
        let bytes = response.bytes().map_err(|e| Error::Fetch(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    #[cfg(not(feature = "remote"))]
    fn fetch(url: &str) -> Result<Self> {
        Err(Error::Fetch(format!(
            "cannot load {url}: built without the `remote` feature"
        )))
    }

    /// Render `text` black on white with a 10 pixel inset.
    pub fn from_text(text: &str, renderer: &dyn TextRenderer) -> Result<Self> {
        Self::text_image(text, &TextStyle::default(), renderer)
    }

    /// Render `text` onto a background just large enough to hold it.
    pub fn text_image(text: &str, style: &TextStyle, renderer: &dyn TextRenderer) -> Result<Self> {
        let measured = renderer.measure_text(text, style.font_size);
        let inset = style.inset as f64;
        let width = render::pixel_extent(measured.width + 2.0 * inset)?;
        let height = render::pixel_extent(measured.height + 2.0 * inset)?;

        let mut canvas = Canvas::filled(width, height, style.background_color)?;
        renderer.draw_text(
            &mut canvas.begin_drawing(),
            text,
            Point::new(inset, inset),
            style.font_size,
            style.font_color,
        )?;
        Ok(Self::from_canvas(canvas))
    }

    /// Image size in pixels, read from the current buffer.
    pub fn size(&self) -> Size {
        Size::new(self.canvas.width() as f64, self.canvas.height() as f64)
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Full image bounds at the origin.
    pub fn bounds(&self) -> Rect {
        self.size().to_rect()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Whether any operation has changed the pixels since loading.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Whether `self` and `other` currently share one pixel buffer.
    pub fn shares_pixels_with(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.canvas, &other.canvas)
    }

    /// Encoded TIFF bytes of the current pixels.
    pub fn data(&self) -> Result<Vec<u8>> {
        render::encode(&self.canvas)
    }

    /// Whether any pixel is not fully opaque.
    pub fn has_alpha_channel(&self) -> bool {
        self.canvas.pixels().any(|p| p[3] != 255)
    }

    /// Whether every pixel is fully opaque.
    pub fn is_opaque(&self) -> bool {
        !self.has_alpha_channel()
    }

    /// Color at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.canvas.get_pixel_checked(x, y).map(|p| Color::from_rgba8(*p))
    }

    /// Fail with [`Error::InvalidImage`] if the image has zero area.
    pub(crate) fn ensure_drawable(&self) -> Result<()> {
        if self.canvas.width() == 0 || self.canvas.height() == 0 {
            return Err(Error::invalid_image(format!(
                "image has zero area ({}x{})",
                self.canvas.width(),
                self.canvas.height()
            )));
        }
        Ok(())
    }

    /// Commit a new buffer and mark the image modified.
    pub(crate) fn replace_pixels(&mut self, pixels: RgbaImage) {
        self.canvas = Arc::new(pixels);
        self.modified = true;
    }

    /// Surround the image with a solid border.
    ///
    /// The result is `(w + 2 * horizontal, h + 2 * vertical)` with the
    /// original drawn at `(horizontal, vertical)`.
    pub fn pad(&mut self, horizontal: u32, vertical: u32, color: Color) -> Result<&mut Self> {
        self.ensure_drawable()?;
        let (w, h) = self.canvas.dimensions();
        let grow = |side: u32, border: u32| {
            border
                .checked_mul(2)
                .and_then(|b| b.checked_add(side))
                .ok_or_else(|| Error::invalid_image(format!("border {border} overflows a {side} pixel side")))
        };
        let mut canvas = Canvas::filled(grow(w, horizontal)?, grow(h, vertical)?, color)?;
        canvas.begin_drawing().draw_image_in_rect(
            &self.canvas,
            Rect::new(
                horizontal as f64,
                vertical as f64,
                horizontal as f64 + w as f64,
                vertical as f64 + h as f64,
            ),
            BlendMode::SourceOver,
        );

        tracing::debug!(horizontal, vertical, "pad");
        self.replace_pixels(canvas.into_pixels());
        Ok(self)
    }

    /// Draw `other` on top of this image.
    ///
    /// `location` defaults to the origin. `size` defaults to `other`'s own
    /// size; a component of `-1` fills the remaining space from `location`
    /// to the far edge in that dimension, so `(-1, -1)` fills both.
    ///
    /// A location outside this image, or an effective size that is not
    /// positive, draws nothing and leaves the image unmodified.
    pub fn overlay_image(
        &mut self,
        other: &Image,
        location: Option<Point>,
        size: Option<Size>,
    ) -> Result<&mut Self> {
        self.ensure_drawable()?;
        other.ensure_drawable()?;

        let location = location.unwrap_or(Point::ZERO);
        let bounds = self.bounds();
        if !(location.x >= 0.0 && location.y >= 0.0 && location.x < bounds.x1 && location.y < bounds.y1)
        {
            tracing::warn!(x = location.x, y = location.y, "overlay location outside image, skipping");
            return Ok(self);
        }

        let requested = size.unwrap_or_else(|| other.size());
        let width = if requested.width == -1.0 {
            bounds.x1 - location.x
        } else {
            requested.width
        };
        let height = if requested.height == -1.0 {
            bounds.y1 - location.y
        } else {
            requested.height
        };
        if !(width > 0.0 && height > 0.0) {
            tracing::warn!(width, height, "overlay size not positive, skipping");
            return Ok(self);
        }

        let dest = Rect::from_origin_size(location, (width, height));
        let mut canvas = Canvas::from_pixels(self.canvas.as_ref().clone())?;
        canvas
            .begin_drawing()
            .draw_image_in_rect(&other.canvas, dest, BlendMode::SourceOver);

        tracing::debug!(?dest, "overlay image");
        self.replace_pixels(canvas.into_pixels());
        Ok(self)
    }

    /// Draw `text` on top of this image.
    ///
    /// `location` (the text block's top-left corner) defaults to `(5, 5)`
    /// and `color` to black. Text is not wrapped.
    pub fn overlay_text(
        &mut self,
        text: &str,
        location: Option<Point>,
        font_size: f64,
        color: Option<Color>,
        renderer: &dyn TextRenderer,
    ) -> Result<&mut Self> {
        self.ensure_drawable()?;
        let location = location.unwrap_or(DEFAULT_TEXT_LOCATION);
        let color = color.unwrap_or_else(Color::black);

        let mut canvas = Canvas::from_pixels(self.canvas.as_ref().clone())?;
        renderer.draw_text(&mut canvas.begin_drawing(), text, location, font_size, color)?;

        self.replace_pixels(canvas.into_pixels());
        Ok(self)
    }

    /// Write the image as TIFF.
    ///
    /// Saves to `path`, or to the path the image was loaded from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDestination`] when neither is available.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let destination = path
            .or(self.source_path.as_deref())
            .ok_or(Error::NoDestination)?
            .to_path_buf();
        let bytes = self.data()?;
        std::fs::write(&destination, bytes)?;
        tracing::debug!(path = %destination.display(), "saved image");
        Ok(destination)
    }

    /// Write the image in an explicit container format.
    pub fn save_as(&self, path: impl AsRef<Path>, format: ImageFormat) -> Result<()> {
        let path = path.as_ref();
        let bytes = render::encode_as(&self.canvas, format)?;
        std::fs::write(path, bytes)?;
        tracing::debug!(path = %path.display(), ?format, "saved image");
        Ok(())
    }
}

impl PartialEq for Image {
    /// Pixel equality: same dimensions and identical RGBA bytes.
    fn eq(&self, other: &Self) -> bool {
        self.canvas.dimensions() == other.canvas.dimensions()
            && self.canvas.as_raw() == other.canvas.as_raw()
    }
}

impl Eq for Image {}

impl From<RgbaImage> for Image {
    fn from(pixels: RgbaImage) -> Self {
        Self::from_pixels(pixels)
    }
}
