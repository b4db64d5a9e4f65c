//! Combining several images into one.
//!
//! Stitches lay images out side by side (or top to bottom) in the order
//! given. Layout is computed fresh from the inputs on every call; the
//! inputs themselves are never modified.

use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::Image;
use crate::render::{pixel_extent, BlendMode, Canvas};

/// Combines images into a new image.
pub trait Composition {
    fn compose(&self, images: &[Image]) -> Result<Image>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Images left to right, top-aligned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HorizontalStitch {
    /// Stretch every image to this size instead of its own.
    #[serde(default)]
    pub force_dimensions: Option<Size>,
}

/// Images top to bottom, left-aligned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VerticalStitch {
    /// Stretch every image to this size instead of its own.
    #[serde(default)]
    pub force_dimensions: Option<Size>,
}

impl HorizontalStitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forced(size: Size) -> Self {
        Self {
            force_dimensions: Some(size),
        }
    }
}

impl VerticalStitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forced(size: Size) -> Self {
        Self {
            force_dimensions: Some(size),
        }
    }
}

impl Composition for HorizontalStitch {
    fn compose(&self, images: &[Image]) -> Result<Image> {
        stitch(images, self.force_dimensions, Axis::Horizontal)
    }
}

impl Composition for VerticalStitch {
    fn compose(&self, images: &[Image]) -> Result<Image> {
        stitch(images, self.force_dimensions, Axis::Vertical)
    }
}

/// Destination rectangle of each image along `axis`.
fn layout(sizes: &[Size], axis: Axis) -> Vec<Rect> {
    let mut offset = 0.0;
    sizes
        .iter()
        .map(|size| {
            let rect = match axis {
                Axis::Horizontal => Rect::new(offset, 0.0, offset + size.width, size.height),
                Axis::Vertical => Rect::new(0.0, offset, size.width, offset + size.height),
            };
            offset += match axis {
                Axis::Horizontal => size.width,
                Axis::Vertical => size.height,
            };
            rect
        })
        .collect()
}

fn stitch(images: &[Image], force: Option<Size>, axis: Axis) -> Result<Image> {
    if images.is_empty() {
        return Err(Error::invalid_image("nothing to compose"));
    }
    if let Some(size) = force {
        if !(size.width > 0.0 && size.height > 0.0 && size.is_finite()) {
            return Err(Error::invalid_image(format!("invalid forced dimensions {size:?}")));
        }
    }

    let sizes: Vec<Size> = images.iter().map(|image| force.unwrap_or_else(|| image.size())).collect();
    let rects = layout(&sizes, axis);
    let extent = rects.iter().fold(Rect::ZERO, |acc, r| acc.union(*r));

    let mut canvas = Canvas::new(pixel_extent(extent.width())?, pixel_extent(extent.height())?)?;
    {
        let mut ctx = canvas.begin_drawing();
        for (image, rect) in images.iter().zip(&rects) {
            ctx.draw_image_in_rect(image.pixels(), *rect, BlendMode::SourceOver);
        }
    }

    tracing::debug!(images = images.len(), ?axis, canvas = ?canvas.dimensions(), "stitch");
    Ok(Image::from_canvas(canvas))
}
