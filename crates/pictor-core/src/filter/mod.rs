//! Named filters.
//!
//! A [`Filter`] pairs one [`FilterKind`] with optional output bounds. On
//! every application it:
//!
//! 1. Rejects zero-area images
//! 2. Resolves defaulted geometry (centers) against the current image
//! 3. Invokes the backend filter by name
//! 4. Crops the possibly overscanned result to the original frame, or to
//!    the forced `bounds`
//! 5. Commits the result and marks the image modified
//!
//! Resolved values live only for the duration of the call, so one filter
//! value can be applied to images of any size.
//!
//! # Example
//! ```ignore
//! use pictor_core::{Filter, Operation, filter::Blur};
//!
//! let mut image = pictor_core::Image::from_path("photo.png")?;
//! Filter::from(Blur::gaussian(4.0)).apply_to(&mut image)?;
//! ```

mod blur;
mod color_effect;
mod distortion;
mod stylize;

use kurbo::Rect;
use serde::{Deserialize, Serialize};

pub use blur::Blur;
pub use color_effect::{ColorEffect, NEUTRAL_TEMPERATURE};
pub use distortion::Distortion;
pub use stylize::Stylize;

use crate::error::{Error, Result};
use crate::image::Image;
use crate::operation::Operation;
use crate::render::{CpuBackend, FilterBackend, FilterInvocation};

/// Every filter, grouped by family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterKind {
    Blur(Blur),
    Color(ColorEffect),
    Stylize(Stylize),
    Distortion(Distortion),
}

impl FilterKind {
    /// Short snake_case name, e.g. `gaussian_blur`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Blur(f) => f.label(),
            Self::Color(f) => f.label(),
            Self::Stylize(f) => f.label(),
            Self::Distortion(f) => f.label(),
        }
    }

    /// Backend invocation for an image occupying `frame`.
    pub fn invocation(&self, frame: Rect) -> FilterInvocation {
        match self {
            Self::Blur(f) => f.invocation(frame),
            Self::Color(f) => f.invocation(),
            Self::Stylize(f) => f.invocation(frame),
            Self::Distortion(f) => f.invocation(frame),
        }
    }
}

impl From<Blur> for FilterKind {
    fn from(f: Blur) -> Self {
        Self::Blur(f)
    }
}

impl From<ColorEffect> for FilterKind {
    fn from(f: ColorEffect) -> Self {
        Self::Color(f)
    }
}

impl From<Stylize> for FilterKind {
    fn from(f: Stylize) -> Self {
        Self::Stylize(f)
    }
}

impl From<Distortion> for FilterKind {
    fn from(f: Distortion) -> Self {
        Self::Distortion(f)
    }
}

/// A filter operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub kind: FilterKind,
    /// Output frame in input coordinates; the input's bounds when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Rect>,
}

impl Filter {
    pub fn new(kind: impl Into<FilterKind>) -> Self {
        Self {
            kind: kind.into(),
            bounds: None,
        }
    }

    /// Force the output frame instead of cropping to the input's bounds.
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Apply through an explicit backend.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidImage`] if the image has zero area
    /// - [`Error::UnsupportedFilter`] if `backend` lacks the filter
    ///
    /// On error the image is unchanged.
    pub fn apply_with<'a>(&self, backend: &dyn FilterBackend, image: &'a mut Image) -> Result<&'a mut Image> {
        image.ensure_drawable()?;

        let frame = image.bounds();
        let invocation = self.kind.invocation(frame);
        if !backend.supports(&invocation.name) {
            return Err(Error::unsupported_filter(invocation.name));
        }

        let overscan = backend.apply_filter(&invocation, image.pixels())?;
        let target = self.bounds.unwrap_or(frame);
        let pixels = overscan.crop_to(target)?;

        tracing::debug!(
            filter = self.kind.label(),
            input = ?frame.size(),
            extent = ?overscan.extent(),
            output = ?(pixels.width(), pixels.height()),
            "apply filter"
        );
        image.replace_pixels(pixels);
        Ok(image)
    }
}

macro_rules! filter_from {
    ($($family:ty),*) => {
        $(
            impl From<$family> for Filter {
                fn from(kind: $family) -> Self {
                    Self::new(kind)
                }
            }
        )*
    };
}

filter_from!(FilterKind, Blur, ColorEffect, Stylize, Distortion);

impl Operation for Filter {
    fn name(&self) -> &str {
        self.kind.label()
    }

    fn apply_to<'a>(&self, image: &'a mut Image) -> Result<&'a mut Image> {
        self.apply_with(&CpuBackend, image)
    }
}
