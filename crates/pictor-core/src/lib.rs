//! Pictor Core - Image operation library
//!
//! This crate provides image editing as reusable operations: named filters,
//! geometric transforms, procedural generators and multi-image composition,
//! all running on a CPU rendering backend.
//!
//! # Overview
//!
//! - [`Image`]: an RGBA image with copy-on-write pixels
//! - [`Operation`]: anything that edits an image in place ([`Filter`],
//!   [`Transform`], [`TransformList`], [`Pipeline`])
//! - [`Generator`]: produces a new image from parameters
//! - [`Composition`]: combines several images into one
//!
//! # Example
//!
//! ```ignore
//! use pictor_core::{filter::Blur, Filter, Image, Operation, Transform};
//!
//! let mut image = Image::from_path("photo.png")?;
//! Transform::rotate(90.0).apply_to(&mut image)?;
//! Filter::new(Blur::gaussian(3.0)).apply_to(&mut image)?;
//! image.save(None)?;
//! ```

pub mod color;
pub mod composition;
pub mod error;
pub mod filter;
pub mod generator;
pub mod image;
pub mod operation;
pub mod render;
pub mod transform;

/// Geometry types used throughout the API.
pub mod geometry {
    pub use kurbo::{Affine, Point, Rect, Size, Vec2};
}

pub use color::Color;
pub use composition::{Composition, HorizontalStitch, VerticalStitch};
pub use error::{Error, Result};
pub use filter::{Filter, FilterKind};
pub use generator::{
    CheckerboardGenerator, Generator, QrCodeGenerator, QrContent, RandomGenerator,
    RoundedRectangleGenerator, StripesGenerator, TextImageGenerator,
};
pub use self::image::{Adjustments, Image, TextStyle};
pub use operation::{Operation, Pipeline, Step, TransformList};
pub use render::{FontdueRenderer, TextRenderer};
pub use transform::{FlipDirection, Transform};

/// Container format for [`Image::save_as`].
pub use ::image::ImageFormat;
