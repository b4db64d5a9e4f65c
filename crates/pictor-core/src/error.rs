//! Error types shared by every operation in the crate.

use thiserror::Error;

/// Convenience result type used across pictor.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for image operations.
///
/// Operations fail fast and never leave a partially mutated image behind:
/// new pixel data is computed into a separate buffer and only swapped in
/// once every fallible step has succeeded.
#[derive(Debug, Error)]
pub enum Error {
    /// The image has zero area or its data could not be decoded.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The backend has no filter with this name, or a parameter is missing
    /// or has the wrong type.
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// `save` was called without a path on an image that was not loaded
    /// from a file.
    #[error("No destination path: image has no source file and no path was given")]
    NoDestination,

    /// A location lies outside the target canvas.
    #[error("Location ({x}, {y}) is outside the {width}x{height} canvas")]
    OutOfBounds {
        x: f64,
        y: f64,
        width: u32,
        height: u32,
    },

    /// Encoding pixel data into a container format failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// A font could not be loaded or a glyph could not be rendered.
    #[error("Font error: {0}")]
    Font(String),

    /// The QR code payload could not be encoded.
    #[error("QR code error: {0}")]
    QrCode(String),

    /// Fetching an image from a URL failed.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// I/O error while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an [`Error::InvalidImage`] value.
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Build an [`Error::UnsupportedFilter`] value.
    pub fn unsupported_filter(msg: impl Into<String>) -> Self {
        Self::UnsupportedFilter(msg.into())
    }
}
