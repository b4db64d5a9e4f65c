//! Crop regions.
//!
//! A crop is given either in pixels or as fractions of the image size.
//! Fractional crops resolve against the image they are applied to, so the
//! same crop can be reused across images of different sizes.
//!
//! # Coordinate System
//!
//! - Pixel crops: `Rect` in image coordinates, may extend past the image
//!   (uncovered area is transparent)
//! - Fractional crops: (0.0, 0.0) = top-left, (1.0, 1.0) = bottom-right,
//!   clamped to the image

use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Crop region resolved against the current image size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropRegion {
    /// Explicit corner and size in pixels.
    Pixels(Rect),
    /// Fractions of the image dimensions.
    Normalized {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    },
}

impl CropRegion {
    /// Pixel rectangle to keep from an image of `size`, snapped to whole
    /// pixels.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidImage`] if the region is empty or not finite.
    pub fn resolve(&self, size: Size) -> Result<Rect> {
        let rect = match *self {
            Self::Pixels(rect) => rect,
            Self::Normalized {
                left,
                top,
                width,
                height,
            } => normalized_rect(size, left, top, width, height),
        };
        let snapped = Rect::new(rect.x0.round(), rect.y0.round(), rect.x1.round(), rect.y1.round());
        let finite = [snapped.x0, snapped.y0, snapped.x1, snapped.y1]
            .iter()
            .all(|v| v.is_finite());
        if !finite || snapped.width() <= 0.0 || snapped.height() <= 0.0 {
            return Err(Error::invalid_image(format!("empty crop region {rect:?}")));
        }
        Ok(snapped)
    }
}

/// Pixel rectangle for a normalized crop, clamped to the image and at least
/// one pixel in each direction.
fn normalized_rect(size: Size, left: f64, top: f64, width: f64, height: f64) -> Rect {
    // Fast path: full crop
    if left <= 0.0 && top <= 0.0 && width >= 1.0 && height >= 1.0 {
        return Rect::from_origin_size((0.0, 0.0), size);
    }

    let px_left = (left.clamp(0.0, 1.0) * size.width).round();
    let px_top = (top.clamp(0.0, 1.0) * size.height).round();
    let px_width = (width.clamp(0.0, 1.0) * size.width).round();
    let px_height = (height.clamp(0.0, 1.0) * size.height).round();

    // Clamp to image bounds
    let px_left = px_left.min((size.width - 1.0).max(0.0));
    let px_top = px_top.min((size.height - 1.0).max(0.0));
    let px_right = (px_left + px_width).min(size.width).max(px_left + 1.0);
    let px_bottom = (px_top + px_height).min(size.height).max(px_top + 1.0);

    Rect::new(px_left, px_top, px_right, px_bottom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(left: f64, top: f64, width: f64, height: f64) -> CropRegion {
        CropRegion::Normalized {
            left,
            top,
            width,
            height,
        }
    }

    #[test]
    fn test_full_crop() {
        let rect = normalized(0.0, 0.0, 1.0, 1.0).resolve(Size::new(100.0, 80.0)).unwrap();
        assert_eq!(rect, Rect::new(0.0, 0.0, 100.0, 80.0));
    }

    #[test]
    fn test_center_crop() {
        let rect = normalized(0.2, 0.2, 0.6, 0.6).resolve(Size::new(10.0, 10.0)).unwrap();
        // 0.2 * 10 = 2, 0.6 * 10 = 6
        assert_eq!(rect, Rect::new(2.0, 2.0, 8.0, 8.0));
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        // Start at 80% and request 50%: only the remaining 2x2 survives
        let rect = normalized(0.8, 0.8, 0.5, 0.5).resolve(Size::new(10.0, 10.0)).unwrap();
        assert_eq!(rect, Rect::new(8.0, 8.0, 10.0, 10.0));
    }

    #[test]
    fn test_crop_handles_negative_coords() {
        let rect = normalized(-0.1, -0.1, 0.5, 0.5).resolve(Size::new(100.0, 100.0)).unwrap();
        assert_eq!(rect, Rect::new(0.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn test_zero_size_normalized_crop_keeps_one_pixel() {
        let rect = normalized(0.5, 0.5, 0.0, 0.0).resolve(Size::new(10.0, 10.0)).unwrap();
        assert_eq!(rect, Rect::new(5.0, 5.0, 6.0, 6.0));
    }

    #[test]
    fn test_pixel_crop_may_extend_past_image() {
        let rect = CropRegion::Pixels(Rect::new(-5.0, 0.0, 20.0, 10.2))
            .resolve(Size::new(10.0, 10.0))
            .unwrap();
        assert_eq!(rect, Rect::new(-5.0, 0.0, 20.0, 10.0));
    }

    #[test]
    fn test_empty_pixel_crop_fails() {
        let result = CropRegion::Pixels(Rect::new(3.0, 3.0, 3.2, 9.0)).resolve(Size::new(10.0, 10.0));
        assert!(matches!(result, Err(Error::InvalidImage(_))));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for generating image dimensions (keep reasonable for speed).
    fn dimensions_strategy() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=400, 1u32..=400)
    }

    /// Strategy for generating normalized crop coordinates.
    fn crop_coords_strategy() -> impl Strategy<Value = (f64, f64, f64, f64)> {
        (
            -0.5f64..=1.5, // left
            -0.5f64..=1.5, // top
            0.0f64..=1.5,  // width
            0.0f64..=1.5,  // height
        )
    }

    proptest! {
        /// Property: Normalized crops always keep at least one pixel inside
        /// the image.
        #[test]
        fn prop_normalized_crop_within_image(
            (width, height) in dimensions_strategy(),
            (left, top, crop_w, crop_h) in crop_coords_strategy(),
        ) {
            let size = Size::new(width as f64, height as f64);
            let rect = normalized(left, top, crop_w, crop_h).resolve(size).unwrap();

            prop_assert!(rect.width() >= 1.0 && rect.height() >= 1.0);
            prop_assert!(rect.x0 >= 0.0 && rect.y0 >= 0.0);
            prop_assert!(rect.x1 <= size.width && rect.y1 <= size.height);
        }

        /// Property: Resolved crops sit on whole pixels.
        #[test]
        fn prop_crop_is_pixel_aligned(
            (width, height) in dimensions_strategy(),
            (left, top, crop_w, crop_h) in crop_coords_strategy(),
        ) {
            let size = Size::new(width as f64, height as f64);
            let rect = normalized(left, top, crop_w, crop_h).resolve(size).unwrap();
            for v in [rect.x0, rect.y0, rect.x1, rect.y1] {
                prop_assert_eq!(v, v.round());
            }
        }
    }

    fn normalized(left: f64, top: f64, width: f64, height: f64) -> CropRegion {
        CropRegion::Normalized {
            left,
            top,
            width,
            height,
        }
    }
}
