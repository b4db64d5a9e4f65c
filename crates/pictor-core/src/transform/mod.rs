//! Geometric transforms: flip, rotate, scale, resize and crop.
//!
//! Every transform plans its output from the *current* image size:
//!
//! 1. The output canvas size
//! 2. A source-to-canvas affine matrix
//! 3. The source rectangle to draw (the whole image, or the crop region)
//!
//! and then redraws the source through the matrix onto a fresh transparent
//! canvas. Plans are recomputed on every call, so a transform value can be
//! applied to images of any size.
//!
//! # Coordinate System
//!
//! - Origin is top-left corner, y grows downward
//! - Rotation angles are in degrees, positive = clockwise
//! - Pixels are sampled at their centers; flips and quarter turns are
//!   lossless

mod crop;
mod rotation;

use kurbo::{Affine, Rect, Size};
use serde::{Deserialize, Serialize};

pub use crop::CropRegion;
pub use rotation::{compute_rotated_bounds, rotation_matrix};

use crate::error::{Error, Result};
use crate::image::Image;
use crate::operation::Operation;
use crate::render::{pixel_extent, BlendMode, Canvas};

/// Mirror axis for [`Transform::Flip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipDirection {
    /// Mirror left to right.
    Horizontal,
    /// Mirror top to bottom.
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Flip {
        direction: FlipDirection,
    },
    /// Rotate about the center, growing the canvas to fit.
    Rotate {
        degrees: f64,
    },
    /// Multiply the dimensions by per-axis factors.
    Scale {
        x: f64,
        y: f64,
    },
    /// Resize to `width`; `height` keeps the aspect ratio when omitted.
    Resize {
        width: f64,
        #[serde(default)]
        height: Option<f64>,
    },
    Crop {
        region: CropRegion,
    },
}

/// Geometry of one transform application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformPlan {
    pub canvas: (u32, u32),
    /// Maps source coordinates onto the canvas.
    pub matrix: Affine,
    /// Part of the source to draw.
    pub source: Rect,
}

impl Transform {
    pub fn flip(direction: FlipDirection) -> Self {
        Self::Flip { direction }
    }

    pub fn rotate(degrees: f64) -> Self {
        Self::Rotate { degrees }
    }

    pub fn scale(x: f64, y: f64) -> Self {
        Self::Scale { x, y }
    }

    pub fn scale_uniform(factor: f64) -> Self {
        Self::Scale { x: factor, y: factor }
    }

    pub fn resize(width: f64, height: Option<f64>) -> Self {
        Self::Resize { width, height }
    }

    pub fn crop(rect: Rect) -> Self {
        Self::Crop {
            region: CropRegion::Pixels(rect),
        }
    }

    /// Crop to fractions of the image size.
    pub fn crop_normalized(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::Crop {
            region: CropRegion::Normalized {
                left,
                top,
                width,
                height,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Flip { .. } => "flip",
            Self::Rotate { .. } => "rotate",
            Self::Scale { .. } => "scale",
            Self::Resize { .. } => "resize",
            Self::Crop { .. } => "crop",
        }
    }

    /// Plan this transform for an image of `width x height` pixels.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidImage`] if the output would be empty or the
    /// parameters are not finite.
    pub fn plan(&self, width: u32, height: u32) -> Result<TransformPlan> {
        let size = Size::new(width as f64, height as f64);
        let full = Rect::from_origin_size((0.0, 0.0), size);

        let plan = match *self {
            Self::Flip { direction } => {
                let matrix = match direction {
                    FlipDirection::Horizontal => Affine::new([-1.0, 0.0, 0.0, 1.0, size.width, 0.0]),
                    FlipDirection::Vertical => Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, size.height]),
                };
                TransformPlan {
                    canvas: (width, height),
                    matrix,
                    source: full,
                }
            }
            Self::Rotate { degrees } => {
                if !degrees.is_finite() {
                    return Err(Error::invalid_image(format!("invalid rotation {degrees}")));
                }
                let canvas = compute_rotated_bounds(width, height, degrees);
                let matrix = rotation_matrix(size, Size::new(canvas.0 as f64, canvas.1 as f64), degrees);
                TransformPlan {
                    canvas,
                    matrix,
                    source: full,
                }
            }
            Self::Scale { x, y } => {
                scaled_plan(full, pixel_extent(size.width * x)?, pixel_extent(size.height * y)?)
            }
            Self::Resize {
                width: target_width,
                height: target_height,
            } => {
                // Aspect ratio from the pre-resize dimensions
                let target_height = target_height.unwrap_or(size.height * target_width / size.width);
                scaled_plan(full, pixel_extent(target_width)?, pixel_extent(target_height)?)
            }
            Self::Crop { region } => {
                let rect = region.resolve(size)?;
                TransformPlan {
                    canvas: (pixel_extent(rect.width())?, pixel_extent(rect.height())?),
                    matrix: Affine::translate((-rect.x0, -rect.y0)),
                    source: rect,
                }
            }
        };
        Ok(plan)
    }
}

/// Stretch the whole source onto a `width x height` canvas.
fn scaled_plan(full: Rect, width: u32, height: u32) -> TransformPlan {
    let sx = width as f64 / full.width();
    let sy = height as f64 / full.height();
    TransformPlan {
        canvas: (width, height),
        matrix: Affine::scale_non_uniform(sx, sy),
        source: full,
    }
}

impl Operation for Transform {
    fn name(&self) -> &str {
        self.label()
    }

    fn apply_to<'a>(&self, image: &'a mut Image) -> Result<&'a mut Image> {
        image.ensure_drawable()?;
        let (width, height) = (image.width(), image.height());
        let plan = self.plan(width, height)?;

        let mut canvas = Canvas::new(plan.canvas.0, plan.canvas.1)?;
        canvas
            .begin_drawing()
            .draw_image(image.pixels(), plan.source, plan.matrix, BlendMode::Copy);

        tracing::debug!(
            transform = self.label(),
            input = ?(width, height),
            output = ?plan.canvas,
            "apply transform"
        );
        image.replace_pixels(canvas.into_pixels());
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::test_image;
    use ::image::{Rgba, RgbaImage};

    fn apply(transform: Transform, image: &Image) -> Image {
        let mut out = image.clone();
        transform.apply_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let image = test_image(30, 17);
        let out = apply(Transform::rotate(0.0), &image);
        assert_eq!(out, image);
        assert!(out.is_modified());
    }

    #[test]
    fn test_double_flip_is_identity() {
        let image = test_image(13, 9);
        for direction in [FlipDirection::Horizontal, FlipDirection::Vertical] {
            let once = apply(Transform::flip(direction), &image);
            assert_ne!(once, image);
            assert_eq!(apply(Transform::flip(direction), &once), image);
        }
    }

    #[test]
    fn test_horizontal_flip_mirrors_columns() {
        let image = test_image(10, 4);
        let out = apply(Transform::flip(FlipDirection::Horizontal), &image);
        assert_eq!(out.pixels().get_pixel(0, 2), image.pixels().get_pixel(9, 2));
        assert_eq!(out.pixels().get_pixel(9, 3), image.pixels().get_pixel(0, 3));
    }

    #[test]
    fn test_rotate_90_is_lossless_and_clockwise() {
        let image = test_image(6, 4);
        let out = apply(Transform::rotate(90.0), &image);
        assert_eq!(out.size(), Size::new(4.0, 6.0));
        // Clockwise: source (x, y) lands at (h - 1 - y, x)
        for y in 0..4 {
            for x in 0..6 {
                assert_eq!(out.pixels().get_pixel(3 - y, x), image.pixels().get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_four_quarter_turns_are_identity() {
        let image = test_image(7, 5);
        let mut out = image.clone();
        for _ in 0..4 {
            Transform::rotate(90.0).apply_to(&mut out).unwrap();
        }
        assert_eq!(out, image);
    }

    #[test]
    fn test_rotate_45_grows_canvas_with_transparent_corners() {
        let image = Image::from_pixels(RgbaImage::from_pixel(100, 100, Rgba([200, 0, 0, 255])));
        let out = apply(Transform::rotate(45.0), &image);
        assert_eq!(out.size(), Size::new(141.0, 141.0));
        assert_eq!(out.pixels().get_pixel(0, 0)[3], 0);
        assert_eq!(out.pixels().get_pixel(70, 70), &Rgba([200, 0, 0, 255]));
    }

    #[test]
    fn test_resize_keeps_aspect_ratio() {
        let image = test_image(100, 50);
        let out = apply(Transform::resize(200.0, None), &image);
        assert_eq!(out.size(), Size::new(200.0, 100.0));

        let out = apply(Transform::resize(30.0, Some(90.0)), &image);
        assert_eq!(out.size(), Size::new(30.0, 90.0));
    }

    #[test]
    fn test_resize_reused_across_sizes() {
        let resize = Transform::resize(50.0, None);
        assert_eq!(apply(resize, &test_image(100, 50)).size(), Size::new(50.0, 25.0));
        assert_eq!(apply(resize, &test_image(10, 40)).size(), Size::new(50.0, 200.0));
    }

    #[test]
    fn test_integer_upscale_replicates_pixels() {
        let image = test_image(3, 2);
        let out = apply(Transform::scale_uniform(2.0), &image);
        assert_eq!(out.size(), Size::new(6.0, 4.0));
        // Output centers map to source x = 0.25, 0.75: exact at edges
        assert_eq!(out.pixels().get_pixel(0, 0), image.pixels().get_pixel(0, 0));
        assert_eq!(out.pixels().get_pixel(5, 3), image.pixels().get_pixel(2, 1));
    }

    #[test]
    fn test_scale_to_nothing_fails() {
        let mut image = test_image(10, 10);
        let result = Transform::scale(0.0, 1.0).apply_to(&mut image);
        assert!(matches!(result, Err(Error::InvalidImage(_))));
        assert!(!image.is_modified());
    }

    #[test]
    fn test_resize_beyond_canvas_limit_fails() {
        let mut image = test_image(4, 4);
        let before = image.clone();
        let result = Transform::resize(4e9, Some(4e9)).apply_to(&mut image);
        assert!(matches!(result, Err(Error::InvalidImage(_))));
        assert_eq!(image, before);

        let result = Transform::scale(1e5, 1e5).apply_to(&mut image);
        assert!(matches!(result, Err(Error::InvalidImage(_))));
        assert!(!image.is_modified());
    }

    #[test]
    fn test_crop_keeps_region() {
        let image = test_image(20, 20);
        let out = apply(Transform::crop(Rect::new(5.0, 6.0, 15.0, 10.0)), &image);
        assert_eq!(out.size(), Size::new(10.0, 4.0));
        assert_eq!(out.pixels().get_pixel(0, 0), image.pixels().get_pixel(5, 6));
        assert_eq!(out.pixels().get_pixel(9, 3), image.pixels().get_pixel(14, 9));
    }

    #[test]
    fn test_crop_past_edge_is_transparent() {
        let image = test_image(10, 10);
        let out = apply(Transform::crop(Rect::new(5.0, 5.0, 15.0, 15.0)), &image);
        assert_eq!(out.size(), Size::new(10.0, 10.0));
        assert_eq!(out.pixels().get_pixel(0, 0), image.pixels().get_pixel(5, 5));
        assert_eq!(out.pixels().get_pixel(9, 9)[3], 0);
    }

    #[test]
    fn test_normalized_crop() {
        let image = test_image(40, 20);
        let out = apply(Transform::crop_normalized(0.5, 0.0, 0.5, 0.5), &image);
        assert_eq!(out.size(), Size::new(20.0, 10.0));
        assert_eq!(out.pixels().get_pixel(0, 0), image.pixels().get_pixel(20, 0));
    }

    #[test]
    fn test_transform_on_empty_image_fails() {
        let mut image = Image::from_pixels(RgbaImage::new(0, 5));
        assert!(matches!(
            Transform::rotate(10.0).apply_to(&mut image),
            Err(Error::InvalidImage(_))
        ));
    }

    #[test]
    fn test_serde_format() {
        let t: Transform = serde_json::from_str(r#"{"resize": {"width": 64}}"#).unwrap();
        assert_eq!(t, Transform::resize(64.0, None));
        let t: Transform = serde_json::from_str(r#"{"flip": {"direction": "vertical"}}"#).unwrap();
        assert_eq!(t, Transform::flip(FlipDirection::Vertical));
        let t: Transform = serde_json::from_str(
            r#"{"crop": {"region": {"normalized": {"left": 0, "top": 0, "width": 0.5, "height": 1}}}}"#,
        )
        .unwrap();
        assert_eq!(t, Transform::crop_normalized(0.0, 0.0, 0.5, 1.0));
    }
}
