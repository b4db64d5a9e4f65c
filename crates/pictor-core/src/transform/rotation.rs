//! Rotation geometry.
//!
//! A rotated image keeps all of its content: the canvas grows to the
//! bounding box of the rotated source, and the source is rotated about its
//! center, which lands on the new canvas center.
//!
//! ```text
//! canvas_w = w * |cos θ| + h * |sin θ|
//! canvas_h = h * |cos θ| + w * |sin θ|
//!
//! M = T(canvas_center) · R(θ) · T(-source_center)
//! ```
//!
//! Angles are in degrees, positive = clockwise on screen (y grows down).

use kurbo::{Affine, Size};

/// Tolerance for snapping angles to a multiple of 90 degrees.
const SNAP_DEGREES: f64 = 0.001;

/// Sine and cosine of `angle_degrees`, exact for multiples of 90.
fn sin_cos(angle_degrees: f64) -> (f64, f64) {
    let normalized = angle_degrees.rem_euclid(360.0);
    for (quarter, exact) in [(0.0, (0.0, 1.0)), (90.0, (1.0, 0.0)), (180.0, (0.0, -1.0)), (270.0, (-1.0, 0.0)), (360.0, (0.0, 1.0))] {
        if (normalized - quarter).abs() < SNAP_DEGREES {
            return exact;
        }
    }
    angle_degrees.to_radians().sin_cos()
}

/// Compute the dimensions of the bounding box for a rotated image.
///
/// When an image is rotated, its corners extend beyond the original
/// bounds. This is the smallest canvas containing the whole rotated image.
///
/// # Example
///
/// ```ignore
/// use pictor_core::transform::compute_rotated_bounds;
///
/// // 90-degree rotation swaps dimensions
/// assert_eq!(compute_rotated_bounds(100, 50, 90.0), (50, 100));
///
/// // No rotation preserves dimensions
/// assert_eq!(compute_rotated_bounds(100, 50, 0.0), (100, 50));
/// ```
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    // Normalize angle to handle 360, 720, etc.
    let angle_normalized = angle_degrees % 360.0;

    // Fast path: no rotation needed (including near-zero and multiples of 360)
    if angle_normalized.abs() < SNAP_DEGREES || (360.0 - angle_normalized.abs()).abs() < SNAP_DEGREES {
        return (width, height);
    }

    // Fast path: exact 90/270 degree rotations (swap dimensions)
    let abs_angle = angle_normalized.abs();
    if (abs_angle - 90.0).abs() < SNAP_DEGREES || (abs_angle - 270.0).abs() < SNAP_DEGREES {
        return (height, width);
    }

    // Fast path: exact 180 degree rotation (same dimensions)
    if (abs_angle - 180.0).abs() < SNAP_DEGREES {
        return (width, height);
    }

    let (sin, cos) = sin_cos(angle_degrees);
    let (sin, cos) = (sin.abs(), cos.abs());
    let w = width as f64;
    let h = height as f64;

    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Matrix drawing a `source`-sized image rotated by `angle_degrees` about
/// its center onto the middle of a `canvas`-sized canvas.
pub fn rotation_matrix(source: Size, canvas: Size, angle_degrees: f64) -> Affine {
    let (sin, cos) = sin_cos(angle_degrees);
    Affine::translate(canvas.to_vec2() / 2.0)
        * Affine::new([cos, sin, -sin, cos, 0.0, 0.0])
        * Affine::translate(-source.to_vec2() / 2.0)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use kurbo::{Point, Rect};
    use proptest::prelude::*;

    proptest! {
        /// Property: Opposite rotations need the same canvas.
        #[test]
        fn prop_bounds_symmetric(
            width in 1u32..=400,
            height in 1u32..=400,
            angle in -720.0f64..=720.0,
        ) {
            prop_assert_eq!(
                compute_rotated_bounds(width, height, angle),
                compute_rotated_bounds(width, height, -angle)
            );
        }

        /// Property: The rotated canvas covers every rotated source corner.
        #[test]
        fn prop_canvas_contains_rotated_corners(
            width in 1u32..=300,
            height in 1u32..=300,
            angle in -360.0f64..=360.0,
        ) {
            let (cw, ch) = compute_rotated_bounds(width, height, angle);
            let source = Size::new(width as f64, height as f64);
            let m = rotation_matrix(source, Size::new(cw as f64, ch as f64), angle);
            let footprint = m.transform_rect_bbox(Rect::from_origin_size(Point::ZERO, source));
            // Rounding the box may shave at most half a pixel per side
            prop_assert!(footprint.x0 >= -0.5 - 1e-6);
            prop_assert!(footprint.y0 >= -0.5 - 1e-6);
            prop_assert!(footprint.x1 <= cw as f64 + 0.5 + 1e-6);
            prop_assert!(footprint.y1 <= ch as f64 + 0.5 + 1e-6);
        }
    }
}
