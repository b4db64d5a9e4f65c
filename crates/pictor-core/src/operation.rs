//! The operation contract and operation sequences.
//!
//! An [`Operation`] edits an [`Image`] in place and hands the same image
//! back for chaining. Operations carry only their parameters; anything
//! derived from the image (centers, canvas sizes) is recomputed on every
//! call.
//!
//! A [`Pipeline`] is an ordered list of filter and transform steps that can
//! be loaded from JSON:
//!
//! ```json
//! {"steps": [
//!     {"transform": {"resize": {"width": 640}}},
//!     {"filter": {"kind": {"gaussian_blur": {"radius": 2}}}}
//! ]}
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::image::Image;
use crate::transform::Transform;

/// A reusable edit of an [`Image`].
pub trait Operation {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Apply the edit in place.
    ///
    /// On error the image is left as it was before the call.
    fn apply_to<'a>(&self, image: &'a mut Image) -> Result<&'a mut Image>;
}

/// Transforms applied in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformList(pub Vec<Transform>);

impl TransformList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, transform: Transform) -> Self {
        self.0.push(transform);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Transform>> for TransformList {
    fn from(transforms: Vec<Transform>) -> Self {
        Self(transforms)
    }
}

impl Operation for TransformList {
    fn name(&self) -> &str {
        "transform_list"
    }

    fn apply_to<'a>(&self, image: &'a mut Image) -> Result<&'a mut Image> {
        apply_all(self.0.iter().map(|t| t as &dyn Operation), image)
    }
}

/// One step of a [`Pipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Filter(Filter),
    Transform(Transform),
}

impl Step {
    fn operation(&self) -> &dyn Operation {
        match self {
            Self::Filter(filter) => filter as &dyn Operation,
            Self::Transform(transform) => transform as &dyn Operation,
        }
    }
}

impl From<Filter> for Step {
    fn from(filter: Filter) -> Self {
        Self::Filter(filter)
    }
}

impl From<Transform> for Step {
    fn from(transform: Transform) -> Self {
        Self::Transform(transform)
    }
}

/// Filter and transform steps applied in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, step: impl Into<Step>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Parse a pipeline from JSON text.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedFilter`] if the document does not describe a
    /// pipeline.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::unsupported_filter(format!("invalid pipeline: {e}")))
    }

    /// Read and parse a JSON pipeline file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Encode(e.to_string()))
    }
}

impl Operation for Pipeline {
    fn name(&self) -> &str {
        "pipeline"
    }

    /// Steps run in order. A failing step stops the pipeline and leaves
    /// the image as it was before the call.
    fn apply_to<'a>(&self, image: &'a mut Image) -> Result<&'a mut Image> {
        apply_all(self.steps.iter().map(Step::operation), image)
    }
}

/// Run `operations` on a shallow copy and commit only if all succeed.
fn apply_all<'o, 'a>(
    operations: impl Iterator<Item = &'o dyn Operation>,
    image: &'a mut Image,
) -> Result<&'a mut Image> {
    let mut work = image.clone();
    for (index, operation) in operations.enumerate() {
        operation.apply_to(&mut work).inspect_err(|e| {
            tracing::warn!(step = index, operation = operation.name(), error = %e, "operation failed");
        })?;
    }
    *image = work;
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Blur, ColorEffect};
    use crate::image::tests::test_image;
    use crate::transform::FlipDirection;
    use kurbo::Size;
    use std::io::Write;

    #[test]
    fn test_transform_list_threads_image() {
        let list = TransformList::new()
            .then(Transform::resize(40.0, Some(20.0)))
            .then(Transform::rotate(90.0));
        let mut image = test_image(10, 10);
        list.apply_to(&mut image).unwrap();
        assert_eq!(image.size(), Size::new(20.0, 40.0));
    }

    #[test]
    fn test_order_matters() {
        let mut a = test_image(30, 10);
        TransformList::from(vec![Transform::rotate(90.0), Transform::resize(20.0, None)])
            .apply_to(&mut a)
            .unwrap();
        let mut b = test_image(30, 10);
        TransformList::from(vec![Transform::resize(20.0, None), Transform::rotate(90.0)])
            .apply_to(&mut b)
            .unwrap();
        assert_eq!(a.size(), Size::new(20.0, 60.0));
        assert_eq!(b.size(), Size::new(7.0, 20.0));
    }

    #[test]
    fn test_empty_pipeline_leaves_image_alone() {
        let mut image = test_image(5, 5);
        Pipeline::new().apply_to(&mut image).unwrap();
        assert!(!image.is_modified());
    }

    #[test]
    fn test_failing_step_rolls_back_pipeline() {
        let pipeline = Pipeline::new()
            .then(Transform::flip(FlipDirection::Horizontal))
            .then(Transform::scale(0.0, 0.0))
            .then(Filter::new(ColorEffect::Invert));
        let original = test_image(8, 4);
        let mut image = original.clone();

        assert!(pipeline.apply_to(&mut image).is_err());
        assert_eq!(image, original);
        assert!(!image.is_modified());
        assert!(image.shares_pixels_with(&original));
    }

    #[test]
    fn test_failing_transform_rolls_back_list() {
        let list = TransformList::new()
            .then(Transform::flip(FlipDirection::Horizontal))
            .then(Transform::scale(0.0, 1.0));
        let original = test_image(6, 3);
        let mut image = original.clone();

        assert!(list.apply_to(&mut image).is_err());
        assert_eq!(image, original);
        assert!(!image.is_modified());
    }

    #[test]
    fn test_successful_list_marks_modified() {
        let mut image = test_image(6, 3);
        TransformList::new()
            .then(Transform::flip(FlipDirection::Vertical))
            .apply_to(&mut image)
            .unwrap();
        assert!(image.is_modified());
    }

    #[test]
    fn test_pipeline_json() {
        let json = r#"{"steps": [
            {"transform": {"resize": {"width": 20}}},
            {"filter": {"kind": {"gaussian_blur": {"radius": 2}}}},
            {"filter": {"kind": "invert"}}
        ]}"#;
        let pipeline = Pipeline::from_json(json).unwrap();
        assert_eq!(
            pipeline,
            Pipeline::new()
                .then(Transform::resize(20.0, None))
                .then(Filter::new(Blur::gaussian(2.0)))
                .then(Filter::new(ColorEffect::Invert))
        );

        let again = Pipeline::from_json(&pipeline.to_json().unwrap()).unwrap();
        assert_eq!(again, pipeline);

        let mut image = test_image(10, 6);
        pipeline.apply_to(&mut image).unwrap();
        assert_eq!(image.size(), Size::new(20.0, 12.0));
    }

    #[test]
    fn test_invalid_pipeline_json() {
        assert!(matches!(
            Pipeline::from_json(r#"{"steps": [{"filter": {"kind": "sparkle"}}]}"#),
            Err(Error::UnsupportedFilter(_))
        ));
    }

    #[test]
    fn test_pipeline_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"steps": [{{"transform": {{"rotate": {{"degrees": 90}}}}}}]}}"#).unwrap();
        let pipeline = Pipeline::from_path(file.path()).unwrap();
        assert_eq!(pipeline.steps, vec![Step::Transform(Transform::rotate(90.0))]);

        let missing = Pipeline::from_path(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
