//! Named filter engine.
//!
//! Filters are invoked by name with a bag of typed parameters, mirroring the
//! way CoreImage-style engines are driven. A backend returns an
//! [`Overscan`]: a result that may extend past the input's bounds (blurs
//! spread outward). Callers crop it back to the frame they want.

use std::collections::BTreeMap;

use image::{Rgba, RgbaImage};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use super::kernels::{blur, color, distort, stylize};
use super::{ensure_area, pixel_extent};
use crate::color::Color;
use crate::error::{Error, Result};

/// A single typed filter parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    Number(f64),
    Point(Point),
    Color(Color),
}

/// Filter parameters keyed by their engine name (`inputRadius`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterParams(BTreeMap<String, ParamValue>);

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: ParamValue) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn with_number(self, key: &str, value: f64) -> Self {
        self.with(key, ParamValue::Number(value))
    }

    pub fn with_point(self, key: &str, value: Point) -> Self {
        self.with(key, ParamValue::Point(value))
    }

    pub fn with_color(self, key: &str, value: Color) -> Self {
        self.with(key, ParamValue::Color(value))
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fetch a numeric parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFilter`] if the key is missing, not a
    /// number, or not finite.
    pub fn number(&self, key: &str) -> Result<f64> {
        match self.0.get(key) {
            Some(ParamValue::Number(v)) if v.is_finite() => Ok(*v),
            Some(other) => Err(Error::unsupported_filter(format!(
                "parameter {key} has unexpected value {other:?}"
            ))),
            None => Err(Error::unsupported_filter(format!("missing parameter {key}"))),
        }
    }

    pub fn point(&self, key: &str) -> Result<Point> {
        match self.0.get(key) {
            Some(ParamValue::Point(p)) if p.is_finite() => Ok(*p),
            Some(other) => Err(Error::unsupported_filter(format!(
                "parameter {key} has unexpected value {other:?}"
            ))),
            None => Err(Error::unsupported_filter(format!("missing parameter {key}"))),
        }
    }

    pub fn color(&self, key: &str) -> Result<Color> {
        match self.0.get(key) {
            Some(ParamValue::Color(c)) => Ok(*c),
            Some(other) => Err(Error::unsupported_filter(format!(
                "parameter {key} has unexpected value {other:?}"
            ))),
            None => Err(Error::unsupported_filter(format!("missing parameter {key}"))),
        }
    }
}

/// A filter call: engine name plus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterInvocation {
    pub name: String,
    pub params: FilterParams,
}

impl FilterInvocation {
    pub fn new(name: impl Into<String>, params: FilterParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// A filter result that may extend beyond the input frame.
#[derive(Debug, Clone)]
pub struct Overscan {
    /// Result pixels.
    pub image: RgbaImage,
    /// Position of `image`'s top-left pixel in input coordinates.
    pub origin: (i64, i64),
}

impl Overscan {
    /// A result aligned with the input frame.
    pub fn aligned(image: RgbaImage) -> Self {
        Self {
            image,
            origin: (0, 0),
        }
    }

    /// Extent of the result in input coordinates.
    pub fn extent(&self) -> Rect {
        Rect::new(
            self.origin.0 as f64,
            self.origin.1 as f64,
            (self.origin.0 + self.image.width() as i64) as f64,
            (self.origin.1 + self.image.height() as i64) as f64,
        )
    }

    /// Crop to `rect` (in input coordinates, snapped to whole pixels).
    ///
    /// The output always has `rect`'s size; areas the result does not cover
    /// are transparent.
    pub fn crop_to(&self, rect: Rect) -> Result<RgbaImage> {
        let width = pixel_extent(rect.width())?;
        let height = pixel_extent(rect.height())?;
        ensure_area(width, height)?;
        let left = rect.x0.round() as i64 - self.origin.0;
        let top = rect.y0.round() as i64 - self.origin.1;
        let (src_w, src_h) = (self.image.width() as i64, self.image.height() as i64);

        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let sx = left + x as i64;
            let sy = top + y as i64;
            if sx < 0 || sy < 0 || sx >= src_w || sy >= src_h {
                Rgba([0, 0, 0, 0])
            } else {
                *self.image.get_pixel(sx as u32, sy as u32)
            }
        }))
    }
}

/// A backend able to run named filters.
pub trait FilterBackend {
    /// Run `invocation` on `input`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFilter`] if the name is unknown or a
    /// parameter is missing or mistyped.
    fn apply_filter(&self, invocation: &FilterInvocation, input: &RgbaImage) -> Result<Overscan>;

    /// Whether this backend knows the filter `name`.
    fn supports(&self, name: &str) -> bool;
}

/// The built-in CPU filter engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CpuBackend {
    /// Every filter name this backend implements.
    pub const FILTERS: &'static [&'static str] = &[
        "CIGaussianBlur",
        "CIBoxBlur",
        "CIDiscBlur",
        "CIMotionBlur",
        "CIZoomBlur",
        "CIMedianFilter",
        "CINoiseReduction",
        "CIBokehBlur",
        "CIDepthOfField",
        "CISepiaTone",
        "CIColorInvert",
        "CIPhotoEffectMono",
        "CIPhotoEffectNoir",
        "CIPhotoEffectTonal",
        "CIPhotoEffectChrome",
        "CIPhotoEffectFade",
        "CIPhotoEffectInstant",
        "CIPhotoEffectProcess",
        "CIPhotoEffectTransfer",
        "CIColorMonochrome",
        "CIVignette",
        "CIXRay",
        "CIThermal",
        "CIGammaAdjust",
        "CIVibrance",
        "CITemperatureAndTint",
        "CIWhitePointAdjust",
        "CIHighlightShadowAdjust",
        "CIColorPosterize",
        "CIPixellate",
        "CIEdges",
        "CIBloom",
        "CIGloom",
        "CIComicEffect",
        "CICrystallize",
        "CIPointillize",
        "CIHexagonalPixellate",
        "CIEdgeWork",
        "CILineOverlay",
        "CIBumpDistortion",
        "CIPinchDistortion",
        "CITwirlDistortion",
        "CIHoleDistortion",
        "CICircleSplashDistortion",
        "CILightTunnel",
        "CICircularWrap",
        "CIBumpDistortionLinear",
        "CITorusLensDistortion",
        "CIVortexDistortion",
    ];
}

impl FilterBackend for CpuBackend {
    fn supports(&self, name: &str) -> bool {
        Self::FILTERS.contains(&name)
    }

    fn apply_filter(&self, invocation: &FilterInvocation, input: &RgbaImage) -> Result<Overscan> {
        let p = &invocation.params;
        let name = invocation.name.as_str();
        tracing::trace!(filter = name, params = p.len(), "cpu filter");

        let out = match name {
            // Blur
            "CIGaussianBlur" => blur::gaussian(input, p.number("inputRadius")?),
            "CIBoxBlur" => blur::box_blur(input, p.number("inputRadius")?),
            "CIDiscBlur" => blur::disc(input, p.number("inputRadius")?),
            "CIMotionBlur" => {
                blur::motion(input, p.number("inputRadius")?, p.number("inputAngle")?)
            }
            "CIZoomBlur" => Overscan::aligned(blur::zoom(
                input,
                p.point("inputCenter")?,
                p.number("inputAmount")?,
            )),
            "CIMedianFilter" => Overscan::aligned(blur::median(input)),
            "CINoiseReduction" => Overscan::aligned(blur::noise_reduction(
                input,
                p.number("inputNoiseLevel")?,
                p.number("inputSharpness")?,
            )),
            "CIBokehBlur" => blur::bokeh(
                input,
                p.number("inputRadius")?,
                p.number("inputRingAmount")?,
                p.number("inputRingSize")?,
                p.number("inputSoftness")?,
            ),
            "CIDepthOfField" => Overscan::aligned(blur::depth_of_field(
                input,
                p.point("inputPoint0")?,
                p.point("inputPoint1")?,
                p.number("inputRadius")?,
                p.number("inputSaturation")?,
            )),

            // Color
            "CISepiaTone" => Overscan::aligned(color::sepia(input, p.number("inputIntensity")?)),
            "CIColorInvert" => Overscan::aligned(color::invert(input)),
            "CIPhotoEffectMono" => Overscan::aligned(color::mono(input)),
            "CIPhotoEffectNoir" => Overscan::aligned(color::noir(input)),
            "CIPhotoEffectTonal" => Overscan::aligned(color::tonal(input)),
            "CIPhotoEffectChrome" => Overscan::aligned(color::chrome(input)),
            "CIPhotoEffectFade" => Overscan::aligned(color::fade(input)),
            "CIPhotoEffectInstant" => Overscan::aligned(color::instant(input)),
            "CIPhotoEffectProcess" => Overscan::aligned(color::process(input)),
            "CIPhotoEffectTransfer" => Overscan::aligned(color::transfer(input)),
            "CIColorMonochrome" => Overscan::aligned(color::monochrome(
                input,
                p.color("inputColor")?,
                p.number("inputIntensity")?,
            )),
            "CIVignette" => Overscan::aligned(color::vignette(
                input,
                p.number("inputIntensity")?,
                p.number("inputRadius")?,
            )),
            "CIXRay" => Overscan::aligned(color::xray(input)),
            "CIThermal" => Overscan::aligned(color::thermal(input)),
            "CIGammaAdjust" => Overscan::aligned(color::gamma(input, p.number("inputPower")?)),
            "CIVibrance" => Overscan::aligned(color::vibrance(input, p.number("inputAmount")?)),
            "CITemperatureAndTint" => Overscan::aligned(color::temperature_and_tint(
                input,
                p.point("inputNeutral")?,
                p.point("inputTargetNeutral")?,
            )),
            "CIWhitePointAdjust" => {
                Overscan::aligned(color::white_point(input, p.color("inputColor")?))
            }
            "CIHighlightShadowAdjust" => Overscan::aligned(color::highlight_shadow(
                input,
                p.number("inputHighlightAmount")?,
                p.number("inputShadowAmount")?,
            )),
            "CIColorPosterize" => {
                Overscan::aligned(color::posterize(input, p.number("inputLevels")?))
            }

            // Stylize
            "CIPixellate" => Overscan::aligned(stylize::pixellate(
                input,
                p.number("inputScale")?,
                p.point("inputCenter")?,
            )),
            "CIEdges" => Overscan::aligned(stylize::edges(input, p.number("inputIntensity")?)),
            "CIBloom" => stylize::bloom(input, p.number("inputRadius")?, p.number("inputIntensity")?),
            "CIGloom" => stylize::gloom(input, p.number("inputRadius")?, p.number("inputIntensity")?),
            "CIComicEffect" => Overscan::aligned(stylize::comic(input)),
            "CICrystallize" => Overscan::aligned(stylize::crystallize(input, p.number("inputRadius")?)),
            "CIPointillize" => Overscan::aligned(stylize::pointillize(input, p.number("inputRadius")?)),
            "CIHexagonalPixellate" => Overscan::aligned(stylize::hexagonal_pixellate(
                input,
                p.number("inputScale")?,
                p.point("inputCenter")?,
            )),
            "CIEdgeWork" => Overscan::aligned(stylize::edge_work(input, p.number("inputRadius")?)),
            "CILineOverlay" => Overscan::aligned(stylize::line_overlay(
                input,
                p.number("inputNRNoiseLevel")?,
                p.number("inputNRSharpness")?,
                p.number("inputEdgeIntensity")?,
                p.number("inputThreshold")?,
                p.number("inputContrast")?,
            )),

            // Distortion
            "CIBumpDistortion" => Overscan::aligned(distort::bump(
                input,
                p.point("inputCenter")?,
                p.number("inputRadius")?,
                p.number("inputScale")?,
            )),
            "CIPinchDistortion" => Overscan::aligned(distort::pinch(
                input,
                p.point("inputCenter")?,
                p.number("inputRadius")?,
                p.number("inputScale")?,
            )),
            "CITwirlDistortion" => Overscan::aligned(distort::twirl(
                input,
                p.point("inputCenter")?,
                p.number("inputRadius")?,
                p.number("inputAngle")?,
            )),
            "CIHoleDistortion" => Overscan::aligned(distort::hole(
                input,
                p.point("inputCenter")?,
                p.number("inputRadius")?,
            )),
            "CICircleSplashDistortion" => Overscan::aligned(distort::circle_splash(
                input,
                p.point("inputCenter")?,
                p.number("inputRadius")?,
            )),
            "CILightTunnel" => Overscan::aligned(distort::light_tunnel(
                input,
                p.point("inputCenter")?,
                p.number("inputRadius")?,
                p.number("inputRotation")?,
            )),
            "CICircularWrap" => Overscan::aligned(distort::circular_wrap(
                input,
                p.point("inputCenter")?,
                p.number("inputRadius")?,
                p.number("inputAngle")?,
            )),
            "CIBumpDistortionLinear" => Overscan::aligned(distort::linear_bump(
                input,
                p.point("inputCenter")?,
                p.number("inputRadius")?,
                p.number("inputAngle")?,
                p.number("inputScale")?,
            )),
            "CITorusLensDistortion" => Overscan::aligned(distort::torus_lens(
                input,
                p.point("inputCenter")?,
                p.number("inputRadius")?,
                p.number("inputWidth")?,
                p.number("inputRefraction")?,
            )),
            "CIVortexDistortion" => Overscan::aligned(distort::vortex(
                input,
                p.point("inputCenter")?,
                p.number("inputRadius")?,
                p.number("inputAngle")?,
            )),

            other => {
                return Err(Error::unsupported_filter(format!(
                    "no backend filter named {other}"
                )))
            }
        };

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 20 % 256) as u8, (y * 20 % 256) as u8, 100, 255])
        })
    }

    #[test]
    fn test_unknown_filter_is_unsupported() {
        let invocation = FilterInvocation::new("CISpotLight", FilterParams::new());
        let err = CpuBackend.apply_filter(&invocation, &test_image(4, 4)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFilter(_)));
        assert!(!CpuBackend.supports("CISpotLight"));
    }

    #[test]
    fn test_missing_parameter_is_unsupported() {
        let invocation = FilterInvocation::new("CIGaussianBlur", FilterParams::new());
        let err = CpuBackend.apply_filter(&invocation, &test_image(4, 4)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFilter(msg) if msg.contains("inputRadius")));
    }

    #[test]
    fn test_mistyped_parameter_is_unsupported() {
        let params = FilterParams::new().with_point("inputRadius", Point::new(1.0, 2.0));
        let invocation = FilterInvocation::new("CIGaussianBlur", params);
        assert!(CpuBackend.apply_filter(&invocation, &test_image(4, 4)).is_err());

        let params = FilterParams::new().with_number("inputRadius", f64::NAN);
        let invocation = FilterInvocation::new("CIGaussianBlur", params);
        assert!(CpuBackend.apply_filter(&invocation, &test_image(4, 4)).is_err());
    }

    #[test]
    fn test_every_listed_filter_is_supported() {
        for name in CpuBackend::FILTERS {
            assert!(CpuBackend.supports(name), "{name} should be supported");
        }
    }

    #[test]
    fn test_blur_overscans_input() {
        let params = FilterParams::new().with_number("inputRadius", 2.0);
        let invocation = FilterInvocation::new("CIGaussianBlur", params);
        let out = CpuBackend.apply_filter(&invocation, &test_image(10, 8)).unwrap();

        assert!(out.origin.0 < 0 && out.origin.1 < 0);
        let extent = out.extent();
        assert!(extent.contains_rect(Rect::new(0.0, 0.0, 10.0, 8.0)));
    }

    #[test]
    fn test_crop_to_restores_frame() {
        let image = test_image(6, 6);
        let overscan = Overscan {
            image: image.clone(),
            origin: (-2, -1),
        };
        let cropped = overscan.crop_to(Rect::new(0.0, 0.0, 3.0, 3.0)).unwrap();
        assert_eq!(cropped.dimensions(), (3, 3));
        assert_eq!(cropped.get_pixel(0, 0), image.get_pixel(2, 1));
    }

    #[test]
    fn test_crop_to_fills_uncovered_area_with_transparency() {
        let overscan = Overscan::aligned(test_image(4, 4));
        let cropped = overscan.crop_to(Rect::new(2.0, 2.0, 8.0, 8.0)).unwrap();
        assert_eq!(cropped.dimensions(), (6, 6));
        assert_eq!(cropped.get_pixel(1, 1)[3], 255);
        assert_eq!(cropped.get_pixel(2, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_crop_to_huge_rect_fails() {
        let overscan = Overscan::aligned(test_image(4, 4));
        let result = overscan.crop_to(Rect::new(0.0, 0.0, 1e9, 1e9));
        assert!(matches!(result, Err(Error::InvalidImage(_))));
    }

    #[test]
    fn test_crop_to_zero_rect_fails() {
        let overscan = Overscan::aligned(test_image(4, 4));
        assert!(overscan.crop_to(Rect::new(1.0, 1.0, 1.0, 3.0)).is_err());
    }

    #[test]
    fn test_params_serde() {
        let params = FilterParams::new()
            .with_number("inputRadius", 4.0)
            .with_point("inputCenter", Point::new(1.0, 2.0))
            .with_color("inputColor", Color::red());
        let json = serde_json::to_string(&params).unwrap();
        let back: FilterParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
