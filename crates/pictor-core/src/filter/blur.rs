//! Blur filters.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::render::{FilterInvocation, FilterParams};

fn radius_10() -> f64 {
    10.0
}

fn radius_8() -> f64 {
    8.0
}

fn radius_20() -> f64 {
    20.0
}

fn noise_level() -> f64 {
    0.02
}

fn sharpness() -> f64 {
    0.4
}

fn half() -> f64 {
    0.5
}

fn ring_size() -> f64 {
    5.0
}

fn radius_100() -> f64 {
    100.0
}

fn saturation_boost() -> f64 {
    1.5
}

/// Point `thirds / 3` of the way across `frame`, at half height.
fn focal_point(frame: Rect, thirds: f64) -> Point {
    Point::new(frame.x0 + frame.width() * thirds / 3.0, frame.center().y)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blur {
    /// Gaussian with standard deviation `radius`.
    GaussianBlur {
        #[serde(default = "radius_10")]
        radius: f64,
    },
    BoxBlur {
        #[serde(default = "radius_10")]
        radius: f64,
    },
    DiscBlur {
        #[serde(default = "radius_8")]
        radius: f64,
    },
    /// Directional blur; `angle` in radians, 0 is horizontal.
    MotionBlur {
        #[serde(default = "radius_20")]
        radius: f64,
        #[serde(default)]
        angle: f64,
    },
    /// Radial blur toward `center` (image center when unset).
    ZoomBlur {
        #[serde(default = "radius_20")]
        amount: f64,
        #[serde(default)]
        center: Option<Point>,
    },
    Median,
    NoiseReduction {
        #[serde(default = "noise_level")]
        noise_level: f64,
        #[serde(default = "sharpness")]
        sharpness: f64,
    },
    /// Disc blur with a brightened rim of `ring_size` pixels.
    BokehBlur {
        #[serde(default = "radius_10")]
        radius: f64,
        #[serde(default = "half")]
        ring_amount: f64,
        #[serde(default = "ring_size")]
        ring_size: f64,
        #[serde(default)]
        softness: f64,
    },
    /// Sharp along the segment `point0`-`point1`, blurred by `radius` away
    /// from it. The points default to the left and right thirds of the
    /// image's center line.
    DepthOfField {
        #[serde(default)]
        point0: Option<Point>,
        #[serde(default)]
        point1: Option<Point>,
        #[serde(default = "radius_100")]
        radius: f64,
        #[serde(default = "saturation_boost")]
        saturation: f64,
    },
}

impl Blur {
    pub fn gaussian(radius: f64) -> Self {
        Self::GaussianBlur { radius }
    }

    pub fn boxed(radius: f64) -> Self {
        Self::BoxBlur { radius }
    }

    pub fn disc(radius: f64) -> Self {
        Self::DiscBlur { radius }
    }

    pub fn motion(radius: f64, angle: f64) -> Self {
        Self::MotionBlur { radius, angle }
    }

    pub fn zoom(amount: f64, center: Option<Point>) -> Self {
        Self::ZoomBlur { amount, center }
    }

    pub fn noise_reduction(noise_level: f64, sharpness: f64) -> Self {
        Self::NoiseReduction {
            noise_level,
            sharpness,
        }
    }

    pub fn bokeh(radius: f64, ring_amount: f64, ring_size: f64, softness: f64) -> Self {
        Self::BokehBlur {
            radius,
            ring_amount,
            ring_size,
            softness,
        }
    }

    pub fn depth_of_field(focal_region: Option<(Point, Point)>, radius: f64, saturation: f64) -> Self {
        Self::DepthOfField {
            point0: focal_region.map(|r| r.0),
            point1: focal_region.map(|r| r.1),
            radius,
            saturation,
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::GaussianBlur { .. } => "gaussian_blur",
            Self::BoxBlur { .. } => "box_blur",
            Self::DiscBlur { .. } => "disc_blur",
            Self::MotionBlur { .. } => "motion_blur",
            Self::ZoomBlur { .. } => "zoom_blur",
            Self::Median => "median",
            Self::NoiseReduction { .. } => "noise_reduction",
            Self::BokehBlur { .. } => "bokeh_blur",
            Self::DepthOfField { .. } => "depth_of_field",
        }
    }

    pub(crate) fn invocation(&self, frame: Rect) -> FilterInvocation {
        let (name, params) = match *self {
            Self::GaussianBlur { radius } => (
                "CIGaussianBlur",
                FilterParams::new().with_number("inputRadius", radius),
            ),
            Self::BoxBlur { radius } => (
                "CIBoxBlur",
                FilterParams::new().with_number("inputRadius", radius),
            ),
            Self::DiscBlur { radius } => (
                "CIDiscBlur",
                FilterParams::new().with_number("inputRadius", radius),
            ),
            Self::MotionBlur { radius, angle } => (
                "CIMotionBlur",
                FilterParams::new()
                    .with_number("inputRadius", radius)
                    .with_number("inputAngle", angle),
            ),
            Self::ZoomBlur { amount, center } => (
                "CIZoomBlur",
                FilterParams::new()
                    .with_number("inputAmount", amount)
                    .with_point("inputCenter", center.unwrap_or_else(|| frame.center())),
            ),
            Self::Median => ("CIMedianFilter", FilterParams::new()),
            Self::NoiseReduction {
                noise_level,
                sharpness,
            } => (
                "CINoiseReduction",
                FilterParams::new()
                    .with_number("inputNoiseLevel", noise_level)
                    .with_number("inputSharpness", sharpness),
            ),
            Self::BokehBlur {
                radius,
                ring_amount,
                ring_size,
                softness,
            } => (
                "CIBokehBlur",
                FilterParams::new()
                    .with_number("inputRadius", radius)
                    .with_number("inputRingAmount", ring_amount)
                    .with_number("inputRingSize", ring_size)
                    .with_number("inputSoftness", softness),
            ),
            Self::DepthOfField {
                point0,
                point1,
                radius,
                saturation,
            } => (
                "CIDepthOfField",
                FilterParams::new()
                    .with_point("inputPoint0", point0.unwrap_or_else(|| focal_point(frame, 1.0)))
                    .with_point("inputPoint1", point1.unwrap_or_else(|| focal_point(frame, 2.0)))
                    .with_number("inputRadius", radius)
                    .with_number("inputSaturation", saturation),
            ),
        };
        FilterInvocation::new(name, params)
    }
}
