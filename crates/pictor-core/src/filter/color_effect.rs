//! Color and tone filters.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::render::{FilterInvocation, FilterParams};

/// Neutral white balance the temperature and tint filters start from.
pub const NEUTRAL_TEMPERATURE: f64 = 6500.0;

fn one() -> f64 {
    1.0
}

fn neutral_temperature() -> f64 {
    NEUTRAL_TEMPERATURE
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorEffect {
    Sepia {
        #[serde(default = "one")]
        intensity: f64,
    },
    Invert,
    Mono,
    Noir,
    Tonal,
    /// High-saturation, punchy contrast.
    Chrome,
    /// Washed out with lifted blacks.
    Fade,
    /// Warm highlights and cool shadows, like a print from an instant camera.
    Instant,
    Process,
    Transfer,
    /// Recolor the luminance with `color`.
    Monochrome {
        color: Color,
        #[serde(default = "one")]
        intensity: f64,
    },
    Vignette {
        #[serde(default = "one")]
        intensity: f64,
        #[serde(default = "one")]
        radius: f64,
    },
    #[serde(rename = "xray")]
    XRay,
    Thermal,
    Gamma {
        #[serde(default = "one")]
        power: f64,
    },
    Vibrance {
        #[serde(default)]
        amount: f64,
    },
    /// Shift white balance to `temperature` kelvin and `tint`.
    TemperatureAndTint {
        #[serde(default = "neutral_temperature")]
        temperature: f64,
        #[serde(default)]
        tint: f64,
    },
    WhitePoint {
        color: Color,
    },
    HighlightShadow {
        #[serde(default = "one")]
        highlight: f64,
        #[serde(default)]
        shadow: f64,
    },
}

impl ColorEffect {
    pub fn sepia(intensity: f64) -> Self {
        Self::Sepia { intensity }
    }

    pub fn monochrome(color: Color, intensity: f64) -> Self {
        Self::Monochrome { color, intensity }
    }

    pub fn vignette(intensity: f64, radius: f64) -> Self {
        Self::Vignette { intensity, radius }
    }

    pub fn gamma(power: f64) -> Self {
        Self::Gamma { power }
    }

    pub fn vibrance(amount: f64) -> Self {
        Self::Vibrance { amount }
    }

    pub fn temperature_and_tint(temperature: f64, tint: f64) -> Self {
        Self::TemperatureAndTint { temperature, tint }
    }

    pub fn white_point(color: Color) -> Self {
        Self::WhitePoint { color }
    }

    pub fn highlight_shadow(highlight: f64, shadow: f64) -> Self {
        Self::HighlightShadow { highlight, shadow }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Sepia { .. } => "sepia",
            Self::Invert => "invert",
            Self::Mono => "mono",
            Self::Noir => "noir",
            Self::Tonal => "tonal",
            Self::Chrome => "chrome",
            Self::Fade => "fade",
            Self::Instant => "instant",
            Self::Process => "process",
            Self::Transfer => "transfer",
            Self::Monochrome { .. } => "monochrome",
            Self::Vignette { .. } => "vignette",
            Self::XRay => "xray",
            Self::Thermal => "thermal",
            Self::Gamma { .. } => "gamma",
            Self::Vibrance { .. } => "vibrance",
            Self::TemperatureAndTint { .. } => "temperature_and_tint",
            Self::WhitePoint { .. } => "white_point",
            Self::HighlightShadow { .. } => "highlight_shadow",
        }
    }

    pub(crate) fn invocation(&self) -> FilterInvocation {
        let (name, params) = match *self {
            Self::Sepia { intensity } => (
                "CISepiaTone",
                FilterParams::new().with_number("inputIntensity", intensity),
            ),
            Self::Invert => ("CIColorInvert", FilterParams::new()),
            Self::Mono => ("CIPhotoEffectMono", FilterParams::new()),
            Self::Noir => ("CIPhotoEffectNoir", FilterParams::new()),
            Self::Tonal => ("CIPhotoEffectTonal", FilterParams::new()),
            Self::Chrome => ("CIPhotoEffectChrome", FilterParams::new()),
            Self::Fade => ("CIPhotoEffectFade", FilterParams::new()),
            Self::Instant => ("CIPhotoEffectInstant", FilterParams::new()),
            Self::Process => ("CIPhotoEffectProcess", FilterParams::new()),
            Self::Transfer => ("CIPhotoEffectTransfer", FilterParams::new()),
            Self::Monochrome { color, intensity } => (
                "CIColorMonochrome",
                FilterParams::new()
                    .with_color("inputColor", color)
                    .with_number("inputIntensity", intensity),
            ),
            Self::Vignette { intensity, radius } => (
                "CIVignette",
                FilterParams::new()
                    .with_number("inputIntensity", intensity)
                    .with_number("inputRadius", radius),
            ),
            Self::XRay => ("CIXRay", FilterParams::new()),
            Self::Thermal => ("CIThermal", FilterParams::new()),
            Self::Gamma { power } => (
                "CIGammaAdjust",
                FilterParams::new().with_number("inputPower", power),
            ),
            Self::Vibrance { amount } => (
                "CIVibrance",
                FilterParams::new().with_number("inputAmount", amount),
            ),
            Self::TemperatureAndTint { temperature, tint } => (
                "CITemperatureAndTint",
                FilterParams::new()
                    .with_point("inputNeutral", Point::new(NEUTRAL_TEMPERATURE, 0.0))
                    .with_point("inputTargetNeutral", Point::new(temperature, tint)),
            ),
            Self::WhitePoint { color } => (
                "CIWhitePointAdjust",
                FilterParams::new().with_color("inputColor", color),
            ),
            Self::HighlightShadow { highlight, shadow } => (
                "CIHighlightShadowAdjust",
                FilterParams::new()
                    .with_number("inputHighlightAmount", highlight)
                    .with_number("inputShadowAmount", shadow),
            ),
        };
        FilterInvocation::new(name, params)
    }
}
