//! Stylizing filters.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::render::{FilterInvocation, FilterParams};

fn scale_8() -> f64 {
    8.0
}

fn one() -> f64 {
    1.0
}

fn radius_10() -> f64 {
    10.0
}

fn half() -> f64 {
    0.5
}

fn levels_6() -> f64 {
    6.0
}

fn radius_20() -> f64 {
    20.0
}

fn radius_3() -> f64 {
    3.0
}

fn noise_level() -> f64 {
    0.07
}

fn sharpness() -> f64 {
    0.71
}

fn threshold() -> f64 {
    0.1
}

fn contrast_50() -> f64 {
    50.0
}

/// Line drawing parameters used when only the threshold is chosen.
const OUTLINE_NOISE_LEVEL: f64 = 0.07;
const OUTLINE_SHARPNESS: f64 = 0.71;
const OUTLINE_CONTRAST: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stylize {
    /// Square mosaic cells of side `scale`, one centered on `center`.
    Pixellate {
        #[serde(default = "scale_8")]
        scale: f64,
        #[serde(default)]
        center: Option<Point>,
    },
    Edges {
        #[serde(default = "one")]
        intensity: f64,
    },
    Bloom {
        #[serde(default = "radius_10")]
        radius: f64,
        #[serde(default = "half")]
        intensity: f64,
    },
    Gloom {
        #[serde(default = "radius_10")]
        radius: f64,
        #[serde(default = "half")]
        intensity: f64,
    },
    Posterize {
        #[serde(default = "levels_6")]
        levels: f64,
    },
    /// Flat posterized color with black ink outlines.
    Comic,
    /// Voronoi cells about `radius` wide, each filled with the color under
    /// its seed.
    Crystallize {
        #[serde(default = "radius_20")]
        radius: f64,
    },
    /// Dots of `radius` on white.
    Pointillize {
        #[serde(default = "radius_20")]
        radius: f64,
    },
    HexagonalPixellate {
        #[serde(default = "scale_8")]
        scale: f64,
        #[serde(default)]
        center: Option<Point>,
    },
    /// White woodcut strokes on black.
    EdgeWork {
        #[serde(default = "radius_3")]
        radius: f64,
    },
    /// Black line drawing on transparency.
    LineOverlay {
        #[serde(default = "noise_level")]
        noise_level: f64,
        #[serde(default = "sharpness")]
        sharpness: f64,
        #[serde(default = "one")]
        edge_intensity: f64,
        #[serde(default = "threshold")]
        threshold: f64,
        #[serde(default = "contrast_50")]
        contrast: f64,
    },
    /// [`Stylize::LineOverlay`] with only the edge threshold exposed.
    Outline {
        #[serde(default = "threshold")]
        threshold: f64,
    },
}

impl Stylize {
    pub fn pixellate(scale: f64, center: Option<Point>) -> Self {
        Self::Pixellate { scale, center }
    }

    pub fn edges(intensity: f64) -> Self {
        Self::Edges { intensity }
    }

    pub fn bloom(radius: f64, intensity: f64) -> Self {
        Self::Bloom { radius, intensity }
    }

    pub fn gloom(radius: f64, intensity: f64) -> Self {
        Self::Gloom { radius, intensity }
    }

    pub fn posterize(levels: f64) -> Self {
        Self::Posterize { levels }
    }

    pub fn crystallize(radius: f64) -> Self {
        Self::Crystallize { radius }
    }

    pub fn pointillize(radius: f64) -> Self {
        Self::Pointillize { radius }
    }

    pub fn hexagonal_pixellate(scale: f64, center: Option<Point>) -> Self {
        Self::HexagonalPixellate { scale, center }
    }

    pub fn edge_work(radius: f64) -> Self {
        Self::EdgeWork { radius }
    }

    pub fn line_overlay(
        noise_level: f64,
        sharpness: f64,
        edge_intensity: f64,
        threshold: f64,
        contrast: f64,
    ) -> Self {
        Self::LineOverlay {
            noise_level,
            sharpness,
            edge_intensity,
            threshold,
            contrast,
        }
    }

    pub fn outline(threshold: f64) -> Self {
        Self::Outline { threshold }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Pixellate { .. } => "pixellate",
            Self::Edges { .. } => "edges",
            Self::Bloom { .. } => "bloom",
            Self::Gloom { .. } => "gloom",
            Self::Posterize { .. } => "posterize",
            Self::Comic => "comic",
            Self::Crystallize { .. } => "crystallize",
            Self::Pointillize { .. } => "pointillize",
            Self::HexagonalPixellate { .. } => "hexagonal_pixellate",
            Self::EdgeWork { .. } => "edge_work",
            Self::LineOverlay { .. } => "line_overlay",
            Self::Outline { .. } => "outline",
        }
    }

    pub(crate) fn invocation(&self, frame: Rect) -> FilterInvocation {
        let (name, params) = match *self {
            Self::Pixellate { scale, center } => (
                "CIPixellate",
                FilterParams::new()
                    .with_number("inputScale", scale)
                    .with_point("inputCenter", center.unwrap_or_else(|| frame.center())),
            ),
            Self::Edges { intensity } => (
                "CIEdges",
                FilterParams::new().with_number("inputIntensity", intensity),
            ),
            Self::Bloom { radius, intensity } => (
                "CIBloom",
                FilterParams::new()
                    .with_number("inputRadius", radius)
                    .with_number("inputIntensity", intensity),
            ),
            Self::Gloom { radius, intensity } => (
                "CIGloom",
                FilterParams::new()
                    .with_number("inputRadius", radius)
                    .with_number("inputIntensity", intensity),
            ),
            Self::Posterize { levels } => (
                "CIColorPosterize",
                FilterParams::new().with_number("inputLevels", levels),
            ),
            Self::Comic => ("CIComicEffect", FilterParams::new()),
            Self::Crystallize { radius } => (
                "CICrystallize",
                FilterParams::new().with_number("inputRadius", radius),
            ),
            Self::Pointillize { radius } => (
                "CIPointillize",
                FilterParams::new().with_number("inputRadius", radius),
            ),
            Self::HexagonalPixellate { scale, center } => (
                "CIHexagonalPixellate",
                FilterParams::new()
                    .with_number("inputScale", scale)
                    .with_point("inputCenter", center.unwrap_or_else(|| frame.center())),
            ),
            Self::EdgeWork { radius } => (
                "CIEdgeWork",
                FilterParams::new().with_number("inputRadius", radius),
            ),
            Self::LineOverlay {
                noise_level,
                sharpness,
                edge_intensity,
                threshold,
                contrast,
            } => ("CILineOverlay", line_overlay_params(noise_level, sharpness, edge_intensity, threshold, contrast)),
            Self::Outline { threshold } => (
                "CILineOverlay",
                line_overlay_params(OUTLINE_NOISE_LEVEL, OUTLINE_SHARPNESS, 1.0, threshold, OUTLINE_CONTRAST),
            ),
        };
        FilterInvocation::new(name, params)
    }
}

fn line_overlay_params(
    noise_level: f64,
    sharpness: f64,
    edge_intensity: f64,
    threshold: f64,
    contrast: f64,
) -> FilterParams {
    FilterParams::new()
        .with_number("inputNRNoiseLevel", noise_level)
        .with_number("inputNRSharpness", sharpness)
        .with_number("inputEdgeIntensity", edge_intensity)
        .with_number("inputThreshold", threshold)
        .with_number("inputContrast", contrast)
}
