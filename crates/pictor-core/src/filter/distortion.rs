//! Radial distortion filters.
//!
//! Every distortion is centered on a point that defaults to the center of
//! the image it is applied to, resolved on each call.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::render::{FilterInvocation, FilterParams};

fn radius_300() -> f64 {
    300.0
}

fn radius_150() -> f64 {
    150.0
}

fn half() -> f64 {
    0.5
}

#[allow(clippy::approx_constant)]
fn half_turn() -> f64 {
    3.14
}

fn tunnel_rotation() -> f64 {
    25.0
}

fn radius_160() -> f64 {
    160.0
}

fn width_80() -> f64 {
    80.0
}

fn refraction() -> f64 {
    1.7
}

fn vortex_angle() -> f64 {
    56.55
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distortion {
    /// Convex (`scale > 0`) or concave bump.
    Bump {
        #[serde(default)]
        center: Option<Point>,
        #[serde(default = "radius_300")]
        radius: f64,
        #[serde(default = "half")]
        scale: f64,
    },
    Pinch {
        #[serde(default)]
        center: Option<Point>,
        #[serde(default = "radius_300")]
        radius: f64,
        #[serde(default = "half")]
        scale: f64,
    },
    /// Rotation around the center; `angle` in radians.
    Twirl {
        #[serde(default)]
        center: Option<Point>,
        #[serde(default = "radius_300")]
        radius: f64,
        #[serde(default = "half_turn")]
        angle: f64,
    },
    Hole {
        #[serde(default)]
        center: Option<Point>,
        #[serde(default = "radius_150")]
        radius: f64,
    },
    CircleSplash {
        #[serde(default)]
        center: Option<Point>,
        #[serde(default = "radius_150")]
        radius: f64,
    },
    LightTunnel {
        #[serde(default)]
        center: Option<Point>,
        #[serde(default = "radius_300")]
        radius: f64,
        #[serde(default = "tunnel_rotation")]
        rotation: f64,
    },
    /// Wrap the image around a transparent circle of `radius`, starting at
    /// `angle` radians.
    CircularWrap {
        #[serde(default)]
        center: Option<Point>,
        #[serde(default = "radius_150")]
        radius: f64,
        #[serde(default)]
        angle: f64,
    },
    /// Bump along the line through the center at `angle` radians.
    LinearBump {
        #[serde(default)]
        center: Option<Point>,
        #[serde(default = "radius_300")]
        radius: f64,
        #[serde(default)]
        angle: f64,
        #[serde(default = "half")]
        scale: f64,
    },
    /// A ring-shaped lens `width` wide, centered `radius` from the center.
    TorusLens {
        #[serde(default)]
        center: Option<Point>,
        #[serde(default = "radius_160")]
        radius: f64,
        #[serde(default = "width_80")]
        width: f64,
        #[serde(default = "refraction")]
        refraction: f64,
    },
    /// Like [`Distortion::Twirl`] with a linear falloff; `angle` may span
    /// many turns.
    Vortex {
        #[serde(default)]
        center: Option<Point>,
        #[serde(default = "radius_300")]
        radius: f64,
        #[serde(default = "vortex_angle")]
        angle: f64,
    },
}

impl Distortion {
    pub fn bump(center: Option<Point>, radius: f64, scale: f64) -> Self {
        Self::Bump {
            center,
            radius,
            scale,
        }
    }

    pub fn pinch(center: Option<Point>, radius: f64, scale: f64) -> Self {
        Self::Pinch {
            center,
            radius,
            scale,
        }
    }

    pub fn twirl(center: Option<Point>, radius: f64, angle: f64) -> Self {
        Self::Twirl {
            center,
            radius,
            angle,
        }
    }

    pub fn hole(center: Option<Point>, radius: f64) -> Self {
        Self::Hole { center, radius }
    }

    pub fn circle_splash(center: Option<Point>, radius: f64) -> Self {
        Self::CircleSplash { center, radius }
    }

    pub fn light_tunnel(center: Option<Point>, radius: f64, rotation: f64) -> Self {
        Self::LightTunnel {
            center,
            radius,
            rotation,
        }
    }

    pub fn circular_wrap(center: Option<Point>, radius: f64, angle: f64) -> Self {
        Self::CircularWrap {
            center,
            radius,
            angle,
        }
    }

    pub fn linear_bump(center: Option<Point>, radius: f64, angle: f64, scale: f64) -> Self {
        Self::LinearBump {
            center,
            radius,
            angle,
            scale,
        }
    }

    pub fn torus_lens(center: Option<Point>, radius: f64, width: f64, refraction: f64) -> Self {
        Self::TorusLens {
            center,
            radius,
            width,
            refraction,
        }
    }

    pub fn vortex(center: Option<Point>, radius: f64, angle: f64) -> Self {
        Self::Vortex {
            center,
            radius,
            angle,
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Bump { .. } => "bump",
            Self::Pinch { .. } => "pinch",
            Self::Twirl { .. } => "twirl",
            Self::Hole { .. } => "hole",
            Self::CircleSplash { .. } => "circle_splash",
            Self::LightTunnel { .. } => "light_tunnel",
            Self::CircularWrap { .. } => "circular_wrap",
            Self::LinearBump { .. } => "linear_bump",
            Self::TorusLens { .. } => "torus_lens",
            Self::Vortex { .. } => "vortex",
        }
    }

    fn center(&self) -> Option<Point> {
        match *self {
            Self::Bump { center, .. }
            | Self::Pinch { center, .. }
            | Self::Twirl { center, .. }
            | Self::Hole { center, .. }
            | Self::CircleSplash { center, .. }
            | Self::LightTunnel { center, .. }
            | Self::CircularWrap { center, .. }
            | Self::LinearBump { center, .. }
            | Self::TorusLens { center, .. }
            | Self::Vortex { center, .. } => center,
        }
    }

    pub(crate) fn invocation(&self, frame: Rect) -> FilterInvocation {
        let center = self.center().unwrap_or_else(|| frame.center());
        let base = FilterParams::new().with_point("inputCenter", center);

        let (name, params) = match *self {
            Self::Bump { radius, scale, .. } => (
                "CIBumpDistortion",
                base.with_number("inputRadius", radius)
                    .with_number("inputScale", scale),
            ),
            Self::Pinch { radius, scale, .. } => (
                "CIPinchDistortion",
                base.with_number("inputRadius", radius)
                    .with_number("inputScale", scale),
            ),
            Self::Twirl { radius, angle, .. } => (
                "CITwirlDistortion",
                base.with_number("inputRadius", radius)
                    .with_number("inputAngle", angle),
            ),
            Self::Hole { radius, .. } => (
                "CIHoleDistortion",
                base.with_number("inputRadius", radius),
            ),
            Self::CircleSplash { radius, .. } => (
                "CICircleSplashDistortion",
                base.with_number("inputRadius", radius),
            ),
            Self::LightTunnel {
                radius, rotation, ..
            } => (
                "CILightTunnel",
                base.with_number("inputRadius", radius)
                    .with_number("inputRotation", rotation),
            ),
            Self::CircularWrap { radius, angle, .. } => (
                "CICircularWrap",
                base.with_number("inputRadius", radius)
                    .with_number("inputAngle", angle),
            ),
            Self::LinearBump {
                radius,
                angle,
                scale,
                ..
            } => (
                "CIBumpDistortionLinear",
                base.with_number("inputRadius", radius)
                    .with_number("inputAngle", angle)
                    .with_number("inputScale", scale),
            ),
            Self::TorusLens {
                radius,
                width,
                refraction,
                ..
            } => (
                "CITorusLensDistortion",
                base.with_number("inputRadius", radius)
                    .with_number("inputWidth", width)
                    .with_number("inputRefraction", refraction),
            ),
            Self::Vortex { radius, angle, .. } => (
                "CIVortexDistortion",
                base.with_number("inputRadius", radius)
                    .with_number("inputAngle", angle),
            ),
        };
        FilterInvocation::new(name, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ParamValue;

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_defaults() {
        let d: Distortion = serde_json::from_str(r#"{"twirl": {}}"#).unwrap();
        assert_eq!(d, Distortion::twirl(None, 300.0, 3.14));
        let d: Distortion = serde_json::from_str(r#"{"hole": {"center": {"x": 3, "y": 4}}}"#).unwrap();
        assert_eq!(d, Distortion::hole(Some(Point::new(3.0, 4.0)), 150.0));
        let d: Distortion = serde_json::from_str(r#"{"torus_lens": {}}"#).unwrap();
        assert_eq!(d, Distortion::torus_lens(None, 160.0, 80.0, 1.7));
        let d: Distortion = serde_json::from_str(r#"{"vortex": {"radius": 50}}"#).unwrap();
        assert_eq!(d, Distortion::vortex(None, 50.0, 56.55));
        let d: Distortion = serde_json::from_str(r#"{"linear_bump": {"angle": 1}}"#).unwrap();
        assert_eq!(d, Distortion::linear_bump(None, 300.0, 1.0, 0.5));
    }

    #[test]
    fn test_every_distortion_has_center() {
        let frame = Rect::new(0.0, 0.0, 60.0, 30.0);
        for d in [
            Distortion::bump(None, 1.0, 0.5),
            Distortion::pinch(None, 1.0, 0.5),
            Distortion::twirl(None, 1.0, 1.0),
            Distortion::hole(None, 1.0),
            Distortion::circle_splash(None, 1.0),
            Distortion::light_tunnel(None, 1.0, 1.0),
            Distortion::circular_wrap(None, 1.0, 0.0),
            Distortion::linear_bump(None, 1.0, 0.0, 0.5),
            Distortion::torus_lens(None, 1.0, 1.0, 1.7),
            Distortion::vortex(None, 1.0, 1.0),
        ] {
            let invocation = d.invocation(frame);
            assert_eq!(
                invocation.params.get("inputCenter"),
                Some(&ParamValue::Point(Point::new(30.0, 15.0))),
                "{} should resolve its center",
                d.label()
            );
        }
    }
}
