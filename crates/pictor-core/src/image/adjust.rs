//! Tone adjustments on [`Image`].
//!
//! Shorthands for the color filters with one varying parameter. Each runs
//! on the CPU backend and marks the image modified. The last value applied
//! through each shorthand is remembered in [`Image::adjustments`].

use super::Image;
use crate::color::Color;
use crate::error::Result;
use crate::filter::{ColorEffect, Filter, NEUTRAL_TEMPERATURE};
use crate::render::CpuBackend;

/// The last value passed to each `adjust_*` method, or `None` if it was
/// never called. Filters applied directly are not tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Adjustments {
    pub gamma: Option<f64>,
    pub vibrance: Option<f64>,
    pub temperature: Option<f64>,
    pub tint: Option<f64>,
    pub white_point: Option<Color>,
    pub highlight: Option<f64>,
    pub shadow: Option<f64>,
}

impl Image {
    /// Values recorded by successful `adjust_*` calls.
    pub fn adjustments(&self) -> &Adjustments {
        &self.adjustments
    }

    fn adjust<F>(&mut self, effect: ColorEffect, record: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Adjustments),
    {
        Filter::new(effect).apply_with(&CpuBackend, self)?;
        record(&mut self.adjustments);
        Ok(self)
    }

    /// Raise every channel to `power`. `1.0` leaves the image unchanged.
    pub fn adjust_gamma(&mut self, power: f64) -> Result<&mut Self> {
        self.adjust(ColorEffect::gamma(power), |a| a.gamma = Some(power))
    }

    /// Boost (`> 0`) or mute (`< 0`) the less saturated colors.
    pub fn adjust_vibrance(&mut self, amount: f64) -> Result<&mut Self> {
        self.adjust(ColorEffect::vibrance(amount), |a| a.vibrance = Some(amount))
    }

    /// Re-balance white to a `kelvin` color temperature with neutral tint.
    pub fn adjust_temperature(&mut self, kelvin: f64) -> Result<&mut Self> {
        self.adjust(ColorEffect::temperature_and_tint(kelvin, 0.0), |a| a.temperature = Some(kelvin))
    }

    /// Shift toward magenta (`> 0`) or green (`< 0`) at neutral temperature.
    pub fn adjust_tint(&mut self, tint: f64) -> Result<&mut Self> {
        self.adjust(ColorEffect::temperature_and_tint(NEUTRAL_TEMPERATURE, tint), |a| a.tint = Some(tint))
    }

    pub fn adjust_white_point(&mut self, color: Color) -> Result<&mut Self> {
        self.adjust(ColorEffect::white_point(color), |a| a.white_point = Some(color))
    }

    /// Scale highlights; `1.0` leaves them unchanged.
    pub fn adjust_highlight(&mut self, amount: f64) -> Result<&mut Self> {
        self.adjust(ColorEffect::highlight_shadow(amount, 0.0), |a| a.highlight = Some(amount))
    }

    /// Lift (`> 0`) or deepen (`< 0`) shadows.
    pub fn adjust_shadow(&mut self, amount: f64) -> Result<&mut Self> {
        self.adjust(ColorEffect::highlight_shadow(1.0, amount), |a| a.shadow = Some(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::image::tests::test_image;
    use ::image::{Rgba, RgbaImage};

    fn gray(value: u8) -> Image {
        Image::from_pixels(RgbaImage::from_pixel(4, 4, Rgba([value, value, value, 255])))
    }

    #[test]
    fn test_neutral_adjustments_keep_pixels() {
        let original = test_image(12, 8);

        let mut image = original.clone();
        image.adjust_gamma(1.0).unwrap();
        assert_eq!(image, original);
        assert!(image.is_modified());

        let mut image = original.clone();
        image.adjust_vibrance(0.0).unwrap();
        assert_eq!(image, original);

        let mut image = original.clone();
        image.adjust_white_point(Color::white()).unwrap();
        assert_eq!(image, original);
    }

    #[test]
    fn test_gamma_darkens_midtones() {
        let mut image = gray(128);
        image.adjust_gamma(2.0).unwrap();
        assert!(image.pixels().get_pixel(0, 0)[0] < 128);
    }

    #[test]
    fn test_warmer_temperature_shifts_red() {
        let mut warm = gray(128);
        warm.adjust_temperature(9000.0).unwrap();
        let p = warm.pixels().get_pixel(1, 1);
        assert!(p[0] > p[2], "expected warmer than neutral, got {p:?}");

        let mut cool = gray(128);
        cool.adjust_temperature(4000.0).unwrap();
        let p = cool.pixels().get_pixel(1, 1);
        assert!(p[2] > p[0], "expected cooler than neutral, got {p:?}");
    }

    #[test]
    fn test_shadow_lift_brightens_dark_pixels() {
        let mut image = gray(30);
        image.adjust_shadow(0.8).unwrap();
        assert!(image.pixels().get_pixel(2, 2)[0] > 30);
    }

    #[test]
    fn test_adjust_empty_image_fails() {
        let mut image = Image::from_pixels(RgbaImage::new(0, 0));
        assert!(matches!(image.adjust_tint(10.0), Err(Error::InvalidImage(_))));
        assert!(!image.is_modified());
        assert_eq!(image.adjustments().tint, None);
    }

    #[test]
    fn test_adjustments_remember_last_value() {
        let mut image = gray(100);
        assert_eq!(*image.adjustments(), Adjustments::default());

        image.adjust_gamma(2.0).unwrap();
        image.adjust_gamma(0.5).unwrap();
        image.adjust_white_point(Color::gray()).unwrap();
        image.adjust_shadow(0.3).unwrap();

        let adjustments = image.adjustments();
        assert_eq!(adjustments.gamma, Some(0.5));
        assert_eq!(adjustments.white_point, Some(Color::gray()));
        assert_eq!(adjustments.shadow, Some(0.3));
        assert_eq!(adjustments.highlight, None);
        assert_eq!(adjustments.temperature, None);

        let copy = image.clone();
        assert_eq!(copy.adjustments().gamma, Some(0.5));
    }
}
