//! Color segmentation: builds the binary target mask from an RGB frame.
//!
//! Red straddles the hue wrap-around, so the mask is the union of two hue
//! bands (one at each end of the circle) gated by minimum saturation and
//! value to reject washed-out and dark pixels.  Hue is on OpenCV's 8-bit
//! scale (0..180); every bound is inclusive.

use opencv::core::{self, Mat, Scalar};
use opencv::imgproc;
use serde::{Deserialize, Serialize};

/// Mask value for pixels that pass the color filter.
pub const FOREGROUND: u8 = 255;

/// Inclusive hue interval on the 0..180 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HueRange {
    pub min: u8,
    pub max: u8,
}

/// Color gate applied to every pixel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorThresholds {
    /// Low-end hue band (reds just above 0).
    pub low_hue: HueRange,
    /// High-end hue band (reds just below the wrap).
    pub high_hue: HueRange,
    /// Minimum saturation (inclusive).
    pub min_saturation: u8,
    /// Minimum value / brightness (inclusive).
    pub min_value: u8,
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self {
            low_hue: HueRange { min: 0, max: 10 },
            high_hue: HueRange { min: 170, max: 180 },
            min_saturation: 100,
            min_value: 50,
        }
    }
}

impl ColorThresholds {
    /// `in_range` bounds for one hue band.
    fn bounds(&self, band: HueRange) -> (Scalar, Scalar) {
        (
            Scalar::new(
                f64::from(band.min),
                f64::from(self.min_saturation),
                f64::from(self.min_value),
                0.0,
            ),
            Scalar::new(f64::from(band.max), 255.0, 255.0, 0.0),
        )
    }
}

/// Threshold an HSV `Mat` into a [`FOREGROUND`]/0 mask.
pub fn hsv_mask(hsv: &Mat, thresholds: &ColorThresholds) -> opencv::Result<Mat> {
    let (low_min, low_max) = thresholds.bounds(thresholds.low_hue);
    let (high_min, high_max) = thresholds.bounds(thresholds.high_hue);

    let mut low = Mat::default();
    core::in_range(hsv, &low_min, &low_max, &mut low)?;
    let mut high = Mat::default();
    core::in_range(hsv, &high_min, &high_max, &mut high)?;

    // Union of two 0/255 masks.
    let mut mask = Mat::default();
    core::max(&low, &high, &mut mask)?;
    Ok(mask)
}

/// Convert an RGB `Mat` to HSV and segment it.
pub fn color_mask(rgb: &Mat, thresholds: &ColorThresholds) -> opencv::Result<Mat> {
    let mut hsv = Mat::default();
    imgproc::cvt_color(rgb, &mut hsv, imgproc::COLOR_RGB2HSV, 0)?;
    hsv_mask(&hsv, thresholds)
}
