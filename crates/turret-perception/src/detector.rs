//! [`BlobDetector`] – turns one frame into a zero-or-one target observation.
//!
//! Pipeline per frame:
//!
//! 1. RGB → HSV and dual-band red [`color_mask`].
//! 2. Morphological opening then closing with a square kernel
//!    ([`open_close`]).
//! 3. External contours of the mask ([`external_blobs`]).
//! 4. The contour with the largest enclosed area wins (first in raster
//!    order on ties).
//! 5. Below [`DetectorConfig::min_area`] the frame counts as empty.
//!
//! The detector is stateless and only borrows the frame, so telemetry drawn
//! onto the frame afterwards cannot influence any detection.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use turret_types::{Observation, Target};

use crate::contour::{Blob, external_blobs};
use crate::mask::{ColorThresholds, color_mask};
use crate::mat::to_mat;
use crate::morphology::open_close;

/// Tunable detector policy.  The defaults assume a 1280×960 capture; a
/// different resolution needs `min_area` retuned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub color: ColorThresholds,
    /// Side of the square structuring element, in pixels.
    pub kernel_size: u32,
    /// Smallest contour area accepted as a target, in square pixels.
    pub min_area: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            color: ColorThresholds::default(),
            kernel_size: 5,
            min_area: 3000.0,
        }
    }
}

/// Stateless single-target color blob detector.
#[derive(Debug, Clone, Default)]
pub struct BlobDetector {
    config: DetectorConfig,
}

impl BlobDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline on one frame.  A frame OpenCV cannot process
    /// is reported as [`Observation::Absent`].
    pub fn detect(&self, frame: &RgbImage) -> Observation {
        match self.candidates(frame) {
            Ok(blobs) => self.select(&blobs),
            Err(e) => {
                warn!(error = %e, "detection failed; treating frame as empty");
                Observation::Absent
            }
        }
    }

    fn candidates(&self, frame: &RgbImage) -> opencv::Result<Vec<Blob>> {
        let rgb = to_mat(frame)?;
        let mask = color_mask(&rgb, &self.config.color)?;
        let mask = open_close(&mask, self.config.kernel_size)?;
        external_blobs(&mask)
    }

    fn select(&self, blobs: &[Blob]) -> Observation {
        let Some(largest) = largest(blobs) else {
            return Observation::Absent;
        };
        if largest.area < self.config.min_area {
            debug!(
                candidates = blobs.len(),
                area = largest.area,
                min_area = self.config.min_area,
                "largest blob below area floor"
            );
            return Observation::Absent;
        }

        let target = Target {
            center_x: largest.bounding_box.center_x(),
            area: largest.area,
            bounding_box: largest.bounding_box,
        };
        debug!(
            candidates = blobs.len(),
            center_x = target.center_x,
            area = target.area,
            "target detected"
        );
        Observation::Present(target)
    }
}

/// Largest blob by area; the earliest one wins a tie.
fn largest(blobs: &[Blob]) -> Option<&Blob> {
    blobs.iter().fold(None, |best, blob| match best {
        Some(b) if b.area >= blob.area => best,
        _ => Some(blob),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const RED: Rgb<u8> = Rgb([210, 25, 30]);
    const GREEN: Rgb<u8> = Rgb([30, 160, 40]);

    fn frame_with(rects: &[(u32, u32, u32, u32, Rgb<u8>)]) -> RgbImage {
        let mut img = RgbImage::from_pixel(320, 240, Rgb([90, 90, 100]));
        for &(x0, y0, w, h, color) in rects {
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    img.put_pixel(x, y, color);
                }
            }
        }
        img
    }

    #[test]
    fn blank_frame_has_no_target() {
        let detector = BlobDetector::default();
        assert_eq!(detector.detect(&frame_with(&[])), Observation::Absent);
    }

    #[test]
    fn region_below_area_floor_is_rejected() {
        // 41 × 51 pixels → contour area 40 × 50 = 2000 < 3000.
        let detector = BlobDetector::default();
        let frame = frame_with(&[(100, 80, 41, 51, RED)]);
        assert_eq!(detector.detect(&frame), Observation::Absent);
    }

    #[test]
    fn region_above_area_floor_is_reported() {
        // 71 × 51 pixels → contour area 70 × 50 = 3500.
        let detector = BlobDetector::default();
        let frame = frame_with(&[(100, 80, 71, 51, RED)]);
        let target = *detector.detect(&frame).target().expect("target");
        assert_eq!(target.area, 3500.0);
        assert_eq!(target.bounding_box.x, 100);
        assert_eq!(target.bounding_box.width, 71);
        assert_eq!(target.center_x, 100 + 71 / 2);
    }

    #[test]
    fn largest_red_region_wins() {
        let detector = BlobDetector::default();
        let frame = frame_with(&[
            (10, 10, 61, 61, RED),   // 3600
            (150, 100, 91, 81, RED), // 7200
            (250, 10, 60, 60, GREEN),
        ]);
        let target = *detector.detect(&frame).target().expect("target");
        assert_eq!(target.area, 7200.0);
        assert_eq!(target.center_x, 150 + 91 / 2);
    }

    #[test]
    fn equal_regions_keep_the_first_in_raster_order() {
        let detector = BlobDetector::default();
        let frame = frame_with(&[(200, 20, 61, 61, RED), (20, 20, 61, 61, RED)]);
        let target = *detector.detect(&frame).target().expect("target");
        assert_eq!(target.bounding_box.x, 20);
    }

    #[test]
    fn speckle_noise_is_ignored() {
        let detector = BlobDetector::default();
        let mut frame = frame_with(&[(100, 60, 81, 61, RED)]);
        for i in 0..20 {
            frame.put_pixel(5 + i * 7, 200, RED);
            frame.put_pixel(5 + i * 7, 201, RED);
        }
        let target = *detector.detect(&frame).target().expect("target");
        assert_eq!(target.area, 4800.0);
    }

    #[test]
    fn custom_floor_is_respected() {
        let detector = BlobDetector::new(DetectorConfig {
            min_area: 1000.0,
            ..DetectorConfig::default()
        });
        let frame = frame_with(&[(100, 80, 41, 51, RED)]);
        assert!(detector.detect(&frame).is_present());
    }

    #[test]
    fn red_ring_is_measured_by_its_outer_border() {
        // 81 × 81 ring with a 41 × 41 hole holding a small red island.
        let detector = BlobDetector::default();
        let mut frame = frame_with(&[(100, 60, 81, 81, RED)]);
        for y in 80..121 {
            for x in 120..161 {
                frame.put_pixel(x, y, Rgb([90, 90, 100]));
            }
        }
        for y in 95..106 {
            for x in 135..146 {
                frame.put_pixel(x, y, RED);
            }
        }
        let target = *detector.detect(&frame).target().expect("target");
        assert_eq!(target.area, 6400.0);
        assert_eq!(target.bounding_box.width, 81);
    }
}
