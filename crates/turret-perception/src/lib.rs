//! `turret-perception` – single-target color blob detection.
//!
//! Turns one camera frame into an [`Observation`][turret_types::Observation]:
//! either nothing, or the horizontal centre and area of the dominant red
//! blob.  The image processing runs on OpenCV (`imgproc`); frames cross the
//! boundary as `image::RgbImage` and are wrapped in a `Mat` per call.
//!
//! # Modules
//!
//! - [`mat`] – `RgbImage` ⇄ `Mat` conversion.
//! - [`mask`] – [`color_mask`][mask::color_mask]: HSV conversion and the
//!   dual hue band red segmentation.
//! - [`morphology`] – opening then closing with a square kernel.
//! - [`contour`] – [`external_blobs`][contour::external_blobs]: outer
//!   contours of the mask with their areas and bounding boxes.
//! - [`detector`] – [`BlobDetector`][detector::BlobDetector]: the full
//!   per-frame pipeline and its [`DetectorConfig`][detector::DetectorConfig].
//! - [`overlay`] – [`render`][overlay::render]: cosmetic telemetry drawn on
//!   the frame after detection.

pub mod contour;
pub mod detector;
pub mod mask;
pub mod mat;
pub mod morphology;
pub mod overlay;

pub use detector::{BlobDetector, DetectorConfig};
pub use overlay::OverlayInfo;
