//! Outer contours of a binary mask, reduced to what the detector ranks on.
//!
//! Only external borders are traced: a blob inside another blob's hole is
//! part of the enclosing candidate, never a candidate of its own.  Areas are
//! the polygon areas of the traced borders, so a filled `w × h` rectangle
//! measures `(w - 1) × (h - 1)`.

use opencv::core::{Mat, Point, Vector};
use opencv::imgproc;
use opencv::prelude::*;
use turret_types::BoundingBox;

/// One external contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    /// Enclosed polygon area in square pixels.
    pub area: f64,
    /// Inclusive pixel extents of the contour.
    pub bounding_box: BoundingBox,
    /// First border pixel in raster order, as `(y, x)`.
    origin: (i32, i32),
}

/// External contours of `mask`, ordered by where their border starts in
/// raster order (top to bottom, then left to right).
pub fn external_blobs(mask: &Mat) -> opencv::Result<Vec<Blob>> {
    let mut contours = Vector::<Vector<Point>>::new();
    imgproc::find_contours(
        mask,
        &mut contours,
        imgproc::RETR_EXTERNAL,
        imgproc::CHAIN_APPROX_SIMPLE,
        Point::new(0, 0),
    )?;

    let mut blobs = contours
        .iter()
        .filter(|contour| !contour.is_empty())
        .map(|contour| -> opencv::Result<Blob> {
            let rect = imgproc::bounding_rect(&contour)?;
            let origin = contour
                .iter()
                .map(|p| (p.y, p.x))
                .min()
                .unwrap_or((rect.y, rect.x));
            Ok(Blob {
                area: imgproc::contour_area(&contour, false)?,
                bounding_box: BoundingBox {
                    x: rect.x.max(0) as u32,
                    y: rect.y.max(0) as u32,
                    width: rect.width.max(0) as u32,
                    height: rect.height.max(0) as u32,
                },
                origin,
            })
        })
        .collect::<opencv::Result<Vec<Blob>>>()?;
    blobs.sort_by_key(|blob| blob.origin);
    Ok(blobs)
}
