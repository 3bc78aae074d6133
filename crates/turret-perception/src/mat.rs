//! Moving pixels between `image::RgbImage` and OpenCV `Mat`.
//!
//! The `Mat` keeps the RGB channel order of the source image; every
//! conversion code and drawing color in this crate assumes RGB, not
//! OpenCV's usual BGR.

use image::RgbImage;
use opencv::core::{self, Mat, Scalar};
use opencv::prelude::*;

fn dim(value: u32) -> opencv::Result<i32> {
    i32::try_from(value)
        .map_err(|_| opencv::Error::new(core::StsOutOfRange, format!("dimension {value} too large")))
}

/// Copy `image` into a new 8-bit, 3-channel `Mat`.
pub fn to_mat(image: &RgbImage) -> opencv::Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        dim(image.height())?,
        dim(image.width())?,
        core::CV_8UC3,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(image.as_raw());
    Ok(mat)
}

/// Copy the pixels of `mat` back into `image`.  Both must have the same
/// size and channel layout.
pub fn copy_into(mat: &Mat, image: &mut RgbImage) -> opencv::Result<()> {
    let bytes = mat.data_bytes()?;
    let target: &mut [u8] = image;
    if bytes.len() != target.len() {
        return Err(opencv::Error::new(
            core::StsUnmatchedSizes,
            format!("Mat holds {} bytes, image {}", bytes.len(), target.len()),
        ));
    }
    target.copy_from_slice(bytes);
    Ok(())
}
