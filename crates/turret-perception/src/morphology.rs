//! Mask cleanup: opening removes speckle, closing fills pinholes.
//!
//! Pixels outside the image never erode the mask and never dilate into it
//! (OpenCV's default constant border for morphology).

use opencv::core::{self, Mat, Point, Size};
use opencv::imgproc;

/// Opening then closing with a `kernel_size`-square structuring element.
pub fn open_close(mask: &Mat, kernel_size: u32) -> opencv::Result<Mat> {
    let side = i32::try_from(kernel_size.max(1)).unwrap_or(i32::MAX);
    let kernel = imgproc::get_structuring_element(
        imgproc::MORPH_RECT,
        Size::new(side, side),
        Point::new(-1, -1),
    )?;
    let border = imgproc::morphology_default_border_value()?;

    let mut opened = Mat::default();
    imgproc::morphology_ex(
        mask,
        &mut opened,
        imgproc::MORPH_OPEN,
        &kernel,
        Point::new(-1, -1),
        1,
        core::BORDER_CONSTANT,
        border,
    )?;
    let mut closed = Mat::default();
    imgproc::morphology_ex(
        &opened,
        &mut closed,
        imgproc::MORPH_CLOSE,
        &kernel,
        Point::new(-1, -1),
        1,
        core::BORDER_CONSTANT,
        border,
    )?;
    Ok(closed)
}
