//! Telemetry overlay drawn onto a frame after detection.
//!
//! Purely cosmetic: the overlay is rendered on a frame the detector has
//! already finished with.  Elements:
//!
//! - crosshair at the frame centre,
//! - target bounding box, centre marker, and `Area: N` label,
//! - while aiming, the aim line from the crosshair to the target and an
//!   `Offset: N` label,
//! - `STABILIZING...` while shooting and `PAUSING: Ns` while pausing,
//! - `STATE: <name>` in the top-left corner.

use std::time::Duration;

use image::RgbImage;
use opencv::core::{Mat, Point, Rect, Scalar};
use opencv::imgproc;
use turret_types::{Observation, RobotState, TurretError};

use crate::mat::{copy_into, to_mat};

// RGB, matching the channel order of the frame.
const CROSSHAIR: [u8; 3] = [255, 0, 0];
const TARGET_BOX: [u8; 3] = [0, 255, 0];
const TARGET_CENTRE: [u8; 3] = [255, 0, 0];
const AIM: [u8; 3] = [0, 0, 255];
const STABILIZING: [u8; 3] = [255, 0, 0];
const PAUSING: [u8; 3] = [255, 255, 0];
const STATE: [u8; 3] = [0, 255, 255];

const CROSSHAIR_ARM: i32 = 20;
const STROKE: i32 = 2;
const MARKER_RADIUS: i32 = 5;
const FONT: i32 = imgproc::FONT_HERSHEY_SIMPLEX;

/// Everything the overlay needs to know about the current tick.
#[derive(Debug, Clone, Copy)]
pub struct OverlayInfo {
    pub state: RobotState,
    pub observation: Observation,
    /// Time left in a time-bounded state, with the state's full duration.
    pub countdown: Option<(Duration, Duration)>,
}

/// A label and where its baseline starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub origin: (i32, i32),
    pub scale: f64,
    pub color: [u8; 3],
}

impl Label {
    fn new(text: String, origin: (i32, i32), scale: f64, color: [u8; 3]) -> Self {
        Self {
            text,
            origin,
            scale,
            color,
        }
    }

    /// Pixel rectangle between the baseline and the top of the text.
    pub fn extent(&self) -> opencv::Result<Rect> {
        let mut baseline = 0;
        let size = imgproc::get_text_size(&self.text, FONT, self.scale, STROKE, &mut baseline)?;
        let (x, y) = self.origin;
        Ok(Rect::new(x, y - size.height, size.width, size.height))
    }
}

/// Every text element for one tick, in drawing order.
pub fn labels(info: &OverlayInfo, width: u32, height: u32) -> Vec<Label> {
    let cx = (width / 2) as i32;
    let cy = (height / 2) as i32;
    let mut labels = Vec::new();

    if let Observation::Present(target) = info.observation {
        let bb = target.bounding_box;
        labels.push(Label::new(
            format!("Area: {}", target.area),
            (bb.x as i32, bb.y as i32 - 10),
            0.9,
            TARGET_BOX,
        ));
        if info.state == RobotState::Aiming {
            labels.push(Label::new(
                format!("Offset: {}", target.center_x - cx),
                (50, 50),
                1.0,
                AIM,
            ));
        }
    }

    match (info.state, info.countdown) {
        (RobotState::Shooting, Some(_)) => labels.push(Label::new(
            "STABILIZING...".to_string(),
            (cx - 100, cy - 50),
            1.0,
            STABILIZING,
        )),
        (RobotState::Pausing, Some((left, _))) => labels.push(Label::new(
            format!("PAUSING: {}s", left.as_secs_f64().ceil() as u64),
            (cx - 100, cy - 50),
            1.0,
            PAUSING,
        )),
        _ => {}
    }

    labels.push(Label::new(
        format!("STATE: {}", info.state),
        (10, 30),
        1.0,
        STATE,
    ));
    labels
}

fn scalar(color: [u8; 3]) -> Scalar {
    Scalar::new(
        f64::from(color[0]),
        f64::from(color[1]),
        f64::from(color[2]),
        0.0,
    )
}

fn line(canvas: &mut Mat, from: Point, to: Point, color: [u8; 3]) -> opencv::Result<()> {
    imgproc::line(canvas, from, to, scalar(color), STROKE, imgproc::LINE_8, 0)
}

fn draw(canvas: &mut Mat, info: &OverlayInfo, width: u32, height: u32) -> opencv::Result<()> {
    let cx = (width / 2) as i32;
    let cy = (height / 2) as i32;

    line(canvas, Point::new(cx - CROSSHAIR_ARM, cy), Point::new(cx + CROSSHAIR_ARM, cy), CROSSHAIR)?;
    line(canvas, Point::new(cx, cy - CROSSHAIR_ARM), Point::new(cx, cy + CROSSHAIR_ARM), CROSSHAIR)?;

    if let Observation::Present(target) = info.observation {
        let bb = target.bounding_box;
        imgproc::rectangle(
            canvas,
            Rect::new(bb.x as i32, bb.y as i32, bb.width as i32, bb.height as i32),
            scalar(TARGET_BOX),
            STROKE,
            imgproc::LINE_8,
            0,
        )?;
        imgproc::circle(
            canvas,
            Point::new(target.center_x, bb.center_y()),
            MARKER_RADIUS,
            scalar(TARGET_CENTRE),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;
        if info.state == RobotState::Aiming {
            line(canvas, Point::new(cx, cy), Point::new(target.center_x, cy), AIM)?;
        }
    }

    for label in labels(info, width, height) {
        imgproc::put_text(
            canvas,
            &label.text,
            Point::new(label.origin.0, label.origin.1),
            FONT,
            label.scale,
            scalar(label.color),
            STROKE,
            imgproc::LINE_8,
            false,
        )?;
    }
    Ok(())
}

/// Draw the full overlay for one tick.
///
/// # Errors
///
/// Returns [`TurretError::Vision`] if OpenCV rejects a drawing call; the
/// frame is left untouched in that case.
pub fn render(frame: &mut RgbImage, info: &OverlayInfo) -> Result<(), TurretError> {
    let (width, height) = frame.dimensions();
    let mut canvas = to_mat(frame).map_err(|e| TurretError::Vision(e.to_string()))?;
    draw(&mut canvas, info, width, height)
        .and_then(|()| copy_into(&canvas, frame))
        .map_err(|e| TurretError::Vision(format!("overlay failed: {e}")))
}
