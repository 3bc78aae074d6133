//! Generic `Camera` trait and supporting types for the frame source.

use image::RgbImage;
use turret_types::TurretError;

/// One captured frame.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Monotonic capture counter, starting at 0 for each camera.
    pub sequence: u64,
    /// 8-bit RGB pixels.
    pub image: RgbImage,
}

impl CameraFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Horizontal midpoint of the frame, used as the aiming reference.
    pub fn center_x(&self) -> i32 {
        (self.image.width() / 2) as i32
    }
}

/// A camera or other source of successive color frames.
pub trait Camera: Send {
    /// Stable identifier for this camera, e.g. `"front_rgb"`.
    fn id(&self) -> &str;

    /// Capture and return the next available frame.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::Acquisition`] if no frame can be produced
    /// (device disconnected, replay exhausted, decode failure).
    fn capture(&mut self) -> Result<CameraFrame, TurretError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockCamera {
        id: String,
        next: u64,
    }

    impl Camera for MockCamera {
        fn id(&self) -> &str {
            &self.id
        }

        fn capture(&mut self) -> Result<CameraFrame, TurretError> {
            let sequence = self.next;
            self.next += 1;
            Ok(CameraFrame {
                sequence,
                image: RgbImage::new(4, 2),
            })
        }
    }

    #[test]
    fn mock_camera_capture() {
        let mut cam = MockCamera {
            id: "front_rgb".to_string(),
            next: 0,
        };
        assert_eq!(cam.id(), "front_rgb");
        let frame = cam.capture().unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.center_x(), 2);
        assert_eq!(cam.capture().unwrap().sequence, 1);
    }
}
