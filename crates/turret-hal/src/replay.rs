//! [`FrameDirCamera`] – replays still images from a directory as a camera.
//!
//! Frames are read in file-name order.  Useful for bench-testing the
//! targeting loop against recorded footage exported as numbered images.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use turret_types::TurretError;

use crate::camera::{Camera, CameraFrame};

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// A camera backed by a directory of image files.
pub struct FrameDirCamera {
    id: String,
    frames: Vec<PathBuf>,
    cursor: usize,
    looping: bool,
    sequence: u64,
}

impl FrameDirCamera {
    /// Index every image file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::Acquisition`] when the directory cannot be
    /// read or contains no images.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, TurretError> {
        let dir = dir.as_ref();
        let id = dir.display().to_string();
        let entries = std::fs::read_dir(dir).map_err(|e| TurretError::Acquisition {
            camera: id.clone(),
            details: format!("cannot read frame directory: {e}"),
        })?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(TurretError::Acquisition {
                camera: id,
                details: "no image files found".to_string(),
            });
        }
        info!(camera = %id, frames = frames.len(), "frame directory indexed");

        Ok(Self {
            id,
            frames,
            cursor: 0,
            looping: false,
            sequence: 0,
        })
    }

    /// Restart from the first frame instead of failing once all frames have
    /// been delivered.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

impl Camera for FrameDirCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn capture(&mut self) -> Result<CameraFrame, TurretError> {
        if self.cursor >= self.frames.len() {
            if !self.looping {
                return Err(TurretError::Acquisition {
                    camera: self.id.clone(),
                    details: "frame source exhausted".to_string(),
                });
            }
            self.cursor = 0;
        }
        let path = &self.frames[self.cursor];
        let image = image::open(path)
            .map_err(|e| TurretError::Acquisition {
                camera: self.id.clone(),
                details: format!("cannot decode {}: {e}", path.display()),
            })?
            .to_rgb8();
        debug!(camera = %self.id, frame = %path.display(), "frame loaded");

        self.cursor += 1;
        let sequence = self.sequence;
        self.sequence += 1;
        Ok(CameraFrame { sequence, image })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_frame(dir: &Path, name: &str, shade: u8) {
        let img = RgbImage::from_pixel(8, 6, Rgb([shade, shade, shade]));
        img.save(dir.join(name)).expect("save frame");
    }

    #[test]
    fn replays_frames_in_name_order_then_fails() {
        let dir = tempfile::tempdir().expect("tmp dir");
        write_frame(dir.path(), "frame_002.png", 20);
        write_frame(dir.path(), "frame_001.png", 10);
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut cam = FrameDirCamera::open(dir.path()).unwrap();

        let first = cam.capture().unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(first.image.get_pixel(0, 0), &Rgb([10, 10, 10]));
        let second = cam.capture().unwrap();
        assert_eq!(second.image.get_pixel(0, 0), &Rgb([20, 20, 20]));

        assert!(matches!(cam.capture(), Err(TurretError::Acquisition { .. })));
    }

    #[test]
    fn looping_restarts_from_first_frame() {
        let dir = tempfile::tempdir().expect("tmp dir");
        write_frame(dir.path(), "a.png", 1);

        let mut cam = FrameDirCamera::open(dir.path()).unwrap().looping(true);
        cam.capture().unwrap();
        let again = cam.capture().unwrap();
        assert_eq!(again.sequence, 1);
        assert_eq!(again.image.get_pixel(0, 0), &Rgb([1, 1, 1]));
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = tempfile::tempdir().expect("tmp dir");
        assert!(matches!(
            FrameDirCamera::open(dir.path()),
            Err(TurretError::Acquisition { .. })
        ));
    }
}
