//! In-process simulated hardware for testing the targeting loop without a
//! camera or a motor controller.
//!
//! [`SimCamera`] plays back a scripted list of frames and then reports an
//! acquisition failure, which is how a test ends a run.  [`SimLink`] records
//! every command it is given; clone its [`SentLog`] before handing the link
//! to the loop to inspect the traffic afterwards.
//!
//! # Example
//!
//! ```rust
//! use image::RgbImage;
//! use turret_hal::camera::Camera;
//! use turret_hal::link::ActuatorLink;
//! use turret_hal::sim::{SimCamera, SimLink};
//! use turret_types::Command;
//!
//! let mut camera = SimCamera::new("front").with_frame(RgbImage::new(4, 4));
//! assert!(camera.capture().is_ok());
//! assert!(camera.capture().is_err());
//!
//! let mut link = SimLink::new("sim");
//! let log = link.log();
//! link.send(Command::Stop).expect("sim link must succeed");
//! assert_eq!(log.commands(), vec![Command::Stop]);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use image::RgbImage;
use turret_types::{Command, TurretError};

use crate::camera::{Camera, CameraFrame};
use crate::link::ActuatorLink;

// ────────────────────────────────────────────────────────────────────────────
// Simulated camera
// ────────────────────────────────────────────────────────────────────────────

/// A camera that returns a fixed script of frames, then fails.
pub struct SimCamera {
    id: String,
    frames: VecDeque<RgbImage>,
    sequence: u64,
}

impl SimCamera {
    /// Create a simulated camera with an empty script.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            frames: VecDeque::new(),
            sequence: 0,
        }
    }

    /// Append one frame to the script.
    pub fn with_frame(mut self, frame: RgbImage) -> Self {
        self.frames.push_back(frame);
        self
    }

    /// Append `count` copies of `frame` to the script.
    pub fn with_repeated(mut self, frame: &RgbImage, count: usize) -> Self {
        self.frames
            .extend(std::iter::repeat_n(frame, count).cloned());
        self
    }
}

impl Camera for SimCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn capture(&mut self) -> Result<CameraFrame, TurretError> {
        let image = self.frames.pop_front().ok_or_else(|| TurretError::Acquisition {
            camera: self.id.clone(),
            details: "simulated frame script exhausted".to_string(),
        })?;
        let sequence = self.sequence;
        self.sequence += 1;
        Ok(CameraFrame { sequence, image })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated link
// ────────────────────────────────────────────────────────────────────────────

/// Shared record of the commands a [`SimLink`] has accepted.
#[derive(Clone, Default)]
pub struct SentLog(Arc<Mutex<Vec<Command>>>);

impl SentLog {
    fn lock(&self) -> MutexGuard<'_, Vec<Command>> {
        // A poisoned log still holds every command recorded before the panic.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of every accepted command, in send order.
    pub fn commands(&self) -> Vec<Command> {
        self.lock().clone()
    }

    /// Accepted commands rendered as wire tokens.
    pub fn tokens(&self) -> Vec<String> {
        self.lock().iter().map(ToString::to_string).collect()
    }
}

/// A link that records commands instead of transmitting them.
pub struct SimLink {
    id: String,
    log: SentLog,
    fail_remaining: usize,
}

impl SimLink {
    /// Create a simulated link that always succeeds.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            log: SentLog::default(),
            fail_remaining: 0,
        }
    }

    /// Make the next `count` sends fail with [`TurretError::Link`].
    /// Failed commands are not recorded.
    pub fn failing(mut self, count: usize) -> Self {
        self.fail_remaining = count;
        self
    }

    /// Handle to the command record; stays valid after the link is moved.
    pub fn log(&self) -> SentLog {
        self.log.clone()
    }
}

impl ActuatorLink for SimLink {
    fn id(&self) -> &str {
        &self.id
    }

    fn send(&mut self, command: Command) -> Result<(), TurretError> {
        if self.fail_remaining > 0 {
            self.fail_remaining -= 1;
            return Err(TurretError::Link {
                link: self.id.clone(),
                details: format!("simulated failure sending '{command}'"),
            });
        }
        self.log.lock().push(command);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_camera_plays_script_in_order() {
        let mut cam = SimCamera::new("front")
            .with_frame(RgbImage::new(2, 2))
            .with_repeated(&RgbImage::new(3, 3), 2);

        assert_eq!(cam.capture().unwrap().width(), 2);
        let second = cam.capture().unwrap();
        assert_eq!(second.width(), 3);
        assert_eq!(second.sequence, 1);
        assert_eq!(cam.capture().unwrap().sequence, 2);
    }

    #[test]
    fn sim_camera_fails_when_exhausted() {
        let mut cam = SimCamera::new("front");
        assert!(matches!(cam.capture(), Err(TurretError::Acquisition { .. })));
    }

    #[test]
    fn sim_link_records_tokens() {
        let mut link = SimLink::new("sim");
        let log = link.log();
        link.send(Command::Stop).unwrap();
        link.send(Command::SlowRight(200)).unwrap();
        assert_eq!(log.tokens(), vec!["s".to_string(), "SR200".to_string()]);
        assert_eq!(log.commands().last(), Some(&Command::SlowRight(200)));
    }

    #[test]
    fn sim_link_fails_then_recovers() {
        let mut link = SimLink::new("sim").failing(1);
        let log = link.log();
        assert!(matches!(link.send(Command::Fire), Err(TurretError::Link { .. })));
        link.send(Command::Fire).unwrap();
        assert_eq!(log.commands(), vec![Command::Fire]);
    }
}
