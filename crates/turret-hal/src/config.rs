//! Device settings for the camera and the actuator link.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serial link settings.  Durations are whole milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Device node of the motor controller.
    pub port: String,
    /// Line speed applied when the port is opened (8N1).
    pub baud: u32,
    /// Longest a single command write may block before it counts as a
    /// link failure.
    pub write_timeout_ms: u64,
    /// Pause after every command.
    pub settle_ms: u64,
    /// Pause after opening the port while the controller resets.
    pub open_settle_ms: u64,
    /// Consecutive send failures before the run is abandoned; 0 never
    /// abandons.
    pub max_consecutive_failures: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud: 115_200,
            write_timeout_ms: 100,
            settle_ms: 100,
            open_settle_ms: 2000,
            max_consecutive_failures: 5,
        }
    }
}

impl LinkConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn open_settle(&self) -> Duration {
        Duration::from_millis(self.open_settle_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

/// Expected capture geometry.  Detection thresholds are tuned for it;
/// other sizes still work but are reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 960,
        }
    }
}

impl CameraConfig {
    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}
