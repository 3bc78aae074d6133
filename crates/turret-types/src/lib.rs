//! `turret-types` – shared vocabulary for the turret workspace.
//!
//! Controller states, actuator commands and their wire tokens, detector
//! observations, and [`TurretError`], the error type every crate returns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The controller's mode.  Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotState {
    /// Autonomous wandering, delegated to the motor controller firmware.
    Roaming,
    /// Stopped with a target in view, correcting heading.
    Aiming,
    /// Locked on, waiting for the chassis to settle before firing.
    Shooting,
    /// Cooldown after a shot.
    Pausing,
}

impl RobotState {
    /// Upper-case label used in overlays and logs.
    pub fn label(self) -> &'static str {
        match self {
            RobotState::Roaming => "ROAMING",
            RobotState::Aiming => "AIMING",
            RobotState::Shooting => "SHOOTING",
            RobotState::Pausing => "PAUSING",
        }
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A command for the motor controller.
///
/// The [`Display`](fmt::Display) form is the exact wire token understood by
/// the actuator firmware; it must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "command", content = "duration_ms")]
pub enum Command {
    /// Halt the drive base (`s`).
    Stop,
    /// Resume autonomous roaming (`a`).
    RoamResume,
    /// Turn slowly left for the given number of milliseconds (`SL<ms>`).
    SlowLeft(u32),
    /// Turn slowly right for the given number of milliseconds (`SR<ms>`).
    SlowRight(u32),
    /// Discharge the launcher (`FIRE`).
    Fire,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Stop => f.write_str("s"),
            Command::RoamResume => f.write_str("a"),
            Command::SlowLeft(ms) => write!(f, "SL{ms}"),
            Command::SlowRight(ms) => write!(f, "SR{ms}"),
            Command::Fire => f.write_str("FIRE"),
        }
    }
}

impl FromStr for Command {
    type Err = TurretError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let parse_ms = |digits: &str| {
            digits
                .parse::<u32>()
                .map_err(|e| TurretError::Protocol(format!("bad duration in '{token}': {e}")))
        };
        match token {
            "s" => Ok(Command::Stop),
            "a" => Ok(Command::RoamResume),
            "FIRE" => Ok(Command::Fire),
            other => {
                if let Some(digits) = other.strip_prefix("SL") {
                    parse_ms(digits).map(Command::SlowLeft)
                } else if let Some(digits) = other.strip_prefix("SR") {
                    parse_ms(digits).map(Command::SlowRight)
                } else {
                    Err(TurretError::Protocol(format!("unknown token '{other}'")))
                }
            }
        }
    }
}

/// Axis-aligned pixel rectangle.  `width` and `height` count pixels, so a
/// single pixel has a 1×1 box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Horizontal midpoint, rounded down.
    pub fn center_x(&self) -> i32 {
        (self.x + self.width / 2) as i32
    }

    /// Vertical midpoint, rounded down.
    pub fn center_y(&self) -> i32 {
        (self.y + self.height / 2) as i32
    }
}

/// A detected target blob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Horizontal midpoint of the bounding box, in pixels.
    pub center_x: i32,
    /// Area enclosed by the blob's outer contour, in square pixels.
    pub area: f64,
    pub bounding_box: BoundingBox,
}

/// The detector's verdict for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target")]
pub enum Observation {
    #[default]
    Absent,
    Present(Target),
}

impl Observation {
    pub fn is_present(&self) -> bool {
        matches!(self, Observation::Present(_))
    }

    pub fn target(&self) -> Option<&Target> {
        match self {
            Observation::Present(t) => Some(t),
            Observation::Absent => None,
        }
    }
}

/// Error type shared by every turret crate.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurretError {
    #[error("Frame acquisition failed on {camera}: {details}")]
    Acquisition { camera: String, details: String },

    #[error("Actuator link failure on {link}: {details}")]
    Link { link: String, details: String },

    #[error("Protocol Error: {0}")]
    Protocol(String),

    #[error("Vision Error: {0}")]
    Vision(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("I/O Error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tokens_match_firmware() {
        assert_eq!(Command::Stop.to_string(), "s");
        assert_eq!(Command::RoamResume.to_string(), "a");
        assert_eq!(Command::SlowLeft(150).to_string(), "SL150");
        assert_eq!(Command::SlowRight(200).to_string(), "SR200");
        assert_eq!(Command::Fire.to_string(), "FIRE");
    }

    #[test]
    fn command_parses_wire_tokens() {
        assert_eq!("s".parse::<Command>().unwrap(), Command::Stop);
        assert_eq!("a".parse::<Command>().unwrap(), Command::RoamResume);
        assert_eq!("SL60".parse::<Command>().unwrap(), Command::SlowLeft(60));
        assert_eq!("SR300".parse::<Command>().unwrap(), Command::SlowRight(300));
        assert_eq!("FIRE".parse::<Command>().unwrap(), Command::Fire);
    }

    #[test]
    fn command_rejects_unknown_and_malformed_tokens() {
        assert!(matches!("fire".parse::<Command>(), Err(TurretError::Protocol(_))));
        assert!(matches!("SL".parse::<Command>(), Err(TurretError::Protocol(_))));
        assert!(matches!("SR-5".parse::<Command>(), Err(TurretError::Protocol(_))));
        assert!(matches!("S L5".parse::<Command>(), Err(TurretError::Protocol(_))));
    }

    #[test]
    fn command_json_roundtrip() {
        let json = serde_json::to_string(&Command::SlowRight(120)).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Command::SlowRight(120));
    }

    #[test]
    fn bounding_box_center_rounds_down() {
        let bb = BoundingBox {
            x: 100,
            y: 40,
            width: 51,
            height: 21,
        };
        assert_eq!(bb.center_x(), 125);
        assert_eq!(bb.center_y(), 50);
    }

    #[test]
    fn absent_observation_has_no_target() {
        let obs = Observation::default();
        assert!(!obs.is_present());
        assert!(obs.target().is_none());
    }

    #[test]
    fn turret_error_display() {
        let err = TurretError::Link {
            link: "/dev/ttyACM0".to_string(),
            details: "broken pipe".to_string(),
        };
        assert!(err.to_string().contains("/dev/ttyACM0"));

        let err2 = TurretError::Acquisition {
            camera: "front".to_string(),
            details: "no frame".to_string(),
        };
        assert!(err2.to_string().contains("acquisition"));
    }
}
