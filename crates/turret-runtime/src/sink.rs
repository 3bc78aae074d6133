//! Per-tick telemetry: the [`TickReport`] record and the sinks that consume it.
//!
//! - [`LogSink`] emits each report as a JSON string through `tracing`.
//! - [`SnapshotSink`] writes annotated frames as PNG files, every N-th tick
//!   and on every tick that sent a command.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use turret_types::{Command, Observation, RobotState, TurretError};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────────────────

/// What happened to the tick's command on the link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "error", rename_all = "snake_case")]
pub enum LinkOutcome {
    /// The controller emitted nothing.
    Idle,
    Sent,
    /// Best-effort failure; the loop carried on.
    Failed(String),
}

/// One tick of the targeting loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub run_id: Uuid,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub state_before: RobotState,
    pub state_after: RobotState,
    pub observation: Observation,
    /// Target offset from the frame centre, when a target was seen.
    pub offset: Option<i32>,
    pub command: Option<Command>,
    pub link: LinkOutcome,
}

impl TickReport {
    pub fn transitioned(&self) -> bool {
        self.state_before != self.state_after
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sinks
// ─────────────────────────────────────────────────────────────────────────────

/// Consumer of per-tick telemetry.  `frame` carries the overlay.
pub trait TelemetrySink: Send {
    fn publish(&mut self, report: &TickReport, frame: &RgbImage) -> Result<(), TurretError>;
}

/// Writes each report as a JSON log field.
///
/// Ticks that sent a command or changed state go out at `info`; quiet
/// ticks at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn publish(&mut self, report: &TickReport, _frame: &RgbImage) -> Result<(), TurretError> {
        let json = serde_json::to_string(report)
            .map_err(|e| TurretError::Io(format!("tick report serialisation failed: {e}")))?;
        if report.command.is_some() || report.transitioned() {
            info!(tick = %json, "tick");
        } else {
            debug!(tick = %json, "tick");
        }
        Ok(())
    }
}

/// Writes annotated frames into a directory as `frame_<sequence>.png`.
#[derive(Debug, Clone)]
pub struct SnapshotSink {
    dir: PathBuf,
    every: u64,
    written: u64,
}

impl SnapshotSink {
    /// Create the directory if needed.  `every == 0` keeps only the frames
    /// of ticks that sent a command.
    pub fn new(dir: impl Into<PathBuf>, every: u64) -> Result<Self, TurretError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            TurretError::Io(format!("cannot create snapshot dir {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir,
            every,
            written: 0,
        })
    }

    fn wants(&self, report: &TickReport) -> bool {
        report.command.is_some() || (self.every != 0 && report.sequence % self.every == 0)
    }
}

impl TelemetrySink for SnapshotSink {
    fn publish(&mut self, report: &TickReport, frame: &RgbImage) -> Result<(), TurretError> {
        if !self.wants(report) {
            return Ok(());
        }
        let path = self.dir.join(format!("frame_{:06}.png", report.sequence));
        frame
            .save(&path)
            .map_err(|e| TurretError::Io(format!("cannot write {}: {e}", path.display())))?;
        self.written += 1;
        debug!(path = %path.display(), written = self.written, "snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turret_types::{BoundingBox, Target};

    fn report(sequence: u64, command: Option<Command>) -> TickReport {
        TickReport {
            run_id: Uuid::new_v4(),
            sequence,
            timestamp: Utc::now(),
            state_before: RobotState::Roaming,
            state_after: RobotState::Roaming,
            observation: Observation::Absent,
            offset: None,
            command,
            link: if command.is_some() {
                LinkOutcome::Sent
            } else {
                LinkOutcome::Idle
            },
        }
    }

    #[test]
    fn report_serialises_with_wire_fields() {
        let mut r = report(7, Some(Command::SlowRight(200)));
        r.state_after = RobotState::Aiming;
        r.observation = Observation::Present(Target {
            center_x: 740,
            area: 4000.0,
            bounding_box: BoundingBox {
                x: 700,
                y: 10,
                width: 81,
                height: 51,
            },
        });
        r.offset = Some(100);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["sequence"], 7);
        assert_eq!(json["offset"], 100);
        assert_eq!(json["link"]["outcome"], "sent");
        assert!(r.transitioned());

        let back: TickReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn failed_outcome_keeps_error_text() {
        let json = serde_json::to_value(LinkOutcome::Failed("broken pipe".into())).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["error"], "broken pipe");
    }

    #[test]
    fn log_sink_accepts_reports() {
        let mut sink = LogSink;
        sink.publish(&report(0, None), &RgbImage::new(1, 1)).unwrap();
    }

    #[test]
    fn snapshot_sink_writes_every_nth_and_command_frames() {
        let dir = tempfile::tempdir().unwrap();
        let snaps = dir.path().join("snaps");
        let mut sink = SnapshotSink::new(&snaps, 3).unwrap();
        let frame = RgbImage::new(8, 6);

        for seq in 0..7 {
            let command = (seq == 4).then_some(Command::Fire);
            sink.publish(&report(seq, command), &frame).unwrap();
        }

        // 0, 3, 6 by cadence plus 4 for the command.
        assert_eq!(fs::read_dir(&snaps).unwrap().count(), 4);
        for seq in [0, 3, 4, 6] {
            let path = snaps.join(format!("frame_{seq:06}.png"));
            assert!(path.exists(), "{}", path.display());
        }
        assert!(!snaps.join("frame_000001.png").exists());

        let saved = image::open(snaps.join("frame_000003.png")).unwrap();
        assert_eq!((saved.width(), saved.height()), (8, 6));
    }

    #[test]
    fn zero_cadence_keeps_command_frames_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = SnapshotSink::new(dir.path(), 0).unwrap();
        let frame = RgbImage::new(2, 2);
        sink.publish(&report(0, None), &frame).unwrap();
        sink.publish(&report(1, Some(Command::Stop)), &frame).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
