//! [`TurretLoop`] – the single-threaded capture → detect → decide → act loop.
//!
//! Each tick:
//!
//! 1. **Acquire** a frame from the [`Camera`].  Failure ends the run.
//! 2. **Detect** the dominant red blob with the [`BlobDetector`].
//! 3. **Decide** by advancing the [`Controller`] with the current instant.
//! 4. **Act** by sending the command, if any, over the link.  Send failures
//!    are logged and tolerated until [`FailureBudget`] runs out.
//! 5. **Report**: draw the overlay on the frame and hand the
//!    [`TickReport`] to every [`TelemetrySink`].
//! 6. **Poll** the operator.  `Quit` ends the run; forcing keys send their
//!    command directly and leave the controller state alone.
//!
//! [`TurretLoop::run`] consumes the loop.  However it ends, including
//! by panic, the link's [`StopGuard`] sends a final `Stop` before the camera
//! and link are released.
//!
//! # Example
//!
//! ```rust
//! use image::RgbImage;
//! use turret_hal::{SimCamera, SimLink};
//! use turret_runtime::operator::NoOperator;
//! use turret_runtime::turret_loop::{ExitReason, TurretLoop, TurretLoopConfig};
//! use turret_types::Command;
//!
//! let camera = SimCamera::new("sim").with_repeated(&RgbImage::new(64, 48), 3);
//! let link = SimLink::new("sim");
//! let log = link.log();
//!
//! let config = TurretLoopConfig { max_ticks: Some(3), ..TurretLoopConfig::default() };
//! let summary = TurretLoop::new(camera, link, config).run(&mut NoOperator).unwrap();
//!
//! assert_eq!(summary.exit, ExitReason::TickLimit);
//! assert_eq!(log.commands(), vec![Command::Stop]);
//! ```

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug_span, error, info, info_span, warn};
use turret_hal::{ActuatorLink, Camera, CameraConfig, CameraFrame};
use turret_perception::overlay::{self, OverlayInfo};
use turret_perception::{BlobDetector, DetectorConfig};
use turret_types::{Command, RobotState, TurretError};
use uuid::Uuid;

use crate::controller::{Controller, ControllerConfig, TickInput};
use crate::guard::{FailureBudget, StopGuard};
use crate::operator::{OperatorInput, OperatorKey};
use crate::sink::{LinkOutcome, TelemetrySink, TickReport};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration and results
// ─────────────────────────────────────────────────────────────────────────────

/// Everything [`TurretLoop`] needs besides its hardware.
#[derive(Debug, Clone, PartialEq)]
pub struct TurretLoopConfig {
    pub detector: DetectorConfig,
    pub controller: ControllerConfig,
    pub camera: CameraConfig,
    /// Consecutive link failures that end the run; 0 never does.
    pub max_consecutive_link_failures: u32,
    /// Stop after this many ticks.  `None` runs until quit or failure.
    pub max_ticks: Option<u64>,
}

impl Default for TurretLoopConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            controller: ControllerConfig::default(),
            camera: CameraConfig::default(),
            max_consecutive_link_failures: 5,
            max_ticks: None,
        }
    }
}

/// Why a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    OperatorQuit,
    TickLimit,
}

/// Totals for one completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub ticks: u64,
    /// Commands that reached the link, including the final stop.
    pub commands_sent: u64,
    pub link_failures: u64,
    pub shots_fired: u64,
    pub final_state: RobotState,
    pub exit: ExitReason,
}

// ─────────────────────────────────────────────────────────────────────────────
// TurretLoop
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the camera, the link, and the policy for one targeting run.
pub struct TurretLoop<C: Camera, L: ActuatorLink> {
    // Declared first so the final stop precedes releasing the camera.
    link: StopGuard<L>,
    camera: C,
    detector: BlobDetector,
    controller: Controller,
    sinks: Vec<Box<dyn TelemetrySink>>,
    camera_config: CameraConfig,
    max_ticks: Option<u64>,
    failures: FailureBudget,
    run_id: Uuid,
    size_warned: bool,
    ticks: u64,
    commands_sent: u64,
    shots_fired: u64,
}

impl<C: Camera, L: ActuatorLink> TurretLoop<C, L> {
    pub fn new(camera: C, link: L, config: TurretLoopConfig) -> Self {
        Self {
            link: StopGuard::new(link),
            camera,
            detector: BlobDetector::new(config.detector),
            controller: Controller::new(config.controller, Instant::now()),
            sinks: Vec::new(),
            camera_config: config.camera,
            max_ticks: config.max_ticks,
            failures: FailureBudget::new(config.max_consecutive_link_failures),
            run_id: Uuid::new_v4(),
            size_warned: false,
            ticks: 0,
            commands_sent: 0,
            shots_fired: 0,
        }
    }

    /// Attach a telemetry sink.  Sinks run in the order they were added.
    pub fn with_sink(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Drive ticks until the operator quits, the tick limit is reached, or a
    /// fatal error occurs.
    ///
    /// # Errors
    ///
    /// - [`TurretError::Acquisition`] when the camera fails.
    /// - [`TurretError::Link`] when consecutive send failures reach the
    ///   configured limit.
    pub fn run(mut self, operator: &mut dyn OperatorInput) -> Result<RunSummary, TurretError> {
        let span = info_span!(
            "turret_run",
            run_id = %self.run_id,
            camera = self.camera.id(),
            link = self.link.link_id(),
        );
        let _enter = span.enter();
        info!("targeting loop started");

        let outcome = self.run_ticks(operator);

        let TurretLoop {
            link,
            camera,
            controller,
            failures,
            run_id,
            ticks,
            commands_sent,
            shots_fired,
            ..
        } = self;
        let final_stop = link.finish();
        drop(camera);

        let exit = outcome.inspect_err(|e| error!(error = %e, ticks, "targeting loop aborted"))?;
        let summary = RunSummary {
            run_id,
            ticks,
            commands_sent: commands_sent + u64::from(final_stop.is_ok()),
            link_failures: failures.total() + u64::from(final_stop.is_err()),
            shots_fired,
            final_state: controller.state(),
            exit,
        };
        info!(
            ?exit,
            ticks,
            shots = shots_fired,
            link_failures = summary.link_failures,
            "targeting loop finished"
        );
        Ok(summary)
    }

    fn run_ticks(&mut self, operator: &mut dyn OperatorInput) -> Result<ExitReason, TurretError> {
        loop {
            if let Some(limit) = self.max_ticks
                && self.ticks >= limit
            {
                return Ok(ExitReason::TickLimit);
            }

            self.tick()?;

            while let Some(key) = operator.poll() {
                let Some(command) = key.forced_command() else {
                    info!("operator requested quit");
                    return Ok(ExitReason::OperatorQuit);
                };
                self.force(key, command)?;
            }
        }
    }

    fn tick(&mut self) -> Result<(), TurretError> {
        let _tick = debug_span!("tick", n = self.ticks).entered();

        let mut frame = self
            .camera
            .capture()
            .inspect_err(|e| error!(error = %e, "frame acquisition failed"))?;
        self.check_geometry(&frame);

        let observation = self.detector.detect(&frame.image);
        let input = TickInput {
            observation,
            frame_center_x: frame.center_x(),
            now: Instant::now(),
        };

        let state_before = self.controller.state();
        let command = self.controller.step(&input);
        let link = match command {
            Some(command) => self.dispatch(command)?,
            None => LinkOutcome::Idle,
        };
        let state_after = self.controller.state();

        let overlay = OverlayInfo {
            state: state_after,
            observation,
            countdown: self.controller.countdown(input.now),
        };
        if let Err(e) = overlay::render(&mut frame.image, &overlay) {
            warn!(error = %e, "overlay skipped");
        }

        let report = TickReport {
            run_id: self.run_id,
            sequence: self.ticks,
            timestamp: Utc::now(),
            state_before,
            state_after,
            observation,
            offset: input.offset(),
            command,
            link,
        };
        for sink in &mut self.sinks {
            if let Err(e) = sink.publish(&report, &frame.image) {
                warn!(error = %e, "telemetry sink failed");
            }
        }

        self.ticks += 1;
        Ok(())
    }

    /// Send an operator-forced command without touching the controller.
    fn force(&mut self, key: OperatorKey, command: Command) -> Result<(), TurretError> {
        info!(?key, %command, state = %self.controller.state(), "operator override");
        self.dispatch(command).map(|_| ())
    }

    /// Best-effort send.  Only a spent failure budget is an error.
    fn dispatch(&mut self, command: Command) -> Result<LinkOutcome, TurretError> {
        match self.link.send(command) {
            Ok(()) => {
                self.failures.record_success();
                self.commands_sent += 1;
                if command == Command::Fire {
                    self.shots_fired += 1;
                }
                info!(%command, "command sent");
                Ok(LinkOutcome::Sent)
            }
            Err(e) => {
                let exhausted = self.failures.record_failure();
                warn!(
                    %command,
                    error = %e,
                    consecutive = self.failures.consecutive(),
                    "command send failed"
                );
                if exhausted {
                    error!(
                        consecutive = self.failures.consecutive(),
                        "link failure limit reached"
                    );
                    return Err(e);
                }
                Ok(LinkOutcome::Failed(e.to_string()))
            }
        }
    }

    fn check_geometry(&mut self, frame: &CameraFrame) {
        if self.size_warned || self.camera_config.matches(frame.width(), frame.height()) {
            return;
        }
        self.size_warned = true;
        warn!(
            width = frame.width(),
            height = frame.height(),
            expected_width = self.camera_config.width,
            expected_height = self.camera_config.height,
            "frame size differs from configured camera geometry; detection thresholds may need retuning"
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
