//! Timed finite-state controller: Roaming → Aiming → Shooting → Pausing.
//!
//! The core is the pure [`tick`] function: it takes the current
//! [`ControllerContext`] by value together with one tick's input and returns
//! the successor context plus at most one [`Command`].  There is no hidden
//! state, so every transition can be tested with synthetic timestamps.
//!
//! | State | Condition | Command | Next |
//! |---|---|---|---|
//! | Roaming | target present | `Stop` | Aiming |
//! | Roaming | absent, keep-alive elapsed | `RoamResume` | Roaming (timer reset) |
//! | Aiming | target absent | `RoamResume` | Roaming |
//! | Aiming | settled, offset within tolerance | – | Shooting |
//! | Aiming | settled, offset outside tolerance | `SlowLeft`/`SlowRight` | Aiming (timer reset) |
//! | Shooting | settle elapsed | `Fire` | Pausing |
//! | Pausing | cooldown elapsed | `RoamResume` | Roaming |
//!
//! # Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use turret_runtime::controller::{tick, ControllerConfig, ControllerContext, TickInput};
//! use turret_types::{BoundingBox, Command, Observation, RobotState, Target};
//!
//! let config = ControllerConfig::default();
//! let t0 = Instant::now();
//! let target = Target {
//!     center_x: 640,
//!     area: 5000.0,
//!     bounding_box: BoundingBox { x: 600, y: 400, width: 81, height: 81 },
//! };
//! let input = TickInput {
//!     observation: Observation::Present(target),
//!     frame_center_x: 640,
//!     now: t0 + Duration::from_millis(100),
//! };
//!
//! let (next, command) = tick(ControllerContext::new(t0), &input, &config);
//! assert_eq!(command, Some(Command::Stop));
//! assert_eq!(next.state, RobotState::Aiming);
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use turret_types::{Command, Observation, RobotState};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Control policy constants.  Durations are whole milliseconds so the
/// struct maps directly onto the TOML config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Roaming: interval between `RoamResume` keep-alives.
    pub roam_keepalive_ms: u64,
    /// Aiming: dwell after entering the state or after each correction.
    pub aim_settle_ms: u64,
    /// Aiming: a target closer than this to the frame centre is locked.
    pub lock_tolerance_px: i32,
    /// Aiming: pixels of offset per unit of turn factor.
    pub px_per_turn_unit: f64,
    /// Aiming: ceiling on the turn factor.
    pub max_turn_factor: f64,
    /// Aiming: milliseconds of turning per unit of turn factor.
    pub ms_per_turn_unit: f64,
    /// Shooting: stabilisation wait before firing.
    pub shoot_settle_ms: u64,
    /// Pausing: cooldown after firing.
    pub pause_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            roam_keepalive_ms: 5000,
            aim_settle_ms: 1000,
            lock_tolerance_px: 30,
            px_per_turn_unit: 50.0,
            max_turn_factor: 3.0,
            ms_per_turn_unit: 100.0,
            shoot_settle_ms: 2000,
            pause_ms: 3000,
        }
    }
}

impl ControllerConfig {
    pub fn roam_keepalive(&self) -> Duration {
        Duration::from_millis(self.roam_keepalive_ms)
    }

    pub fn aim_settle(&self) -> Duration {
        Duration::from_millis(self.aim_settle_ms)
    }

    pub fn shoot_settle(&self) -> Duration {
        Duration::from_millis(self.shoot_settle_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    /// Duration of one heading correction for a given pixel offset.
    ///
    /// Grows linearly with `|offset|` and saturates at
    /// `max_turn_factor * ms_per_turn_unit`.
    pub fn turn_ms(&self, offset: i32) -> u32 {
        let factor = (f64::from(offset.unsigned_abs()) / self.px_per_turn_unit)
            .min(self.max_turn_factor);
        (factor * self.ms_per_turn_unit).floor() as u32
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context and input
// ─────────────────────────────────────────────────────────────────────────────

/// The controller's entire mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerContext {
    pub state: RobotState,
    /// When the current state was entered or its timer last reset.
    pub last_transition: Instant,
}

impl ControllerContext {
    /// Initial context: roaming, matching the firmware's power-on behaviour.
    pub fn new(start: Instant) -> Self {
        Self {
            state: RobotState::Roaming,
            last_transition: start,
        }
    }

    fn enter(state: RobotState, now: Instant) -> Self {
        Self {
            state,
            last_transition: now,
        }
    }

    /// Time left and total length of the current state's timer, for the
    /// states whose exit is purely time-driven (Shooting and Pausing).
    pub fn remaining(&self, now: Instant, config: &ControllerConfig) -> Option<(Duration, Duration)> {
        let total = match self.state {
            RobotState::Shooting => config.shoot_settle(),
            RobotState::Pausing => config.pause(),
            RobotState::Roaming | RobotState::Aiming => return None,
        };
        let elapsed = now.saturating_duration_since(self.last_transition);
        Some((total.saturating_sub(elapsed), total))
    }
}

/// One tick's worth of input.
#[derive(Debug, Clone, Copy)]
pub struct TickInput {
    pub observation: Observation,
    /// Horizontal centre of the frame the observation came from.
    pub frame_center_x: i32,
    pub now: Instant,
}

impl TickInput {
    /// Signed horizontal distance from the frame centre to the target;
    /// negative means the target is to the left.
    pub fn offset(&self) -> Option<i32> {
        self.observation
            .target()
            .map(|t| t.center_x - self.frame_center_x)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transition function
// ─────────────────────────────────────────────────────────────────────────────

/// Advance the state machine by one tick.
pub fn tick(
    ctx: ControllerContext,
    input: &TickInput,
    config: &ControllerConfig,
) -> (ControllerContext, Option<Command>) {
    let now = input.now;
    let elapsed = now.saturating_duration_since(ctx.last_transition);

    match ctx.state {
        RobotState::Roaming => {
            if input.observation.is_present() {
                (
                    ControllerContext::enter(RobotState::Aiming, now),
                    Some(Command::Stop),
                )
            } else if elapsed > config.roam_keepalive() {
                (
                    ControllerContext::enter(RobotState::Roaming, now),
                    Some(Command::RoamResume),
                )
            } else {
                (ctx, None)
            }
        }

        RobotState::Aiming => {
            let Some(offset) = input.offset() else {
                return (
                    ControllerContext::enter(RobotState::Roaming, now),
                    Some(Command::RoamResume),
                );
            };
            if elapsed <= config.aim_settle() {
                return (ctx, None);
            }
            if offset.abs() < config.lock_tolerance_px {
                return (ControllerContext::enter(RobotState::Shooting, now), None);
            }
            let turn_ms = config.turn_ms(offset);
            let command = if offset < 0 {
                Command::SlowLeft(turn_ms)
            } else {
                Command::SlowRight(turn_ms)
            };
            (
                ControllerContext::enter(RobotState::Aiming, now),
                Some(command),
            )
        }

        RobotState::Shooting => {
            if elapsed < config.shoot_settle() {
                (ctx, None)
            } else {
                (
                    ControllerContext::enter(RobotState::Pausing, now),
                    Some(Command::Fire),
                )
            }
        }

        RobotState::Pausing => {
            if elapsed > config.pause() {
                (
                    ControllerContext::enter(RobotState::Roaming, now),
                    Some(Command::RoamResume),
                )
            } else {
                (ctx, None)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stateful wrapper
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the [`ControllerContext`] for the loop driver and logs transitions.
#[derive(Debug, Clone)]
pub struct Controller {
    context: ControllerContext,
    config: ControllerConfig,
}

impl Controller {
    pub fn new(config: ControllerConfig, start: Instant) -> Self {
        Self {
            context: ControllerContext::new(start),
            config,
        }
    }

    pub fn state(&self) -> RobotState {
        self.context.state
    }

    /// Run one [`tick`] and keep the resulting context.
    pub fn step(&mut self, input: &TickInput) -> Option<Command> {
        let before = self.context.state;
        let (next, command) = tick(self.context, input, &self.config);
        if next.state != before {
            info!(from = %before, to = %next.state, offset = ?input.offset(), "state transition");
        } else if let Some(cmd) = command {
            debug!(state = %before, command = %cmd, "command without transition");
        }
        self.context = next;
        command
    }

    /// See [`ControllerContext::remaining`].
    pub fn countdown(&self, now: Instant) -> Option<(Duration, Duration)> {
        self.context.remaining(now, &self.config)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
