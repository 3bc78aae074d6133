//! Safety guards around the actuator link.
//!
//! - [`StopGuard`] owns the link and sends a final `Stop` when it goes out of
//!   scope, whether the loop returned normally, failed, or panicked.
//! - [`FailureBudget`] counts consecutive link failures and tells the loop
//!   when to give up.
//!
//! # Example
//!
//! ```rust
//! use turret_hal::SimLink;
//! use turret_runtime::guard::StopGuard;
//! use turret_types::Command;
//!
//! let link = SimLink::new("sim");
//! let log = link.log();
//! {
//!     let mut guard = StopGuard::new(link);
//!     guard.send(Command::RoamResume).unwrap();
//! } // dropped here
//! assert_eq!(log.commands(), vec![Command::RoamResume, Command::Stop]);
//! ```

use tracing::{info, warn};
use turret_hal::ActuatorLink;
use turret_types::{Command, TurretError};

// ─────────────────────────────────────────────────────────────────────────────
// StopGuard
// ─────────────────────────────────────────────────────────────────────────────

/// Actuator link wrapper that always leaves the robot stopped.
pub struct StopGuard<L: ActuatorLink> {
    link: L,
    finished: bool,
}

impl<L: ActuatorLink> StopGuard<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            finished: false,
        }
    }

    pub fn link_id(&self) -> &str {
        self.link.id()
    }

    pub fn send(&mut self, command: Command) -> Result<(), TurretError> {
        self.link.send(command)
    }

    /// Send the final `Stop` now and report whether it went through.
    ///
    /// After this the guard's drop does nothing further.
    pub fn finish(mut self) -> Result<(), TurretError> {
        self.finished = true;
        let result = self.link.send(Command::Stop);
        match &result {
            Ok(()) => info!(link = self.link.id(), "final stop sent"),
            Err(e) => warn!(link = self.link.id(), error = %e, "final stop failed"),
        }
        result
    }
}

impl<L: ActuatorLink> Drop for StopGuard<L> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.link.send(Command::Stop) {
            Ok(()) => info!(link = self.link.id(), "stop sent on unwind"),
            Err(e) => warn!(link = self.link.id(), error = %e, "stop on unwind failed"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FailureBudget
// ─────────────────────────────────────────────────────────────────────────────

/// Consecutive-failure counter.
///
/// `limit == 0` disables escalation entirely.
#[derive(Debug, Clone)]
pub struct FailureBudget {
    limit: u32,
    consecutive: u32,
    total: u64,
}

impl FailureBudget {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            consecutive: 0,
            total: 0,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Record one failure.  Returns `true` once the limit has been reached.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive += 1;
        self.total += 1;
        self.is_exhausted()
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit != 0 && self.consecutive >= self.limit
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}
