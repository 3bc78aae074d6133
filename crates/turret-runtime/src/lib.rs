//! `turret-runtime` – decision making and loop orchestration.
//!
//! # Modules
//!
//! - [`controller`] – the pure [`tick`][controller::tick] transition
//!   function over [`ControllerContext`][controller::ControllerContext], and
//!   the [`Controller`][controller::Controller] wrapper the loop holds.
//! - [`turret_loop`] – [`TurretLoop`][turret_loop::TurretLoop]: sequences
//!   capture, detection, control, actuation, and telemetry once per tick.
//! - [`guard`] – [`StopGuard`][guard::StopGuard], which leaves the robot
//!   stopped on every exit path, and the link
//!   [`FailureBudget`][guard::FailureBudget].
//! - [`operator`] – the `q` / `s` / `a` operator keys and their sources.
//! - [`sink`] – [`TickReport`][sink::TickReport] and the log and snapshot
//!   telemetry sinks.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   `tracing` subscriber, with OTLP export when
//!   `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//!
//! # Safety contract
//!
//! Commands reach the link in the order the loop produced them, and no run
//! ends without a final `Stop` being attempted.

pub mod controller;
pub mod guard;
pub mod operator;
pub mod sink;
pub mod telemetry;
pub mod turret_loop;

pub use controller::{Controller, ControllerConfig, ControllerContext, TickInput, tick};
pub use guard::{FailureBudget, StopGuard};
pub use operator::{ChannelOperator, NoOperator, OperatorInput, OperatorKey};
pub use sink::{LinkOutcome, LogSink, SnapshotSink, TelemetrySink, TickReport};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use turret_loop::{ExitReason, RunSummary, TurretLoop, TurretLoopConfig};
