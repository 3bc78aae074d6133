//! `turret-hal` – hardware seams of the targeting loop.
//!
//! The rest of the system only ever talks to the [`Camera`] and
//! [`ActuatorLink`] traits, so real devices, recorded footage, and
//! simulated stand-ins are interchangeable.
//!
//! # Modules
//!
//! - [`camera`] – [`Camera`] trait and [`CameraFrame`].
//! - [`config`] – [`LinkConfig`] and [`CameraConfig`] device settings.
//! - [`link`] – [`ActuatorLink`] trait for the fire-and-forget command
//!   channel.
//! - [`serial`] – [`SerialLink`]: newline-terminated token writer bound to a
//!   serial port.
//! - [`replay`] – [`FrameDirCamera`]: replays a directory of images.
//! - [`sim`] – [`SimCamera`] and [`SimLink`] for headless tests.

pub mod camera;
pub mod config;
pub mod link;
pub mod replay;
pub mod serial;
pub mod sim;

pub use camera::{Camera, CameraFrame};
pub use config::{CameraConfig, LinkConfig};
pub use link::ActuatorLink;
pub use replay::FrameDirCamera;
pub use serial::SerialLink;
pub use sim::{SentLog, SimCamera, SimLink};
