//! [`SerialLink`] – newline-terminated ASCII token link to the motor
//! controller.
//!
//! Every [`Command`] is written as its wire token followed by `\n` in a
//! single write, flushed, and then followed by a fixed settle delay that
//! absorbs serial jitter.  There is no acknowledgment to wait for.
//!
//! The port is opened with [`serialport`] at the configured baud rate (8N1)
//! and a write timeout, so a stalled controller turns into a
//! [`TurretError::Link`] instead of blocking the tick loop.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};
use turret_types::{Command, TurretError};

use crate::config::LinkConfig;
use crate::link::ActuatorLink;

/// Token link over any byte sink; [`SerialLink::from_config`] binds it to a
/// serial port.
pub struct SerialLink<W: Write + Send> {
    id: String,
    writer: W,
    settle: Duration,
}

impl SerialLink<Box<dyn SerialPort>> {
    /// Open the port named in `config`.
    ///
    /// Blocks for `open_settle` afterwards: opening the port resets the
    /// Arduino, which ignores input until its bootloader has finished.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::Link`] if the port cannot be opened.
    pub fn from_config(config: &LinkConfig) -> Result<Self, TurretError> {
        let port = serialport::new(&config.port, config.baud)
            .timeout(config.write_timeout())
            .open()
            .map_err(|e| TurretError::Link {
                link: config.port.clone(),
                details: format!("failed to open at {} baud: {e}", config.baud),
            })?;
        info!(
            link = %config.port,
            baud = config.baud,
            settle_ms = config.open_settle_ms,
            "serial link opened"
        );
        let open_settle = config.open_settle();
        if !open_settle.is_zero() {
            thread::sleep(open_settle);
        }
        Ok(Self::new(config.port.clone(), port, config.settle()))
    }
}

impl<W: Write + Send> SerialLink<W> {
    /// Wrap an arbitrary writer.  `settle` is slept after every command.
    pub fn new(id: impl Into<String>, writer: W, settle: Duration) -> Self {
        Self {
            id: id.into(),
            writer,
            settle,
        }
    }
}

impl<W: Write + Send> ActuatorLink for SerialLink<W> {
    fn id(&self) -> &str {
        &self.id
    }

    fn send(&mut self, command: Command) -> Result<(), TurretError> {
        let line = format!("{command}\n");
        self.writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|e| TurretError::Link {
                link: self.id.clone(),
                details: match e.kind() {
                    io::ErrorKind::TimedOut => format!("write of '{command}' timed out"),
                    _ => format!("write of '{command}' failed: {e}"),
                },
            })?;
        debug!(link = %self.id, token = %command, "sent");
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
        Ok(())
    }
}
