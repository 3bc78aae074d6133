//! Generic `ActuatorLink` trait for the command channel to the motor
//! controller.
//!
//! The link is half-duplex and unacknowledged: a successful [`send`] only
//! means the token left this process.  Callers must send commands in the
//! order they were produced, since the firmware has no way to correlate
//! them.
//!
//! [`send`]: ActuatorLink::send

use turret_types::{Command, TurretError};

/// A fire-and-forget command channel to the actuator firmware.
pub trait ActuatorLink: Send {
    /// Stable identifier for this link, e.g. the serial device path.
    fn id(&self) -> &str;

    /// Transmit one command.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::Link`] if the command could not be written.
    /// No retry is attempted.
    fn send(&mut self, command: Command) -> Result<(), TurretError>;
}

impl<L: ActuatorLink + ?Sized> ActuatorLink for Box<L> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn send(&mut self, command: Command) -> Result<(), TurretError> {
        (**self).send(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal in-process link used only for tests.
    struct MockLink {
        id: String,
        sent: Vec<Command>,
    }

    impl ActuatorLink for MockLink {
        fn id(&self) -> &str {
            &self.id
        }

        fn send(&mut self, command: Command) -> Result<(), TurretError> {
            self.sent.push(command);
            Ok(())
        }
    }

    #[test]
    fn mock_link_records_in_order() {
        let mut link = MockLink {
            id: "mock".to_string(),
            sent: Vec::new(),
        };
        link.send(Command::Stop).unwrap();
        link.send(Command::SlowLeft(100)).unwrap();
        assert_eq!(link.id(), "mock");
        assert_eq!(link.sent, vec![Command::Stop, Command::SlowLeft(100)]);
    }

    #[test]
    fn boxed_link_forwards() {
        let mut boxed: Box<dyn ActuatorLink> = Box::new(MockLink {
            id: "boxed".to_string(),
            sent: Vec::new(),
        });
        assert_eq!(boxed.id(), "boxed");
        boxed.send(Command::Fire).unwrap();
    }
}
