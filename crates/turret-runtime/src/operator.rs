//! Operator keys polled once per tick.
//!
//! Keys bypass the state machine: `q` ends the run, `s` forces a `Stop`, and
//! `a` forces a `RoamResume`.  The loop never blocks on operator input.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};

use serde::{Deserialize, Serialize};
use turret_types::Command;

/// One operator request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKey {
    Quit,
    ForceStop,
    ForceRoam,
}

impl OperatorKey {
    /// Map a key press to a request.  Unknown keys are ignored.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'q' | 'Q' => Some(Self::Quit),
            's' | 'S' => Some(Self::ForceStop),
            'a' | 'A' => Some(Self::ForceRoam),
            _ => None,
        }
    }

    /// Parse the first non-blank character of a console line.
    pub fn from_line(line: &str) -> Option<Self> {
        line.trim().chars().next().and_then(Self::from_key)
    }

    /// The command a forcing key sends directly to the link.
    pub fn forced_command(self) -> Option<Command> {
        match self {
            Self::Quit => None,
            Self::ForceStop => Some(Command::Stop),
            Self::ForceRoam => Some(Command::RoamResume),
        }
    }
}

/// Non-blocking source of operator keys.
pub trait OperatorInput {
    /// Next pending key, or `None` if nothing is waiting.
    fn poll(&mut self) -> Option<OperatorKey>;
}

/// Headless runs: no operator attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOperator;

impl OperatorInput for NoOperator {
    fn poll(&mut self) -> Option<OperatorKey> {
        None
    }
}

/// Pre-recorded keys, one returned per poll.  A `None` entry is a poll
/// with nothing pressed.
impl OperatorInput for VecDeque<Option<OperatorKey>> {
    fn poll(&mut self) -> Option<OperatorKey> {
        self.pop_front().flatten()
    }
}

/// Keys delivered from another thread, plus a shutdown flag for signal
/// handlers.  A raised flag reads as [`OperatorKey::Quit`].
pub struct ChannelOperator {
    rx: Receiver<OperatorKey>,
    shutdown: Arc<AtomicBool>,
}

impl ChannelOperator {
    /// Build the operator end plus the sender and flag for producers.
    pub fn pair() -> (Self, Sender<OperatorKey>, Arc<AtomicBool>) {
        let (tx, rx) = channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        (
            Self {
                rx,
                shutdown: Arc::clone(&shutdown),
            },
            tx,
            shutdown,
        )
    }
}

impl OperatorInput for ChannelOperator {
    fn poll(&mut self) -> Option<OperatorKey> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Some(OperatorKey::Quit);
        }
        match self.rx.try_recv() {
            Ok(key) => Some(key),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_requests() {
        assert_eq!(OperatorKey::from_key('q'), Some(OperatorKey::Quit));
        assert_eq!(OperatorKey::from_key('s'), Some(OperatorKey::ForceStop));
        assert_eq!(OperatorKey::from_key('a'), Some(OperatorKey::ForceRoam));
        assert_eq!(OperatorKey::from_key('x'), None);
        assert_eq!(OperatorKey::from_line("  a\n"), Some(OperatorKey::ForceRoam));
        assert_eq!(OperatorKey::from_line("\n"), None);
    }

    #[test]
    fn forcing_keys_carry_commands() {
        assert_eq!(OperatorKey::ForceStop.forced_command(), Some(Command::Stop));
        assert_eq!(
            OperatorKey::ForceRoam.forced_command(),
            Some(Command::RoamResume)
        );
        assert_eq!(OperatorKey::Quit.forced_command(), None);
    }

    #[test]
    fn channel_operator_delivers_keys_in_order() {
        let (mut op, tx, _flag) = ChannelOperator::pair();
        assert_eq!(op.poll(), None);
        tx.send(OperatorKey::ForceStop).unwrap();
        tx.send(OperatorKey::ForceRoam).unwrap();
        assert_eq!(op.poll(), Some(OperatorKey::ForceStop));
        assert_eq!(op.poll(), Some(OperatorKey::ForceRoam));
        drop(tx);
        assert_eq!(op.poll(), None);
    }

    #[test]
    fn shutdown_flag_reads_as_quit() {
        let (mut op, _tx, flag) = ChannelOperator::pair();
        flag.store(true, Ordering::SeqCst);
        assert_eq!(op.poll(), Some(OperatorKey::Quit));
    }

    #[test]
    fn scripted_keys_pop_one_per_poll() {
        let mut script = VecDeque::from([None, Some(OperatorKey::Quit)]);
        assert_eq!(script.poll(), None);
        assert_eq!(script.poll(), Some(OperatorKey::Quit));
        assert_eq!(script.poll(), None);
    }
}
