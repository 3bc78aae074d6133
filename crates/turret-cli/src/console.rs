//! Operator console – reads single-key commands from stdin on a helper
//! thread and forwards them to the loop.
//!
//! Supported keys (first character of each line):
//!   q – quit the run (final stop is sent)
//!   s – force Stop
//!   a – force RoamResume
//!   ? – show this list

use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use colored::Colorize;
use tracing::warn;
use turret_runtime::OperatorKey;

/// Start the console thread.  It ends on EOF, on `q`, or when the loop has
/// gone away.
pub fn spawn(keys: Sender<OperatorKey>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("operator-console".to_string())
        .spawn(move || {
            if let Err(e) = pump(io::stdin().lock(), &keys) {
                warn!(error = %e, "operator console read failed");
            }
        })
}

/// Forward keys from `input` until EOF, quit, or a closed channel.
pub(crate) fn pump(mut input: impl BufRead, keys: &Sender<OperatorKey>) -> io::Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        if line.trim() == "?" {
            print_help();
            continue;
        }
        let Some(key) = OperatorKey::from_line(&line) else {
            if !line.trim().is_empty() {
                println!(
                    "{} '{}'. Type {} for the key list.",
                    "Unknown key:".red(),
                    line.trim().yellow(),
                    "?".bold()
                );
            }
            continue;
        };
        if keys.send(key).is_err() {
            return Ok(());
        }
        if key == OperatorKey::Quit {
            return Ok(());
        }
    }
}

pub fn print_help() {
    println!();
    println!("{}", "Operator keys (press Enter after each)".bold().underline());
    println!("  {}  – quit; the robot is stopped first", "q".bold().cyan());
    println!("  {}  – force Stop", "s".bold().cyan());
    println!("  {}  – force RoamResume", "a".bold().cyan());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc::channel;

    #[test]
    fn forwards_known_keys_until_quit() {
        let (tx, rx) = channel();
        pump(Cursor::new("s\n\nx\n?\n a\nq\ns\n"), &tx).unwrap();
        let keys: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            keys,
            vec![
                OperatorKey::ForceStop,
                OperatorKey::ForceRoam,
                OperatorKey::Quit
            ]
        );
    }

    #[test]
    fn stops_at_eof() {
        let (tx, rx) = channel();
        pump(Cursor::new("a"), &tx).unwrap();
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![OperatorKey::ForceRoam]);
    }

    #[test]
    fn stops_when_loop_has_gone() {
        let (tx, rx) = channel();
        drop(rx);
        pump(Cursor::new("s\ns\n"), &tx).unwrap();
    }
}
