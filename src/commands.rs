//! Keyboard commands.
//!
//! The session loop never blocks on input: a reader thread turns stdin lines
//! into `Command`s and the loop drains the channel with `try_recv` once per
//! frame.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    ToggleMemes,
    Report,
    /// Start a scenario by 0-based index.
    Scenario(usize),
    NextScenario,
}

impl Command {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'q' | 'Q' => Some(Self::Quit),
            'm' | 'M' => Some(Self::ToggleMemes),
            'r' | 'R' => Some(Self::Report),
            'n' | 'N' => Some(Self::NextScenario),
            '1'..='6' => key.to_digit(10).map(|d| Self::Scenario(d as usize - 1)),
            _ => None,
        }
    }

    /// Every recognised key on an input line, in order.
    pub fn parse_line(line: &str) -> Vec<Self> {
        line.chars().filter_map(Self::from_key).collect()
    }
}

/// Forward commands from any line-oriented reader over `tx`.
///
/// Returns when the reader hits EOF or the receiving side hangs up.
pub fn forward_commands<R: BufRead>(reader: R, tx: &Sender<Command>) {
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        for command in Command::parse_line(&line) {
            if tx.send(command).is_err() {
                return;
            }
        }
    }
}

/// Spawn the stdin reader thread.
pub fn spawn_stdin_reader() -> Receiver<Command> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("awk-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            forward_commands(stdin.lock(), &tx);
        });
    if let Err(err) = spawned {
        log::warn!("keyboard commands unavailable: {}", err);
    }
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(Command::from_key('q'), Some(Command::Quit));
        assert_eq!(Command::from_key('1'), Some(Command::Scenario(0)));
        assert_eq!(Command::from_key('6'), Some(Command::Scenario(5)));
        assert_eq!(Command::from_key('7'), None);
        assert_eq!(Command::from_key('x'), None);
    }

    #[test]
    fn lines_are_forwarded_in_order() {
        let (tx, rx) = mpsc::channel();
        forward_commands(Cursor::new("m\n3n\nq\n"), &tx);
        drop(tx);
        let got: Vec<_> = rx.iter().collect();
        assert_eq!(
            got,
            vec![
                Command::ToggleMemes,
                Command::Scenario(2),
                Command::NextScenario,
                Command::Quit
            ]
        );
    }
}
