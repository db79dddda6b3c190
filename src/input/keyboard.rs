// Terminal keyboard module
//
// Reads key presses from the terminal through crossterm's event queue. The
// terminal is in raw mode while the display is open, so Ctrl+C arrives as a
// key event instead of SIGINT and is turned into a shutdown request here.

use super::{KeyCode, KeySource};
use crate::host::ShutdownToken;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// What a terminal key event means to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    /// A key the sampler should see
    Key(KeyCode),
    /// Ctrl+C
    Interrupt,
    /// Releases, repeats, modifiers and keys the host has no code for
    Ignore,
}

/// Map a crossterm key event to a host key
pub fn translate(event: &KeyEvent) -> Translation {
    use crossterm::event::KeyCode as Term;

    if event.kind != KeyEventKind::Press {
        return Translation::Ignore;
    }

    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return match event.code {
            Term::Char('c') | Term::Char('C') => Translation::Interrupt,
            _ => Translation::Ignore,
        };
    }

    let key = match event.code {
        Term::Char(c) => KeyCode::Char(c),
        Term::Up => KeyCode::Up,
        Term::Down => KeyCode::Down,
        Term::Left => KeyCode::Left,
        Term::Right => KeyCode::Right,
        Term::Enter => KeyCode::Enter,
        Term::Esc => KeyCode::Esc,
        Term::Tab => KeyCode::Tab,
        Term::Backspace => KeyCode::Backspace,
        _ => return Translation::Ignore,
    };

    Translation::Key(key)
}

/// Key source reading the controlling terminal
pub struct TerminalKeys {
    timeout: Duration,
    shutdown: ShutdownToken,
    error_reported: bool,
}

impl TerminalKeys {
    /// Create a terminal key source
    ///
    /// # Arguments
    /// * `timeout` - Longest time one poll waits for an event
    /// * `shutdown` - Token requested when Ctrl+C is pressed
    pub fn new(timeout: Duration, shutdown: ShutdownToken) -> Self {
        Self {
            timeout,
            shutdown,
            error_reported: false,
        }
    }

    fn read_event(&mut self) -> std::io::Result<Option<Event>> {
        if event::poll(self.timeout)? {
            event::read().map(Some)
        } else {
            Ok(None)
        }
    }
}

impl KeySource for TerminalKeys {
    fn poll_key(&mut self) -> Option<KeyCode> {
        let event = match self.read_event() {
            Ok(event) => event?,
            Err(e) => {
                if !self.error_reported {
                    log::warn!("failed to read terminal input: {}", e);
                    self.error_reported = true;
                }
                return None;
            }
        };

        let Event::Key(key_event) = event else {
            return None;
        };

        match translate(&key_event) {
            Translation::Key(key) => Some(key),
            Translation::Interrupt => {
                log::info!("interrupt key pressed, shutting down");
                self.shutdown.request();
                None
            }
            Translation::Ignore => None,
        }
    }
}
