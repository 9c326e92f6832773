//! Single-character terminal reads.
//!
//! Raw mode is entered for one check and left straight after, so the
//! terminal behaves normally between polls.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

pub trait RawTerminal {
    fn enable_raw(&mut self) -> io::Result<()>;
    fn disable_raw(&mut self) -> io::Result<()>;
    /// The pending character, if any, without blocking.
    fn poll_char(&mut self) -> io::Result<Option<char>>;
}

// ════════════════════════════════════════════════════════════════════════════
// RawModeGuard
// ════════════════════════════════════════════════════════════════════════════

/// Holds raw mode until dropped.
pub struct RawModeGuard<'a, T: RawTerminal> {
    term: &'a mut T,
}

impl<'a, T: RawTerminal> RawModeGuard<'a, T> {
    pub fn enter(term: &'a mut T) -> io::Result<Self> {
        term.enable_raw()?;
        Ok(RawModeGuard { term })
    }

    pub fn poll_char(&mut self) -> io::Result<Option<char>> {
        self.term.poll_char()
    }
}

impl<T: RawTerminal> Drop for RawModeGuard<'_, T> {
    fn drop(&mut self) {
        let _ = self.term.disable_raw();
    }
}

/// One raw-mode check for a pending character.
pub fn char_if_pressed<T: RawTerminal>(term: &mut T) -> io::Result<Option<char>> {
    let mut guard = RawModeGuard::enter(term)?;
    guard.poll_char()
}

// ════════════════════════════════════════════════════════════════════════════
// CrosstermTerminal
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct CrosstermTerminal;

impl RawTerminal for CrosstermTerminal {
    fn enable_raw(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()
    }

    fn disable_raw(&mut self) -> io::Result<()> {
        terminal::disable_raw_mode()
    }

    fn poll_char(&mut self) -> io::Result<Option<char>> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                return Ok(key_char(key.code, key.modifiers));
            }
        }
        Ok(None)
    }
}

/// The character a raw terminal would have delivered for this key.
fn key_char(code: KeyCode, modifiers: KeyModifiers) -> Option<char> {
    match code {
        KeyCode::Char(c) if modifiers.contains(KeyModifiers::CONTROL) && c.is_ascii_alphabetic() => {
            char::from_u32(c.to_ascii_lowercase() as u32 - 'a' as u32 + 1)
        }
        KeyCode::Char(c) => Some(c),
        KeyCode::Enter => Some('\r'),
        KeyCode::Tab => Some('\t'),
        KeyCode::Backspace => Some('\x7f'),
        KeyCode::Esc => Some('\x1b'),
        _ => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Test support
// ════════════════════════════════════════════════════════════════════════════
