//! # key_forwarder
//!
//! Publishes terminal key presses on the fiducial OSC bus as `/key` events.
//! Each poll enters raw mode for a single non-blocking check and restores
//! the terminal before sleeping.

pub mod forwarder;
pub mod terminal;

pub use forwarder::{ForwardError, Forwarder, KeyPublisher, Step, CTRL_C, DEFAULT_POLL};
pub use terminal::{char_if_pressed, CrosstermTerminal, RawModeGuard, RawTerminal};
