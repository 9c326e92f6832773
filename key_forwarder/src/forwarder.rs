//! The poll-and-publish loop.

use std::io;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use fiducial_bus::{BusError, BusSender};

use crate::terminal::{char_if_pressed, RawTerminal};

/// Raw mode swallows SIGINT, so Ctrl-C arrives as this code.  It stops the
/// forwarder and is never published.
pub const CTRL_C: i32 = 3;

pub const DEFAULT_POLL: Duration = Duration::from_millis(5);

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("terminal: {0}")]
    Terminal(#[from] io::Error),
    #[error("publish: {0}")]
    Publish(#[from] BusError),
}

pub trait KeyPublisher {
    fn publish(&mut self, code: i32) -> Result<(), BusError>;
}

impl KeyPublisher for BusSender {
    fn publish(&mut self, code: i32) -> Result<(), BusError> {
        self.send_key(code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Sent(i32),
    Idle,
    Quit,
}

pub struct Forwarder<T: RawTerminal, P: KeyPublisher> {
    term:      T,
    publisher: P,
    poll:      Duration,
}

impl<T: RawTerminal, P: KeyPublisher> Forwarder<T, P> {
    pub fn new(term: T, publisher: P, poll: Duration) -> Self {
        Forwarder { term, publisher, poll }
    }

    /// One check of the terminal, without the sleep.
    pub fn step(&mut self) -> Result<Step, ForwardError> {
        let Some(c) = char_if_pressed(&mut self.term)? else {
            return Ok(Step::Idle);
        };
        let code = c as i32;
        if code == CTRL_C {
            return Ok(Step::Quit);
        }
        if code == 0 {
            return Ok(Step::Idle);
        }
        self.publisher.publish(code)?;
        debug!(code, "key forwarded");
        Ok(Step::Sent(code))
    }

    /// Poll until Ctrl-C or an error.
    pub fn run(&mut self) -> Result<(), ForwardError> {
        info!(poll_ms = self.poll.as_millis() as u64, "forwarding keys; Ctrl-C to stop");
        loop {
            if self.step()? == Step::Quit {
                info!("stopped");
                return Ok(());
            }
            thread::sleep(self.poll);
        }
    }

    pub fn into_parts(self) -> (T, P) {
        (self.term, self.publisher)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
