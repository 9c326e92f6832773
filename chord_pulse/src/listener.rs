//! Threads that drain the bus channels.
//!
//! The marker listener is the store's only writer.  Key events have no
//! effect yet beyond the log.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, trace};

use fiducial_core::{apply_marker, Applied, KeyEvent, MarkerEvent, StateStore};

/// Apply markers until the channel disconnects.  Returns how many were
/// received.
pub fn run_marker_listener(store: &StateStore, markers: Receiver<MarkerEvent>) -> usize {
    let mut seen = 0;
    for event in markers {
        seen += 1;
        match apply_marker(store, &event) {
            Applied::Root { note, switched, angle_written } => {
                if switched {
                    info!(id = event.id, root = %note, "root switched");
                }
                debug!(id = event.id, angle = event.angle, angle_written, "root marker");
            }
            Applied::Interval { cell, angle } => {
                debug!(id = event.id, cell = cell.name(), angle, "interval");
            }
            Applied::Ignored => trace!(id = event.id, "unrouted marker"),
        }
    }
    debug!(seen, "marker channel closed");
    seen
}

pub fn spawn_marker_listener(
    store: Arc<StateStore>,
    markers: Receiver<MarkerEvent>,
) -> JoinHandle<usize> {
    thread::spawn(move || run_marker_listener(&store, markers))
}

/// Log key codes until the channel disconnects.
pub fn run_key_listener(keys: Receiver<KeyEvent>) -> usize {
    let mut seen = 0;
    for key in keys {
        seen += 1;
        let shown = u32::try_from(key.code).ok().and_then(char::from_u32);
        info!(code = key.code, ?shown, "key");
    }
    debug!(seen, "key channel closed");
    seen
}

pub fn spawn_key_listener(keys: Receiver<KeyEvent>) -> JoinHandle<usize> {
    thread::spawn(move || run_key_listener(keys))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
