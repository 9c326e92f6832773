//! Process wiring: store, bus receiver, listeners and renderer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};

use fiducial_bus::{BusChannels, BusError, BusReceiver};
use fiducial_core::StateStore;

use crate::config::{ConfigError, PulseConfig};
use crate::listener::{spawn_key_listener, spawn_marker_listener};
use crate::renderer::{spawn_renderer, AMPLITUDE};
use crate::sink::{open_sink, ChordSink};

#[derive(Debug, Error)]
pub enum PulseError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("bus: {0}")]
    Bus(#[from] BusError),
    #[error("{0} thread panicked")]
    Panicked(&'static str),
    #[error("{0} thread stopped")]
    Stopped(&'static str),
}

/// How often [`Engine::supervise`] checks its threads.
const WATCH_INTERVAL: Duration = Duration::from_millis(250);

// ════════════════════════════════════════════════════════════════════════════
// Engine
// ════════════════════════════════════════════════════════════════════════════

/// A running engine.  Its threads never finish on their own.
pub struct Engine {
    pub store:    Arc<StateStore>,
    pub addr:     SocketAddr,
    pub bus:      JoinHandle<()>,
    pub markers:  JoinHandle<usize>,
    pub keys:     JoinHandle<usize>,
    pub renderer: JoinHandle<()>,
}

impl Engine {
    /// Bind the bus and start every thread.  `make_sink` runs on the
    /// renderer thread.
    pub fn start<S, F>(cfg: &PulseConfig, make_sink: F) -> Result<Engine, PulseError>
    where
        S: ChordSink + 'static,
        F: FnOnce() -> S + Send + 'static,
    {
        cfg.validate()?;
        let store = Arc::new(StateStore::new());

        let (receiver, BusChannels { markers, keys }) = BusReceiver::bind(cfg.listen.as_str())?;
        let addr = receiver.local_addr()?;

        let markers = spawn_marker_listener(store.clone(), markers);
        let keys = spawn_key_listener(keys);
        let renderer = spawn_renderer(store.clone(), cfg.tick(), AMPLITUDE, make_sink);
        let bus = receiver.spawn();

        info!(%addr, tick_ms = cfg.tick_ms, "chord engine started");
        Ok(Engine { store, addr, bus, markers, keys, renderer })
    }

    /// Block until one of the threads ends, and report which one.
    pub fn supervise(self) -> PulseError {
        let Engine { bus, markers, keys, renderer, .. } = self;
        let err = loop {
            if renderer.is_finished() {
                break finished("renderer", renderer);
            }
            if markers.is_finished() {
                break finished("marker listener", markers);
            }
            if keys.is_finished() {
                break finished("key listener", keys);
            }
            if bus.is_finished() {
                break finished("bus receiver", bus);
            }
            thread::sleep(WATCH_INTERVAL);
        };
        error!(error = %err, "chord engine stopped");
        err
    }
}

fn finished<T>(name: &'static str, handle: JoinHandle<T>) -> PulseError {
    match handle.join() {
        Ok(_) => PulseError::Stopped(name),
        Err(_) => PulseError::Panicked(name),
    }
}

/// Start with the configured sink and block for the life of the process.
/// Only returns on failure.
pub fn run(cfg: PulseConfig) -> Result<(), PulseError> {
    let sink_cfg = cfg.clone();
    let engine = Engine::start(&cfg, move || open_sink(&sink_cfg))?;
    Err(engine.supervise())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
