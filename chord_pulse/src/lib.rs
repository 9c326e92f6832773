//! # chord_pulse
//!
//! The chord engine.  Fiducial markers arrive on the OSC bus, a listener
//! thread writes them into a shared [`fiducial_core::StateStore`], and a
//! renderer thread turns the store into one chord per tick.
//!
//! ```text
//!  UDP :4559 ──► BusReceiver ──► marker listener ──► StateStore
//!                     │                                  │
//!                     └──► key listener (log)            ▼
//!                                              renderer ──► ChordSink
//! ```

pub mod app;
pub mod config;
pub mod listener;
pub mod renderer;
pub mod sink;

pub use app::{run, Engine, PulseError};
pub use config::{ConfigError, Overrides, PulseConfig};
pub use renderer::{spawn_renderer, ChordRenderer, AMPLITUDE};
pub use sink::{open_sink, ChordSink, MidiSink, NullSink, SinkError};
