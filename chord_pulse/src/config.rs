//! Process settings for the chord engine.
//!
//! The marker routing table, thresholds, start-up sentinels and chord
//! amplitude are fixed.  Only the plumbing around them is configurable:
//! where the bus listens, how long a tick lasts, and which synthesiser gets
//! the chords.
//!
//! Settings come from defaults, then an optional TOML file, then
//! command-line overrides.
//!
//! ```toml
//! listen     = "127.0.0.1:4559"
//! tick_ms    = 1000
//! midi_port  = "fluid"
//! instrument = 0
//! channel    = 0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use fiducial_bus::ENGINE_PORT;

/// One time unit: a beat at 60 BPM.
pub const DEFAULT_TICK_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path:   PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ════════════════════════════════════════════════════════════════════════════
// PulseConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PulseConfig {
    /// UDP address the OSC bus listens on.
    pub listen:     String,
    /// Renderer period in milliseconds.
    pub tick_ms:    u64,
    /// Substring of the MIDI output port to use.
    pub midi_port:  Option<String>,
    /// General MIDI program (0–127).
    pub instrument: u8,
    /// MIDI channel (0–15).
    pub channel:    u8,
    /// Skip MIDI entirely and log chords instead.
    pub null_audio: bool,
}

impl Default for PulseConfig {
    fn default() -> Self {
        PulseConfig {
            listen:     format!("127.0.0.1:{ENGINE_PORT}"),
            tick_ms:    DEFAULT_TICK_MS,
            midi_port:  None,
            instrument: 0,
            channel:    0,
            null_audio: false,
        }
    }
}

/// Command-line values that win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen:     Option<String>,
    pub tick_ms:    Option<u64>,
    pub midi_port:  Option<String>,
    pub null_audio: bool,
}

impl PulseConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Defaults, or the file at `path` when given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn with_overrides(mut self, o: &Overrides) -> Self {
        if let Some(listen) = &o.listen {
            self.listen = listen.clone();
        }
        if let Some(tick_ms) = o.tick_ms {
            self.tick_ms = tick_ms;
        }
        if let Some(port) = &o.midi_port {
            self.midi_port = Some(port.clone());
        }
        self.null_audio |= o.null_audio;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be at least 1".into()));
        }
        if self.channel > 15 {
            return Err(ConfigError::Invalid(format!("channel {} is not 0–15", self.channel)));
        }
        if self.instrument > 127 {
            return Err(ConfigError::Invalid(format!(
                "instrument {} is not a General MIDI program",
                self.instrument
            )));
        }
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Invalid("listen address is empty".into()));
        }
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
