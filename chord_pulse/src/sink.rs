//! Where rendered chords go.
//!
//! [`ChordSink`] is the seam to the audio engine.  The MIDI sink releases
//! whatever the previous tick struck and then strikes the new chord, so one
//! chord sounds at a time.  An empty chord just releases.

use midir::{MidiOutput, MidiOutputConnection};
use thiserror::Error;
use tracing::{info, trace, warn};

use fiducial_core::Chord;

use crate::config::PulseConfig;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("MIDI init: {0}")]
    Init(#[from] midir::InitError),
    #[error("MIDI port info: {0}")]
    PortInfo(#[from] midir::PortInfoError),
    #[error("MIDI connect: {0}")]
    Connect(String),
    #[error("MIDI send: {0}")]
    Send(#[from] midir::SendError),
    #[error("no MIDI output ports")]
    NoPorts,
}

/// Receives one chord per renderer tick.
pub trait ChordSink {
    fn trigger(&mut self, chord: &Chord, amplitude: f32) -> Result<(), SinkError>;
}

impl<S: ChordSink + ?Sized> ChordSink for Box<S> {
    fn trigger(&mut self, chord: &Chord, amplitude: f32) -> Result<(), SinkError> {
        (**self).trigger(chord, amplitude)
    }
}

/// Amplitude 10 is full velocity; anything audible is at least 1.
pub fn velocity_for(amplitude: f32) -> u8 {
    (amplitude / 10.0 * 127.0).round().clamp(1.0, 127.0) as u8
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut: raw channel messages
// ════════════════════════════════════════════════════════════════════════════

pub trait MidiOut {
    fn program_change(&mut self, channel: u8, program: u8) -> Result<(), SinkError>;
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SinkError>;
    fn note_off(&mut self, channel: u8, note: u8) -> Result<(), SinkError>;
}

pub struct MidirOut {
    conn: MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) -> Result<(), SinkError> {
        Ok(self.conn.send(&[0xC0 | (channel & 0x0F), program & 0x7F])?)
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SinkError> {
        Ok(self.conn.send(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F])?)
    }
    fn note_off(&mut self, channel: u8, note: u8) -> Result<(), SinkError> {
        Ok(self.conn.send(&[0x80 | (channel & 0x0F), note & 0x7F, 0])?)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiSink
// ════════════════════════════════════════════════════════════════════════════

/// Plays each chord on one MIDI channel.
pub struct MidiSink<O: MidiOut> {
    out:      O,
    channel:  u8,
    sounding: Vec<u8>,
}

impl<O: MidiOut> MidiSink<O> {
    pub fn new(mut out: O, channel: u8, program: u8) -> Result<Self, SinkError> {
        out.program_change(channel, program)?;
        Ok(MidiSink { out, channel, sounding: Vec::new() })
    }

    /// Notes struck by the last trigger and not yet released.
    pub fn sounding(&self) -> &[u8] {
        &self.sounding
    }

    fn release(&mut self) -> Result<(), SinkError> {
        for note in std::mem::take(&mut self.sounding) {
            self.out.note_off(self.channel, note)?;
        }
        Ok(())
    }
}

impl<O: MidiOut> ChordSink for MidiSink<O> {
    fn trigger(&mut self, chord: &Chord, amplitude: f32) -> Result<(), SinkError> {
        self.release()?;
        let velocity = velocity_for(amplitude);
        for note in chord.notes() {
            let n = note.midi();
            if self.sounding.contains(&n) {
                continue;
            }
            self.out.note_on(self.channel, n, velocity)?;
            self.sounding.push(n);
        }
        Ok(())
    }
}

impl<O: MidiOut> Drop for MidiSink<O> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NullSink
// ════════════════════════════════════════════════════════════════════════════

/// Used when no synthesiser is available; chords are only logged.
#[derive(Debug, Default)]
pub struct NullSink;

impl ChordSink for NullSink {
    fn trigger(&mut self, chord: &Chord, amplitude: f32) -> Result<(), SinkError> {
        trace!(%chord, amplitude, "null sink");
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Port selection
// ════════════════════════════════════════════════════════════════════════════

const SOFTSYNTH_HINTS: [&str; 5] = ["fluid", "timidity", "microsoft", "gm", "synth"];

/// Pick an output port: the first matching `hint`, else something that
/// looks like a software synthesiser, else the first port.
pub fn pick_port(names: &[String], hint: Option<&str>) -> Option<usize> {
    if names.is_empty() {
        return None;
    }
    let lower: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    if let Some(hint) = hint {
        let hint = hint.to_lowercase();
        if let Some(i) = lower.iter().position(|n| n.contains(&hint)) {
            return Some(i);
        }
        warn!(%hint, "no MIDI port matches hint");
    }
    lower
        .iter()
        .position(|n| SOFTSYNTH_HINTS.iter().any(|h| n.contains(h)))
        .or(Some(0))
}

/// Names of the available MIDI output ports.
pub fn list_ports() -> Result<Vec<String>, SinkError> {
    let midi_out = MidiOutput::new("chord_pulse")?;
    midi_out
        .ports()
        .iter()
        .map(|p| midi_out.port_name(p).map_err(SinkError::from))
        .collect()
}

fn open_midi(cfg: &PulseConfig) -> Result<MidiSink<MidirOut>, SinkError> {
    let midi_out = MidiOutput::new("chord_pulse")?;
    let ports = midi_out.ports();
    let names: Vec<String> = ports
        .iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();

    let idx = pick_port(&names, cfg.midi_port.as_deref()).ok_or(SinkError::NoPorts)?;
    info!(port = %names[idx], "opening MIDI output");
    let conn = midi_out
        .connect(&ports[idx], "chord-pulse")
        .map_err(|e| SinkError::Connect(e.to_string()))?;
    MidiSink::new(MidirOut { conn }, cfg.channel, cfg.instrument)
}

/// The sink the config asks for, falling back to [`NullSink`] when no
/// MIDI output can be opened.
pub fn open_sink(cfg: &PulseConfig) -> Box<dyn ChordSink> {
    if cfg.null_audio {
        info!("audio disabled; chords are logged only");
        return Box::new(NullSink);
    }
    match open_midi(cfg) {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            warn!(error = %e, "MIDI unavailable, using null output");
            warn!("install a synthesiser such as `fluidsynth` or `timidity -iA`");
            Box::new(NullSink)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Test support
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Keeps every triggered chord for inspection.
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        pub chords: Arc<Mutex<Vec<(Chord, f32)>>>,
    }

    impl RecordingSink {
        pub fn taken(&self) -> Vec<(Chord, f32)> {
            self.chords.lock().unwrap().clone()
        }
    }

    impl ChordSink for RecordingSink {
        fn trigger(&mut self, chord: &Chord, amplitude: f32) -> Result<(), SinkError> {
            self.chords.lock().unwrap().push((chord.clone(), amplitude));
            Ok(())
        }
    }

    /// Raw MIDI messages as `(status, data1, data2)`.
    #[derive(Clone, Default)]
    pub struct RecordingOut {
        pub messages: Arc<Mutex<Vec<(u8, u8, u8)>>>,
    }

    impl MidiOut for RecordingOut {
        fn program_change(&mut self, channel: u8, program: u8) -> Result<(), SinkError> {
            self.messages.lock().unwrap().push((0xC0 | channel, program, 0));
            Ok(())
        }
        fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SinkError> {
            self.messages.lock().unwrap().push((0x90 | channel, note, velocity));
            Ok(())
        }
        fn note_off(&mut self, channel: u8, note: u8) -> Result<(), SinkError> {
            self.messages.lock().unwrap().push((0x80 | channel, note, 0));
            Ok(())
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
