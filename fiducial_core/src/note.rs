//! Note identities: MIDI note numbers shown with scientific-pitch names.
//!
//! `C4` is middle C (MIDI 60).

use std::fmt;

/// A MIDI note number (0–127).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Note(u8);

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl Note {
    pub const C4: Note = Note(60);
    pub const F4: Note = Note(65);
    pub const G4: Note = Note(67);
    pub const A4: Note = Note(69);

    /// `None` above 127.
    pub const fn from_midi(n: u8) -> Option<Note> {
        if n <= 127 { Some(Note(n)) } else { None }
    }

    /// Raw MIDI note number.
    pub const fn midi(self) -> u8 { self.0 }

    /// Pitch class, 0 = C … 11 = B.
    pub const fn pitch_class(self) -> u8 { self.0 % 12 }

    /// Scientific-pitch octave (MIDI 60 is octave 4).
    pub const fn octave(self) -> i8 { (self.0 / 12) as i8 - 1 }

    /// Raise by `semitones`, clamped to 127.
    pub fn transpose(self, semitones: u8) -> Note {
        Note(self.0.saturating_add(semitones).min(127))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SHARP_NAMES[self.pitch_class() as usize], self.octave())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
