//! Interval selection: turn a [`StoreSnapshot`] into a [`Chord`].
//!
//! Most contributors are simply on (angle ≥ 0) or off.  The third and the
//! seventh also pick a quality from the angle:
//!
//! | angle | third | seventh |
//! |---|---|---|
//! | `< 0` | none | none |
//! | `[0, 2)` | minor (3) | dominant (10) |
//! | `2` | none | none |
//! | `(2, 5)` | major (4) | major (11) |
//! | `5` | none | none |
//! | `> 5` | minor (3) | dominant (10) |
//!
//! Angles of exactly 2 and exactly 5 select neither quality and the
//! contributor drops out of the chord.

use std::fmt;

use crate::note::Note;
use crate::store::{is_active, AngleCell, StoreSnapshot};

const QUALITY_LOW:  f64 = 2.0;
const QUALITY_HIGH: f64 = 5.0;

// ════════════════════════════════════════════════════════════════════════════
// Interval
// ════════════════════════════════════════════════════════════════════════════

/// A chord tone, as a semitone offset above the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Interval {
    Root            = 0,
    MinorThird      = 3,
    MajorThird      = 4,
    Fourth          = 5,
    Fifth           = 7,
    DominantSeventh = 10,
    MajorSeventh    = 11,
    FlatNinth       = 13,
    Ninth           = 14,
    SharpNinth      = 15,
}

impl Interval {
    pub fn semitones(self) -> u8 { self as u8 }

    pub fn name(self) -> &'static str {
        match self {
            Interval::Root            => "root",
            Interval::MinorThird      => "minor third",
            Interval::MajorThird      => "major third",
            Interval::Fourth          => "fourth",
            Interval::Fifth           => "fifth",
            Interval::DominantSeventh => "dominant seventh",
            Interval::MajorSeventh    => "major seventh",
            Interval::FlatNinth       => "flat ninth",
            Interval::Ninth           => "ninth",
            Interval::SharpNinth      => "sharp ninth",
        }
    }
}

/// Which side of the dead zone an angle falls on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Quality {
    /// Strictly between 2 and 5.
    Upper,
    /// Active and outside `[2, 5]`.
    Lower,
}

fn quality(angle: f64) -> Option<Quality> {
    if angle > QUALITY_LOW && angle < QUALITY_HIGH {
        Some(Quality::Upper)
    } else if is_active(angle) && (angle > QUALITY_HIGH || angle < QUALITY_LOW) {
        Some(Quality::Lower)
    } else {
        None
    }
}

/// Active intervals, in contributor order: root, fifth, third, seventh,
/// fourth, ninth, sharp ninth, flat ninth.
pub fn select_intervals(snapshot: &StoreSnapshot) -> Vec<Interval> {
    let on = |cell| is_active(snapshot.angle(cell));
    let mut out = Vec::with_capacity(8);

    if on(AngleCell::Root) {
        out.push(Interval::Root);
    }
    if on(AngleCell::Fifths) {
        out.push(Interval::Fifth);
    }
    match quality(snapshot.angle(AngleCell::Thirds)) {
        Some(Quality::Upper) => out.push(Interval::MajorThird),
        Some(Quality::Lower) => out.push(Interval::MinorThird),
        None => {}
    }
    match quality(snapshot.angle(AngleCell::Sevenths)) {
        Some(Quality::Upper) => out.push(Interval::MajorSeventh),
        Some(Quality::Lower) => out.push(Interval::DominantSeventh),
        None => {}
    }
    if on(AngleCell::Fourths) {
        out.push(Interval::Fourth);
    }
    if on(AngleCell::Ninth) {
        out.push(Interval::Ninth);
    }
    if on(AngleCell::SharpNinth) {
        out.push(Interval::SharpNinth);
    }
    if on(AngleCell::FlatNinth) {
        out.push(Interval::FlatNinth);
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// Chord
// ════════════════════════════════════════════════════════════════════════════

/// One rendered chord.  Rebuilt every tick, never kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chord {
    pub root:      Note,
    pub intervals: Vec<Interval>,
}

impl Chord {
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Self {
        Chord {
            root:      snapshot.root,
            intervals: select_intervals(snapshot),
        }
    }

    pub fn offsets(&self) -> Vec<u8> {
        self.intervals.iter().map(|i| i.semitones()).collect()
    }

    /// Absolute notes, root + each offset.
    pub fn notes(&self) -> Vec<Note> {
        self.intervals
            .iter()
            .map(|i| self.root.transpose(i.semitones()))
            .collect()
    }

    pub fn is_empty(&self) -> bool { self.intervals.is_empty() }
    pub fn len(&self) -> usize { self.intervals.len() }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.root)?;
        for (i, offset) in self.offsets().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{offset}")?;
        }
        f.write_str("]")
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
