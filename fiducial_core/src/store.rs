//! The shared state store.
//!
//! Nine named cells: the root note and eight angle cells.  Every cell is an
//! independent atomic, so a reader on another thread always sees a whole
//! value (last write wins).  There is no multi-cell transaction; a
//! [`StoreSnapshot`] reads the cells one after another.
//!
//! Angle cells double as activation flags: `angle >= 0` is active, anything
//! below zero (the `-1` sentinel included) is inactive.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use thiserror::Error;

use crate::note::Note;

/// Sentinel written to every angle cell at start-up.
pub const INACTIVE: f64 = -1.0;

/// Root note until a root marker says otherwise.
pub const DEFAULT_ROOT: Note = Note::C4;

/// `true` when an angle cell value marks its contributor active.
pub fn is_active(angle: f64) -> bool {
    angle >= 0.0
}

// ════════════════════════════════════════════════════════════════════════════
// Cell names
// ════════════════════════════════════════════════════════════════════════════

/// The eight angle cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AngleCell {
    Root,
    Fifths,
    Thirds,
    Fourths,
    Sevenths,
    Ninth,
    FlatNinth,
    SharpNinth,
}

impl AngleCell {
    pub const ALL: [AngleCell; 8] = [
        AngleCell::Root,
        AngleCell::Fifths,
        AngleCell::Thirds,
        AngleCell::Fourths,
        AngleCell::Sevenths,
        AngleCell::Ninth,
        AngleCell::FlatNinth,
        AngleCell::SharpNinth,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            AngleCell::Root       => "root_angle",
            AngleCell::Fifths     => "fifths_angle",
            AngleCell::Thirds     => "thirds_angle",
            AngleCell::Fourths    => "fourths_angle",
            AngleCell::Sevenths   => "sevenths_angle",
            AngleCell::Ninth      => "ninth_angle",
            AngleCell::FlatNinth  => "bninth_angle",
            AngleCell::SharpNinth => "sninth_angle",
        }
    }
}

/// Any cell in the store, addressed by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellName {
    Root,
    Angle(AngleCell),
}

impl CellName {
    pub fn name(self) -> &'static str {
        match self {
            CellName::Root => "root",
            CellName::Angle(cell) => cell.name(),
        }
    }

    /// All nine cells, root first.
    pub fn all() -> impl Iterator<Item = CellName> {
        std::iter::once(CellName::Root).chain(AngleCell::ALL.into_iter().map(CellName::Angle))
    }
}

impl fmt::Display for CellName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CellName {
    type Err = CellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellName::all()
            .find(|c| c.name() == s)
            .ok_or_else(|| CellError::UnknownCell(s.to_string()))
    }
}

/// The value held by a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellValue {
    Note(Note),
    Angle(f64),
}

impl CellValue {
    fn kind(&self) -> &'static str {
        match self {
            CellValue::Note(_)  => "a note",
            CellValue::Angle(_) => "an angle",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CellError {
    #[error("unknown state cell {0:?}")]
    UnknownCell(String),
    #[error("cell {cell} holds {expected}, not {found}")]
    TypeMismatch {
        cell:     &'static str,
        expected: &'static str,
        found:    &'static str,
    },
}

// ════════════════════════════════════════════════════════════════════════════
// StateStore
// ════════════════════════════════════════════════════════════════════════════

/// Shared cells, one writer (the marker listener) and one reader (the
/// chord renderer).  Share it with `Arc<StateStore>`.
#[derive(Debug)]
pub struct StateStore {
    root:   AtomicU8,
    angles: [AtomicU64; 8],
}

impl Default for StateStore {
    fn default() -> Self {
        StateStore::new()
    }
}

impl StateStore {
    /// All cells at their start-up sentinels.
    pub fn new() -> Self {
        StateStore {
            root:   AtomicU8::new(DEFAULT_ROOT.midi()),
            angles: std::array::from_fn(|_| AtomicU64::new(INACTIVE.to_bits())),
        }
    }

    pub fn root(&self) -> Note {
        Note::from_midi(self.root.load(Ordering::Acquire)).unwrap_or(DEFAULT_ROOT)
    }

    pub fn set_root(&self, note: Note) {
        self.root.store(note.midi(), Ordering::Release);
    }

    pub fn angle(&self, cell: AngleCell) -> f64 {
        f64::from_bits(self.angles[cell.index()].load(Ordering::Acquire))
    }

    pub fn set_angle(&self, cell: AngleCell, angle: f64) {
        self.angles[cell.index()].store(angle.to_bits(), Ordering::Release);
    }

    /// Read a cell by name.
    pub fn get(&self, name: CellName) -> CellValue {
        match name {
            CellName::Root        => CellValue::Note(self.root()),
            CellName::Angle(cell) => CellValue::Angle(self.angle(cell)),
        }
    }

    /// Overwrite a cell by name.  The value kind must match the cell.
    pub fn set(&self, name: CellName, value: CellValue) -> Result<(), CellError> {
        match (name, value) {
            (CellName::Root, CellValue::Note(note))         => self.set_root(note),
            (CellName::Angle(cell), CellValue::Angle(angle)) => self.set_angle(cell, angle),
            (name, value) => {
                return Err(CellError::TypeMismatch {
                    cell:     name.name(),
                    expected: if name == CellName::Root { "a note" } else { "an angle" },
                    found:    value.kind(),
                })
            }
        }
        Ok(())
    }

    /// Read every cell.  Cells are loaded one at a time, so a concurrent
    /// writer may leave a mix of older and newer values.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            root:   self.root(),
            angles: AngleCell::ALL.map(|cell| self.angle(cell)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// StoreSnapshot
// ════════════════════════════════════════════════════════════════════════════

/// Plain copy of every cell at one moment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StoreSnapshot {
    pub root:   Note,
    pub angles: [f64; 8],
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        StoreSnapshot {
            root:   DEFAULT_ROOT,
            angles: [INACTIVE; 8],
        }
    }
}

impl StoreSnapshot {
    pub fn angle(&self, cell: AngleCell) -> f64 {
        self.angles[cell.index()]
    }

    pub fn with_root(mut self, root: Note) -> Self {
        self.root = root;
        self
    }

    pub fn with_angle(mut self, cell: AngleCell, angle: f64) -> Self {
        self.angles[cell.index()] = angle;
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
