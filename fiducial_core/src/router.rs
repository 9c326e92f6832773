//! Marker routing: which cell a marker writes, and the root-identity gate.
//!
//! A root marker (44–47) does two things, in this order:
//!
//! 1. if `angle > -1`, make its note the current root;
//! 2. if the current root (read *after* step 1) is its note, write
//!    `root_angle`.
//!
//! So a root marker can take over the root and register its angle in the
//! same event, while a competing root marker that is not the current root
//! never touches `root_angle`.

use crate::event::MarkerEvent;
use crate::note::Note;
use crate::store::{AngleCell, StateStore, INACTIVE};

/// Where a marker's angle goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Root marker for the given note; writes `root` and (gated) `root_angle`.
    Root(Note),
    /// Interval marker; writes its angle cell unconditionally.
    Interval(AngleCell),
}

/// Fixed marker id → route table.
pub const ROUTES: [(i32, Route); 11] = [
    (44, Route::Root(Note::C4)),
    (45, Route::Root(Note::F4)),
    (46, Route::Root(Note::A4)),
    (47, Route::Root(Note::G4)),
    (0,  Route::Interval(AngleCell::Fifths)),
    (1,  Route::Interval(AngleCell::Thirds)),
    (2,  Route::Interval(AngleCell::Sevenths)),
    (3,  Route::Interval(AngleCell::Fourths)),
    (4,  Route::Interval(AngleCell::Ninth)),
    (5,  Route::Interval(AngleCell::SharpNinth)),
    (6,  Route::Interval(AngleCell::FlatNinth)),
];

/// `None` for ids outside the table.
pub fn route_for(id: i32) -> Option<Route> {
    ROUTES.iter().find(|(rid, _)| *rid == id).map(|(_, route)| *route)
}

/// What a single event did to the store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Applied {
    /// Unknown marker id; nothing written.
    Ignored,
    /// An interval cell was overwritten.
    Interval { cell: AngleCell, angle: f64 },
    /// A root marker was handled.
    Root {
        note:          Note,
        /// The root cell changed to `note`.
        switched:      bool,
        /// The gate passed and `root_angle` was written.
        angle_written: bool,
    },
}

/// Route one event into the store.
pub fn apply_marker(store: &StateStore, event: &MarkerEvent) -> Applied {
    match route_for(event.id) {
        None => Applied::Ignored,
        Some(Route::Interval(cell)) => {
            store.set_angle(cell, event.angle);
            Applied::Interval { cell, angle: event.angle }
        }
        Some(Route::Root(note)) => {
            let before = store.root();
            if event.angle > INACTIVE {
                store.set_root(note);
            }
            let current = store.root();
            let angle_written = current == note;
            if angle_written {
                store.set_angle(AngleCell::Root, event.angle);
            }
            Applied::Root {
                note,
                switched: before != current,
                angle_written,
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
