//! # fiducial_core
//!
//! The angle-to-interval mapping engine behind the fiducial chord table.
//!
//! Markers placed on the sensing surface are routed into a small set of
//! [`StateStore`] cells; a renderer reads those cells on a fixed tick and
//! turns them into a [`Chord`].
//!
//! ## Marker → cell routing
//!
//! | Marker id | Cell | Notes |
//! |---|---|---|
//! | 44 / 45 / 46 / 47 | `root` = C4 / F4 / A4 / G4 | only when `angle > -1` |
//! | 44 / 45 / 46 / 47 | `root_angle` | only for the marker of the current root |
//! | 0 | `fifths_angle` | |
//! | 1 | `thirds_angle` | |
//! | 2 | `sevenths_angle` | |
//! | 3 | `fourths_angle` | |
//! | 4 | `ninth_angle` | |
//! | 5 | `sninth_angle` | |
//! | 6 | `bninth_angle` | |
//!
//! ## Quick start
//!
//! ```rust
//! use fiducial_core::{apply_marker, Chord, MarkerEvent, Note, StateStore};
//!
//! let store = StateStore::new();
//! apply_marker(&store, &MarkerEvent::new(44, 0.5, 0.5, 1.0)); // root C4
//! apply_marker(&store, &MarkerEvent::new(0, 0.2, 0.2, 1.0));  // fifth
//! apply_marker(&store, &MarkerEvent::new(1, 0.3, 0.3, 3.0));  // major third
//!
//! let chord = Chord::from_snapshot(&store.snapshot());
//! let midi: Vec<u8> = chord.notes().iter().map(|n| n.midi()).collect();
//! assert_eq!(midi, vec![60, 67, 64]);
//! assert_eq!(chord.root, Note::C4);
//! ```

pub mod chord;
pub mod event;
pub mod note;
pub mod router;
pub mod store;

pub use chord::{select_intervals, Chord, Interval};
pub use event::{KeyEvent, MarkerEvent};
pub use note::Note;
pub use router::{apply_marker, route_for, Applied, Route, ROUTES};
pub use store::{
    is_active, AngleCell, CellError, CellName, CellValue, StateStore, StoreSnapshot,
    DEFAULT_ROOT, INACTIVE,
};
