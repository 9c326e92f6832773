//! Events delivered by the sensing surface and the keyboard forwarder.

/// One positional update from the sensing surface.
///
/// `x` and `y` travel with the event but play no part in the mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerEvent {
    pub id:    i32,
    pub x:     f64,
    pub y:     f64,
    pub angle: f64,
}

impl MarkerEvent {
    pub fn new(id: i32, x: f64, y: f64, angle: f64) -> Self {
        MarkerEvent { id, x, y, angle }
    }
}

/// A key code published by the keyboard forwarder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: i32,
}
