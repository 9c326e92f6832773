//! # fiducial_bus
//!
//! The event bus between the sensing surface, the keyboard forwarder and
//! the chord engine.  Everything travels as OSC 1.0 over UDP.
//!
//! | Address | Arguments | Direction |
//! |---|---|---|
//! | `/tuio/fiducial` | `id:int x:float y:float angle:float` | surface → engine |
//! | `/key` | `code:int` | keyboard forwarder → engine |
//! | `/tuio/2Dobj` | TUIO 1.1 `alive` / `set` / `fseq` | tracker → bridge |
//!
//! Inbound addresses are also accepted with the host's `/osc` prefix
//! (`/osc/tuio/fiducial`, `/osc/key`).
//!
//! Inbound datagrams are split into one `mpsc` channel per event type by
//! [`BusReceiver`]; outbound events go through [`BusSender`].

pub mod bridge;
pub mod codec;
pub mod error;
pub mod receiver;
pub mod sender;
pub mod tuio;

pub use bridge::TuioBridge;
pub use codec::{BusEvent, FIDUCIAL_ADDR, KEY_ADDR};
pub use error::BusError;
pub use receiver::{BusChannels, BusReceiver};
pub use sender::BusSender;
pub use tuio::{Debouncer, TuioObject, TuioTracker};

/// Default UDP port of the chord engine.
pub const ENGINE_PORT: u16 = 4559;

/// Default UDP port TUIO trackers publish on.
pub const TUIO_PORT: u16 = 3333;
