//! Bus error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("could not decode OSC packet: {0:?}")]
    Decode(rosc::OscError),

    #[error("could not encode OSC packet: {0:?}")]
    Encode(rosc::OscError),

    #[error("no handler for OSC address {0}")]
    UnknownAddress(String),

    #[error("{addr}: missing argument {index} ({field})")]
    MissingArg {
        addr:  String,
        index: usize,
        field: &'static str,
    },

    #[error("{addr}: argument {index} ({field}) is not a usable number")]
    BadArg {
        addr:  String,
        index: usize,
        field: &'static str,
    },

    #[error("{addr} set: expected {expected} arguments, got {got}")]
    TuioArity {
        addr:     String,
        expected: usize,
        got:      usize,
    },

    #[error("address {0} did not resolve")]
    NoAddress(String),

    #[error("bus i/o: {0}")]
    Io(#[from] std::io::Error),
}
