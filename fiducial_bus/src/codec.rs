//! OSC codec: [`BusEvent`] ⇄ OSC packets.

use rosc::{OscMessage, OscPacket, OscType};

use fiducial_core::{KeyEvent, MarkerEvent};

use crate::error::BusError;

/// Marker telemetry address as senders put it on the wire.
pub const FIDUCIAL_ADDR: &str = "/tuio/fiducial";

/// Key-code address as senders put it on the wire.
pub const KEY_ADDR: &str = "/key";

/// Prefix the host bus adds to inbound addresses.
const HOST_PREFIX: &str = "/osc";

/// A decoded inbound event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusEvent {
    Marker(MarkerEvent),
    Key(KeyEvent),
}

/// Strip the host `/osc` prefix, if present.
pub fn normalize_addr(addr: &str) -> &str {
    addr.strip_prefix(HOST_PREFIX)
        .filter(|rest| rest.starts_with('/'))
        .unwrap_or(addr)
}

// ════════════════════════════════════════════════════════════════════════════
// Decoding
// ════════════════════════════════════════════════════════════════════════════

/// Decode one message.
pub fn decode_message(msg: &OscMessage) -> Result<BusEvent, BusError> {
    match normalize_addr(&msg.addr) {
        FIDUCIAL_ADDR => Ok(BusEvent::Marker(MarkerEvent {
            id:    arg_i32(msg, 0, "id")?,
            x:     arg_f64(msg, 1, "x")?,
            y:     arg_f64(msg, 2, "y")?,
            angle: arg_f64(msg, 3, "angle")?,
        })),
        KEY_ADDR => Ok(BusEvent::Key(KeyEvent {
            code: arg_i32(msg, 0, "key")?,
        })),
        _ => Err(BusError::UnknownAddress(msg.addr.clone())),
    }
}

/// Decode every message in a packet, unpacking bundles in order.
pub fn decode_packet(packet: &OscPacket) -> Vec<Result<BusEvent, BusError>> {
    let mut out = Vec::new();
    for_each_message(packet, &mut |msg| out.push(decode_message(msg)));
    out
}

/// Decode a raw UDP datagram.
pub fn decode_datagram(buf: &[u8]) -> Result<Vec<Result<BusEvent, BusError>>, BusError> {
    let (_, packet) = rosc::decoder::decode_udp(buf).map_err(BusError::Decode)?;
    Ok(decode_packet(&packet))
}

/// Visit every message in a packet, depth first.
pub fn for_each_message<F: FnMut(&OscMessage)>(packet: &OscPacket, f: &mut F) {
    match packet {
        OscPacket::Message(msg) => f(msg),
        OscPacket::Bundle(bundle) => {
            for inner in &bundle.content {
                for_each_message(inner, f);
            }
        }
    }
}

fn arg<'a>(
    msg: &'a OscMessage,
    index: usize,
    field: &'static str,
) -> Result<&'a OscType, BusError> {
    msg.args.get(index).ok_or_else(|| BusError::MissingArg {
        addr: msg.addr.clone(),
        index,
        field,
    })
}

fn bad_arg(msg: &OscMessage, index: usize, field: &'static str) -> BusError {
    BusError::BadArg { addr: msg.addr.clone(), index, field }
}

/// Any numeric argument as a real.
pub(crate) fn arg_f64(msg: &OscMessage, index: usize, field: &'static str) -> Result<f64, BusError> {
    match arg(msg, index, field)? {
        OscType::Float(v)  => Ok(*v as f64),
        OscType::Double(v) => Ok(*v),
        OscType::Int(v)    => Ok(*v as f64),
        OscType::Long(v)   => Ok(*v as f64),
        _ => Err(bad_arg(msg, index, field)),
    }
}

/// Any numeric argument as an integer; reals are truncated.
pub(crate) fn arg_i32(msg: &OscMessage, index: usize, field: &'static str) -> Result<i32, BusError> {
    let value = match arg(msg, index, field)? {
        OscType::Int(v)    => return Ok(*v),
        OscType::Long(v)   => return i32::try_from(*v).map_err(|_| bad_arg(msg, index, field)),
        OscType::Float(v)  => *v as f64,
        OscType::Double(v) => *v,
        _ => return Err(bad_arg(msg, index, field)),
    };
    if value.is_finite() && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Ok(value.trunc() as i32)
    } else {
        Err(bad_arg(msg, index, field))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Encoding
// ════════════════════════════════════════════════════════════════════════════

pub fn marker_message(event: &MarkerEvent) -> OscMessage {
    OscMessage {
        addr: FIDUCIAL_ADDR.to_string(),
        args: vec![
            OscType::Int(event.id),
            OscType::Double(event.x),
            OscType::Double(event.y),
            OscType::Double(event.angle),
        ],
    }
}

pub fn key_message(key: &KeyEvent) -> OscMessage {
    OscMessage {
        addr: KEY_ADDR.to_string(),
        args: vec![OscType::Int(key.code)],
    }
}

pub fn encode_message(msg: OscMessage) -> Result<Vec<u8>, BusError> {
    rosc::encoder::encode(&OscPacket::Message(msg)).map_err(BusError::Encode)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
