//! Outbound OSC over UDP.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::trace;

use fiducial_core::{KeyEvent, MarkerEvent};

use crate::codec::{encode_message, key_message, marker_message};
use crate::error::BusError;

/// Fire-and-forget sender to a single target.
#[derive(Debug)]
pub struct BusSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl BusSender {
    /// Resolve `target` and bind an ephemeral local socket of the same
    /// address family.
    pub fn connect<A: ToSocketAddrs + std::fmt::Debug>(target: A) -> Result<Self, BusError> {
        let resolved = target
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| BusError::NoAddress(format!("{target:?}")))?;
        let local: SocketAddr = if resolved.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        Ok(BusSender { socket, target: resolved })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn send_marker(&self, event: &MarkerEvent) -> Result<(), BusError> {
        trace!(?event, target = %self.target, "send marker");
        self.send(&encode_message(marker_message(event))?)
    }

    pub fn send_key(&self, code: i32) -> Result<(), BusError> {
        trace!(code, target = %self.target, "send key");
        self.send(&encode_message(key_message(&KeyEvent { code }))?)
    }

    fn send(&self, bytes: &[u8]) -> Result<(), BusError> {
        self.socket.send_to(bytes, self.target)?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_datagram, BusEvent};
    use std::time::Duration;

    fn listener() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    fn recv_event(socket: &UdpSocket) -> BusEvent {
        let mut buf = [0u8; 1536];
        let (len, _) = socket.recv_from(&mut buf).unwrap();
        let mut decoded = decode_datagram(&buf[..len]).unwrap();
        decoded.remove(0).unwrap()
    }

    #[test]
    fn sends_key_codes() {
        let (socket, addr) = listener();
        let sender = BusSender::connect(addr).unwrap();
        assert_eq!(sender.target(), addr);
        sender.send_key(113).unwrap();
        assert_eq!(recv_event(&socket), BusEvent::Key(KeyEvent { code: 113 }));
    }

    #[test]
    fn sends_markers() {
        let (socket, addr) = listener();
        let sender = BusSender::connect(addr).unwrap();
        let event = MarkerEvent::new(5, 0.5, 0.5, -1.0);
        sender.send_marker(&event).unwrap();
        assert_eq!(recv_event(&socket), BusEvent::Marker(event));
    }

    #[test]
    fn unresolvable_target_fails() {
        let empty: Vec<SocketAddr> = Vec::new();
        assert!(matches!(
            BusSender::connect(empty.as_slice()),
            Err(BusError::NoAddress(_))
        ));
    }
}
