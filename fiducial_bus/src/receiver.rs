//! UDP receive thread: decode inbound OSC and fan out one channel per
//! event type.
//!
//! Malformed packets are the bus's problem, not the engine's: they are
//! logged at `debug` and dropped here, so consumers only ever see
//! well-formed events.

use std::io::{self, ErrorKind};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use fiducial_core::{KeyEvent, MarkerEvent};

use crate::codec::{decode_datagram, BusEvent};
use crate::error::BusError;

/// Largest datagram we accept.
const MAX_DATAGRAM: usize = rosc::decoder::MTU;

/// Pause after a receive failure that is not a one-off.
pub const RECV_BACKOFF: Duration = Duration::from_millis(100);

/// How long to wait before receiving again after `err`.
pub fn retry_delay(err: &io::Error) -> Duration {
    match err.kind() {
        // interrupted syscalls and ICMP port-unreachable echoes from a
        // previous send are one-offs
        ErrorKind::Interrupted
        | ErrorKind::WouldBlock
        | ErrorKind::TimedOut
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionRefused => Duration::ZERO,
        _ => RECV_BACKOFF,
    }
}

/// Consumer ends of the bus, one per event type.
pub struct BusChannels {
    pub markers: Receiver<MarkerEvent>,
    pub keys:    Receiver<KeyEvent>,
}

/// Owns the inbound socket and the producer ends of the channels.
pub struct BusReceiver {
    socket:       UdpSocket,
    marker_tx:    Sender<MarkerEvent>,
    key_tx:       Sender<KeyEvent>,
    markers_open: bool,
    keys_open:    bool,
}

impl BusReceiver {
    /// Bind the inbound socket and create the channels.
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<(BusReceiver, BusChannels), BusError> {
        let socket = UdpSocket::bind(addr)?;
        let (marker_tx, markers) = mpsc::channel();
        let (key_tx, keys) = mpsc::channel();
        let receiver = BusReceiver {
            socket,
            marker_tx,
            key_tx,
            markers_open: true,
            keys_open:    true,
        };
        Ok((receiver, BusChannels { markers, keys }))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BusError> {
        Ok(self.socket.local_addr()?)
    }

    /// `false` once every consumer has hung up.
    pub fn is_open(&self) -> bool {
        self.markers_open || self.keys_open
    }

    /// Route one decoded event to its channel.
    pub fn dispatch(&mut self, event: BusEvent) {
        match event {
            BusEvent::Marker(marker) => {
                if self.markers_open && self.marker_tx.send(marker).is_err() {
                    debug!("marker consumer hung up");
                    self.markers_open = false;
                }
            }
            BusEvent::Key(key) => {
                if self.keys_open && self.key_tx.send(key).is_err() {
                    debug!("key consumer hung up");
                    self.keys_open = false;
                }
            }
        }
    }

    /// Decode a datagram and dispatch every well-formed event in it.
    /// Returns the number of events dispatched.
    pub fn handle_datagram(&mut self, buf: &[u8]) -> usize {
        let decoded = match decode_datagram(buf) {
            Ok(d) => d,
            Err(e) => {
                debug!(error = %e, len = buf.len(), "dropping undecodable datagram");
                return 0;
            }
        };
        let mut dispatched = 0;
        for result in decoded {
            match result {
                Ok(event) => {
                    trace!(?event, "bus event");
                    self.dispatch(event);
                    dispatched += 1;
                }
                Err(e) => debug!(error = %e, "dropping OSC message"),
            }
        }
        dispatched
    }

    /// Receive until every consumer hangs up.
    pub fn run(mut self) {
        let mut buf = [0u8; MAX_DATAGRAM];
        if let Ok(addr) = self.socket.local_addr() {
            info!(%addr, "bus listening");
        }
        while self.is_open() {
            match self.socket.recv_from(&mut buf) {
                Ok((len, from)) => {
                    trace!(%from, len, "datagram");
                    self.handle_datagram(&buf[..len]);
                }
                Err(e) => {
                    let delay = retry_delay(&e);
                    if delay.is_zero() {
                        debug!(error = %e, "bus receive interrupted");
                    } else {
                        warn!(error = %e, retry_ms = delay.as_millis() as u64, "bus receive failed");
                        thread::sleep(delay);
                    }
                }
            }
        }
        info!("bus receiver stopped");
    }

    /// Run on its own thread.
    pub fn spawn(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_message, key_message, marker_message};
    use std::time::Duration;

    #[test]
    fn handle_datagram_splits_by_type() {
        let (mut rx, channels) = BusReceiver::bind("127.0.0.1:0").unwrap();
        let marker = MarkerEvent::new(2, 0.1, 0.2, 4.0);
        let n = rx.handle_datagram(&encode_message(marker_message(&marker)).unwrap());
        assert_eq!(n, 1);
        let n = rx.handle_datagram(&encode_message(key_message(&KeyEvent { code: 65 })).unwrap());
        assert_eq!(n, 1);

        assert_eq!(channels.markers.try_recv().unwrap(), marker);
        assert_eq!(channels.keys.try_recv().unwrap(), KeyEvent { code: 65 });
        assert!(channels.markers.try_recv().is_err());
    }

    #[test]
    fn malformed_datagrams_are_dropped() {
        let (mut rx, channels) = BusReceiver::bind("127.0.0.1:0").unwrap();
        assert_eq!(rx.handle_datagram(b"\x00\x01garbage"), 0);
        let short = rosc::OscMessage {
            addr: "/tuio/fiducial".into(),
            args: vec![rosc::OscType::Int(1)],
        };
        assert_eq!(rx.handle_datagram(&encode_message(short).unwrap()), 0);
        assert!(channels.markers.try_recv().is_err());
    }

    #[test]
    fn hung_up_consumer_closes_its_side_only() {
        let (mut rx, channels) = BusReceiver::bind("127.0.0.1:0").unwrap();
        let BusChannels { markers, keys } = channels;
        drop(keys);
        rx.dispatch(BusEvent::Key(KeyEvent { code: 1 }));
        assert!(rx.is_open());
        rx.dispatch(BusEvent::Marker(MarkerEvent::new(0, 0.0, 0.0, 1.0)));
        assert_eq!(markers.try_recv().unwrap().id, 0);
        drop(markers);
        rx.dispatch(BusEvent::Marker(MarkerEvent::new(0, 0.0, 0.0, 1.0)));
        assert!(!rx.is_open());
    }

    #[test]
    fn persistent_receive_errors_back_off() {
        assert_eq!(retry_delay(&io::Error::from(ErrorKind::Interrupted)), Duration::ZERO);
        assert_eq!(retry_delay(&io::Error::from(ErrorKind::ConnectionReset)), Duration::ZERO);
        assert_eq!(retry_delay(&io::Error::from(ErrorKind::PermissionDenied)), RECV_BACKOFF);
        assert_eq!(retry_delay(&io::Error::other("socket gone")), RECV_BACKOFF);
    }

    #[test]
    fn receives_over_loopback() {
        let (rx, channels) = BusReceiver::bind("127.0.0.1:0").unwrap();
        let addr = rx.local_addr().unwrap();
        rx.spawn();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        let bytes = encode_message(marker_message(&MarkerEvent::new(46, 0.5, 0.5, 0.5))).unwrap();
        sender.send_to(&bytes, addr).unwrap();

        let got = channels.markers.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(got, MarkerEvent::new(46, 0.5, 0.5, 0.5));
    }
}
