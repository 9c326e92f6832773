//! TUIO → fiducial bridge: tracker + debouncer + sender on one socket loop.

use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use fiducial_core::MarkerEvent;

use crate::codec::for_each_message;
use crate::error::BusError;
use crate::sender::BusSender;
use crate::tuio::{Debouncer, TuioTracker};

/// How long a receive waits before the debouncer is polled anyway.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct TuioBridge {
    socket:    UdpSocket,
    tracker:   TuioTracker,
    debouncer: Debouncer,
    sender:    BusSender,
}

impl TuioBridge {
    pub fn bind<A: ToSocketAddrs>(listen: A, sender: BusSender) -> Result<Self, BusError> {
        let socket = UdpSocket::bind(listen)?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        Ok(TuioBridge {
            socket,
            tracker: TuioTracker::new(),
            debouncer: Debouncer::new(),
            sender,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BusError> {
        Ok(self.socket.local_addr()?)
    }

    /// Fold one TUIO datagram into the tracker and return the events for
    /// any frame it committed.
    pub fn handle_datagram(&mut self, buf: &[u8], now: Instant) -> Vec<MarkerEvent> {
        let packet = match rosc::decoder::decode_udp(buf) {
            Ok((_, packet)) => packet,
            Err(e) => {
                debug!(error = ?e, "dropping undecodable TUIO datagram");
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        let tracker = &mut self.tracker;
        let debouncer = &mut self.debouncer;
        for_each_message(&packet, &mut |msg| match tracker.handle(msg) {
            Ok(Some(objects)) => events.extend(debouncer.update(objects, now)),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "dropping TUIO message"),
        });
        events
    }

    /// Receive one datagram (or time out) and forward whatever changed.
    pub fn poll_once(&mut self) -> Result<usize, BusError> {
        let mut buf = [0u8; rosc::decoder::MTU];
        let events = match self.socket.recv_from(&mut buf) {
            Ok((len, _)) => self.handle_datagram(&buf[..len], Instant::now()),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                // quiet surface: refresh present markers, release stale ones
                let objects = self.tracker.objects().to_vec();
                self.debouncer.update(&objects, Instant::now())
            }
            Err(e) => return Err(e.into()),
        };
        for event in &events {
            debug!(id = event.id, angle = event.angle, "forward fiducial");
            self.sender.send_marker(event)?;
        }
        Ok(events.len())
    }

    /// Forward until the process is stopped.  Receive and send failures
    /// are logged and the loop carries on.
    pub fn run(mut self) {
        if let Ok(addr) = self.local_addr() {
            info!(%addr, target = %self.sender.target(), "tuio bridge running");
        }
        loop {
            if let Err(e) = self.poll_once() {
                warn!(error = %e, "tuio bridge");
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_datagram, BusEvent};
    use crate::tuio::OBJ_ADDR;
    use rosc::{OscBundle, OscMessage, OscPacket, OscTime, OscType};

    fn frame(frame: i32, objects: &[(i32, i32, f32, f32)]) -> Vec<u8> {
        let cmd = |name: &str, rest: Vec<OscType>| {
            let mut args = vec![OscType::String(name.into())];
            args.extend(rest);
            OscPacket::Message(OscMessage { addr: OBJ_ADDR.into(), args })
        };
        let mut content = vec![cmd(
            "alive",
            objects.iter().map(|(s, _, _, _)| OscType::Int(*s)).collect(),
        )];
        for (s, m, x, a) in objects {
            let mut rest = vec![
                OscType::Int(*s),
                OscType::Int(*m),
                OscType::Float(*x),
                OscType::Float(0.5),
                OscType::Float(*a),
            ];
            rest.extend((0..5).map(|_| OscType::Float(0.0)));
            content.push(cmd("set", rest));
        }
        content.push(cmd("fseq", vec![OscType::Int(frame)]));
        let bundle = OscPacket::Bundle(OscBundle {
            timetag: OscTime { seconds: 0, fractional: 1 },
            content,
        });
        rosc::encoder::encode(&bundle).unwrap()
    }

    fn bridge_to(target: SocketAddr) -> TuioBridge {
        TuioBridge::bind("127.0.0.1:0", BusSender::connect(target).unwrap()).unwrap()
    }

    #[test]
    fn bundle_becomes_fiducial_events() {
        let sink = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut bridge = bridge_to(sink.local_addr().unwrap());

        let now = Instant::now();
        let events = bridge.handle_datagram(&frame(1, &[(10, 45, 0.5, 3.2), (11, 1, 0.3, 1.0)]), now);
        assert_eq!(
            events,
            vec![
                MarkerEvent::new(45, 0.5, 0.5, 3.0),
                MarkerEvent::new(1, 0.30000001192092896, 0.5, 1.0),
            ]
        );

        // identical frame: nothing new
        let events = bridge.handle_datagram(&frame(2, &[(10, 45, 0.5, 3.2), (11, 1, 0.3, 1.0)]), now);
        assert!(events.is_empty());
    }

    #[test]
    fn forwards_over_loopback() {
        let sink = UdpSocket::bind("127.0.0.1:0").unwrap();
        sink.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let mut bridge = bridge_to(sink.local_addr().unwrap());
        let bridge_addr = bridge.local_addr().unwrap();

        let surface = UdpSocket::bind("127.0.0.1:0").unwrap();
        surface.send_to(&frame(1, &[(3, 0, 0.5, 1.0)]), bridge_addr).unwrap();
        assert_eq!(bridge.poll_once().unwrap(), 1);

        let mut buf = [0u8; 1536];
        let (len, _) = sink.recv_from(&mut buf).unwrap();
        let decoded = decode_datagram(&buf[..len]).unwrap();
        assert_eq!(
            decoded[0].as_ref().unwrap(),
            &BusEvent::Marker(MarkerEvent::new(0, 0.5, 0.5, 1.0))
        );
    }

    #[test]
    fn garbage_is_ignored() {
        let sink = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut bridge = bridge_to(sink.local_addr().unwrap());
        assert!(bridge.handle_datagram(b"junk", Instant::now()).is_empty());
    }
}
