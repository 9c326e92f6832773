//! TUIO 1.1 object tracking and fiducial debouncing.
//!
//! A tracker (e.g. reacTIVision) publishes `/tuio/2Dobj` bundles made of
//! `alive`, `set` and `fseq` messages.  [`TuioTracker`] folds them into the
//! list of objects on the surface; [`Debouncer`] turns successive lists into
//! the sparse `/tuio/fiducial` events the chord engine consumes.
//!
//! # Debouncing
//!
//! * Angles are quantised to `round(angle) mod 6`, so a full turn of a
//!   marker (radians) steps through 0‥5.
//! * An event is emitted when a marker appears, its quantised angle changes,
//!   or it moves more than [`MOVE_THRESHOLD`] along x.
//! * A move first releases the old position (`y = -1`, `angle = -1`).
//! * A marker not reported for [`STALE_AFTER`] is released with
//!   `angle = -1` and forgotten.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rosc::{OscMessage, OscType};

use fiducial_core::{MarkerEvent, INACTIVE};

use crate::codec::{arg_f64, arg_i32};
use crate::error::BusError;

/// The 2D object profile address.
pub const OBJ_ADDR: &str = "/tuio/2Dobj";

/// Arguments after the `set` command: s i x y a X Y A m r.
const SET_ARITY: usize = 10;

/// x distance that counts as a move.
pub const MOVE_THRESHOLD: f64 = 0.1;

/// Silence after which a marker is released.
pub const STALE_AFTER: Duration = Duration::from_millis(500);

// ════════════════════════════════════════════════════════════════════════════
// TuioObject
// ════════════════════════════════════════════════════════════════════════════

/// One tracked object.  Velocities and accelerations are not kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TuioObject {
    pub session_id: i32,
    pub marker_id:  i32,
    pub x:          f64,
    pub y:          f64,
    pub angle:      f64,
}

// ════════════════════════════════════════════════════════════════════════════
// TuioTracker
// ════════════════════════════════════════════════════════════════════════════

/// Frame assembly for the `/tuio/2Dobj` profile.
#[derive(Debug, Default)]
pub struct TuioTracker {
    alive:   Vec<i32>,
    pending: Vec<TuioObject>,
    objects: Vec<TuioObject>,
    fseq:    i32,
}

impl TuioTracker {
    pub fn new() -> Self {
        TuioTracker::default()
    }

    /// Objects of the last committed frame.
    pub fn objects(&self) -> &[TuioObject] {
        &self.objects
    }

    /// Feed one message.  Returns the new object list when an `fseq`
    /// commits a frame.  Other profiles and unknown commands are ignored.
    pub fn handle(&mut self, msg: &OscMessage) -> Result<Option<&[TuioObject]>, BusError> {
        if msg.addr != OBJ_ADDR {
            return Ok(None);
        }
        let command = match msg.args.first() {
            Some(OscType::String(s)) => s.as_str(),
            Some(_) => {
                return Err(BusError::BadArg { addr: msg.addr.clone(), index: 0, field: "command" })
            }
            None => {
                return Err(BusError::MissingArg { addr: msg.addr.clone(), index: 0, field: "command" })
            }
        };

        match command {
            "alive" => {
                self.alive = (1..msg.args.len())
                    .map(|i| arg_i32(msg, i, "session id"))
                    .collect::<Result<_, _>>()?;
                Ok(None)
            }
            "set" => {
                let got = msg.args.len() - 1;
                if got != SET_ARITY {
                    return Err(BusError::TuioArity {
                        addr:     msg.addr.clone(),
                        expected: SET_ARITY,
                        got,
                    });
                }
                self.pending.push(TuioObject {
                    session_id: arg_i32(msg, 1, "session id")?,
                    marker_id:  arg_i32(msg, 2, "class id")?,
                    x:          arg_f64(msg, 3, "x")?,
                    y:          arg_f64(msg, 4, "y")?,
                    angle:      arg_f64(msg, 5, "angle")?,
                });
                Ok(None)
            }
            "fseq" => {
                let frame = arg_i32(msg, 1, "frame")?;
                let pending = std::mem::take(&mut self.pending);
                if frame != -1 && frame <= self.fseq {
                    return Ok(None);
                }
                self.fseq = frame;
                let kept = self.objects.iter().filter(|o| {
                    self.alive.contains(&o.session_id)
                        && !pending.iter().any(|p| p.session_id == o.session_id)
                });
                let mut next = pending.clone();
                next.extend(kept);
                self.objects = next;
                Ok(Some(self.objects.as_slice()))
            }
            _ => Ok(None),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Debouncer
// ════════════════════════════════════════════════════════════════════════════

/// Quantise a marker angle (radians) to 0‥5, rounding ties to even.
pub fn quantize_angle(angle: f64) -> f64 {
    angle.round_ties_even().rem_euclid(6.0)
}

#[derive(Clone, Copy, Debug)]
struct Seen {
    at:    Instant,
    angle: f64,
    x:     f64,
    y:     f64,
}

/// Turns object lists into change events, keyed by marker id.
#[derive(Debug, Default)]
pub struct Debouncer {
    seen: BTreeMap<i32, Seen>,
}

impl Debouncer {
    pub fn new() -> Self {
        Debouncer::default()
    }

    /// Number of markers currently considered present.
    pub fn tracked(&self) -> usize {
        self.seen.len()
    }

    /// Process the objects present at `now`.
    pub fn update(&mut self, objects: &[TuioObject], now: Instant) -> Vec<MarkerEvent> {
        let mut out = Vec::new();

        for o in objects {
            let angle = quantize_angle(o.angle);
            let prev = self.seen.get(&o.marker_id).copied();
            let moved = prev.filter(|p| (p.x - o.x).abs() > MOVE_THRESHOLD);

            if let Some(p) = moved {
                out.push(MarkerEvent::new(o.marker_id, p.x, INACTIVE, INACTIVE));
            }
            if prev.map_or(true, |p| p.angle != angle) || moved.is_some() {
                out.push(MarkerEvent::new(o.marker_id, o.x, o.y, angle));
            }
            self.seen.insert(o.marker_id, Seen { at: now, angle, x: o.x, y: o.y });
        }

        let stale: Vec<i32> = self
            .seen
            .iter()
            .filter(|(_, s)| now.saturating_duration_since(s.at) > STALE_AFTER)
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            if let Some(s) = self.seen.remove(&id) {
                out.push(MarkerEvent::new(id, s.x, s.y, INACTIVE));
            }
        }

        out
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn alive(ids: &[i32]) -> OscMessage {
        let mut args = vec![OscType::String("alive".into())];
        args.extend(ids.iter().map(|i| OscType::Int(*i)));
        OscMessage { addr: OBJ_ADDR.into(), args }
    }

    fn set(session: i32, marker: i32, x: f32, y: f32, a: f32) -> OscMessage {
        let mut args = vec![
            OscType::String("set".into()),
            OscType::Int(session),
            OscType::Int(marker),
            OscType::Float(x),
            OscType::Float(y),
            OscType::Float(a),
        ];
        args.extend((0..5).map(|_| OscType::Float(0.0)));
        OscMessage { addr: OBJ_ADDR.into(), args }
    }

    fn fseq(frame: i32) -> OscMessage {
        OscMessage {
            addr: OBJ_ADDR.into(),
            args: vec![OscType::String("fseq".into()), OscType::Int(frame)],
        }
    }

    fn obj(marker: i32, x: f64, angle: f64) -> TuioObject {
        TuioObject { session_id: marker + 100, marker_id: marker, x, y: 0.5, angle }
    }

    // ── tracker ───────────────────────────────────────────────────────────
    #[test]
    fn frame_commits_on_fseq() {
        let mut t = TuioTracker::new();
        assert_eq!(t.handle(&alive(&[1, 2])).unwrap(), None);
        assert_eq!(t.handle(&set(1, 44, 0.5, 0.5, 1.0)).unwrap(), None);
        assert_eq!(t.handle(&set(2, 0, 0.2, 0.3, 3.0)).unwrap(), None);
        let objects = t.handle(&fseq(1)).unwrap().unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].marker_id, 44);
        assert_eq!(objects[1].angle, 3.0);
    }

    #[test]
    fn unchanged_alive_objects_are_kept() {
        let mut t = TuioTracker::new();
        t.handle(&alive(&[1, 2])).unwrap();
        t.handle(&set(1, 44, 0.5, 0.5, 1.0)).unwrap();
        t.handle(&set(2, 0, 0.2, 0.3, 3.0)).unwrap();
        t.handle(&fseq(1)).unwrap();

        // only session 2 changes; session 1 stays alive
        t.handle(&alive(&[1, 2])).unwrap();
        t.handle(&set(2, 0, 0.2, 0.3, 4.0)).unwrap();
        let objects = t.handle(&fseq(2)).unwrap().unwrap();
        assert_eq!(objects.len(), 2);
        assert!(objects.iter().any(|o| o.session_id == 1 && o.angle == 1.0));
        assert!(objects.iter().any(|o| o.session_id == 2 && o.angle == 4.0));
    }

    #[test]
    fn dead_sessions_drop_out() {
        let mut t = TuioTracker::new();
        t.handle(&alive(&[1, 2])).unwrap();
        t.handle(&set(1, 44, 0.5, 0.5, 1.0)).unwrap();
        t.handle(&set(2, 0, 0.2, 0.3, 3.0)).unwrap();
        t.handle(&fseq(1)).unwrap();

        t.handle(&alive(&[2])).unwrap();
        let objects = t.handle(&fseq(2)).unwrap().unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].session_id, 2);
    }

    #[test]
    fn late_frames_are_discarded() {
        let mut t = TuioTracker::new();
        t.handle(&alive(&[1])).unwrap();
        t.handle(&set(1, 44, 0.5, 0.5, 1.0)).unwrap();
        t.handle(&fseq(5)).unwrap();

        t.handle(&set(1, 44, 0.5, 0.5, 2.0)).unwrap();
        assert_eq!(t.handle(&fseq(4)).unwrap(), None);
        assert_eq!(t.objects()[0].angle, 1.0);

        // -1 always commits
        t.handle(&set(1, 44, 0.5, 0.5, 2.0)).unwrap();
        assert!(t.handle(&fseq(-1)).unwrap().is_some());
        assert_eq!(t.objects()[0].angle, 2.0);
    }

    #[test]
    fn wrong_set_arity_is_rejected() {
        let mut t = TuioTracker::new();
        let mut msg = set(1, 44, 0.5, 0.5, 1.0);
        msg.args.pop();
        assert!(matches!(
            t.handle(&msg),
            Err(BusError::TuioArity { expected: 10, got: 9, .. })
        ));
    }

    #[test]
    fn other_profiles_are_ignored() {
        let mut t = TuioTracker::new();
        let cur = OscMessage {
            addr: "/tuio/2Dcur".into(),
            args: vec![OscType::String("fseq".into()), OscType::Int(9)],
        };
        assert_eq!(t.handle(&cur).unwrap(), None);
        let empty = OscMessage { addr: OBJ_ADDR.into(), args: vec![] };
        assert!(matches!(t.handle(&empty), Err(BusError::MissingArg { .. })));
    }

    // ── debouncer ─────────────────────────────────────────────────────────
    #[test]
    fn quantize_wraps_a_full_turn() {
        assert_eq!(quantize_angle(0.2), 0.0);
        assert_eq!(quantize_angle(3.1), 3.0);
        assert_eq!(quantize_angle(4.6), 5.0);
        assert_eq!(quantize_angle(6.2), 0.0);
        assert_eq!(quantize_angle(2.5), 2.0);
        assert_eq!(quantize_angle(3.5), 4.0);
    }

    #[test]
    fn new_marker_emits_once() {
        let mut d = Debouncer::new();
        let t0 = Instant::now();
        let events = d.update(&[obj(1, 0.5, 3.1)], t0);
        assert_eq!(events, vec![MarkerEvent::new(1, 0.5, 0.5, 3.0)]);
        // same quantised angle, small jitter: nothing
        let events = d.update(&[obj(1, 0.55, 2.9)], t0 + Duration::from_millis(100));
        assert!(events.is_empty());
        assert_eq!(d.tracked(), 1);
    }

    #[test]
    fn angle_step_emits() {
        let mut d = Debouncer::new();
        let t0 = Instant::now();
        d.update(&[obj(2, 0.5, 1.0)], t0);
        let events = d.update(&[obj(2, 0.5, 4.0)], t0 + Duration::from_millis(50));
        assert_eq!(events, vec![MarkerEvent::new(2, 0.5, 0.5, 4.0)]);
    }

    #[test]
    fn move_releases_old_position_first() {
        let mut d = Debouncer::new();
        let t0 = Instant::now();
        d.update(&[obj(0, 0.2, 1.0)], t0);
        let events = d.update(&[obj(0, 0.5, 1.0)], t0 + Duration::from_millis(50));
        assert_eq!(
            events,
            vec![
                MarkerEvent::new(0, 0.2, -1.0, -1.0),
                MarkerEvent::new(0, 0.5, 0.5, 1.0),
            ]
        );
    }

    #[test]
    fn stale_markers_are_released() {
        let mut d = Debouncer::new();
        let t0 = Instant::now();
        d.update(&[obj(44, 0.5, 1.0), obj(0, 0.3, 2.0)], t0);

        let t1 = t0 + Duration::from_millis(400);
        assert!(d.update(&[obj(0, 0.3, 2.0)], t1).is_empty());

        let t2 = t0 + Duration::from_millis(600);
        let events = d.update(&[obj(0, 0.3, 2.0)], t2);
        assert_eq!(events, vec![MarkerEvent::new(44, 0.5, 0.5, -1.0)]);
        assert_eq!(d.tracked(), 1);
    }
}
