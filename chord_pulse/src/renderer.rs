//! The periodic chord renderer.
//!
//! Every tick: snapshot the store, pick intervals, hand the chord to the
//! sink, sleep one period.  The renderer never writes to the store.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use fiducial_core::{Chord, StateStore};

use crate::sink::ChordSink;

/// Every chord is struck at this amplitude; 10 is full MIDI velocity.
pub const AMPLITUDE: f32 = 10.0;

pub struct ChordRenderer<S: ChordSink> {
    store:     Arc<StateStore>,
    sink:      S,
    period:    Duration,
    amplitude: f32,
    ticks:     u64,
}

impl<S: ChordSink> ChordRenderer<S> {
    pub fn new(store: Arc<StateStore>, sink: S, period: Duration, amplitude: f32) -> Self {
        ChordRenderer { store, sink, period, amplitude, ticks: 0 }
    }

    /// One tick without the sleep.  A failing sink is logged and skipped.
    pub fn render_once(&mut self) -> Chord {
        let chord = Chord::from_snapshot(&self.store.snapshot());
        self.ticks += 1;
        debug!(tick = self.ticks, %chord, "render");
        if let Err(e) = self.sink.trigger(&chord, self.amplitude) {
            warn!(error = %e, tick = self.ticks, "chord dropped");
        }
        chord
    }

    /// Render `n` ticks, sleeping one period after each.
    pub fn run_ticks(&mut self, n: u64) {
        for _ in 0..n {
            self.render_once();
            thread::sleep(self.period);
        }
    }

    pub fn run(mut self) {
        info!(period_ms = self.period.as_millis() as u64, "renderer running");
        loop {
            self.render_once();
            thread::sleep(self.period);
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Start the renderer on its own thread.  The sink is built on that thread,
/// since MIDI connections are not always `Send`.
pub fn spawn_renderer<S, F>(
    store: Arc<StateStore>,
    period: Duration,
    amplitude: f32,
    make_sink: F,
) -> JoinHandle<()>
where
    S: ChordSink + 'static,
    F: FnOnce() -> S + Send + 'static,
{
    thread::spawn(move || ChordRenderer::new(store, make_sink(), period, amplitude).run())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::testing::RecordingSink;
    use crate::sink::SinkError;
    use fiducial_core::{apply_marker, AngleCell, MarkerEvent, Note};
    use std::time::Instant;

    struct FailingSink;

    impl ChordSink for FailingSink {
        fn trigger(&mut self, _: &Chord, _: f32) -> Result<(), SinkError> {
            Err(SinkError::NoPorts)
        }
    }

    #[test]
    fn fresh_store_renders_silence() {
        let sink = RecordingSink::default();
        let mut r = ChordRenderer::new(Arc::new(StateStore::new()), sink.clone(), Duration::ZERO, AMPLITUDE);
        assert!(r.render_once().is_empty());
        assert_eq!(sink.taken().len(), 1);
    }

    #[test]
    fn renders_current_store_each_tick() {
        let store = Arc::new(StateStore::new());
        let sink = RecordingSink::default();
        let mut r = ChordRenderer::new(store.clone(), sink.clone(), Duration::ZERO, 7.5);

        apply_marker(&store, &MarkerEvent::new(44, 0.5, 0.5, 1.0));
        let first = r.render_once();
        assert_eq!(first.offsets(), vec![0]);

        apply_marker(&store, &MarkerEvent::new(0, 0.5, 0.5, 0.0));
        let second = r.render_once();
        assert_eq!(second.offsets(), vec![0, 7]);

        let taken = sink.taken();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[1], (second, 7.5));
        assert_eq!(r.ticks(), 2);
    }

    #[test]
    fn renderer_does_not_write_the_store() {
        let store = Arc::new(StateStore::new());
        store.set_root(Note::A4);
        store.set_angle(AngleCell::Thirds, 4.0);
        let before = store.snapshot();
        let mut r = ChordRenderer::new(store.clone(), RecordingSink::default(), Duration::ZERO, AMPLITUDE);
        r.run_ticks(3);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn sink_errors_do_not_stop_ticks() {
        let mut r = ChordRenderer::new(Arc::new(StateStore::new()), FailingSink, Duration::ZERO, AMPLITUDE);
        r.run_ticks(3);
        assert_eq!(r.ticks(), 3);
    }

    #[test]
    fn run_ticks_sleeps_between_ticks() {
        let sink = RecordingSink::default();
        let mut r = ChordRenderer::new(
            Arc::new(StateStore::new()),
            sink.clone(),
            Duration::from_millis(20),
            AMPLITUDE,
        );
        let start = Instant::now();
        r.run_ticks(3);
        assert!(start.elapsed() >= Duration::from_millis(60));
        assert_eq!(sink.taken().len(), 3);
    }

    #[test]
    fn spawned_renderer_keeps_ticking() {
        let sink = RecordingSink::default();
        let probe = sink.clone();
        spawn_renderer(Arc::new(StateStore::new()), Duration::from_millis(5), AMPLITUDE, move || sink);
        let deadline = Instant::now() + Duration::from_secs(2);
        while probe.taken().len() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(probe.taken().len() >= 3);
    }
}
