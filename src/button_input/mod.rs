//! ButtonInput - Debounced Edge Detection
//!
//! ## Responsibilities
//!
//! - Turn raw level transitions into press events (HIGH→LOW, active-low button)
//! - Two sources: hardware falling-edge interrupt and per-tick polling
//! - Each source keeps its own window and last-accepted time; a candidate
//!   press is measured against the newest press accepted by either source so
//!   one physical press is not reported twice

mod debounce;

pub use debounce::Debouncer;

use crate::gpio::Level;
use std::time::Duration;
use tokio::time::Instant;

/// Where a press was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressSource {
    Interrupt,
    Poll,
}

/// Accepted button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressEvent {
    pub source: PressSource,
    pub at: Instant,
}

/// Per-button edge detector shared by both sources
#[derive(Debug)]
pub struct EdgeDetector {
    last_level: Level,
    interrupt: Debouncer,
    poll: Debouncer,
}

impl EdgeDetector {
    /// `baseline` is the level sampled before the scheduler loop starts
    pub fn new(baseline: Level, interrupt_window: Duration, poll_window: Duration) -> Self {
        Self {
            last_level: baseline,
            interrupt: Debouncer::new(interrupt_window),
            poll: Debouncer::new(poll_window),
        }
    }

    pub fn last_level(&self) -> Level {
        self.last_level
    }

    /// Poll path: compare against the previously observed level
    pub fn sample(&mut self, level: Level, now: Instant) -> Option<PressEvent> {
        let previous = std::mem::replace(&mut self.last_level, level);
        self.on_raw_transition(PressSource::Poll, previous, level, now)
    }

    /// Interrupt path: the hardware already reported a falling edge
    pub fn on_falling_edge(&mut self, now: Instant) -> Option<PressEvent> {
        self.on_raw_transition(PressSource::Interrupt, Level::High, Level::Low, now)
    }

    pub fn on_raw_transition(
        &mut self,
        source: PressSource,
        previous: Level,
        current: Level,
        now: Instant,
    ) -> Option<PressEvent> {
        if previous != Level::High || current != Level::Low {
            return None;
        }

        let window = self.debouncer(source).window();
        if let Some(last) = self.last_accepted() {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < window {
                tracing::debug!(
                    source = ?source,
                    elapsed_ms = elapsed.as_millis() as u64,
                    window_ms = window.as_millis() as u64,
                    "Press debounced"
                );
                return None;
            }
        }

        self.debouncer_mut(source).record(now);
        Some(PressEvent { source, at: now })
    }

    fn last_accepted(&self) -> Option<Instant> {
        match (self.interrupt.last_accepted(), self.poll.last_accepted()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    fn debouncer(&self, source: PressSource) -> &Debouncer {
        match source {
            PressSource::Interrupt => &self.interrupt,
            PressSource::Poll => &self.poll,
        }
    }

    fn debouncer_mut(&mut self, source: PressSource) -> &mut Debouncer {
        match source {
            PressSource::Interrupt => &mut self.interrupt,
            PressSource::Poll => &mut self.poll,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(non_snake_case)]
    fn MS(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn detector() -> EdgeDetector {
        EdgeDetector::new(Level::High, MS(300), MS(500))
    }

    #[test]
    fn test_only_falling_edge_is_a_press() {
        let mut d = detector();
        let t0 = Instant::now();
        assert!(d.on_raw_transition(PressSource::Poll, Level::Low, Level::High, t0).is_none());
        assert!(d.on_raw_transition(PressSource::Poll, Level::Low, Level::Low, t0).is_none());
        assert!(d.on_raw_transition(PressSource::Poll, Level::High, Level::High, t0).is_none());
        assert!(d.on_raw_transition(PressSource::Poll, Level::High, Level::Low, t0).is_some());
    }

    #[test]
    fn test_rapid_interrupts_within_window_fire_once() {
        let mut d = detector();
        let t0 = Instant::now();
        assert!(d.on_falling_edge(t0).is_some());
        assert!(d.on_falling_edge(t0 + MS(50)).is_none());
        assert!(d.on_falling_edge(t0 + MS(299)).is_none());
        assert!(d.on_falling_edge(t0 + MS(300)).is_some());
    }

    #[test]
    fn test_poll_tracks_previous_level() {
        let mut d = detector();
        let t0 = Instant::now();
        assert!(d.sample(Level::High, t0).is_none());
        let press = d.sample(Level::Low, t0 + MS(100)).unwrap();
        assert_eq!(press.source, PressSource::Poll);
        // held down
        assert!(d.sample(Level::Low, t0 + MS(200)).is_none());
        assert!(d.sample(Level::High, t0 + MS(300)).is_none());
        // bounce inside the poll window
        assert!(d.sample(Level::Low, t0 + MS(400)).is_none());
        assert!(d.sample(Level::High, t0 + MS(500)).is_none());
        assert!(d.sample(Level::Low, t0 + MS(700)).is_some());
    }

    #[test]
    fn test_interrupt_then_poll_same_press_fires_once() {
        let mut d = detector();
        let t0 = Instant::now();
        assert!(d.on_falling_edge(t0).is_some());
        // the poll loop sees the same press on its next tick
        assert!(d.sample(Level::Low, t0 + MS(60)).is_none());
        assert_eq!(d.last_level(), Level::Low);
    }

    #[test]
    fn test_each_source_uses_its_own_window() {
        let mut d = detector();
        let t0 = Instant::now();

        assert!(d.sample(Level::Low, t0).is_some());
        d.sample(Level::High, t0 + MS(100));
        // interrupt window (300ms) has passed even though the poll window has not
        assert!(d.on_falling_edge(t0 + MS(350)).is_some());

        d.sample(Level::Low, t0 + MS(360));
        d.sample(Level::High, t0 + MS(400));
        // poll window (500ms) measured from the interrupt press at 350ms
        assert!(d.sample(Level::Low, t0 + MS(800)).is_none());
        d.sample(Level::High, t0 + MS(820));
        assert!(d.sample(Level::Low, t0 + MS(850)).is_some());
    }

    #[test]
    fn test_zero_window_accepts_every_edge() {
        let mut d = EdgeDetector::new(Level::High, Duration::ZERO, Duration::ZERO);
        let t0 = Instant::now();
        assert!(d.on_falling_edge(t0).is_some());
        assert!(d.on_falling_edge(t0).is_some());
    }
}
