//! Pen events and the interrupt-side tracker that produces them

use crate::calibration::CalibrationCoefficients;
use crate::sample::{RawSample, DEFAULT_PEN_UP_THRESHOLD};
use crate::Point;

/// What happened to the pen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PenEventKind {
    /// The pen has been placed on the screen
    Down,
    /// The pen has moved while down
    Move,
    /// The pen has been lifted
    Up,
}

/// A pen transition at a screen position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PenEvent {
    pub kind: PenEventKind,
    pub x: i32,
    pub y: i32,
}

impl PenEvent {
    pub const fn new(kind: PenEventKind, x: i32, y: i32) -> PenEvent {
        PenEvent { kind, x, y }
    }

    pub const fn down(x: i32, y: i32) -> PenEvent {
        PenEvent::new(PenEventKind::Down, x, y)
    }

    pub const fn moved(x: i32, y: i32) -> PenEvent {
        PenEvent::new(PenEventKind::Move, x, y)
    }

    pub const fn up(x: i32, y: i32) -> PenEvent {
        PenEvent::new(PenEventKind::Up, x, y)
    }

    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Receiver of pen events, registered with the sampling interrupt
///
/// Implementations are called from interrupt context and must complete in
/// bounded time without blocking.  Returns `false` if the event was dropped.
pub trait PenEventSink {
    fn push(&mut self, event: PenEvent) -> bool;
}

impl<F> PenEventSink for F
where
    F: FnMut(PenEvent) -> bool,
{
    fn push(&mut self, event: PenEvent) -> bool {
        self(event)
    }
}

/// Settings for [`PenTracker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackerConfig {
    /// Raw reading below which an axis counts as pen-up
    pub pen_up_threshold: u16,
    /// Pen-down samples ignored before reporting `Down`
    pub skip_samples: u8,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            pen_up_threshold: DEFAULT_PEN_UP_THRESHOLD,
            skip_samples: 3,
        }
    }
}

/// Turns the raw sample stream into `Down`, `Move` and `Up` events
///
/// Call [`on_sample`](PenTracker::on_sample) from the sampling interrupt
/// with every new reading.  The first few pen-down samples of a contact are
/// skipped while the panel settles, then `Down` is reported at the mapped
/// position, `Move` whenever the mapped position changes, and `Up` at the
/// last position once the pen lifts.
#[derive(Debug, Clone)]
pub struct PenTracker {
    coefficients: CalibrationCoefficients,
    config: TrackerConfig,
    skipped: u8,
    down: bool,
    last: Point,
}

impl PenTracker {
    pub fn new(coefficients: CalibrationCoefficients, config: TrackerConfig) -> PenTracker {
        PenTracker {
            coefficients,
            config,
            skipped: 0,
            down: false,
            last: Point::default(),
        }
    }

    /// `true` between a reported `Down` and the matching `Up`
    pub fn is_down(&self) -> bool {
        self.down
    }

    /// Swap in a new calibration, e.g. after recalibrating
    pub fn set_coefficients(&mut self, coefficients: CalibrationCoefficients) {
        self.coefficients = coefficients;
    }

    /// Process one raw sample, posting any resulting event to `sink`
    ///
    /// Returns the event generated by this sample, whether or not the sink
    /// accepted it.
    pub fn on_sample<K>(&mut self, raw: RawSample, sink: &mut K) -> Option<PenEvent>
    where
        K: PenEventSink + ?Sized,
    {
        let event = self.advance(raw)?;
        sink.push(event);
        Some(event)
    }

    fn advance(&mut self, raw: RawSample) -> Option<PenEvent> {
        if raw.is_pen_up(self.config.pen_up_threshold) {
            self.skipped = 0;
            if self.down {
                self.down = false;
                return Some(PenEvent::up(self.last.x, self.last.y));
            }
            return None;
        }

        if !self.down && self.skipped < self.config.skip_samples {
            self.skipped += 1;
            return None;
        }

        let p = self
            .coefficients
            .map(Point::new(raw.x as i32, raw.y as i32));
        if !self.down {
            self.down = true;
            self.last = p;
            Some(PenEvent::down(p.x, p.y))
        } else if p != self.last {
            self.last = p;
            Some(PenEvent::moved(p.x, p.y))
        } else {
            None
        }
    }
}
