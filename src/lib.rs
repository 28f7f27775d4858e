//! Resistive touchscreen calibration and pen event pipeline
//!
//! This crate turns the noisy raw ADC readings of a resistive touchscreen
//! into calibrated screen coordinates, and hands the resulting pen events
//! from interrupt context to the main loop without locks or allocation.
//!
//! The pipeline has two phases:
//!
//! * A one-time **calibration** phase.  The user touches three target boxes;
//!   each touch is debounced and averaged by an [`AveragingSampler`] and the
//!   three (screen, raw) pairs are solved into [`CalibrationCoefficients`].
//!   [`Calibrator::run`] drives the whole sequence on a [`Canvas`].
//! * Normal **drawing** operation.  The sampling interrupt feeds raw samples
//!   to a [`PenTracker`], which maps them to screen space and posts
//!   [`PenEvent`]s to the [`Producer`] half of an [`EventQueue`].  The main
//!   loop drains the [`Consumer`] half into a [`PenDispatcher`], which owns
//!   all drawing.
//!
//! The ADC and the display are external.  Raw samples arrive through the
//! [`SampleSource`] trait ([`AdcSampleSource`] wraps an
//! [`embedded_hal`](https://docs.rs/embedded-hal) `adc::OneShot`), and
//! drawing requests leave through [`Canvas`] (with the `graphics` feature,
//! `GraphicsCanvas` wraps any `embedded_graphics` draw target).
//!
//! # Examples
//!
//! Set up the queue, hand the producer to the touch interrupt and process
//! events from the main loop:
//!
//! ```rust,ignore
//!     let coefficients = penpad::Calibrator::default().run(&mut &LATEST, &mut canvas, &mut delay)?;
//!
//!     let queue: &'static mut penpad::PenEventQueue = QUEUE.init(penpad::EventQueue::new());
//!     let (producer, mut consumer) = queue.split();
//!     let tracker = penpad::PenTracker::new(coefficients, Default::default());
//!     critical_section::with(|cs| {
//!         TOUCH.borrow(cs).replace(Some((tracker, producer)));
//!     });
//!
//!     let area = penpad::render::draw_scribble_frame(&mut canvas)?;
//!     let mut dispatcher = penpad::PenDispatcher::new(area);
//!     loop {
//!         dispatcher.process(&mut consumer, &mut canvas)?;
//!     }
//! ```
//!
//! and in the touch interrupt handler:
//!
//! ```rust,ignore
//!     let raw = adc.sample()?;
//!     LATEST.publish(raw);
//!     tracker.on_sample(raw, producer);
//! ```
//!
//! # Logging
//!
//! Enable the `defmt` or `log` feature to get log output from the crate.
//! Public types derive `defmt::Format` when `defmt` is enabled.

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

use paste;

pub mod calibration;
pub mod dispatch;
pub mod palette;
pub mod pen;
pub mod queue;
pub mod render;
pub mod sample;
pub mod sampler;

pub use calibration::{
    CalibrationConfig, CalibrationCoefficients, CalibrationPoint, CalibrationSet, Calibrator,
};
pub use dispatch::{DispatchState, PenDispatcher, PenState};
pub use pen::{PenEvent, PenEventKind, PenEventSink, PenTracker, TrackerConfig};
pub use queue::{Consumer, EventQueue, PenEventQueue, Producer};
pub use render::{Canvas, Color, Rect};
pub use sample::{AdcSampleSource, LatestSample, RawSample, SampleSource};
pub use sampler::{AveragingSampler, SamplerConfig};

/// Errors produced by the touch pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The calibration points are collinear or coincide
    DegenerateCalibration,
    /// An error reading the touch ADC
    AdcError,
    /// An error issuing a drawing request
    RenderError,
    /// No gesture completed within the configured number of ticks
    Timeout,
}

pub type Result<T> = core::result::Result<T, Error>;

/// A position in raw sensor or screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Point {
        Point { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point { x, y }
    }
}

// End of file
