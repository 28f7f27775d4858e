//! Debounce and averaging of a single touch gesture
//!
//! A resistive panel reads noisy while the pen settles onto the surface.  The
//! [`AveragingSampler`] throws away the first few pen-down samples of each
//! contact, averages the rest, and reports the average when the pen lifts.
//! A contact that lifts again before it settles is discarded.

use embedded_hal::blocking::delay::DelayMs;

use crate::sample::{SampleSource, DEFAULT_PEN_UP_THRESHOLD};
use crate::{Error, Point, Result};

/// Default number of pen-down samples discarded at the start of a gesture
pub const DEFAULT_SETTLE_SAMPLES: u8 = 5;

/// Settings for [`AveragingSampler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplerConfig {
    /// Pen-down samples discarded before accumulation starts
    pub settle: u8,
    /// Raw reading below which an axis counts as pen-up
    pub pen_up_threshold: u16,
    /// Delay between polls in [`AveragingSampler::capture`], 0 to spin
    pub tick_ms: u32,
    /// Give up on a gesture after this many polls
    ///
    /// `None` waits forever, which is what a one-shot calibration at
    /// power-up normally wants.
    pub max_ticks: Option<u32>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            settle: DEFAULT_SETTLE_SAMPLES,
            pen_up_threshold: DEFAULT_PEN_UP_THRESHOLD,
            tick_ms: 1,
            max_ticks: None,
        }
    }
}

/// Turns one physical touch-and-lift into one averaged raw reading
#[derive(Debug, Clone)]
pub struct AveragingSampler {
    config: SamplerConfig,
    sum_x: i64,
    sum_y: i64,
    // Negative while inside the settle window
    count: i32,
}

impl AveragingSampler {
    pub fn new(config: SamplerConfig) -> AveragingSampler {
        AveragingSampler {
            config,
            sum_x: 0,
            sum_y: 0,
            count: -(config.settle as i32),
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Number of samples accumulated so far, negative inside the settle window
    pub fn count(&self) -> i32 {
        self.count
    }

    /// Discard anything accumulated and wait for a fresh contact
    pub fn reset(&mut self) {
        self.sum_x = 0;
        self.sum_y = 0;
        self.count = -(self.config.settle as i32);
    }

    /// Feed one sample
    ///
    /// Returns the averaged raw position when this sample ends a gesture
    /// that got past the settle window, `None` otherwise.
    pub fn push(&mut self, sample: crate::RawSample) -> Option<Point> {
        if sample.is_pen_up(self.config.pen_up_threshold) {
            let avg = if self.count > 0 {
                let n = self.count as i64;
                // The mean of u16 readings always fits an i32
                Some(Point::new((self.sum_x / n) as i32, (self.sum_y / n) as i32))
            } else {
                None
            };
            self.reset();
            return avg;
        }

        // Stop accumulating once the count saturates, the mean is settled by then
        if self.count == i32::MAX {
            return None;
        }
        self.count += 1;
        if self.count > 0 {
            self.sum_x += sample.x as i64;
            self.sum_y += sample.y as i64;
        }
        None
    }

    /// Poll `source` until a gesture completes and return its average
    ///
    /// This blocks the caller.  Without `max_ticks` it never returns if the
    /// pen is never put down, or never lifted.
    pub fn capture<S: SampleSource>(
        &mut self,
        source: &mut S,
        delay: &mut dyn DelayMs<u32>,
    ) -> Result<Point> {
        self.reset();
        let mut ticks: u32 = 0;
        loop {
            let sample = source.sample().map_err(|_| Error::AdcError)?;
            if let Some(avg) = self.push(sample) {
                return Ok(avg);
            }

            ticks = ticks.saturating_add(1);
            if let Some(max) = self.config.max_ticks {
                if ticks >= max {
                    warn!("gesture not completed after {} ticks", ticks);
                    self.reset();
                    return Err(Error::Timeout);
                }
            }
            if self.config.tick_ms > 0 {
                delay.delay_ms(self.config.tick_ms);
            }
        }
    }
}

impl Default for AveragingSampler {
    fn default() -> Self {
        Self::new(SamplerConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sample::tests::ScriptedSource;
    use crate::RawSample;

    pub struct NoDelay {
        pub total_ms: u32,
    }

    impl DelayMs<u32> for NoDelay {
        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += ms;
        }
    }

    fn down(x: u16, y: u16) -> RawSample {
        RawSample::new(x, y)
    }

    #[test]
    fn average_skips_settle_window() {
        let mut s = AveragingSampler::default();
        // 5 noisy settle samples, then 4 that count
        for v in [4000, 300, 3900, 250, 3999] {
            assert_eq!(s.push(down(v, v)), None);
        }
        for (x, y) in [(1000, 2000), (1001, 2003), (1003, 2001), (1005, 2002)] {
            assert_eq!(s.push(down(x, y)), None);
        }
        assert_eq!(s.count(), 4);
        // (1000+1001+1003+1005)/4 = 1002.25, (2000+2003+2001+2002)/4 = 2001.5
        assert_eq!(s.push(RawSample::PEN_UP), Some(Point::new(1002, 2001)));
        assert_eq!(s.count(), -5);
    }

    #[test]
    fn short_burst_is_discarded() {
        let mut s = AveragingSampler::default();
        for _ in 0..5 {
            s.push(down(3000, 3000));
        }
        assert_eq!(s.push(RawSample::PEN_UP), None);
        assert_eq!(s.count(), -5);

        // Next gesture is unaffected by the first
        for _ in 0..5 {
            s.push(down(3000, 3000));
        }
        s.push(down(600, 700));
        assert_eq!(s.push(RawSample::new(600, 0)), Some(Point::new(600, 700)));
    }

    #[test]
    fn long_hold_at_full_scale_averages_exactly() {
        let mut s = AveragingSampler::default();
        for _ in 0..40_000 {
            assert_eq!(s.push(down(60_000, 65_535)), None);
        }
        assert_eq!(s.count(), 40_000 - 5);
        assert_eq!(s.push(RawSample::PEN_UP), Some(Point::new(60_000, 65_535)));
    }

    #[test]
    fn pen_up_while_idle_keeps_waiting() {
        let mut s = AveragingSampler::default();
        for _ in 0..10 {
            assert_eq!(s.push(RawSample::PEN_UP), None);
        }
        assert_eq!(s.count(), -5);
    }

    #[test]
    fn zero_settle_window_counts_first_sample() {
        let mut s = AveragingSampler::new(SamplerConfig {
            settle: 0,
            ..Default::default()
        });
        s.push(down(900, 901));
        assert_eq!(s.push(RawSample::PEN_UP), Some(Point::new(900, 901)));
    }

    #[test]
    fn capture_polls_until_lift() {
        let mut script = std::vec![(0, 0), (0, 0)];
        script.extend([(3000, 3000); 2]);
        script.push((0, 0)); // bounce, discarded
        script.extend([(1200, 800); 8]);
        script.push((0, 0));
        let mut src = ScriptedSource::new(&script);
        let mut delay = NoDelay { total_ms: 0 };

        let mut s = AveragingSampler::default();
        assert_eq!(s.capture(&mut src, &mut delay), Ok(Point::new(1200, 800)));
        assert_eq!(src.polled, script.len());
        assert_eq!(delay.total_ms, (script.len() - 1) as u32);
    }

    #[test]
    fn capture_times_out_when_bounded() {
        let mut src = ScriptedSource::new(&[]);
        let mut delay = NoDelay { total_ms: 0 };
        let mut s = AveragingSampler::new(SamplerConfig {
            max_ticks: Some(50),
            tick_ms: 2,
            ..Default::default()
        });
        assert_eq!(s.capture(&mut src, &mut delay), Err(Error::Timeout));
        assert_eq!(src.polled, 50);
        assert_eq!(delay.total_ms, 49 * 2);
    }
}
