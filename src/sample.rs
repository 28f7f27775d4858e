//! Raw touch samples and where they come from

use core::marker::PhantomData;
use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::adc::{Channel, OneShot};

use crate::{Error, Result};

/// Default minimum raw reading on either axis for the pen to count as down
pub const DEFAULT_PEN_UP_THRESHOLD: u16 = 200;

/// An unprocessed reading from the touch ADC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub x: u16,
    pub y: u16,
}

impl RawSample {
    /// A sample that reads as pen-up for any non-zero threshold
    pub const PEN_UP: RawSample = RawSample { x: 0, y: 0 };

    pub const fn new(x: u16, y: u16) -> RawSample {
        RawSample { x, y }
    }

    /// `true` if either axis reads below `threshold`, i.e. the pen is not touching
    pub const fn is_pen_up(&self, threshold: u16) -> bool {
        self.x < threshold || self.y < threshold
    }

    const fn pack(self) -> u32 {
        (self.x as u32) << 16 | self.y as u32
    }

    const fn unpack(v: u32) -> RawSample {
        RawSample {
            x: (v >> 16) as u16,
            y: v as u16,
        }
    }
}

/// Something that can be polled for the current raw touch reading
pub trait SampleSource {
    type Error;

    /// Read the current raw sample
    ///
    /// A pen-up condition is not an error: it is reported as a sample below
    /// the pen-up threshold.
    fn sample(&mut self) -> core::result::Result<RawSample, Self::Error>;
}

/// Most recent raw sample, published from interrupt context
///
/// The touch interrupt handler stores each new reading with
/// [`publish`](LatestSample::publish) and the main loop polls it, as the
/// calibration routine does.  Both axes live in one atomic word so a reader
/// never sees x from one sample and y from another.
#[derive(Debug)]
pub struct LatestSample {
    packed: AtomicU32,
}

impl LatestSample {
    /// Start out reporting pen-up
    pub const fn new() -> LatestSample {
        LatestSample {
            packed: AtomicU32::new(RawSample::PEN_UP.pack()),
        }
    }

    pub fn publish(&self, sample: RawSample) {
        self.packed.store(sample.pack(), Ordering::Release);
    }

    pub fn load(&self) -> RawSample {
        RawSample::unpack(self.packed.load(Ordering::Acquire))
    }
}

impl Default for LatestSample {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for &LatestSample {
    type Error = core::convert::Infallible;

    fn sample(&mut self) -> core::result::Result<RawSample, Self::Error> {
        Ok(self.load())
    }
}

/// Sample source reading the X and Y axes from two ADC channels
///
/// `adc` is the ADC driver, `x_pin` and `y_pin` the channels the touch
/// panel's X and Y sense lines are wired to.  Each call to `sample()` does a
/// blocking one-shot conversion per axis.
pub struct AdcSampleSource<A, ADC, XP, YP> {
    adc: A,
    x_pin: XP,
    y_pin: YP,
    _adc: PhantomData<ADC>,
}

impl<A, ADC, XP, YP> AdcSampleSource<A, ADC, XP, YP> {
    pub fn new(adc: A, x_pin: XP, y_pin: YP) -> AdcSampleSource<A, ADC, XP, YP> {
        AdcSampleSource {
            adc,
            x_pin,
            y_pin,
            _adc: PhantomData,
        }
    }

    /// Give back the ADC and the two channel pins
    pub fn release(self) -> (A, XP, YP) {
        (self.adc, self.x_pin, self.y_pin)
    }
}

impl<A, ADC, XP, YP> SampleSource for AdcSampleSource<A, ADC, XP, YP>
where
    XP: Channel<ADC>,
    YP: Channel<ADC>,
    A: OneShot<ADC, u16, XP> + OneShot<ADC, u16, YP>,
{
    type Error = Error;

    fn sample(&mut self) -> Result<RawSample> {
        let x = nb::block!(OneShot::<ADC, u16, XP>::read(&mut self.adc, &mut self.x_pin))
            .map_err(|_| Error::AdcError)?;
        let y = nb::block!(OneShot::<ADC, u16, YP>::read(&mut self.adc, &mut self.y_pin))
            .map_err(|_| Error::AdcError)?;
        Ok(RawSample { x, y })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// Source replaying a fixed script of samples, then pen-up forever
    pub struct ScriptedSource {
        pub samples: VecDeque<RawSample>,
        pub polled: usize,
    }

    impl ScriptedSource {
        pub fn new(samples: &[(u16, u16)]) -> Self {
            ScriptedSource {
                samples: samples.iter().map(|&(x, y)| RawSample::new(x, y)).collect(),
                polled: 0,
            }
        }
    }

    impl SampleSource for ScriptedSource {
        type Error = ();

        fn sample(&mut self) -> core::result::Result<RawSample, ()> {
            self.polled += 1;
            Ok(self.samples.pop_front().unwrap_or(RawSample::PEN_UP))
        }
    }

    pub struct FakeAdc {
        pub x: Vec<nb::Result<u16, ()>>,
        pub y: Vec<nb::Result<u16, ()>>,
    }
    pub struct FakeAdcMarker;
    pub struct XPin;
    pub struct YPin;

    impl Channel<FakeAdcMarker> for XPin {
        type ID = u8;
        fn channel() -> u8 {
            0
        }
    }

    impl Channel<FakeAdcMarker> for YPin {
        type ID = u8;
        fn channel() -> u8 {
            1
        }
    }

    impl OneShot<FakeAdcMarker, u16, XPin> for FakeAdc {
        type Error = ();
        fn read(&mut self, _pin: &mut XPin) -> nb::Result<u16, ()> {
            self.x.remove(0)
        }
    }

    impl OneShot<FakeAdcMarker, u16, YPin> for FakeAdc {
        type Error = ();
        fn read(&mut self, _pin: &mut YPin) -> nb::Result<u16, ()> {
            self.y.remove(0)
        }
    }

    #[test]
    fn pen_up_when_either_axis_is_below_threshold() {
        assert!(RawSample::new(199, 3000).is_pen_up(200));
        assert!(RawSample::new(3000, 10).is_pen_up(200));
        assert!(!RawSample::new(200, 200).is_pen_up(200));
        assert!(RawSample::PEN_UP.is_pen_up(DEFAULT_PEN_UP_THRESHOLD));
    }

    #[test]
    fn latest_sample_keeps_axes_together() {
        let latest = LatestSample::new();
        let mut src = &latest;
        assert_eq!(src.sample(), Ok(RawSample::PEN_UP));
        latest.publish(RawSample::new(0xFFFF, 1234));
        assert_eq!(src.sample(), Ok(RawSample::new(0xFFFF, 1234)));
        latest.publish(RawSample::new(17, 0xFFFF));
        assert_eq!(latest.load(), RawSample::new(17, 0xFFFF));
    }

    #[test]
    fn adc_source_waits_for_conversion() {
        let adc = FakeAdc {
            x: std::vec![Err(nb::Error::WouldBlock), Ok(1500)],
            y: std::vec![Err(nb::Error::WouldBlock), Err(nb::Error::WouldBlock), Ok(2500)],
        };
        let mut src: AdcSampleSource<_, FakeAdcMarker, _, _> = AdcSampleSource::new(adc, XPin, YPin);
        assert_eq!(src.sample(), Ok(RawSample::new(1500, 2500)));
        let (adc, _, _) = src.release();
        assert!(adc.x.is_empty() && adc.y.is_empty());
    }

    #[test]
    fn adc_failure_maps_to_adc_error() {
        let adc = FakeAdc {
            x: std::vec![Ok(1500)],
            y: std::vec![Err(nb::Error::Other(()))],
        };
        let mut src: AdcSampleSource<_, FakeAdcMarker, _, _> = AdcSampleSource::new(adc, XPin, YPin);
        assert_eq!(src.sample(), Err(Error::AdcError));
    }
}
