//! Three-point touchscreen calibration
//!
//! The raw ADC coordinates of a resistive panel are related to screen
//! coordinates by an affine transform (scale, rotation, skew and offset per
//! axis).  Touching three known, non-collinear screen points is enough to
//! solve it:
//!
//! ```text
//! screen_x = (M0 * raw_x + M1 * raw_y + M2) / M6
//! screen_y = (M3 * raw_x + M4 * raw_y + M5) / M6
//! ```
//!
//! All arithmetic is integer only, in `i64`, so results are bit-exact on
//! targets without an FPU.

use core::fmt;
use core::fmt::Write as _;

use embedded_hal::blocking::delay::DelayMs;

use crate::palette::{CLR_BLACK, CLR_WHITE};
use crate::render::{draw_banner, Canvas, Rect, BANNER_HEIGHT};
use crate::sample::SampleSource;
use crate::sampler::{AveragingSampler, SamplerConfig};
use crate::{Error, Point, Result};

/// A known screen position and the averaged raw reading taken there
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationPoint {
    pub screen: Point,
    pub raw: Point,
}

impl CalibrationPoint {
    pub const fn new(screen: Point, raw: Point) -> CalibrationPoint {
        CalibrationPoint { screen, raw }
    }
}

/// The three points a calibration is solved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationSet {
    pub points: [CalibrationPoint; 3],
}

impl CalibrationSet {
    pub const fn new(points: [CalibrationPoint; 3]) -> CalibrationSet {
        CalibrationSet { points }
    }

    /// Solve for the raw to screen mapping
    ///
    /// Returns `Err(Error::DegenerateCalibration)` if the raw readings are
    /// collinear or coincide, in which case no mapping exists.
    pub fn solve(&self) -> Result<CalibrationCoefficients> {
        let [p0, p1, p2] = self.points;
        let (sx0, sy0, rx0, ry0) = widen(p0);
        let (sx1, sy1, rx1, ry1) = widen(p1);
        let (sx2, sy2, rx2, ry2) = widen(p2);

        let m6 = (rx0 - rx2) * (ry1 - ry2) - (rx1 - rx2) * (ry0 - ry2);
        if m6 == 0 {
            warn!("degenerate calibration points: {:?}", self.points);
            return Err(Error::DegenerateCalibration);
        }

        let m = [
            (sx0 - sx2) * (ry1 - ry2) - (sx1 - sx2) * (ry0 - ry2),
            (rx0 - rx2) * (sx1 - sx2) - (sx0 - sx2) * (rx1 - rx2),
            (rx2 * sx1 - rx1 * sx2) * ry0
                + (rx0 * sx2 - rx2 * sx0) * ry1
                + (rx1 * sx0 - rx0 * sx1) * ry2,
            (sy0 - sy2) * (ry1 - ry2) - (sy1 - sy2) * (ry0 - ry2),
            (rx0 - rx2) * (sy1 - sy2) - (sy0 - sy2) * (rx1 - rx2),
            (rx2 * sy1 - rx1 * sy2) * ry0
                + (rx0 * sy2 - rx2 * sy0) * ry1
                + (rx1 * sy0 - rx0 * sy1) * ry2,
            m6,
        ];
        info!("calibration: {:?}", m);
        Ok(CalibrationCoefficients { m })
    }
}

fn widen(p: CalibrationPoint) -> (i64, i64, i64, i64) {
    (
        p.screen.x as i64,
        p.screen.y as i64,
        p.raw.x as i64,
        p.raw.y as i64,
    )
}

/// The coefficients `M0..M6` of the raw to screen mapping
///
/// The denominator `M6` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationCoefficients {
    m: [i64; 7],
}

impl CalibrationCoefficients {
    /// Rebuild coefficients from values computed earlier
    ///
    /// Fails with `Error::DegenerateCalibration` if `M6` is zero.
    pub fn new(m: [i64; 7]) -> Result<CalibrationCoefficients> {
        if m[6] == 0 {
            return Err(Error::DegenerateCalibration);
        }
        Ok(CalibrationCoefficients { m })
    }

    pub fn as_array(&self) -> &[i64; 7] {
        &self.m
    }

    /// Map a raw reading to screen coordinates
    ///
    /// Division truncates towards zero.
    pub fn map(&self, raw: Point) -> Point {
        let m = &self.m;
        let (x, y) = (raw.x as i64, raw.y as i64);
        Point::new(
            ((m[0] * x + m[1] * y + m[2]) / m[6]) as i32,
            ((m[3] * x + m[4] * y + m[5]) / m[6]) as i32,
        )
    }
}

impl fmt::Display for CalibrationCoefficients {
    /// One `Mn = value` line per coefficient
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.m.iter().enumerate() {
            if i > 0 {
                f.write_char('\n')?;
            }
            write!(f, "M{} = {}", i, v)?;
        }
        Ok(())
    }
}

/// Screen positions of the three calibration targets for a display size
///
/// Placed at (10%, 20%), (50%, 90%) and (90%, 50%) of the display, which
/// spreads them over both axes and keeps them clear of the banner.
pub fn reference_points(width: i32, height: i32) -> [Point; 3] {
    [
        Point::new(width / 10, (height * 2) / 10),
        Point::new(width / 2, (height * 9) / 10),
        Point::new((width * 9) / 10, height / 2),
    ]
}

/// Settings for [`Calibrator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationConfig {
    pub sampler: SamplerConfig,
    /// Half the side of the target box drawn around each point
    pub target_half_size: i32,
    /// Pause before showing each target, so the previous lift settles
    pub point_delay_ms: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig {
            sampler: SamplerConfig::default(),
            target_half_size: 5,
            point_delay_ms: 500,
        }
    }
}

/// Interactive calibration: show targets, capture touches, solve
pub struct Calibrator {
    config: CalibrationConfig,
    sampler: AveragingSampler,
}

impl Calibrator {
    pub fn new(config: CalibrationConfig) -> Calibrator {
        Calibrator {
            config,
            sampler: AveragingSampler::new(config.sampler),
        }
    }

    /// Run the calibration sequence and display the result
    ///
    /// * Draw the banner and instructions
    /// * For each reference point: show a white target box, wait for an
    ///   averaged touch on `source`, erase the box
    /// * Solve and list `M0..M6` on screen
    ///
    /// Blocks until all three gestures complete (see
    /// [`SamplerConfig::max_ticks`]).  A degenerate set, a timeout or an ADC
    /// failure is reported on screen and returned as the error.
    pub fn run<S, C>(
        &mut self,
        source: &mut S,
        canvas: &mut C,
        delay: &mut dyn DelayMs<u32>,
    ) -> Result<CalibrationCoefficients>
    where
        S: SampleSource,
        C: Canvas,
    {
        let (width, height) = canvas.size();

        draw_banner(canvas, "calibrate")?;
        canvas.set_foreground(CLR_WHITE);
        render(canvas.draw_text("Touch the box", Point::new(0, height / 2 - 10), false))?;

        let targets = reference_points(width, height);
        let mut points = [CalibrationPoint::default(); 3];
        for (point, &screen) in points.iter_mut().zip(targets.iter()) {
            match self.capture_point(source, canvas, delay, screen) {
                Ok(captured) => *point = captured,
                Err(Error::RenderError) => return Err(Error::RenderError),
                Err(e) => {
                    warn!("calibration aborted: {:?}", e);
                    return report_failure(canvas, e);
                }
            }
            debug!("calibration point {:?} raw {:?}", point.screen, point.raw);
        }

        let coefficients = match CalibrationSet::new(points).solve() {
            Ok(coefficients) => coefficients,
            Err(e) => return report_failure(canvas, e),
        };

        clear_below_banner(canvas)?;
        render(canvas.draw_text("Calibration data:", Point::new(0, 40), false))?;
        for (i, v) in coefficients.as_array().iter().enumerate() {
            let mut line: heapless::String<32> = heapless::String::new();
            // 32 bytes always fit "Mn = " and an i64
            let _ = write!(line, "M{} = {}", i, v);
            render(canvas.draw_text(&line, Point::new(0, 80 + 20 * i as i32), false))?;
        }
        render(canvas.flush())?;
        Ok(coefficients)
    }

    fn capture_point<S, C>(
        &mut self,
        source: &mut S,
        canvas: &mut C,
        delay: &mut dyn DelayMs<u32>,
        screen: Point,
    ) -> Result<CalibrationPoint>
    where
        S: SampleSource,
        C: Canvas,
    {
        let target = Rect::around(screen, self.config.target_half_size);

        canvas.set_foreground(CLR_WHITE);
        render(canvas.flush())?;
        delay.delay_ms(self.config.point_delay_ms);
        render(canvas.fill_rect(target))?;
        render(canvas.flush())?;

        let raw = self.sampler.capture(source, delay);

        // Erase the target even if the capture failed
        canvas.set_foreground(CLR_BLACK);
        render(canvas.fill_rect(target))?;
        Ok(CalibrationPoint::new(screen, raw?))
    }
}

fn clear_below_banner<C: Canvas>(canvas: &mut C) -> Result<()> {
    let (width, height) = canvas.size();
    canvas.set_foreground(CLR_BLACK);
    render(canvas.fill_rect(Rect::new(0, BANNER_HEIGHT, width - 1, height - 1)))?;
    canvas.set_foreground(CLR_WHITE);
    Ok(())
}

/// Show why calibration failed and hand the error back
fn report_failure<C: Canvas>(canvas: &mut C, error: Error) -> Result<CalibrationCoefficients> {
    let hint = match error {
        Error::DegenerateCalibration => "Touch points in a line",
        Error::Timeout => "No touch detected",
        _ => "Touch read error",
    };
    clear_below_banner(canvas)?;
    render(canvas.draw_text("Calibration failed", Point::new(0, 40), false))?;
    render(canvas.draw_text(hint, Point::new(0, 60), false))?;
    render(canvas.flush())?;
    Err(error)
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}

fn render<E>(r: core::result::Result<(), E>) -> Result<()> {
    r.map_err(|_| Error::RenderError)
}
