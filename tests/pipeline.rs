//! Calibrate, then run a stroke from raw samples through to drawing requests

use embedded_hal::blocking::delay::DelayMs;
use penpad::{
    Calibrator, Canvas, Color, EventQueue, LatestSample, PenDispatcher, PenTracker, Point,
    RawSample, Rect, SampleSource,
};

#[derive(Default)]
struct Lines {
    lines: Vec<(Point, Point)>,
    colors: Vec<Color>,
}

impl Canvas for Lines {
    type Error = core::convert::Infallible;

    fn size(&self) -> (i32, i32) {
        (320, 240)
    }

    fn set_foreground(&mut self, color: Color) {
        self.colors.push(color);
    }

    fn fill_rect(&mut self, _rect: Rect) -> Result<(), Self::Error> {
        Ok(())
    }

    fn draw_rect(&mut self, _rect: Rect) -> Result<(), Self::Error> {
        Ok(())
    }

    fn draw_line(&mut self, from: Point, to: Point) -> Result<(), Self::Error> {
        self.lines.push((from, to));
        Ok(())
    }

    fn draw_text(&mut self, _text: &str, _at: Point, _centered: bool) -> Result<(), Self::Error> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Plays the role of the touch interrupt during calibration: every poll
/// publishes the next scripted reading into the shared cell first.
struct Touches<'a> {
    latest: &'a LatestSample,
    script: std::vec::IntoIter<RawSample>,
}

impl SampleSource for Touches<'_> {
    type Error = core::convert::Infallible;

    fn sample(&mut self) -> Result<RawSample, Self::Error> {
        self.latest
            .publish(self.script.next().unwrap_or(RawSample::PEN_UP));
        let mut latest = self.latest;
        latest.sample()
    }
}

struct Spin;

impl DelayMs<u32> for Spin {
    fn delay_ms(&mut self, _ms: u32) {}
}

fn touch(script: &mut Vec<RawSample>, x: u16, y: u16) {
    script.extend(std::iter::repeat(RawSample::new(x, y)).take(20));
    script.push(RawSample::PEN_UP);
}

#[test]
fn calibrated_stroke_reaches_the_canvas() {
    // Panel with raw = 10 * screen + 300 on both axes
    let raw = |p: Point| RawSample::new((p.x * 10 + 300) as u16, (p.y * 10 + 300) as u16);

    let latest = LatestSample::new();
    let mut script = Vec::new();
    for p in penpad::calibration::reference_points(320, 240) {
        let r = raw(p);
        touch(&mut script, r.x, r.y);
    }
    let mut touches = Touches {
        latest: &latest,
        script: script.into_iter(),
    };
    let mut canvas = Lines::default();
    let coefficients = Calibrator::default()
        .run(&mut touches, &mut canvas, &mut Spin)
        .unwrap();
    assert_eq!(coefficients.map(Point::new(1300, 2300)), Point::new(100, 200));

    let mut queue: EventQueue<16> = EventQueue::new();
    let (mut producer, mut consumer) = queue.split();
    let mut tracker = PenTracker::new(coefficients, Default::default());
    let stroke = [(50, 60), (50, 60), (50, 60), (50, 60), (55, 65), (60, 70), (65, 75)];
    for (x, y) in stroke {
        tracker.on_sample(raw(Point::new(x, y)), &mut producer);
    }
    tracker.on_sample(RawSample::PEN_UP, &mut producer);

    let area = penpad::render::draw_scribble_frame(&mut canvas).unwrap();
    let mut dispatcher = PenDispatcher::new(area);
    let mut canvas = Lines::default();
    assert_eq!(dispatcher.process(&mut consumer, &mut canvas), Ok(5));

    assert_eq!(
        canvas.lines,
        [
            (Point::new(50, 60), Point::new(55, 65)),
            (Point::new(55, 65), Point::new(60, 70)),
            (Point::new(60, 70), Point::new(65, 75)),
            (Point::new(65, 75), Point::new(65, 75)),
        ]
    );
    assert_eq!(dispatcher.pen().color_index, 1);
}
