//! Main-loop handling of pen events
//!
//! The dispatcher owns the pen state and issues every drawing request, so
//! drawing only ever happens in main-loop context.  Each stroke clears the
//! drawing area and is drawn in the next colour of the palette.

use crate::palette::{CLR_BLACK, FUNDAMENTAL};
use crate::pen::{PenEvent, PenEventKind};
use crate::queue::Consumer;
use crate::render::{Canvas, Color, Rect};
use crate::{Error, Point, Result};

/// Whether a stroke is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchState {
    Idle,
    Drawing,
}

/// Pen position and colour bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PenState {
    /// Last recorded pen position
    pub last: Point,
    /// Index into the palette of the colour for the next stroke
    pub color_index: usize,
}

/// Pen event state machine
///
/// * `Idle` + `Down`: clear the drawing area, select the current colour,
///   start `Drawing`
/// * `Drawing` + `Move`: line from the last position
/// * `Drawing` + `Up`: final line, advance to the next colour, back to `Idle`
///
/// `Move` and `Up` while `Idle` are ignored.  `Down` while `Drawing` starts
/// a new stroke.
pub struct PenDispatcher {
    state: DispatchState,
    pen: PenState,
    area: Rect,
    palette: &'static [Color],
}

impl PenDispatcher {
    /// Dispatcher drawing in `area` with the fundamental colours
    pub fn new(area: Rect) -> PenDispatcher {
        Self::with_palette(area, &FUNDAMENTAL)
    }

    /// Dispatcher using a custom stroke palette
    ///
    /// An empty palette draws everything in the fundamental colours.
    pub fn with_palette(area: Rect, palette: &'static [Color]) -> PenDispatcher {
        PenDispatcher {
            state: DispatchState::Idle,
            pen: PenState::default(),
            area,
            palette: if palette.is_empty() {
                &FUNDAMENTAL
            } else {
                palette
            },
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn pen(&self) -> &PenState {
        &self.pen
    }

    /// Colour the current or next stroke is drawn in
    pub fn color(&self) -> Color {
        self.palette[self.pen.color_index]
    }

    /// Apply one event
    pub fn handle<C: Canvas>(&mut self, event: PenEvent, canvas: &mut C) -> Result<()> {
        let p = event.position();
        match (self.state, event.kind) {
            (_, PenEventKind::Down) => {
                canvas.set_foreground(CLR_BLACK);
                canvas.fill_rect(self.area).map_err(|_| Error::RenderError)?;
                canvas.flush().map_err(|_| Error::RenderError)?;
                canvas.set_foreground(self.color());
                self.pen.last = p;
                self.state = DispatchState::Drawing;
                debug!("stroke start at {:?}", p);
            }
            (DispatchState::Drawing, PenEventKind::Move) => {
                self.line_to(p, canvas)?;
            }
            (DispatchState::Drawing, PenEventKind::Up) => {
                self.line_to(p, canvas)?;
                self.pen.color_index = (self.pen.color_index + 1) % self.palette.len();
                self.state = DispatchState::Idle;
                debug!("stroke end at {:?}", p);
            }
            (DispatchState::Idle, _) => {}
        }
        Ok(())
    }

    /// Drain the queue once and apply every event, oldest first
    ///
    /// Returns the number of events handled.  Stops at the first drawing
    /// error; the remaining events stay queued.
    pub fn process<C: Canvas, const N: usize>(
        &mut self,
        consumer: &mut Consumer<'_, N>,
        canvas: &mut C,
    ) -> Result<usize> {
        let mut handled = 0;
        for event in consumer.drain() {
            self.handle(event, canvas)?;
            handled += 1;
        }
        Ok(handled)
    }

    fn line_to<C: Canvas>(&mut self, p: Point, canvas: &mut C) -> Result<()> {
        canvas
            .draw_line(self.pen.last, p)
            .map_err(|_| Error::RenderError)?;
        canvas.flush().map_err(|_| Error::RenderError)?;
        self.pen.last = p;
        Ok(())
    }
}
