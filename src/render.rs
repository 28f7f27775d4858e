//! Rendering collaborator interface
//!
//! The pen pipeline never draws pixels itself.  Every drawing request is
//! issued from the main loop through the [`Canvas`] trait, so the display
//! driver needs no locking against interrupt context.
//!
//! With the `graphics` feature, [`GraphicsCanvas`] adapts any
//! [`embedded_graphics`](https://docs.rs/embedded-graphics) draw target.

use crate::palette::{CLR_DARK_BLUE, CLR_GREEN, CLR_WHITE};
use crate::{Error, Point, Result};

/// A 24-bit `0xRRGGBB` colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color(pub u32);

impl Color {
    /// Split into (red, green, blue) channels
    pub const fn rgb(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }
}

/// An axis aligned rectangle, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rect {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl Rect {
    pub const fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Rect {
        Rect {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Square of side `2 * half + 1` centred on `p`
    pub const fn around(p: Point, half: i32) -> Rect {
        Rect::new(p.x - half, p.y - half, p.x + half, p.y + half)
    }

    /// Shrink by `n` pixels on every side
    pub const fn inset(self, n: i32) -> Rect {
        Rect::new(self.x_min + n, self.y_min + n, self.x_max - n, self.y_max - n)
    }

    pub const fn width(&self) -> i32 {
        self.x_max - self.x_min + 1
    }

    pub const fn height(&self) -> i32 {
        self.y_max - self.y_min + 1
    }

    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }
}

/// Drawing surface used by the calibration routine and the pen dispatcher
pub trait Canvas {
    type Error;

    /// Display size in pixels as (width, height)
    fn size(&self) -> (i32, i32);

    /// Colour used by subsequent drawing requests
    fn set_foreground(&mut self, color: Color);

    fn fill_rect(&mut self, rect: Rect) -> core::result::Result<(), Self::Error>;

    /// Draw the outline of `rect`
    fn draw_rect(&mut self, rect: Rect) -> core::result::Result<(), Self::Error>;

    fn draw_line(&mut self, from: Point, to: Point) -> core::result::Result<(), Self::Error>;

    /// Draw `text` with its left edge at `at.x`, or centred on `at` if `centered`
    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        centered: bool,
    ) -> core::result::Result<(), Self::Error>;

    /// Push out any buffered drawing operations
    fn flush(&mut self) -> core::result::Result<(), Self::Error>;
}

/// Height of the title banner across the top of the screen
pub const BANNER_HEIGHT: i32 = 24;

/// Top edge of the frame drawn around the scribble area
pub const SCRIBBLE_FRAME_TOP: i32 = 44;

/// Fill the top rows with a dark blue banner carrying `title`
pub fn draw_banner<C: Canvas>(canvas: &mut C, title: &str) -> Result<()> {
    let (width, _) = canvas.size();
    let banner = Rect::new(0, 0, width - 1, BANNER_HEIGHT - 1);

    canvas.set_foreground(CLR_DARK_BLUE);
    canvas.fill_rect(banner).map_err(|_| Error::RenderError)?;
    canvas.set_foreground(CLR_WHITE);
    canvas.draw_rect(banner).map_err(|_| Error::RenderError)?;
    canvas
        .draw_text(title, Point::new(width / 2, BANNER_HEIGHT / 2 - 1), true)
        .map_err(|_| Error::RenderError)
}

/// Draw the scribble pad screen: banner, instructions and a green frame
///
/// Returns the area inside the frame, which is where strokes may be drawn.
pub fn draw_scribble_frame<C: Canvas>(canvas: &mut C) -> Result<Rect> {
    let (width, height) = canvas.size();

    draw_banner(canvas, "scribble")?;
    canvas.set_foreground(CLR_WHITE);
    canvas
        .draw_text("Touch the screen to draw", Point::new(width / 2, 34), true)
        .map_err(|_| Error::RenderError)?;

    let frame = Rect::new(0, SCRIBBLE_FRAME_TOP, width - 1, height - 1);
    canvas.set_foreground(CLR_GREEN);
    canvas.draw_rect(frame).map_err(|_| Error::RenderError)?;
    canvas.flush().map_err(|_| Error::RenderError)?;

    Ok(frame.inset(1))
}

#[cfg(feature = "graphics")]
pub use graphics::GraphicsCanvas;

#[cfg(feature = "graphics")]
mod graphics {
    use super::{Canvas, Color, Rect};
    use crate::Point;
    use embedded_graphics::{
        draw_target::DrawTarget,
        geometry::{Dimensions, Point as EgPoint, Size},
        mono_font::{ascii::FONT_6X10, MonoTextStyle},
        pixelcolor::{Rgb888, RgbColor},
        primitives::{Line, Primitive, PrimitiveStyle, Rectangle},
        text::{Alignment, Baseline, Text, TextStyleBuilder},
        Drawable,
    };

    /// [`Canvas`] over an `embedded_graphics` draw target
    ///
    /// Drawing is immediate, so `flush` does nothing; targets with their own
    /// frame buffer should be flushed through [`GraphicsCanvas::target_mut`].
    pub struct GraphicsCanvas<D: DrawTarget> {
        target: D,
        foreground: D::Color,
    }

    impl<D> GraphicsCanvas<D>
    where
        D: DrawTarget,
        D::Color: From<Rgb888>,
    {
        pub fn new(target: D) -> GraphicsCanvas<D> {
            GraphicsCanvas {
                target,
                foreground: Rgb888::WHITE.into(),
            }
        }

        pub fn target_mut(&mut self) -> &mut D {
            &mut self.target
        }

        pub fn release(self) -> D {
            self.target
        }
    }

    fn eg_point(p: Point) -> EgPoint {
        EgPoint::new(p.x, p.y)
    }

    impl<D> Canvas for GraphicsCanvas<D>
    where
        D: DrawTarget,
        D::Color: From<Rgb888>,
    {
        type Error = D::Error;

        fn size(&self) -> (i32, i32) {
            let size = self.target.bounding_box().size;
            (size.width as i32, size.height as i32)
        }

        fn set_foreground(&mut self, color: Color) {
            let (r, g, b) = color.rgb();
            self.foreground = Rgb888::new(r, g, b).into();
        }

        fn fill_rect(&mut self, rect: Rect) -> Result<(), D::Error> {
            if rect.width() <= 0 || rect.height() <= 0 {
                return Ok(());
            }
            Rectangle::new(
                EgPoint::new(rect.x_min, rect.y_min),
                Size::new(rect.width() as u32, rect.height() as u32),
            )
            .into_styled(PrimitiveStyle::with_fill(self.foreground))
            .draw(&mut self.target)
        }

        fn draw_rect(&mut self, rect: Rect) -> Result<(), D::Error> {
            if rect.width() <= 0 || rect.height() <= 0 {
                return Ok(());
            }
            Rectangle::new(
                EgPoint::new(rect.x_min, rect.y_min),
                Size::new(rect.width() as u32, rect.height() as u32),
            )
            .into_styled(PrimitiveStyle::with_stroke(self.foreground, 1))
            .draw(&mut self.target)
        }

        fn draw_line(&mut self, from: Point, to: Point) -> Result<(), D::Error> {
            Line::new(eg_point(from), eg_point(to))
                .into_styled(PrimitiveStyle::with_stroke(self.foreground, 1))
                .draw(&mut self.target)
        }

        fn draw_text(&mut self, text: &str, at: Point, centered: bool) -> Result<(), D::Error> {
            let alignment = if centered {
                Alignment::Center
            } else {
                Alignment::Left
            };
            let style = TextStyleBuilder::new()
                .alignment(alignment)
                .baseline(if centered { Baseline::Middle } else { Baseline::Top })
                .build();
            Text::with_text_style(
                text,
                eg_point(at),
                MonoTextStyle::new(&FONT_6X10, self.foreground),
                style,
            )
            .draw(&mut self.target)?;
            Ok(())
        }

        fn flush(&mut self) -> Result<(), D::Error> {
            Ok(())
        }
    }

}
