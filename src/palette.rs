//! Colours used by the pen pipeline
//!
//! Values are 24-bit `0xRRGGBB`, as accepted by [`Canvas::set_foreground`](crate::render::Canvas::set_foreground).

use crate::render::Color;

macro_rules! color_id {
    ($name:ident, $rgb:literal) => {
        $crate::paste::paste! {
            #[doc = "The " [<$name:lower>] " colour"]
            pub const [<CLR_ $name:upper>]: Color = Color($rgb);
        }
    };
}

color_id!(BLACK, 0x00_0000);
color_id!(WHITE, 0xFF_FFFF);
color_id!(YELLOW, 0xFF_FF00);
color_id!(MAGENTA, 0xFF_00FF);
color_id!(RED, 0xFF_0000);
color_id!(CYAN, 0x00_FFFF);
color_id!(LIME, 0x00_FF00);
color_id!(GREEN, 0x00_8000);
color_id!(BLUE, 0x00_00FF);
color_id!(DARK_BLUE, 0x00_008B);

/// The seven fundamental colours, one per stroke in turn
///
/// These are the colours produced by the three colour channels each being
/// fully on or fully off (black excluded).
pub const FUNDAMENTAL: [Color; 7] = [
    CLR_WHITE,
    CLR_YELLOW,
    CLR_MAGENTA,
    CLR_RED,
    CLR_CYAN,
    CLR_LIME,
    CLR_BLUE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fundamental_colours_are_saturated_channels() {
        for c in FUNDAMENTAL {
            let (r, g, b) = c.rgb();
            for ch in [r, g, b] {
                assert!(ch == 0 || ch == 0xFF);
            }
            assert_ne!(c, CLR_BLACK);
        }
    }
}
