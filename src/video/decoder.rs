// Pixel decoder - Packed 16-bit pixels to terminal color classes
//
// Pixel layout (one u16):
//   bit 15     opacity (0 = transparent)
//   bits 14-10 red   (5 bits)
//   bits 9-5   green (5 bits)
//   bits 4-0   blue  (5 bits)
//
// A terminal cell can only show one of a few colors, so each pixel collapses
// to the single channel that strictly dominates the other two. Ties, grays
// and transparent pixels all come out blank.

/// Opacity flag
pub const OPACITY_BIT: u16 = 1 << 15;

/// Mask for one 5-bit channel
pub const CHANNEL_MASK: u16 = 0x1F;

/// Discrete color a pixel decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorClass {
    /// Blank cell (transparent pixel or no dominant channel)
    #[default]
    None,
    /// Red dominates
    Red,
    /// Green dominates
    Green,
    /// Blue dominates
    Blue,
}

/// Split a pixel into its (red, green, blue) 5-bit channels
#[inline]
pub const fn channels(pixel: u16) -> (u16, u16, u16) {
    (
        (pixel >> 10) & CHANNEL_MASK,
        (pixel >> 5) & CHANNEL_MASK,
        pixel & CHANNEL_MASK,
    )
}

/// Decode a packed pixel to its color class
///
/// # Arguments
/// * `pixel` - Packed pixel (see module docs for the layout)
///
/// # Returns
/// The strictly dominant channel, or `ColorClass::None`
#[inline]
pub const fn decode(pixel: u16) -> ColorClass {
    if pixel & OPACITY_BIT == 0 {
        return ColorClass::None;
    }

    let (red, green, blue) = channels(pixel);

    if red > green && red > blue {
        ColorClass::Red
    } else if green > red && green > blue {
        ColorClass::Green
    } else if blue > red && blue > green {
        ColorClass::Blue
    } else {
        ColorClass::None
    }
}
