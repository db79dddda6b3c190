// Video module - From core framebuffers to terminal cells
//
// This module provides:
// - Pixel decoding (packed 16-bit pixel -> ColorClass)
// - The video relay that samples a frame and draws it cell by cell
// - A crossterm-backed terminal display
// - A null display for headless runs

pub mod decoder;
pub mod relay;
pub mod terminal;

pub use decoder::{decode, ColorClass};
pub use relay::{FrameView, VideoRelay, DEFAULT_DECIMATION};
pub use terminal::TerminalDisplay;

use std::io;

/// A character-cell display the video relay draws into
pub trait DisplaySink {
    /// Paint one cell
    ///
    /// # Arguments
    /// * `row` - Destination row (0 = top)
    /// * `col` - Destination column (0 = left)
    /// * `color` - Color class for the cell
    fn set_cell(&mut self, row: usize, col: usize, color: ColorClass) -> io::Result<()>;

    /// Make everything drawn since the last present visible
    fn present(&mut self) -> io::Result<()>;

    /// Release the display and restore whatever it took over
    fn close(&mut self) -> io::Result<()>;
}

/// Display that discards everything
#[derive(Debug, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn set_cell(&mut self, _row: usize, _col: usize, _color: ColorClass) -> io::Result<()> {
        Ok(())
    }

    fn present(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}
