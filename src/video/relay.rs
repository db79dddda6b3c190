// Video relay - Sampling a core framebuffer onto a display
//
// The core hands over a pointer to its own pixel memory that is only valid
// during the refresh callback. `FrameView` borrows it for exactly that long;
// nothing from a frame survives the call except what was drawn.

use super::decoder::decode;
use super::DisplaySink;
use std::ffi::{c_uint, c_void};

/// Default horizontal and vertical decimation factor
pub const DEFAULT_DECIMATION: usize = 2;

/// Bytes per pixel of the supported pixel format
const BYTES_PER_PIXEL: usize = 2;

/// Borrowed view of a core-owned framebuffer
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    bytes: &'a [u8],
    width: usize,
    height: usize,
    pitch: usize,
}

impl<'a> FrameView<'a> {
    /// Number of bytes a frame with these dimensions spans
    fn span(width: usize, height: usize, pitch: usize) -> usize {
        if width == 0 || height == 0 {
            0
        } else {
            pitch * (height - 1) + width * BYTES_PER_PIXEL
        }
    }

    /// Create a view over a byte slice
    ///
    /// # Arguments
    /// * `bytes` - Pixel memory, rows `pitch` bytes apart
    /// * `width` - Frame width in pixels
    /// * `height` - Frame height in pixels
    /// * `pitch` - Distance between rows in bytes
    ///
    /// # Returns
    /// None if a row does not fit in `pitch` or the slice is too short
    pub fn new(bytes: &'a [u8], width: usize, height: usize, pitch: usize) -> Option<Self> {
        if pitch < width * BYTES_PER_PIXEL || bytes.len() < Self::span(width, height, pitch) {
            return None;
        }

        Some(Self {
            bytes,
            width,
            height,
            pitch,
        })
    }

    /// Create a view from the arguments of a video refresh callback
    ///
    /// # Returns
    /// None for a null frame (the core repeats the previous one) or for a
    /// frame whose pitch cannot hold a row
    ///
    /// # Safety
    /// A non-null `data` must point to at least `pitch * (height - 1) +
    /// width * 2` readable bytes that stay valid for `'a`.
    pub unsafe fn from_raw(
        data: *const c_void,
        width: c_uint,
        height: c_uint,
        pitch: usize,
    ) -> Option<Self> {
        if data.is_null() {
            return None;
        }

        let (width, height) = (width as usize, height as usize);
        if pitch < width * BYTES_PER_PIXEL {
            log::debug!(
                "dropping frame {}x{}: pitch {} is narrower than a row",
                width,
                height,
                pitch
            );
            return None;
        }

        let bytes = std::slice::from_raw_parts(data.cast::<u8>(), Self::span(width, height, pitch));
        Self::new(bytes, width, height, pitch)
    }

    /// Frame width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Read the pixel at (x, y)
    ///
    /// # Panics
    /// Panics if the coordinates are outside the frame
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u16 {
        assert!(x < self.width, "X coordinate {} out of bounds", x);
        assert!(y < self.height, "Y coordinate {} out of bounds", y);

        let offset = y * self.pitch + x * BYTES_PER_PIXEL;
        u16::from_ne_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }
}

/// Draws sampled frames onto the attached display
pub struct VideoRelay {
    display: Option<Box<dyn DisplaySink>>,
    decimation: usize,
    frames_presented: u64,
    error_reported: bool,
}

impl VideoRelay {
    /// Create a relay with no display attached
    ///
    /// # Arguments
    /// * `decimation` - Sample every Nth pixel in both directions (clamped to at least 1)
    pub fn new(decimation: usize) -> Self {
        Self {
            display: None,
            decimation: decimation.max(1),
            frames_presented: 0,
            error_reported: false,
        }
    }

    /// Attach the display frames are drawn into
    pub fn attach(&mut self, display: Box<dyn DisplaySink>) {
        self.display = Some(display);
        self.error_reported = false;
    }

    /// Detach and return the display
    pub fn detach(&mut self) -> Option<Box<dyn DisplaySink>> {
        self.display.take()
    }

    /// Whether a display is attached
    pub fn is_attached(&self) -> bool {
        self.display.is_some()
    }

    /// Decimation factor in use
    pub fn decimation(&self) -> usize {
        self.decimation
    }

    /// Number of frames presented so far
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Handle one video refresh
    ///
    /// A `None` frame is a no-op; the previous frame stays on screen.
    pub fn refresh(&mut self, frame: Option<FrameView<'_>>) {
        let (Some(frame), Some(display)) = (frame, self.display.as_mut()) else {
            return;
        };

        let step = self.decimation;
        let result = (|| {
            for y in (0..frame.height()).step_by(step) {
                for x in (0..frame.width()).step_by(step) {
                    display.set_cell(y / step, x / step, decode(frame.pixel(x, y)))?;
                }
            }
            display.present()
        })();

        match result {
            Ok(()) => self.frames_presented += 1,
            Err(e) if !self.error_reported => {
                log::warn!("display error, dropping frame: {}", e);
                self.error_reported = true;
            }
            Err(e) => log::debug!("display error, dropping frame: {}", e),
        }
    }
}
