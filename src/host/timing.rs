// Timing module - Core-reported geometry/timing and frame pacing

use crate::abi::{self, SystemAvInfo};
use crate::loader::CoreApi;
use std::thread;
use std::time::{Duration, Instant};

/// Geometry and timing reported by `retro_get_system_av_info`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvTiming {
    pub base_width: u32,
    pub base_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub aspect_ratio: f32,
    /// Frames per second
    pub fps: f64,
    /// Audio sample rate (Hz)
    pub sample_rate: f64,
}

impl AvTiming {
    /// Ask the core for its geometry and timing
    pub fn query(api: &CoreApi) -> Self {
        let mut info = abi::empty_system_av_info();
        // SAFETY: the core fills in a struct we own.
        unsafe { (api.get_system_av_info)(&mut info) };
        Self::from(&info)
    }
}

impl From<&SystemAvInfo> for AvTiming {
    fn from(info: &SystemAvInfo) -> Self {
        Self {
            base_width: info.geometry.base_width,
            base_height: info.geometry.base_height,
            max_width: info.geometry.max_width,
            max_height: info.geometry.max_height,
            aspect_ratio: info.geometry.aspect_ratio,
            fps: info.timing.fps,
            sample_rate: info.timing.sample_rate,
        }
    }
}

/// Sleeps the frame pump to the core's frame rate
///
/// Only used when no audio sink paces the loop through blocking writes.
#[derive(Debug)]
pub struct FramePacer {
    frame: Duration,
    next: Instant,
}

impl FramePacer {
    /// Create a pacer for `fps` frames per second
    ///
    /// Returns None for rates that cannot pace anything (zero, negative, NaN).
    pub fn new(fps: f64) -> Option<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return None;
        }

        let frame = Duration::from_secs_f64(1.0 / fps);
        Some(Self {
            frame,
            next: Instant::now() + frame,
        })
    }

    /// Length of one frame
    pub fn frame_duration(&self) -> Duration {
        self.frame
    }

    /// Sleep until the next frame is due
    ///
    /// A pump that fell more than a frame behind starts over instead of
    /// running fast to catch up.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
            self.next += self.frame;
        } else if now - self.next > self.frame {
            self.next = now + self.frame;
        } else {
            self.next += self.frame;
        }
    }
}
