// Audio module - From core sample batches to a PCM device
//
// This module provides:
// - The audio sink boundary (write / recover / close)
// - The audio relay that forwards core batches and absorbs underruns
// - A fixed-capacity i16 ring buffer shared with the device callback
// - Cross-platform PCM output using cpal (feature "audio")
//
// All samples are signed 16-bit, two channels, interleaved (L, R, L, R, ...).

#[cfg(feature = "audio")]
pub mod output;
pub mod relay;
pub mod ring;

#[cfg(feature = "audio")]
pub use output::PcmOutput;
pub use relay::{AudioRelay, AudioStats};
pub use ring::SampleRing;

use thiserror::Error;

/// Interleaved channel count of every stream
pub const CHANNELS: u16 = 2;

/// Errors reported by an audio sink
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    /// No output device could be found
    #[error("no output device available")]
    NoDevice,

    /// The device cannot play the requested stream
    #[error("unsupported stream configuration: {0}")]
    Unsupported(String),

    /// The core reported a sample rate that cannot be used
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(f64),

    /// The device could not be opened or started
    #[error("{0}")]
    Device(String),

    /// The device ran out of samples
    #[error("buffer underrun")]
    Underrun,

    /// The device stopped consuming samples
    #[error("device stalled for {0} ms")]
    Stalled(u64),

    /// The stream reported an error asynchronously
    #[error("stream error: {0}")]
    Stream(String),
}

/// Sample format of a PCM stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 16-bit, native endian
    S16,
}

/// Parameters a PCM sink is opened with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcmParams {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Sample format
    pub format: SampleFormat,
    /// Number of periods in the device buffer
    pub periods: u32,
    /// Frames per period
    pub period_size: u32,
}

impl PcmParams {
    /// Derive stream parameters from the core's sample rate and a target latency
    ///
    /// # Arguments
    /// * `sample_rate` - Rate reported by the core (Hz)
    /// * `periods` - Number of periods the buffer is split into
    /// * `latency_ms` - Total buffer length in milliseconds
    ///
    /// # Returns
    /// The parameters, or `InvalidSampleRate` for non-finite or non-positive rates
    pub fn for_latency(sample_rate: f64, periods: u32, latency_ms: u32) -> Result<Self, AudioError> {
        if !sample_rate.is_finite() || sample_rate < 1.0 || sample_rate > u32::MAX as f64 {
            return Err(AudioError::InvalidSampleRate(sample_rate));
        }

        let sample_rate = sample_rate.round() as u32;
        let periods = periods.max(1);
        let buffer_frames = (sample_rate as u64 * latency_ms as u64 / 1000).max(periods as u64);
        let period_size = (buffer_frames / periods as u64) as u32;

        Ok(Self {
            sample_rate,
            channels: CHANNELS,
            format: SampleFormat::S16,
            periods,
            period_size,
        })
    }

    /// Total buffer capacity in frames
    pub fn buffer_frames(&self) -> usize {
        self.periods as usize * self.period_size as usize
    }
}

/// A PCM device the audio relay writes into
pub trait AudioSink {
    /// Write interleaved frames
    ///
    /// May block until the device has room.
    ///
    /// # Returns
    /// Number of frames written, or the error the device reported
    fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError>;

    /// Bring the device back into a playable state after `error`
    fn recover(&mut self, error: &AudioError) -> Result<(), AudioError>;

    /// Stop playback and release the device
    fn close(&mut self);
}
