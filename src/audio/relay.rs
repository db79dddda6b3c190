// Audio relay - Forwarding core sample batches to the attached sink
//
// Dropped audio is acceptable, a stalled frame pump is not: when the sink
// reports an error the relay asks it to recover, reports zero frames for that
// batch and moves on.

use super::{AudioError, AudioSink};

/// Audio relay counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioStats {
    /// Batches received from the core
    pub batches: u64,

    /// Frames accepted by the sink
    pub frames_written: u64,

    /// Frames dropped because of sink errors
    pub frames_dropped: u64,

    /// Recoveries attempted
    pub recoveries: u64,
}

/// Forwards interleaved stereo batches to an audio sink
#[derive(Default)]
pub struct AudioRelay {
    sink: Option<Box<dyn AudioSink>>,
    stats: AudioStats,
}

impl AudioRelay {
    /// Create a relay with no sink attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the sink batches are written into
    pub fn attach(&mut self, sink: Box<dyn AudioSink>) {
        self.sink = Some(sink);
    }

    /// Detach and return the sink
    pub fn detach(&mut self) -> Option<Box<dyn AudioSink>> {
        self.sink.take()
    }

    /// Whether a sink is attached
    pub fn is_attached(&self) -> bool {
        self.sink.is_some()
    }

    /// Relay counters so far
    pub fn stats(&self) -> AudioStats {
        self.stats
    }

    /// Write a batch of interleaved stereo frames
    ///
    /// # Arguments
    /// * `samples` - Interleaved samples, two per frame
    ///
    /// # Returns
    /// Frames written; 0 when no sink is attached or the sink failed
    pub fn write_batch(&mut self, samples: &[i16]) -> usize {
        let Some(sink) = self.sink.as_mut() else {
            return 0;
        };

        let frames = samples.len() / 2;
        self.stats.batches += 1;

        match sink.write(&samples[..frames * 2]) {
            Ok(written) => {
                self.stats.frames_written += written as u64;
                written
            }
            Err(error) => {
                self.stats.frames_dropped += frames as u64;
                self.stats.recoveries += 1;
                log_write_error(&error);

                if let Err(e) = sink.recover(&error) {
                    log::warn!("audio recovery failed: {}", e);
                }
                0
            }
        }
    }

    /// Write a single stereo frame
    pub fn write_sample(&mut self, left: i16, right: i16) -> usize {
        self.write_batch(&[left, right])
    }
}

fn log_write_error(error: &AudioError) {
    match error {
        AudioError::Underrun => log::debug!("audio underrun, recovering"),
        other => log::warn!("audio write failed, recovering: {}", other),
    }
}
