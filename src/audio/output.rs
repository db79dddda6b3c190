// PCM output - Blocking stereo i16 playback on top of cpal
//
// cpal pulls samples from a callback on its own thread, while the frame pump
// pushes whole batches. The two meet in a `SampleRing` behind a mutex:
// - write() blocks while the ring is full, up to a stall timeout
// - the device callback pops samples and plays silence when it runs dry
// - running dry after playback has started is an underrun, reported on the
//   next write() and cleared by recover()

use super::{AudioError, AudioSink, PcmParams, SampleRing};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Shortest time write() waits for the device before giving up
const MIN_STALL_TIMEOUT: Duration = Duration::from_millis(100);

/// State shared with the device callback
struct StreamState {
    ring: SampleRing,
    /// Samples have been queued since the last (re)start
    primed: bool,
    /// The device ran dry after being primed
    underrun: bool,
    /// Asynchronous stream error, if any
    failure: Option<String>,
}

struct Shared {
    state: Mutex<StreamState>,
    space: Condvar,
}

impl Shared {
    fn new(capacity_samples: usize) -> Self {
        Self {
            state: Mutex::new(StreamState {
                ring: SampleRing::new(capacity_samples),
                primed: false,
                underrun: false,
                failure: None,
            }),
            space: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Device callback: fill `out` from the ring
    fn fill<T: Copy>(&self, out: &mut [T], convert: impl Fn(i16) -> T, silence: T) {
        let mut state = self.lock();
        let mut starved = false;

        for slot in out.iter_mut() {
            *slot = match state.ring.pop() {
                Some(sample) => convert(sample),
                None => {
                    starved = true;
                    silence
                }
            };
        }

        if starved && state.primed {
            state.underrun = true;
        }
        drop(state);

        self.space.notify_one();
    }

    fn fail(&self, message: String) {
        self.lock().failure = Some(message);
        self.space.notify_all();
    }
}

/// cpal-backed audio sink
pub struct PcmOutput {
    params: PcmParams,
    stream: Stream,
    shared: Arc<Shared>,
    stall_timeout: Duration,
    closed: bool,
}

impl PcmOutput {
    /// Open the default output device
    ///
    /// # Arguments
    ///
    /// * `params` - Stream parameters (rate, channels, buffer geometry)
    ///
    /// # Returns
    ///
    /// The running output, or why the device could not play this stream
    pub fn open(params: &PcmParams) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let device_name = device.name().unwrap_or_default();

        let format = pick_sample_format(&device, params)?;
        let stream_config = StreamConfig {
            channels: params.channels,
            sample_rate: cpal::SampleRate(params.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let shared = Arc::new(Shared::new(
            params.buffer_frames() * params.channels as usize,
        ));

        let error_shared = Arc::clone(&shared);
        let on_error = move |err: cpal::StreamError| {
            error_shared.fail(err.to_string());
        };

        let data_shared = Arc::clone(&shared);
        let stream = match format {
            cpal::SampleFormat::I16 => device.build_output_stream(
                &stream_config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    data_shared.fill(data, |s| s, 0);
                },
                on_error,
                None,
            ),
            _ => device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    data_shared.fill(data, |s| s as f32 / 32768.0, 0.0);
                },
                on_error,
                None,
            ),
        }
        .map_err(|e| AudioError::Device(format!("failed to build audio stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::Device(format!("failed to start audio stream: {}", e)))?;

        let buffer_ms = params.buffer_frames() as u64 * 1000 / params.sample_rate.max(1) as u64;
        let stall_timeout = Duration::from_millis(buffer_ms * 2).max(MIN_STALL_TIMEOUT);

        log::info!(
            "audio device '{}' opened: {} Hz, {} channels, {:?} ({}), {} x {} frames",
            device_name,
            params.sample_rate,
            params.channels,
            params.format,
            format,
            params.periods,
            params.period_size
        );

        Ok(Self {
            params: *params,
            stream,
            shared,
            stall_timeout,
            closed: false,
        })
    }
}

impl AudioSink for PcmOutput {
    fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError> {
        let mut state = self.shared.lock();
        let mut offset = 0;

        while offset < samples.len() {
            if state.underrun {
                return Err(AudioError::Underrun);
            }
            if let Some(message) = &state.failure {
                return Err(AudioError::Stream(message.clone()));
            }

            let pushed = state.ring.push_slice(&samples[offset..]);
            if pushed > 0 {
                state.primed = true;
                offset += pushed;
                continue;
            }

            let (guard, wait) = self
                .shared
                .space
                .wait_timeout(state, self.stall_timeout)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;

            if wait.timed_out() && state.ring.free() == 0 {
                return Err(AudioError::Stalled(self.stall_timeout.as_millis() as u64));
            }
        }

        Ok(samples.len() / self.params.channels as usize)
    }

    fn recover(&mut self, error: &AudioError) -> Result<(), AudioError> {
        let restart = {
            let mut state = self.shared.lock();
            state.underrun = false;
            state.primed = false;
            let restart = state.failure.take().is_some() || matches!(error, AudioError::Stalled(_));
            if restart {
                state.ring.clear();
            }
            restart
        };

        if restart {
            self.stream
                .play()
                .map_err(|e| AudioError::Device(format!("failed to restart audio stream: {}", e)))?;
        }

        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.stream.pause() {
            log::debug!("failed to pause audio stream: {}", e);
        }
        self.shared.space.notify_all();
    }
}

/// Choose a device sample format that can play `params`
///
/// Prefers native i16; falls back to f32 with conversion.
fn pick_sample_format(
    device: &cpal::Device,
    params: &PcmParams,
) -> Result<cpal::SampleFormat, AudioError> {
    let configs = device
        .supported_output_configs()
        .map_err(|e| AudioError::Device(format!("failed to query output configs: {}", e)))?;

    let formats: Vec<cpal::SampleFormat> = configs
        .filter(|range| {
            range.channels() == params.channels
                && range.min_sample_rate().0 <= params.sample_rate
                && params.sample_rate <= range.max_sample_rate().0
        })
        .map(|range| range.sample_format())
        .collect();

    if formats.contains(&cpal::SampleFormat::I16) {
        Ok(cpal::SampleFormat::I16)
    } else if formats.contains(&cpal::SampleFormat::F32) {
        Ok(cpal::SampleFormat::F32)
    } else {
        Err(AudioError::Unsupported(format!(
            "{} Hz, {} channels, s16",
            params.sample_rate, params.channels
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_plays_silence_when_empty() {
        let shared = Shared::new(8);
        let mut out = [7i16; 4];
        shared.fill(&mut out, |s| s, 0);
        assert_eq!(out, [0; 4]);
        assert!(!shared.lock().underrun);
    }

    #[test]
    fn test_fill_flags_underrun_after_priming() {
        let shared = Shared::new(8);
        {
            let mut state = shared.lock();
            state.ring.push_slice(&[1, 2]);
            state.primed = true;
        }

        let mut out = [0i16; 4];
        shared.fill(&mut out, |s| s, 0);

        assert_eq!(out, [1, 2, 0, 0]);
        assert!(shared.lock().underrun);
    }

    #[test]
    fn test_fill_converts_to_f32() {
        let shared = Shared::new(8);
        shared.lock().ring.push_slice(&[16384, -32768]);

        let mut out = [1.0f32; 2];
        shared.fill(&mut out, |s| s as f32 / 32768.0, 0.0);

        assert_eq!(out, [0.5, -1.0]);
    }

    #[test]
    fn test_stream_error_is_recorded() {
        let shared = Shared::new(8);
        shared.fail("device unplugged".to_string());
        assert_eq!(shared.lock().failure.as_deref(), Some("device unplugged"));
    }

    // Note: PcmOutput::open needs audio hardware and is exercised by running
    // the binary rather than by unit tests
}
