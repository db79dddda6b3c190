// Platform module - Where the host gets its display, audio and keys from
//
// The core host only sees the sink traits; a Platform decides which concrete
// backends stand behind them.

use super::ShutdownToken;
use crate::audio::{AudioError, AudioSink, PcmParams};
use crate::input::{ChainKeys, InputConfig, KeySource, NullKeys, TerminalKeys};
use crate::video::{DisplaySink, NullDisplay, TerminalDisplay};
use std::io;

/// Factory for the host backends
pub trait Platform {
    /// Open the PCM sink for `params`
    fn open_audio(&mut self, params: &PcmParams) -> Result<Box<dyn AudioSink>, AudioError>;

    /// Open the display
    fn open_display(&mut self) -> io::Result<Box<dyn DisplaySink>>;

    /// Open the key source polled by the input sampler
    fn open_keys(&mut self, config: &InputConfig, shutdown: &ShutdownToken) -> Box<dyn KeySource>;
}

/// Open the default PCM device
#[cfg(feature = "audio")]
pub fn open_pcm(params: &PcmParams) -> Result<Box<dyn AudioSink>, AudioError> {
    let output = crate::audio::PcmOutput::open(params)?;
    Ok(Box::new(output))
}

/// Open the default PCM device
#[cfg(not(feature = "audio"))]
pub fn open_pcm(_params: &PcmParams) -> Result<Box<dyn AudioSink>, AudioError> {
    Err(AudioError::Unsupported(
        "built without audio support, run with --mute".to_string(),
    ))
}

/// Terminal display, terminal (and gamepad) keys, PCM audio
#[derive(Debug, Default)]
pub struct TerminalPlatform;

impl Platform for TerminalPlatform {
    fn open_audio(&mut self, params: &PcmParams) -> Result<Box<dyn AudioSink>, AudioError> {
        open_pcm(params)
    }

    fn open_display(&mut self) -> io::Result<Box<dyn DisplaySink>> {
        Ok(Box::new(TerminalDisplay::open()?))
    }

    fn open_keys(&mut self, config: &InputConfig, shutdown: &ShutdownToken) -> Box<dyn KeySource> {
        #[cfg_attr(not(feature = "gamepad"), allow(unused_mut))]
        let mut keys = ChainKeys::new().with(Box::new(TerminalKeys::new(
            config.poll_timeout(),
            shutdown.clone(),
        )));

        #[cfg(feature = "gamepad")]
        if let Some(gamepad) = crate::input::GamepadKeys::new(&config.gamepad) {
            keys.push(Box::new(gamepad));
        }

        log::debug!("polling {} key source(s)", keys.len());
        Box::new(keys)
    }
}

/// No display and no keys; audio still plays unless muted
#[derive(Debug, Default)]
pub struct HeadlessPlatform;

impl Platform for HeadlessPlatform {
    fn open_audio(&mut self, params: &PcmParams) -> Result<Box<dyn AudioSink>, AudioError> {
        open_pcm(params)
    }

    fn open_display(&mut self) -> io::Result<Box<dyn DisplaySink>> {
        Ok(Box::new(NullDisplay))
    }

    fn open_keys(&mut self, _config: &InputConfig, _shutdown: &ShutdownToken) -> Box<dyn KeySource> {
        Box::new(NullKeys)
    }
}
