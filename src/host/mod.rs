// Host module - Core lifecycle and frame pump
//
// This module provides the core host that drives a bound core through its
// lifecycle:
//
//   Unloaded -> Loaded -> GameLoaded -> AudioReady -> Running
//            -> ShuttingDown -> Terminated
//
// Each step is a method that checks the current state first. Teardown undoes
// acquisitions in reverse order and runs at most once, whether it is called
// explicitly, from the error path or from Drop.

pub mod config;
mod context;
mod error;
mod game;
mod info;
pub mod platform;
mod shutdown;
mod timing;

pub use config::{AudioConfig, ConfigError, HostConfig, VideoConfig};
pub use context::{is_active, register, CallbackScope, HostContext, Trampolines, TRAMPOLINES};
pub use error::HostError;
pub use game::GameImage;
pub use info::CoreInfo;
pub use platform::{HeadlessPlatform, Platform, TerminalPlatform};
pub use shutdown::ShutdownToken;
pub use timing::{AvTiming, FramePacer};

use crate::abi::{API_VERSION, DEVICE_JOYPAD};
use crate::audio::{AudioRelay, PcmParams};
use crate::input::InputSampler;
use crate::loader::{CoreApi, CoreModule};
use crate::video::VideoRelay;
use std::path::Path;

/// Lifecycle state of a core host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    /// Module bound, nothing called yet
    Unloaded,
    /// Callbacks registered and retro_init called
    Loaded,
    /// Game accepted by the core
    GameLoaded,
    /// Timing known, audio sink attached (unless muted)
    AudioReady,
    /// Frame pump running
    Running,
    /// Teardown in progress
    ShuttingDown,
    /// Everything released
    Terminated,
}

/// Drives one core through one game session
pub struct CoreHost<P: Platform> {
    /// Callback context (reached by the trampolines during core calls)
    context: HostContext,

    /// Backend factory
    platform: P,

    /// Host configuration
    config: HostConfig,

    /// Stop flag checked before every run-step
    shutdown: ShutdownToken,

    /// Current lifecycle state
    state: HostState,

    /// retro_init has been called and not yet undone
    initialized: bool,

    /// The game handed to the core; Some while the core has it loaded
    game: Option<GameImage>,

    /// System info captured at start
    info: Option<CoreInfo>,

    /// Timing captured after game load
    timing: Option<AvTiming>,

    /// Run-steps executed
    frames: u64,

    /// Bound core; declared last so the library outlives the teardown above
    module: CoreModule,
}

impl<P: Platform> CoreHost<P> {
    /// Create a host for a bound core
    ///
    /// # Arguments
    /// * `module` - The bound core module
    /// * `platform` - Backend factory
    /// * `config` - Validated host configuration
    /// * `shutdown` - Token that stops the frame pump
    pub fn new(
        module: CoreModule,
        platform: P,
        config: HostConfig,
        shutdown: ShutdownToken,
    ) -> Result<Self, HostError> {
        config.validate()?;
        let keymap = config
            .input
            .keymap
            .to_keymap()
            .map_err(ConfigError::Invalid)?;

        let context = HostContext::new(
            VideoRelay::new(config.video.decimation),
            AudioRelay::new(),
            InputSampler::new(keymap),
        );

        Ok(Self {
            context,
            platform,
            config,
            shutdown,
            state: HostState::Unloaded,
            initialized: false,
            game: None,
            info: None,
            timing: None,
            frames: 0,
            module,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> HostState {
        self.state
    }

    /// Run-steps executed so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Core system info, once started
    pub fn core_info(&self) -> Option<&CoreInfo> {
        self.info.as_ref()
    }

    /// Core timing, once audio is set up
    pub fn timing(&self) -> Option<&AvTiming> {
        self.timing.as_ref()
    }

    /// Callback context
    pub fn context(&self) -> &HostContext {
        &self.context
    }

    /// Token that stops the frame pump
    pub fn shutdown_token(&self) -> &ShutdownToken {
        &self.shutdown
    }

    fn expect_state(&self, expected: HostState, operation: &'static str) -> Result<(), HostError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(HostError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Call into the core with the callback context reachable
    fn call_core<R>(&mut self, f: impl FnOnce(&CoreApi) -> R) -> R {
        let api = *self.module.api();
        let _scope = CallbackScope::enter(&mut self.context);
        f(&api)
    }

    /// Register callbacks and initialize the core
    pub fn start(&mut self) -> Result<(), HostError> {
        self.expect_state(HostState::Unloaded, "start the core")?;
        let api = *self.module.api();

        // SAFETY: `api` comes from a bound module that outlives the host.
        unsafe { register(&api) };
        self.call_core(|api| unsafe { (api.init)() });
        self.initialized = true;

        let version = unsafe { (api.api_version)() };
        let info = CoreInfo::query(&api);

        log::info!(
            "core loaded: {} {} (API version {})",
            info.library_name,
            info.library_version,
            version
        );
        if version != API_VERSION {
            log::warn!(
                "core reports API version {}, expected {}",
                version,
                API_VERSION
            );
        }

        self.info = Some(info);
        self.state = HostState::Loaded;
        Ok(())
    }

    /// Hand the game to the core and plug the joypad into port 0
    ///
    /// # Arguments
    /// * `rom` - Game file
    pub fn load_game(&mut self, rom: &Path) -> Result<(), HostError> {
        self.expect_state(HostState::Loaded, "load a game")?;

        let info = CoreInfo::query(self.module.api());
        let game = GameImage::load(rom, info.need_fullpath)?;
        let game_info = game.as_game_info();

        // SAFETY: `game_info` points into `game`, which is kept until unload.
        let accepted = self.call_core(|api| unsafe { (api.load_game)(&game_info) });
        if !accepted {
            return Err(HostError::GameRejected(rom.to_path_buf()));
        }

        log::info!(
            "game loaded: {} ({})",
            game.path().display(),
            if game.is_path_only() {
                "path only".to_string()
            } else {
                format!("{} bytes", game.len())
            }
        );
        self.game = Some(game);

        self.call_core(|api| unsafe { (api.set_controller_port_device)(0, DEVICE_JOYPAD) });
        self.state = HostState::GameLoaded;
        Ok(())
    }

    /// Read the core's timing and open the audio sink at its sample rate
    pub fn open_audio(&mut self) -> Result<(), HostError> {
        self.expect_state(HostState::GameLoaded, "open audio")?;

        let timing = AvTiming::query(self.module.api());
        log::info!(
            "core timing: {}x{} (max {}x{}), {:.3} fps, {} Hz",
            timing.base_width,
            timing.base_height,
            timing.max_width,
            timing.max_height,
            timing.fps,
            timing.sample_rate
        );

        if self.config.audio.enabled {
            let params = PcmParams::for_latency(
                timing.sample_rate,
                self.config.audio.periods,
                self.config.audio.latency_ms,
            )?;
            let sink = self.platform.open_audio(&params)?;
            self.context.audio.attach(sink);
        } else {
            log::info!("audio disabled");
        }

        self.timing = Some(timing);
        self.state = HostState::AudioReady;
        Ok(())
    }

    /// Open the display and keys, then run the core until shutdown is requested
    pub fn run(&mut self) -> Result<(), HostError> {
        self.expect_state(HostState::AudioReady, "run the core")?;

        let display = self.platform.open_display().map_err(HostError::Display)?;
        self.context.video.attach(display);
        let keys = self.platform.open_keys(&self.config.input, &self.shutdown);
        self.context.input.attach(keys);
        self.state = HostState::Running;

        let mut pacer = if self.context.audio.is_attached() {
            None
        } else {
            self.timing.and_then(|t| FramePacer::new(t.fps))
        };

        log::info!("running");
        while !self.shutdown.is_requested() {
            self.call_core(|api| unsafe { (api.run)() });
            self.frames += 1;

            if let Some(pacer) = pacer.as_mut() {
                pacer.wait();
            }
        }
        log::info!("shutdown requested after {} frames", self.frames);

        Ok(())
    }

    /// Start, load `rom`, open audio and run, stopping at the first error
    pub fn execute(&mut self, rom: &Path) -> Result<(), HostError> {
        self.start()?;
        self.load_game(rom)?;
        self.open_audio()?;
        self.run()
    }

    /// Release everything in reverse acquisition order
    ///
    /// Unload the game, deinit the core, close audio, close the display and
    /// flush the log. Does nothing the second time.
    pub fn shutdown(&mut self) {
        if matches!(self.state, HostState::ShuttingDown | HostState::Terminated) {
            return;
        }
        self.state = HostState::ShuttingDown;

        if self.game.is_some() {
            self.call_core(|api| unsafe { (api.unload_game)() });
            self.game = None;
            log::debug!("game unloaded");
        }

        if self.initialized {
            self.call_core(|api| unsafe { (api.deinit)() });
            self.initialized = false;
            log::debug!("core deinitialized");
        }

        if let Some(mut sink) = self.context.audio.detach() {
            let stats = self.context.audio.stats();
            log::debug!(
                "audio: {} batches, {} frames written, {} dropped, {} recoveries",
                stats.batches,
                stats.frames_written,
                stats.frames_dropped,
                stats.recoveries
            );
            sink.close();
        }

        if let Some(mut display) = self.context.video.detach() {
            if let Err(e) = display.close() {
                log::warn!("failed to restore terminal: {}", e);
            }
        }
        self.context.input.detach();

        log::info!("core host terminated after {} frames", self.frames);
        log::logger().flush();
        self.state = HostState::Terminated;
    }
}

impl<P: Platform> Drop for CoreHost<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
