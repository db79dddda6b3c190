// termretro library
// Terminal host runtime for libretro emulation cores

// Public modules
pub mod abi;
pub mod audio;
pub mod host;
pub mod input;
pub mod loader;
pub mod video;

// Re-export main types for convenience
#[cfg(feature = "audio")]
pub use audio::PcmOutput;
pub use audio::{AudioError, AudioRelay, AudioSink, PcmParams};
pub use host::{
    CoreHost, HeadlessPlatform, HostConfig, HostError, HostState, Platform, ShutdownToken,
    TerminalPlatform,
};
pub use input::{Button, InputSampler, JoypadState, KeyCode, KeySource, Keymap};
pub use loader::{CoreApi, CoreModule, LoadError, SymbolSource};
pub use video::{decode, ColorClass, DisplaySink, FrameView, VideoRelay};
