// Host errors - Everything that ends a session
//
// Audio write errors never show up here: the audio relay recovers from them
// in place. What remains is fatal and propagates to the top-level handler.

use super::config::ConfigError;
use super::HostState;
use crate::audio::AudioError;
use crate::loader::LoadError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal host error
#[derive(Debug, Error)]
pub enum HostError {
    /// The core module could not be opened or bound
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The game file could not be read
    #[error("failed to read game {}: {source}", .path.display())]
    Rom {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The game path cannot be passed to the core as a C string
    #[error("game path {} contains a NUL byte", .0.display())]
    RomPath(PathBuf),

    /// retro_load_game returned false
    #[error("core rejected game {}", .0.display())]
    GameRejected(PathBuf),

    /// The audio device could not be opened or configured
    #[error("failed to open audio device: {0}")]
    Audio(#[from] AudioError),

    /// The display could not be initialized
    #[error("failed to initialize display: {0}")]
    Display(#[source] io::Error),

    /// The host configuration is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A lifecycle step was called out of order
    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: HostState,
    },
}
