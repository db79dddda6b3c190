// Host configuration module
//
// The whole TOML file the binary accepts with `--config`. Every section and
// field is optional; missing values take their defaults.

use crate::input::InputConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The `[video]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Sample every Nth pixel in both directions
    pub decimation: usize,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            decimation: crate::video::DEFAULT_DECIMATION,
        }
    }
}

/// The `[audio]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Open the PCM device at all
    pub enabled: bool,
    /// Periods in the device buffer
    pub periods: u32,
    /// Total device buffer length (milliseconds)
    pub latency_ms: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            periods: 4,
            latency_ms: 64,
        }
    }
}

/// Complete host configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub video: VideoConfig,
    pub audio: AudioConfig,
    pub input: InputConfig,
}

impl HostConfig {
    /// Load and validate configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: HostConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let toml_string = toml::to_string_pretty(self)?;

        fs::write(path, toml_string).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values the host cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.video.decimation == 0 {
            return Err(ConfigError::Invalid(
                "video.decimation must be at least 1".to_string(),
            ));
        }
        if self.audio.periods == 0 {
            return Err(ConfigError::Invalid(
                "audio.periods must be at least 1".to_string(),
            ));
        }
        if self.audio.latency_ms == 0 {
            return Err(ConfigError::Invalid(
                "audio.latency_ms must be at least 1".to_string(),
            ));
        }
        self.input.validate().map_err(ConfigError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.video.decimation, 2);
        assert!(config.audio.enabled);
        assert_eq!(config.audio.periods, 4);
        assert_eq!(config.audio.latency_ms, 64);
        assert_eq!(config.input.poll_timeout_ms, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let file = write_config("");
        let config = HostConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn test_overrides() {
        let file = write_config(
            r#"
            [video]
            decimation = 3

            [audio]
            enabled = false

            [input.keymap]
            start = "enter"
            "#,
        );

        let config = HostConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.video.decimation, 3);
        assert!(!config.audio.enabled);
        assert_eq!(config.audio.periods, 4);
        assert_eq!(config.input.keymap.start.as_deref(), Some("enter"));
    }

    #[test]
    fn test_save_and_reload() {
        let mut config = HostConfig::default();
        config.video.decimation = 1;
        config.audio.latency_ms = 100;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("termretro.toml");
        config.save_to_file(&path).unwrap();

        assert_eq!(HostConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_save_and_reload_keeps_unbound_button() {
        let mut keymap = crate::input::Keymap::default();
        keymap.unbind(crate::input::Button::Start);
        let mut config = HostConfig::default();
        config.input.keymap = crate::input::KeymapConfig::from_keymap(&keymap);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("termretro.toml");
        config.save_to_file(&path).unwrap();

        let reloaded = HostConfig::load_from_file(&path).unwrap();
        assert_eq!(reloaded.input.keymap.to_keymap().unwrap(), keymap);
    }

    #[test]
    fn test_rejects_long_poll_timeout() {
        let file = write_config("[input]\npoll_timeout_ms = 10000\n");
        let err = HostConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("poll_timeout_ms")));
    }

    #[test]
    fn test_rejects_zero_decimation() {
        let file = write_config("[video]\ndecimation = 0\n");
        let err = HostConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("decimation")));
    }

    #[test]
    fn test_rejects_zero_periods_and_latency() {
        let mut config = HostConfig::default();
        config.audio.periods = 0;
        assert!(config.validate().is_err());

        let mut config = HostConfig::default();
        config.audio.latency_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_key_name() {
        let file = write_config("[input.keymap]\na = \"hyper\"\n");
        let err = HostConfig::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("hyper"));
    }

    #[test]
    fn test_parse_error_names_file() {
        let file = write_config("[video\n");
        let err = HostConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = HostConfig::load_from_file("/nonexistent/termretro.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
