// Gamepad input module
//
// Turns gamepad button presses into host keys using gilrs, so a pad drives
// the same single-key sampler as the terminal. Releases produce no key: the
// last pressed button stays held until another key arrives.

use super::{GamepadConfig, KeyCode, KeySource};
use gilrs::{Button as GilrsButton, Event, EventType, Gilrs};

/// Gamepad-backed key source
pub struct GamepadKeys {
    /// Gilrs instance for gamepad events
    gilrs: Gilrs,
    /// Gamepad button -> key it acts as
    bindings: Vec<(GilrsButton, KeyCode)>,
}

impl GamepadKeys {
    /// Open the gamepad subsystem
    ///
    /// # Arguments
    /// * `config` - Gamepad section of the input configuration
    ///
    /// # Returns
    /// None when gamepads are disabled, the bindings are invalid, or gilrs
    /// cannot be initialized on this system
    pub fn new(config: &GamepadConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        let bindings = match config.bindings() {
            Ok(bindings) => bindings
                .into_iter()
                .filter_map(|(name, key)| gilrs_button(&name).map(|b| (b, key)))
                .collect(),
            Err(e) => {
                log::warn!("gamepad support disabled: {}", e);
                return None;
            }
        };

        let gilrs = match Gilrs::new() {
            Ok(gilrs) => gilrs,
            Err(e) => {
                log::warn!("failed to initialize gamepad support: {}", e);
                return None;
            }
        };

        let mut connected = 0;
        for (id, gamepad) in gilrs.gamepads() {
            if gamepad.is_connected() {
                log::info!("gamepad '{}' (id {}) connected", gamepad.name(), id);
                connected += 1;
            }
        }
        if connected == 0 {
            log::debug!("no gamepads detected");
        }

        Some(Self { gilrs, bindings })
    }

    fn key_for(&self, button: GilrsButton) -> Option<KeyCode> {
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == button)
            .map(|(_, key)| *key)
    }
}

impl KeySource for GamepadKeys {
    fn poll_key(&mut self) -> Option<KeyCode> {
        while let Some(Event { event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::ButtonPressed(button, _) => {
                    if let Some(key) = self.key_for(button) {
                        return Some(key);
                    }
                }
                EventType::Connected => log::info!("gamepad connected"),
                EventType::Disconnected => log::info!("gamepad disconnected"),
                _ => {}
            }
        }
        None
    }
}

/// Convert a configuration name to a gilrs button
pub fn gilrs_button(name: &str) -> Option<GilrsButton> {
    match name {
        "South" => Some(GilrsButton::South),
        "East" => Some(GilrsButton::East),
        "North" => Some(GilrsButton::North),
        "West" => Some(GilrsButton::West),
        "C" => Some(GilrsButton::C),
        "Z" => Some(GilrsButton::Z),
        "LeftTrigger" => Some(GilrsButton::LeftTrigger),
        "LeftTrigger2" => Some(GilrsButton::LeftTrigger2),
        "RightTrigger" => Some(GilrsButton::RightTrigger),
        "RightTrigger2" => Some(GilrsButton::RightTrigger2),
        "Select" => Some(GilrsButton::Select),
        "Start" => Some(GilrsButton::Start),
        "Mode" => Some(GilrsButton::Mode),
        "LeftThumb" => Some(GilrsButton::LeftThumb),
        "RightThumb" => Some(GilrsButton::RightThumb),
        "DPadUp" => Some(GilrsButton::DPadUp),
        "DPadDown" => Some(GilrsButton::DPadDown),
        "DPadLeft" => Some(GilrsButton::DPadLeft),
        "DPadRight" => Some(GilrsButton::DPadRight),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::config::GAMEPAD_BUTTON_NAMES;

    #[test]
    fn test_every_config_name_maps_to_gilrs() {
        for name in GAMEPAD_BUTTON_NAMES {
            assert!(gilrs_button(name).is_some(), "{} has no gilrs button", name);
        }
        assert_eq!(gilrs_button("East"), Some(GilrsButton::East));
        assert_eq!(gilrs_button("Paddle9"), None);
    }

    #[test]
    fn test_disabled_config_opens_nothing() {
        let config = GamepadConfig {
            enabled: false,
            ..GamepadConfig::default()
        };
        assert!(GamepadKeys::new(&config).is_none());
    }
}
