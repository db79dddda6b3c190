// Input configuration module
//
// The `[input]` section of the host configuration: poll timeout, the
// button-to-key map and the gamepad-button-to-key map. Key and button names
// are kept as strings here and validated when converted to runtime types.

use super::{Button, KeyCode, Keymap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Key name that leaves a button unbound
pub const UNBOUND: &str = "none";

/// Upper bound on `poll_timeout_ms`; each poll blocks the frame pump
pub const MAX_POLL_TIMEOUT_MS: u64 = 100;

/// Gamepad button names accepted in `[input.gamepad.buttons]`
pub const GAMEPAD_BUTTON_NAMES: [&str; 19] = [
    "South",
    "East",
    "North",
    "West",
    "C",
    "Z",
    "LeftTrigger",
    "LeftTrigger2",
    "RightTrigger",
    "RightTrigger2",
    "Select",
    "Start",
    "Mode",
    "LeftThumb",
    "RightThumb",
    "DPadUp",
    "DPadDown",
    "DPadLeft",
    "DPadRight",
];

/// Serializable button-to-key mapping
///
/// Each field holds a key name (see `KeyCode::from_name`) or "none".
/// Missing fields fall back to the default mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeymapConfig {
    pub b: Option<String>,
    pub y: Option<String>,
    pub select: Option<String>,
    pub start: Option<String>,
    pub up: Option<String>,
    pub down: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
    pub a: Option<String>,
    pub x: Option<String>,
    pub l: Option<String>,
    pub r: Option<String>,
    pub l2: Option<String>,
    pub r2: Option<String>,
    pub l3: Option<String>,
}

impl KeymapConfig {
    /// Configuration with every button explicitly unbound
    ///
    /// Unbound buttons are written as "none" rather than left out, so saving
    /// and reloading does not bring the default key back.
    pub fn unbound() -> Self {
        let none = || Some(UNBOUND.to_string());
        Self {
            b: none(),
            y: none(),
            select: none(),
            start: none(),
            up: none(),
            down: none(),
            left: none(),
            right: none(),
            a: none(),
            x: none(),
            l: none(),
            r: none(),
            l2: none(),
            r2: none(),
            l3: none(),
        }
    }

    fn slot(&self, button: Button) -> &Option<String> {
        match button {
            Button::B => &self.b,
            Button::Y => &self.y,
            Button::Select => &self.select,
            Button::Start => &self.start,
            Button::Up => &self.up,
            Button::Down => &self.down,
            Button::Left => &self.left,
            Button::Right => &self.right,
            Button::A => &self.a,
            Button::X => &self.x,
            Button::L => &self.l,
            Button::R => &self.r,
            Button::L2 => &self.l2,
            Button::R2 => &self.r2,
            Button::L3 => &self.l3,
        }
    }

    fn slot_mut(&mut self, button: Button) -> &mut Option<String> {
        match button {
            Button::B => &mut self.b,
            Button::Y => &mut self.y,
            Button::Select => &mut self.select,
            Button::Start => &mut self.start,
            Button::Up => &mut self.up,
            Button::Down => &mut self.down,
            Button::Left => &mut self.left,
            Button::Right => &mut self.right,
            Button::A => &mut self.a,
            Button::X => &mut self.x,
            Button::L => &mut self.l,
            Button::R => &mut self.r,
            Button::L2 => &mut self.l2,
            Button::R2 => &mut self.r2,
            Button::L3 => &mut self.l3,
        }
    }

    /// Convert to a runtime keymap
    ///
    /// # Returns
    /// Result containing the Keymap or an error naming the bad entry
    pub fn to_keymap(&self) -> Result<Keymap, String> {
        let mut keymap = Keymap::empty();

        for button in Button::ALL {
            match self.slot(button).as_deref() {
                None => {}
                Some(name) if name.eq_ignore_ascii_case(UNBOUND) => {}
                Some(name) => {
                    let key = KeyCode::from_name(name)
                        .map_err(|e| format!("input.keymap.{}: {}", button.name(), e))?;
                    keymap.bind(button, key);
                }
            }
        }

        Ok(keymap)
    }

    /// Create from a runtime keymap
    pub fn from_keymap(keymap: &Keymap) -> Self {
        let mut config = Self::unbound();
        for (button, key) in keymap.bindings() {
            *config.slot_mut(button) = Some(key.to_string());
        }
        config
    }
}

impl Default for KeymapConfig {
    fn default() -> Self {
        Self::from_keymap(&Keymap::default())
    }
}

/// Serializable gamepad configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamepadConfig {
    /// Whether to look for gamepads at all
    pub enabled: bool,

    /// Gamepad button name -> key name it acts as
    pub buttons: BTreeMap<String, String>,
}

impl GamepadConfig {
    /// Validated bindings as (gamepad button name, key)
    ///
    /// # Returns
    /// Result containing the bindings or an error naming the bad entry
    pub fn bindings(&self) -> Result<Vec<(String, KeyCode)>, String> {
        self.buttons
            .iter()
            .map(|(button, key)| {
                if !GAMEPAD_BUTTON_NAMES.contains(&button.as_str()) {
                    return Err(format!("input.gamepad.buttons: unknown gamepad button '{}'", button));
                }
                let key = KeyCode::from_name(key)
                    .map_err(|e| format!("input.gamepad.buttons.{}: {}", button, e))?;
                Ok((button.clone(), key))
            })
            .collect()
    }
}

impl Default for GamepadConfig {
    /// D-pad and face buttons act as the default keyboard keys
    fn default() -> Self {
        let buttons = [
            ("DPadLeft", "j"),
            ("DPadRight", "l"),
            ("DPadUp", "i"),
            ("DPadDown", "k"),
            ("East", "x"),
            ("South", "z"),
            ("Start", "space"),
        ]
        .into_iter()
        .map(|(button, key)| (button.to_string(), key.to_string()))
        .collect();

        Self {
            enabled: true,
            buttons,
        }
    }
}

/// The `[input]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Longest time one input poll waits for a key (milliseconds)
    pub poll_timeout_ms: u64,

    /// Button-to-key mapping
    pub keymap: KeymapConfig,

    /// Gamepad settings
    pub gamepad: GamepadConfig,
}

impl InputConfig {
    /// Poll timeout as a Duration
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Check the poll timeout and every key and button name
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_timeout_ms > MAX_POLL_TIMEOUT_MS {
            return Err(format!(
                "input.poll_timeout_ms must be at most {} (got {})",
                MAX_POLL_TIMEOUT_MS, self.poll_timeout_ms
            ));
        }
        self.keymap.to_keymap()?;
        self.gamepad.bindings()?;
        Ok(())
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 5,
            keymap: KeymapConfig::default(),
            gamepad: GamepadConfig::default(),
        }
    }
}
