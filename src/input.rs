// Input module - Joypad state fed to the core from host key sources
//
// This module provides:
// - The libretro joypad button ids the host tracks (B through L3)
// - The joypad state the core reads through its input-state callback
// - Host key codes and the key source boundary
// - The sampler that turns one key per poll into joypad state
// - Terminal (crossterm) and gamepad (gilrs, feature "gamepad") key sources
//
// Input is single-key: each poll reads at most one key, and that key alone
// decides which bound buttons are held until the next key arrives.

pub mod config;
#[cfg(feature = "gamepad")]
pub mod gamepad;
pub mod keyboard;
pub mod sampler;
pub mod unified;

pub use config::{GamepadConfig, InputConfig, KeymapConfig};
#[cfg(feature = "gamepad")]
pub use gamepad::GamepadKeys;
pub use keyboard::TerminalKeys;
pub use sampler::InputSampler;
pub use unified::ChainKeys;

use std::fmt;

/// Number of tracked joypad buttons (B through L3)
pub const JOYPAD_BUTTONS: usize = 15;

/// Libretro joypad button, discriminant is the libretro button id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Button {
    B = 0,
    Y = 1,
    Select = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
    A = 8,
    X = 9,
    L = 10,
    R = 11,
    L2 = 12,
    R2 = 13,
    L3 = 14,
}

impl Button {
    /// Every tracked button in id order
    pub const ALL: [Button; JOYPAD_BUTTONS] = [
        Button::B,
        Button::Y,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::A,
        Button::X,
        Button::L,
        Button::R,
        Button::L2,
        Button::R2,
        Button::L3,
    ];

    /// Libretro button id
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Button for a libretro id, None for untracked ids
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Lowercase name used in configuration files
    pub const fn name(self) -> &'static str {
        match self {
            Button::B => "b",
            Button::Y => "y",
            Button::Select => "select",
            Button::Start => "start",
            Button::Up => "up",
            Button::Down => "down",
            Button::Left => "left",
            Button::Right => "right",
            Button::A => "a",
            Button::X => "x",
            Button::L => "l",
            Button::R => "r",
            Button::L2 => "l2",
            Button::R2 => "r2",
            Button::L3 => "l3",
        }
    }
}

/// Pressed flags for every tracked button
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoypadState([bool; JOYPAD_BUTTONS]);

impl JoypadState {
    /// All buttons released
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the button with libretro id `id` is held; false for untracked ids
    pub fn is_pressed(&self, id: u32) -> bool {
        self.0.get(id as usize).copied().unwrap_or(false)
    }

    /// Set one button
    pub fn set(&mut self, button: Button, pressed: bool) {
        self.0[button as usize] = pressed;
    }

    /// Buttons currently held
    pub fn pressed(&self) -> impl Iterator<Item = Button> + '_ {
        Button::ALL.into_iter().filter(|b| self.0[*b as usize])
    }
}

/// A key as seen by the host, independent of the backend that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Enter,
    Esc,
    Tab,
    Backspace,
}

impl KeyCode {
    /// Parse a configuration key name
    ///
    /// Accepts a single character, "space", or one of "up", "down", "left",
    /// "right", "enter", "esc", "tab", "backspace" (case-insensitive for
    /// named keys).
    ///
    /// # Returns
    /// The key, or an error message naming the unknown key
    pub fn from_name(name: &str) -> Result<Self, String> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(KeyCode::Char(c));
        }

        match name.to_ascii_lowercase().as_str() {
            "space" => Ok(KeyCode::Char(' ')),
            "up" => Ok(KeyCode::Up),
            "down" => Ok(KeyCode::Down),
            "left" => Ok(KeyCode::Left),
            "right" => Ok(KeyCode::Right),
            "enter" | "return" => Ok(KeyCode::Enter),
            "esc" | "escape" => Ok(KeyCode::Esc),
            "tab" => Ok(KeyCode::Tab),
            "backspace" => Ok(KeyCode::Backspace),
            _ => Err(format!("unknown key '{}'", name)),
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char(' ') => f.write_str("space"),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::Up => f.write_str("up"),
            KeyCode::Down => f.write_str("down"),
            KeyCode::Left => f.write_str("left"),
            KeyCode::Right => f.write_str("right"),
            KeyCode::Enter => f.write_str("enter"),
            KeyCode::Esc => f.write_str("esc"),
            KeyCode::Tab => f.write_str("tab"),
            KeyCode::Backspace => f.write_str("backspace"),
        }
    }
}

/// Button-to-key bindings, at most one key per button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    keys: [Option<KeyCode>; JOYPAD_BUTTONS],
}

impl Keymap {
    /// A keymap with nothing bound
    pub fn empty() -> Self {
        Self {
            keys: [None; JOYPAD_BUTTONS],
        }
    }

    /// Bind `button` to `key`, replacing any previous binding
    pub fn bind(&mut self, button: Button, key: KeyCode) {
        self.keys[button as usize] = Some(key);
    }

    /// Remove the binding of `button`
    pub fn unbind(&mut self, button: Button) {
        self.keys[button as usize] = None;
    }

    /// Key bound to `button`
    pub fn key_for(&self, button: Button) -> Option<KeyCode> {
        self.keys[button as usize]
    }

    /// Bound buttons with their keys, in id order
    pub fn bindings(&self) -> impl Iterator<Item = (Button, KeyCode)> + '_ {
        Button::ALL
            .into_iter()
            .filter_map(|b| self.keys[b as usize].map(|k| (b, k)))
    }
}

impl Default for Keymap {
    /// j/l/i/k for the d-pad, x and z for A and B, space for start
    fn default() -> Self {
        let mut keymap = Self::empty();
        keymap.bind(Button::Left, KeyCode::Char('j'));
        keymap.bind(Button::Right, KeyCode::Char('l'));
        keymap.bind(Button::Up, KeyCode::Char('i'));
        keymap.bind(Button::Down, KeyCode::Char('k'));
        keymap.bind(Button::A, KeyCode::Char('x'));
        keymap.bind(Button::B, KeyCode::Char('z'));
        keymap.bind(Button::Start, KeyCode::Char(' '));
        keymap
    }
}

/// Something that yields host keys
pub trait KeySource {
    /// Return at most one pending key
    ///
    /// May wait up to the source's poll timeout; None when nothing arrived.
    fn poll_key(&mut self) -> Option<KeyCode>;
}

/// Key source that never produces a key
#[derive(Debug, Default, Clone, Copy)]
pub struct NullKeys;

impl KeySource for NullKeys {
    fn poll_key(&mut self) -> Option<KeyCode> {
        None
    }
}
