// Input sampler - Key source to joypad state
//
// Called from the core's input-poll and input-state callbacks. Only port 0,
// index 0 of the joypad device is ever reported as held.

use super::{JoypadState, KeyCode, KeySource, Keymap};
use crate::abi::DEVICE_JOYPAD;

/// Maintains the joypad state the core reads
pub struct InputSampler {
    keymap: Keymap,
    joypad: JoypadState,
    source: Option<Box<dyn KeySource>>,
}

impl InputSampler {
    /// Create a sampler with no key source attached
    pub fn new(keymap: Keymap) -> Self {
        Self {
            keymap,
            joypad: JoypadState::new(),
            source: None,
        }
    }

    /// Attach the key source polled on every input poll
    pub fn attach(&mut self, source: Box<dyn KeySource>) {
        self.source = Some(source);
    }

    /// Detach and return the key source
    pub fn detach(&mut self) -> Option<Box<dyn KeySource>> {
        self.source.take()
    }

    /// Current joypad state
    pub fn joypad(&self) -> &JoypadState {
        &self.joypad
    }

    /// Active keymap
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Read at most one key and update the joypad state
    ///
    /// With no key pending the state is left as it was.
    pub fn poll(&mut self) {
        let Some(source) = self.source.as_mut() else {
            return;
        };

        if let Some(key) = source.poll_key() {
            self.apply(key);
        }
    }

    /// Press every button bound to `key` and release every other bound button
    pub fn apply(&mut self, key: KeyCode) {
        for (button, bound) in self.keymap.bindings() {
            self.joypad.set(button, bound == key);
        }
        log::trace!("key {} -> {:?}", key, self.joypad.pressed().collect::<Vec<_>>());
    }

    /// Answer the core's input-state query
    ///
    /// # Arguments
    /// * `port` - Controller port
    /// * `device` - Libretro device type
    /// * `index` - Device index (analog stick index for analog devices)
    /// * `id` - Button id
    ///
    /// # Returns
    /// Whether the button is held; false for anything but port 0, index 0 of
    /// the joypad device
    pub fn state(&self, port: u32, device: u32, index: u32, id: u32) -> bool {
        if port != 0 || index != 0 || device != DEVICE_JOYPAD {
            return false;
        }
        self.joypad.is_pressed(id)
    }
}

impl Default for InputSampler {
    fn default() -> Self {
        Self::new(Keymap::default())
    }
}
