// ABI module - libretro plugin interface as seen from the frontend
//
// This module provides:
// - Function pointer types for the callbacks a core calls back into
// - Function pointer types for the entry points a core exports
// - The exact symbol names the loader resolves
// - Re-exports of the C structs shared with the core (from libretro-sys)
//
// Everything here mirrors `libretro.h`; nothing in this module calls a core.

use std::ffi::{c_uint, c_void};

pub use libretro_sys::{GameGeometry, GameInfo, SystemAvInfo, SystemInfo, SystemTiming};

/// API version this frontend was written against
pub const API_VERSION: c_uint = 1;

/// Logical device id of the standard joypad
pub const DEVICE_JOYPAD: c_uint = libretro_sys::DEVICE_JOYPAD;

// Callbacks (core -> frontend)

/// `retro_environment_t`
pub type EnvironmentFn = unsafe extern "C" fn(cmd: c_uint, data: *mut c_void) -> bool;

/// `retro_video_refresh_t`
pub type VideoRefreshFn =
    unsafe extern "C" fn(data: *const c_void, width: c_uint, height: c_uint, pitch: usize);

/// `retro_audio_sample_t`
pub type AudioSampleFn = unsafe extern "C" fn(left: i16, right: i16);

/// `retro_audio_sample_batch_t`
pub type AudioSampleBatchFn = unsafe extern "C" fn(data: *const i16, frames: usize) -> usize;

/// `retro_input_poll_t`
pub type InputPollFn = unsafe extern "C" fn();

/// `retro_input_state_t`
pub type InputStateFn =
    unsafe extern "C" fn(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16;

// Entry points (frontend -> core)

pub type SetEnvironmentFn = unsafe extern "C" fn(EnvironmentFn);
pub type SetVideoRefreshFn = unsafe extern "C" fn(VideoRefreshFn);
pub type SetAudioSampleFn = unsafe extern "C" fn(AudioSampleFn);
pub type SetAudioSampleBatchFn = unsafe extern "C" fn(AudioSampleBatchFn);
pub type SetInputPollFn = unsafe extern "C" fn(InputPollFn);
pub type SetInputStateFn = unsafe extern "C" fn(InputStateFn);
pub type VoidFn = unsafe extern "C" fn();
pub type ApiVersionFn = unsafe extern "C" fn() -> c_uint;
pub type GetSystemInfoFn = unsafe extern "C" fn(info: *mut SystemInfo);
pub type GetSystemAvInfoFn = unsafe extern "C" fn(info: *mut SystemAvInfo);
pub type SetControllerPortDeviceFn = unsafe extern "C" fn(port: c_uint, device: c_uint);
pub type SerializeSizeFn = unsafe extern "C" fn() -> usize;
pub type SerializeFn = unsafe extern "C" fn(data: *mut c_void, size: usize) -> bool;
pub type UnserializeFn = unsafe extern "C" fn(data: *const c_void, size: usize) -> bool;
pub type LoadGameFn = unsafe extern "C" fn(game: *const GameInfo) -> bool;

/// Exported symbol names, in binding order
pub mod symbols {
    pub const SET_ENVIRONMENT: &str = "retro_set_environment";
    pub const SET_VIDEO_REFRESH: &str = "retro_set_video_refresh";
    pub const SET_AUDIO_SAMPLE: &str = "retro_set_audio_sample";
    pub const SET_AUDIO_SAMPLE_BATCH: &str = "retro_set_audio_sample_batch";
    pub const SET_INPUT_POLL: &str = "retro_set_input_poll";
    pub const SET_INPUT_STATE: &str = "retro_set_input_state";
    pub const INIT: &str = "retro_init";
    pub const DEINIT: &str = "retro_deinit";
    pub const API_VERSION: &str = "retro_api_version";
    pub const GET_SYSTEM_INFO: &str = "retro_get_system_info";
    pub const GET_SYSTEM_AV_INFO: &str = "retro_get_system_av_info";
    pub const SET_CONTROLLER_PORT_DEVICE: &str = "retro_set_controller_port_device";
    pub const RESET: &str = "retro_reset";
    pub const RUN: &str = "retro_run";
    pub const SERIALIZE_SIZE: &str = "retro_serialize_size";
    pub const SERIALIZE: &str = "retro_serialize";
    pub const UNSERIALIZE: &str = "retro_unserialize";
    pub const LOAD_GAME: &str = "retro_load_game";
    pub const UNLOAD_GAME: &str = "retro_unload_game";

    /// Every symbol a conforming core must export
    pub const REQUIRED: [&str; 19] = [
        SET_ENVIRONMENT,
        SET_VIDEO_REFRESH,
        SET_AUDIO_SAMPLE,
        SET_AUDIO_SAMPLE_BATCH,
        SET_INPUT_POLL,
        SET_INPUT_STATE,
        INIT,
        DEINIT,
        API_VERSION,
        GET_SYSTEM_INFO,
        GET_SYSTEM_AV_INFO,
        SET_CONTROLLER_PORT_DEVICE,
        RESET,
        RUN,
        SERIALIZE_SIZE,
        SERIALIZE,
        UNSERIALIZE,
        LOAD_GAME,
        UNLOAD_GAME,
    ];
}

/// An all-zero `SystemInfo` for the core to fill in
pub fn empty_system_info() -> SystemInfo {
    SystemInfo {
        library_name: std::ptr::null(),
        library_version: std::ptr::null(),
        valid_extensions: std::ptr::null(),
        need_fullpath: false,
        block_extract: false,
    }
}

/// An all-zero `SystemAvInfo` for the core to fill in
pub fn empty_system_av_info() -> SystemAvInfo {
    SystemAvInfo {
        geometry: GameGeometry {
            base_width: 0,
            base_height: 0,
            max_width: 0,
            max_height: 0,
            aspect_ratio: 0.0,
        },
        timing: SystemTiming {
            fps: 0.0,
            sample_rate: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_required_symbols_are_unique() {
        let unique: HashSet<_> = symbols::REQUIRED.iter().collect();
        assert_eq!(unique.len(), symbols::REQUIRED.len());
        assert!(symbols::REQUIRED.iter().all(|s| s.starts_with("retro_")));
    }

    #[test]
    fn test_joypad_device_id() {
        assert_eq!(DEVICE_JOYPAD, 1);
    }

    #[test]
    fn test_empty_infos() {
        let info = empty_system_info();
        assert!(info.library_name.is_null());
        assert!(!info.need_fullpath);

        let av = empty_system_av_info();
        assert_eq!(av.geometry.base_width, 0);
        assert_eq!(av.timing.sample_rate, 0.0);
    }
}
