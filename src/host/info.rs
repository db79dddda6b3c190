// Core info - What `retro_get_system_info` says about the core

use crate::abi;
use crate::loader::CoreApi;
use std::ffi::{c_char, CStr};

/// Owned copy of the core's system info
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreInfo {
    pub library_name: String,
    pub library_version: String,
    /// `|`-separated list of extensions the core loads
    pub valid_extensions: String,
    /// The core reads the game from disk itself
    pub need_fullpath: bool,
    pub block_extract: bool,
}

impl CoreInfo {
    /// Ask the core for its system info
    pub fn query(api: &CoreApi) -> Self {
        let mut info = abi::empty_system_info();
        // SAFETY: the core fills in a struct we own; the strings it points to
        // are static in the core and copied before returning.
        unsafe {
            (api.get_system_info)(&mut info);
            Self {
                library_name: lossy(info.library_name),
                library_version: lossy(info.library_version),
                valid_extensions: lossy(info.valid_extensions),
                need_fullpath: info.need_fullpath,
                block_extract: info.block_extract,
            }
        }
    }
}

/// Copy a possibly-null C string
unsafe fn lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}
