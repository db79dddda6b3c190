// Game image - The game handed to retro_load_game
//
// Cores that need a real file only get the path; everyone else also gets the
// whole file in memory. The image is owned by the host and kept until the
// game is unloaded, since cores may hold on to both pointers.

use super::HostError;
use crate::abi::GameInfo;
use std::ffi::{c_void, CString};
use std::path::{Path, PathBuf};
use std::{fs, io, ptr};

/// Game path and optional contents, in the form the core expects
#[derive(Debug)]
pub struct GameImage {
    source: PathBuf,
    path: CString,
    data: Option<Vec<u8>>,
}

impl GameImage {
    /// Prepare a game for loading
    ///
    /// # Arguments
    /// * `path` - Game file on disk
    /// * `need_fullpath` - Whether the core loads the file itself
    ///
    /// # Returns
    /// The image, or `Rom` when the file cannot be read and `RomPath` when the
    /// path cannot be expressed as a C string
    pub fn load(path: &Path, need_fullpath: bool) -> Result<Self, HostError> {
        let c_path = CString::new(path.as_os_str().as_encoded_bytes())
            .map_err(|_| HostError::RomPath(path.to_path_buf()))?;

        let rom_error = |source: io::Error| HostError::Rom {
            path: path.to_path_buf(),
            source,
        };

        // Path-only cores still need a file that opens
        let data = if need_fullpath {
            fs::File::open(path).map_err(rom_error)?;
            None
        } else {
            Some(fs::read(path).map_err(rom_error)?)
        };

        Ok(Self {
            source: path.to_path_buf(),
            path: c_path,
            data,
        })
    }

    /// Path the image was read from
    pub fn path(&self) -> &Path {
        &self.source
    }

    /// Whether only the path is passed to the core
    pub fn is_path_only(&self) -> bool {
        self.data.is_none()
    }

    /// Size of the in-memory contents (0 when path-only)
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    /// Whether there are no in-memory contents
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrowing `retro_game_info` for this image
    ///
    /// The returned pointers are valid while `self` is alive.
    pub fn as_game_info(&self) -> GameInfo {
        let (data, size) = match &self.data {
            Some(bytes) => (bytes.as_ptr().cast::<c_void>(), bytes.len()),
            None => (ptr::null(), 0),
        };

        GameInfo {
            path: self.path.as_ptr(),
            data,
            size,
            meta: ptr::null(),
        }
    }
}
