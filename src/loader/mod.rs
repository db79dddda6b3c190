// Loader module - Opening a core module and binding its entry points
//
// A core is usable only when every entry point in `abi::symbols::REQUIRED`
// resolves. Binding is all-or-nothing: `CoreApi` can only be built by
// `CoreApi::bind`, which returns the first missing symbol as an error.
// No core function is called while binding.

use crate::abi::{self, symbols};
use libloading::Library;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from opening or binding a core module
#[derive(Debug, Error)]
pub enum LoadError {
    /// The module file could not be opened by the dynamic loader
    #[error("failed to load core {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// A required entry point is missing
    #[error("failed to load symbol '{symbol}': {reason}")]
    MissingSymbol { symbol: &'static str, reason: String },
}

/// Anything that can look up exported symbols by name
///
/// Implemented for `libloading::Library`; tests implement it with a table
/// of plain `extern "C"` functions.
pub trait SymbolSource {
    /// Resolve `name` to its address
    fn resolve(&self, name: &str) -> Result<*const c_void, String>;
}

impl SymbolSource for Library {
    fn resolve(&self, name: &str) -> Result<*const c_void, String> {
        // SAFETY: the address is only reinterpreted by `CoreApi::bind`, as the
        // function type `libretro.h` declares for this name.
        let symbol = unsafe { self.get::<*const c_void>(name.as_bytes()) }
            .map_err(|e| e.to_string())?;
        Ok(*symbol)
    }
}

/// Resolve one symbol and reinterpret it as the function pointer type `F`
fn resolve_fn<F: Copy>(source: &dyn SymbolSource, symbol: &'static str) -> Result<F, LoadError> {
    assert_eq!(
        std::mem::size_of::<F>(),
        std::mem::size_of::<*const c_void>(),
        "entry point types must be thin function pointers"
    );

    let address = source
        .resolve(symbol)
        .map_err(|reason| LoadError::MissingSymbol { symbol, reason })?;

    if address.is_null() {
        return Err(LoadError::MissingSymbol {
            symbol,
            reason: "symbol resolved to a null address".to_string(),
        });
    }

    // SAFETY: `F` is a function pointer of the same size as `address`, and
    // `address` is non-null.
    Ok(unsafe { std::mem::transmute_copy::<*const c_void, F>(&address) })
}

/// Capability table: one typed function pointer per required entry point
///
/// Only `bind` constructs it, so a value of this type is always complete.
#[derive(Clone, Copy)]
pub struct CoreApi {
    pub set_environment: abi::SetEnvironmentFn,
    pub set_video_refresh: abi::SetVideoRefreshFn,
    pub set_audio_sample: abi::SetAudioSampleFn,
    pub set_audio_sample_batch: abi::SetAudioSampleBatchFn,
    pub set_input_poll: abi::SetInputPollFn,
    pub set_input_state: abi::SetInputStateFn,
    pub init: abi::VoidFn,
    pub deinit: abi::VoidFn,
    pub api_version: abi::ApiVersionFn,
    pub get_system_info: abi::GetSystemInfoFn,
    pub get_system_av_info: abi::GetSystemAvInfoFn,
    pub set_controller_port_device: abi::SetControllerPortDeviceFn,
    pub reset: abi::VoidFn,
    pub run: abi::VoidFn,
    pub serialize_size: abi::SerializeSizeFn,
    pub serialize: abi::SerializeFn,
    pub unserialize: abi::UnserializeFn,
    pub load_game: abi::LoadGameFn,
    pub unload_game: abi::VoidFn,
    _sealed: (),
}

impl CoreApi {
    /// Resolve every required entry point from `source`
    ///
    /// # Returns
    /// The complete table, or the first symbol that failed to resolve
    pub fn bind(source: &dyn SymbolSource) -> Result<Self, LoadError> {
        Ok(Self {
            set_environment: resolve_fn(source, symbols::SET_ENVIRONMENT)?,
            set_video_refresh: resolve_fn(source, symbols::SET_VIDEO_REFRESH)?,
            set_audio_sample: resolve_fn(source, symbols::SET_AUDIO_SAMPLE)?,
            set_audio_sample_batch: resolve_fn(source, symbols::SET_AUDIO_SAMPLE_BATCH)?,
            set_input_poll: resolve_fn(source, symbols::SET_INPUT_POLL)?,
            set_input_state: resolve_fn(source, symbols::SET_INPUT_STATE)?,
            init: resolve_fn(source, symbols::INIT)?,
            deinit: resolve_fn(source, symbols::DEINIT)?,
            api_version: resolve_fn(source, symbols::API_VERSION)?,
            get_system_info: resolve_fn(source, symbols::GET_SYSTEM_INFO)?,
            get_system_av_info: resolve_fn(source, symbols::GET_SYSTEM_AV_INFO)?,
            set_controller_port_device: resolve_fn(source, symbols::SET_CONTROLLER_PORT_DEVICE)?,
            reset: resolve_fn(source, symbols::RESET)?,
            run: resolve_fn(source, symbols::RUN)?,
            serialize_size: resolve_fn(source, symbols::SERIALIZE_SIZE)?,
            serialize: resolve_fn(source, symbols::SERIALIZE)?,
            unserialize: resolve_fn(source, symbols::UNSERIALIZE)?,
            load_game: resolve_fn(source, symbols::LOAD_GAME)?,
            unload_game: resolve_fn(source, symbols::UNLOAD_GAME)?,
            _sealed: (),
        })
    }
}

/// A bound core: the entry point table plus the library that backs it
///
/// Field order matters: the table is dropped before the library is unloaded.
pub struct CoreModule {
    api: CoreApi,
    path: Option<PathBuf>,
    _library: Option<Library>,
}

impl CoreModule {
    /// Open a core module from disk and bind all of its entry points
    ///
    /// # Arguments
    /// * `path` - Path to the shared library (`.so`, `.dylib`, `.dll`)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();

        // SAFETY: loading a core runs its initializers; that is the contract
        // of a libretro frontend.
        let library = unsafe { Library::new(path) }.map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let api = CoreApi::bind(&library)?;
        log::debug!(
            "bound {} entry points from {}",
            symbols::REQUIRED.len(),
            path.display()
        );

        Ok(Self {
            api,
            path: Some(path.to_path_buf()),
            _library: Some(library),
        })
    }

    /// Wrap an already bound table that is not backed by a loaded library
    ///
    /// Used for statically linked cores and test doubles.
    pub fn from_api(api: CoreApi) -> Self {
        Self {
            api,
            path: None,
            _library: None,
        }
    }

    /// The bound entry points
    pub fn api(&self) -> &CoreApi {
        &self.api
    }

    /// Where the module was loaded from, if it came from disk
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
