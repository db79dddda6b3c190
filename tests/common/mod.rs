// Common test utilities for host integration tests
//
// This module provides a fake libretro core made of plain `extern "C"`
// functions, a symbol source that serves them to the loader, and a platform
// whose sinks record what the host does with them. Core calls and sink
// operations are appended to one per-thread event log so tests can check
// ordering across both sides.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_uint, c_void, CStr};
use std::io;
use std::rc::Rc;
use termretro::abi::{self, symbols, GameInfo, SystemAvInfo, SystemInfo};
use termretro::audio::{AudioError, AudioSink, PcmParams};
use termretro::host::Platform;
use termretro::input::{InputConfig, KeyCode, KeySource};
use termretro::loader::{CoreApi, CoreModule, SymbolSource};
use termretro::video::{ColorClass, DisplaySink};
use termretro::ShutdownToken;

/// Opaque red, opaque green, transparent, opaque blue
pub const FRAME: [u16; 4] = [0x8000 | (31 << 10), 0x8000 | (31 << 5), 31 << 10, 0x8000 | 31];
pub const FRAME_WIDTH: u32 = 2;
pub const FRAME_HEIGHT: u32 = 2;
/// One frame of stereo audio
pub const AUDIO: [i16; 8] = [1, -1, 2, -2, 3, -3, 4, -4];

/// What the fake core was asked and what it saw
#[derive(Default)]
pub struct FakeCore {
    pub need_fullpath: bool,
    pub reject_game: bool,
    pub api_version: u32,
    pub sample_rate: f64,
    pub fps: f64,

    pub environment: Option<abi::EnvironmentFn>,
    pub video_refresh: Option<abi::VideoRefreshFn>,
    pub audio_sample: Option<abi::AudioSampleFn>,
    pub audio_sample_batch: Option<abi::AudioSampleBatchFn>,
    pub input_poll: Option<abi::InputPollFn>,
    pub input_state: Option<abi::InputStateFn>,

    /// Path, data and size passed to retro_load_game
    pub game_path: Option<String>,
    pub game_data: Option<Vec<u8>>,
    pub game_size: usize,

    /// (port, device) pairs passed to retro_set_controller_port_device
    pub port_devices: Vec<(u32, u32)>,
    /// Frames the batch callback accepted, per run-step
    pub audio_accepted: Vec<usize>,
    /// Whether A (id 8) was held, per run-step
    pub a_held: Vec<bool>,
    /// What the environment callback answered
    pub environment_answers: Vec<bool>,
}

impl FakeCore {
    fn fresh() -> Self {
        Self {
            api_version: abi::API_VERSION,
            sample_rate: 44100.0,
            fps: 60.0,
            ..Self::default()
        }
    }
}

thread_local! {
    static CORE: RefCell<FakeCore> = RefCell::new(FakeCore::fresh());
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Forget everything the fake core and sinks recorded on this thread
pub fn reset() {
    CORE.with(|core| *core.borrow_mut() = FakeCore::fresh());
    EVENTS.with(|events| events.borrow_mut().clear());
}

/// Append to the event log
pub fn record(event: impl Into<String>) {
    EVENTS.with(|events| events.borrow_mut().push(event.into()));
}

/// Everything recorded so far on this thread
pub fn events() -> Vec<String> {
    EVENTS.with(|events| events.borrow().clone())
}

/// Whether the fake core saw `name` called
pub fn called(name: &str) -> bool {
    events().iter().any(|e| e == name)
}

/// Configure the fake core before a test
pub fn configure(f: impl FnOnce(&mut FakeCore)) {
    CORE.with(|core| f(&mut core.borrow_mut()));
}

/// Read what the fake core recorded
pub fn inspect<R>(f: impl FnOnce(&FakeCore) -> R) -> R {
    CORE.with(|core| f(&core.borrow()))
}

extern "C" fn retro_set_environment(cb: abi::EnvironmentFn) {
    record("set_environment");
    configure(|c| c.environment = Some(cb));
}

extern "C" fn retro_set_video_refresh(cb: abi::VideoRefreshFn) {
    record("set_video_refresh");
    configure(|c| c.video_refresh = Some(cb));
}

extern "C" fn retro_set_audio_sample(cb: abi::AudioSampleFn) {
    record("set_audio_sample");
    configure(|c| c.audio_sample = Some(cb));
}

extern "C" fn retro_set_audio_sample_batch(cb: abi::AudioSampleBatchFn) {
    record("set_audio_sample_batch");
    configure(|c| c.audio_sample_batch = Some(cb));
}

extern "C" fn retro_set_input_poll(cb: abi::InputPollFn) {
    record("set_input_poll");
    configure(|c| c.input_poll = Some(cb));
}

extern "C" fn retro_set_input_state(cb: abi::InputStateFn) {
    record("set_input_state");
    configure(|c| c.input_state = Some(cb));
}

extern "C" fn retro_init() {
    record("init");
    // A real core asks for its pixel format here
    let environment = inspect(|c| c.environment);
    if let Some(environment) = environment {
        let mut format: u32 = 2;
        let answer = unsafe { environment(10, (&mut format as *mut u32).cast()) };
        configure(|c| c.environment_answers.push(answer));
    }
}

extern "C" fn retro_deinit() {
    record("deinit");
}

extern "C" fn retro_api_version() -> c_uint {
    inspect(|c| c.api_version)
}

extern "C" fn retro_get_system_info(info: *mut SystemInfo) {
    let need_fullpath = inspect(|c| c.need_fullpath);
    unsafe {
        (*info).library_name = b"fakecore\0".as_ptr().cast();
        (*info).library_version = b"1.0\0".as_ptr().cast();
        (*info).valid_extensions = b"bin\0".as_ptr().cast();
        (*info).need_fullpath = need_fullpath;
        (*info).block_extract = false;
    }
}

extern "C" fn retro_get_system_av_info(info: *mut SystemAvInfo) {
    let (fps, sample_rate) = inspect(|c| (c.fps, c.sample_rate));
    unsafe {
        (*info).geometry.base_width = FRAME_WIDTH;
        (*info).geometry.base_height = FRAME_HEIGHT;
        (*info).geometry.max_width = FRAME_WIDTH;
        (*info).geometry.max_height = FRAME_HEIGHT;
        (*info).geometry.aspect_ratio = 1.0;
        (*info).timing.fps = fps;
        (*info).timing.sample_rate = sample_rate;
    }
}

extern "C" fn retro_set_controller_port_device(port: c_uint, device: c_uint) {
    record("set_controller_port_device");
    configure(|c| c.port_devices.push((port, device)));
}

extern "C" fn retro_reset() {
    record("reset");
}

extern "C" fn retro_run() {
    record("run");
    let (poll, state, video, batch) =
        inspect(|c| (c.input_poll, c.input_state, c.video_refresh, c.audio_sample_batch));

    unsafe {
        if let Some(poll) = poll {
            poll();
        }
        if let Some(state) = state {
            let held = state(0, abi::DEVICE_JOYPAD, 0, 8) != 0;
            configure(|c| c.a_held.push(held));
        }
        if let Some(video) = video {
            video(FRAME.as_ptr().cast(), FRAME_WIDTH, FRAME_HEIGHT, FRAME_WIDTH as usize * 2);
        }
        if let Some(batch) = batch {
            let accepted = batch(AUDIO.as_ptr(), AUDIO.len() / 2);
            configure(|c| c.audio_accepted.push(accepted));
        }
    }
}

extern "C" fn retro_serialize_size() -> usize {
    0
}

extern "C" fn retro_serialize(_data: *mut c_void, _size: usize) -> bool {
    false
}

extern "C" fn retro_unserialize(_data: *const c_void, _size: usize) -> bool {
    false
}

extern "C" fn retro_load_game(game: *const GameInfo) -> bool {
    record("load_game");
    let reject = inspect(|c| c.reject_game);

    let game = unsafe { &*game };
    let path = (!game.path.is_null())
        .then(|| unsafe { CStr::from_ptr(game.path) }.to_string_lossy().into_owned());
    let data = (!game.data.is_null())
        .then(|| unsafe { std::slice::from_raw_parts(game.data.cast::<u8>(), game.size) }.to_vec());

    configure(|c| {
        c.game_path = path;
        c.game_data = data;
        c.game_size = game.size;
    });

    !reject
}

extern "C" fn retro_unload_game() {
    record("unload_game");
}

/// Serves the fake core's functions by symbol name
pub struct FakeSymbols(HashMap<&'static str, *const c_void>);

impl FakeSymbols {
    /// Every required entry point
    pub fn complete() -> Self {
        let table: [(&'static str, *const c_void); 19] = [
            (symbols::SET_ENVIRONMENT, retro_set_environment as *const c_void),
            (symbols::SET_VIDEO_REFRESH, retro_set_video_refresh as *const c_void),
            (symbols::SET_AUDIO_SAMPLE, retro_set_audio_sample as *const c_void),
            (symbols::SET_AUDIO_SAMPLE_BATCH, retro_set_audio_sample_batch as *const c_void),
            (symbols::SET_INPUT_POLL, retro_set_input_poll as *const c_void),
            (symbols::SET_INPUT_STATE, retro_set_input_state as *const c_void),
            (symbols::INIT, retro_init as *const c_void),
            (symbols::DEINIT, retro_deinit as *const c_void),
            (symbols::API_VERSION, retro_api_version as *const c_void),
            (symbols::GET_SYSTEM_INFO, retro_get_system_info as *const c_void),
            (symbols::GET_SYSTEM_AV_INFO, retro_get_system_av_info as *const c_void),
            (symbols::SET_CONTROLLER_PORT_DEVICE, retro_set_controller_port_device as *const c_void),
            (symbols::RESET, retro_reset as *const c_void),
            (symbols::RUN, retro_run as *const c_void),
            (symbols::SERIALIZE_SIZE, retro_serialize_size as *const c_void),
            (symbols::SERIALIZE, retro_serialize as *const c_void),
            (symbols::UNSERIALIZE, retro_unserialize as *const c_void),
            (symbols::LOAD_GAME, retro_load_game as *const c_void),
            (symbols::UNLOAD_GAME, retro_unload_game as *const c_void),
        ];
        Self(table.into_iter().collect())
    }

    /// Every required entry point except `symbol`
    pub fn without(symbol: &str) -> Self {
        let mut symbols = Self::complete();
        symbols.0.remove(symbol);
        symbols
    }
}

impl SymbolSource for FakeSymbols {
    fn resolve(&self, name: &str) -> Result<*const c_void, String> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| format!("undefined symbol: {}", name))
    }
}

/// The fake core bound as a module
pub fn fake_module() -> CoreModule {
    let api = CoreApi::bind(&FakeSymbols::complete()).expect("fake core binds");
    CoreModule::from_api(api)
}

/// What the recording sinks saw
#[derive(Default)]
pub struct Recorded {
    pub params: Option<PcmParams>,
    pub samples: Vec<i16>,
    pub cells: Vec<(usize, usize, ColorClass)>,
    pub presents: usize,
    pub polls: usize,
}

/// Platform backed by recording sinks
///
/// The key source requests shutdown once it has been polled `stop_after`
/// times, which bounds the run loop.
pub struct FakePlatform {
    pub shutdown: ShutdownToken,
    pub stop_after: usize,
    pub keys: Vec<Option<KeyCode>>,
    pub audio_error: Option<AudioError>,
    pub display_error: bool,
    pub recorded: Rc<RefCell<Recorded>>,
}

impl FakePlatform {
    pub fn new(shutdown: ShutdownToken, stop_after: usize) -> Self {
        Self {
            shutdown,
            stop_after,
            keys: Vec::new(),
            audio_error: None,
            display_error: false,
            recorded: Rc::default(),
        }
    }
}

struct RecordingAudio(Rc<RefCell<Recorded>>);

impl AudioSink for RecordingAudio {
    fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError> {
        self.0.borrow_mut().samples.extend_from_slice(samples);
        Ok(samples.len() / 2)
    }

    fn recover(&mut self, _error: &AudioError) -> Result<(), AudioError> {
        record("audio.recover");
        Ok(())
    }

    fn close(&mut self) {
        record("audio.close");
    }
}

struct RecordingDisplay(Rc<RefCell<Recorded>>);

impl DisplaySink for RecordingDisplay {
    fn set_cell(&mut self, row: usize, col: usize, color: ColorClass) -> io::Result<()> {
        self.0.borrow_mut().cells.push((row, col, color));
        Ok(())
    }

    fn present(&mut self) -> io::Result<()> {
        self.0.borrow_mut().presents += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        record("display.close");
        Ok(())
    }
}

struct ScriptedKeys {
    keys: Vec<Option<KeyCode>>,
    stop_after: usize,
    shutdown: ShutdownToken,
    recorded: Rc<RefCell<Recorded>>,
}

impl KeySource for ScriptedKeys {
    fn poll_key(&mut self) -> Option<KeyCode> {
        let mut recorded = self.recorded.borrow_mut();
        let index = recorded.polls;
        recorded.polls += 1;
        if recorded.polls >= self.stop_after {
            self.shutdown.request();
        }
        self.keys.get(index).copied().flatten()
    }
}

impl Platform for FakePlatform {
    fn open_audio(&mut self, params: &PcmParams) -> Result<Box<dyn AudioSink>, AudioError> {
        record("audio.open");
        if let Some(error) = self.audio_error.clone() {
            return Err(error);
        }
        self.recorded.borrow_mut().params = Some(*params);
        Ok(Box::new(RecordingAudio(self.recorded.clone())))
    }

    fn open_display(&mut self) -> io::Result<Box<dyn DisplaySink>> {
        record("display.open");
        if self.display_error {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "not a terminal"));
        }
        Ok(Box::new(RecordingDisplay(self.recorded.clone())))
    }

    fn open_keys(&mut self, _config: &InputConfig, _shutdown: &ShutdownToken) -> Box<dyn KeySource> {
        Box::new(ScriptedKeys {
            keys: self.keys.clone(),
            stop_after: self.stop_after,
            shutdown: self.shutdown.clone(),
            recorded: self.recorded.clone(),
        })
    }
}

/// Write a ROM file for a test
pub fn rom_file(contents: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().expect("create ROM file");
    file.write_all(contents).expect("write ROM file");
    file
}
