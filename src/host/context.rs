// Callback context - How the core's C callbacks reach the host
//
// The core calls plain `extern "C"` functions with no user-data pointer. The
// trampolines below find the host through a thread-local pointer that is only
// set while a `CallbackScope` is alive, i.e. for the duration of one host ->
// core call. Outside a scope every callback is a no-op that reports 0/false.

use crate::abi::{self, DEVICE_JOYPAD};
use crate::audio::AudioRelay;
use crate::input::InputSampler;
use crate::loader::CoreApi;
use crate::video::{FrameView, VideoRelay};
use std::cell::Cell;
use std::ffi::{c_uint, c_void};
use std::marker::PhantomData;
use std::ptr;

/// Everything the callbacks touch
pub struct HostContext {
    pub video: VideoRelay,
    pub audio: AudioRelay,
    pub input: InputSampler,
}

impl HostContext {
    pub fn new(video: VideoRelay, audio: AudioRelay, input: InputSampler) -> Self {
        Self { video, audio, input }
    }
}

thread_local! {
    static ACTIVE: Cell<*mut HostContext> = const { Cell::new(ptr::null_mut()) };
}

/// Makes a context reachable from the trampolines until dropped
///
/// Scopes nest: dropping one restores whatever was active before it.
pub struct CallbackScope<'a> {
    previous: *mut HostContext,
    _context: PhantomData<&'a mut HostContext>,
}

impl<'a> CallbackScope<'a> {
    /// Install `context` as the active context on this thread
    pub fn enter(context: &'a mut HostContext) -> Self {
        let previous = ACTIVE.with(|active| active.replace(context as *mut HostContext));
        Self {
            previous,
            _context: PhantomData,
        }
    }
}

impl Drop for CallbackScope<'_> {
    fn drop(&mut self) {
        ACTIVE.with(|active| active.set(self.previous));
    }
}

/// Run `f` against the active context, None when no scope is active
fn with_active<R>(f: impl FnOnce(&mut HostContext) -> R) -> Option<R> {
    let context = ACTIVE.with(Cell::get);
    if context.is_null() {
        log::trace!("callback outside of a core call ignored");
        return None;
    }

    // SAFETY: the pointer was installed by a live CallbackScope that holds
    // the exclusive borrow, and callbacks run synchronously on this thread.
    Some(f(unsafe { &mut *context }))
}

/// Whether a context is currently reachable from the trampolines
pub fn is_active() -> bool {
    !ACTIVE.with(Cell::get).is_null()
}

unsafe extern "C" fn environment(cmd: c_uint, _data: *mut c_void) -> bool {
    log::trace!("environment command {} not supported", cmd);
    false
}

unsafe extern "C" fn video_refresh(data: *const c_void, width: c_uint, height: c_uint, pitch: usize) {
    with_active(|context| {
        // SAFETY: the core guarantees `data` covers the frame for the
        // duration of this call; the view does not outlive it.
        let frame = unsafe { FrameView::from_raw(data, width, height, pitch) };
        context.video.refresh(frame);
    });
}

unsafe extern "C" fn audio_sample(left: i16, right: i16) {
    with_active(|context| {
        context.audio.write_sample(left, right);
    });
}

unsafe extern "C" fn audio_sample_batch(data: *const i16, frames: usize) -> usize {
    if data.is_null() || frames == 0 {
        return 0;
    }

    with_active(|context| {
        // SAFETY: the core passes `frames` interleaved stereo frames.
        let samples = unsafe { std::slice::from_raw_parts(data, frames * 2) };
        context.audio.write_batch(samples)
    })
    .unwrap_or(0)
}

unsafe extern "C" fn input_poll() {
    with_active(|context| context.input.poll());
}

unsafe extern "C" fn input_state(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16 {
    with_active(|context| context.input.state(port, device, index, id) as i16).unwrap_or(0)
}

/// Register the trampolines with the core
///
/// # Safety
/// `api` must be a bound core; the setters are called directly.
pub unsafe fn register(api: &CoreApi) {
    (api.set_environment)(environment);
    (api.set_video_refresh)(video_refresh);
    (api.set_audio_sample)(audio_sample);
    (api.set_audio_sample_batch)(audio_sample_batch);
    (api.set_input_poll)(input_poll);
    (api.set_input_state)(input_state);
}

/// The trampolines as a table, for tests that drive them directly
pub struct Trampolines {
    pub environment: abi::EnvironmentFn,
    pub video_refresh: abi::VideoRefreshFn,
    pub audio_sample: abi::AudioSampleFn,
    pub audio_sample_batch: abi::AudioSampleBatchFn,
    pub input_poll: abi::InputPollFn,
    pub input_state: abi::InputStateFn,
}

/// The functions `register` hands to the core
pub const TRAMPOLINES: Trampolines = Trampolines {
    environment,
    video_refresh,
    audio_sample,
    audio_sample_batch,
    input_poll,
    input_state,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioError, AudioSink};
    use crate::input::{Button, KeyCode};
    use crate::video::{ColorClass, DisplaySink};
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Cells(Rc<RefCell<Vec<(usize, usize, ColorClass)>>>);

    impl DisplaySink for Cells {
        fn set_cell(&mut self, row: usize, col: usize, color: ColorClass) -> io::Result<()> {
            self.0.borrow_mut().push((row, col, color));
            Ok(())
        }
        fn present(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn close(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Samples(Rc<RefCell<Vec<i16>>>);

    impl AudioSink for Samples {
        fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError> {
            self.0.borrow_mut().extend_from_slice(samples);
            Ok(samples.len() / 2)
        }
        fn recover(&mut self, _error: &AudioError) -> Result<(), AudioError> {
            Ok(())
        }
        fn close(&mut self) {}
    }

    fn context() -> HostContext {
        HostContext::new(VideoRelay::new(1), AudioRelay::new(), InputSampler::default())
    }

    #[test]
    fn test_callbacks_without_scope_are_ignored() {
        assert!(!is_active());
        let samples = [1i16, 2, 3, 4];
        unsafe {
            assert_eq!((TRAMPOLINES.audio_sample_batch)(samples.as_ptr(), 2), 0);
            assert_eq!((TRAMPOLINES.input_state)(0, DEVICE_JOYPAD, 0, 0), 0);
            (TRAMPOLINES.input_poll)();
            (TRAMPOLINES.audio_sample)(1, 2);
        }
    }

    #[test]
    fn test_scope_routes_callbacks() {
        let sink = Samples::default();
        let mut ctx = context();
        ctx.audio.attach(Box::new(sink.clone()));
        ctx.input.apply(KeyCode::Char('x'));

        {
            let _scope = CallbackScope::enter(&mut ctx);
            assert!(is_active());

            let batch = [10i16, 11, 12, 13];
            unsafe {
                assert_eq!((TRAMPOLINES.audio_sample_batch)(batch.as_ptr(), 2), 2);
                (TRAMPOLINES.audio_sample)(20, 21);
                assert_eq!((TRAMPOLINES.input_state)(0, DEVICE_JOYPAD, 0, Button::A.id()), 1);
                assert_eq!((TRAMPOLINES.input_state)(1, DEVICE_JOYPAD, 0, Button::A.id()), 0);
            }
        }

        assert!(!is_active());
        assert_eq!(*sink.0.borrow(), vec![10, 11, 12, 13, 20, 21]);
    }

    #[test]
    fn test_video_refresh_decodes_frame() {
        let cells = Cells::default();
        let mut ctx = context();
        ctx.video.attach(Box::new(cells.clone()));

        // 2x1 frame: opaque red, opaque blue
        let pixels: [u16; 2] = [0x8000 | (31 << 10), 0x8000 | 31];
        {
            let _scope = CallbackScope::enter(&mut ctx);
            unsafe {
                (TRAMPOLINES.video_refresh)(pixels.as_ptr().cast(), 2, 1, 4);
                (TRAMPOLINES.video_refresh)(ptr::null(), 2, 1, 4);
            }
        }

        assert_eq!(
            *cells.0.borrow(),
            vec![(0, 0, ColorClass::Red), (0, 1, ColorClass::Blue)]
        );
        assert_eq!(ctx.video.frames_presented(), 1);
    }

    #[test]
    fn test_null_batch_is_ignored() {
        let mut ctx = context();
        let _scope = CallbackScope::enter(&mut ctx);
        assert_eq!(unsafe { (TRAMPOLINES.audio_sample_batch)(ptr::null(), 4) }, 0);
    }

    #[test]
    fn test_environment_answers_false() {
        let mut data = 0u32;
        let handled = unsafe { (TRAMPOLINES.environment)(10, (&mut data as *mut u32).cast()) };
        assert!(!handled);
    }
}
