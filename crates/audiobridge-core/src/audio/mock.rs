//! Synthetic audio backend for tests and hardware-free runs
//!
//! [`MockBackend`] hands out streams whose frames are injected by the caller
//! with [`MockBackend::deliver`]. Frames are only delivered while the stream
//! is started, just like a real device.

use crate::audio::stream::{
    AudioBackend, AudioStream, FrameEvent, FrameHandler, FrameSignal, StreamParams, TimingInfo,
};
use crate::error::{BridgeError, BridgeResult};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct MockShared {
    params: Mutex<Option<StreamParams>>,
    handler: Mutex<Option<FrameHandler>>,
    running: AtomicBool,
    fail_open: AtomicBool,
    opens: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
    terminates: AtomicUsize,
    frames_delivered: AtomicUsize,
    output_overruns: AtomicU64,
}

/// Cloneable handle to a synthetic device
///
/// Clones share state, so a test can keep one clone to inject frames after
/// passing another to [`AudioBridge::open`](crate::AudioBridge::open).
#[derive(Clone, Default)]
pub struct MockBackend {
    shared: Arc<MockShared>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `open_stream` calls fail with `DeviceOpen`
    pub fn set_fail_open(&self, fail: bool) {
        self.shared.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Deliver one frame to the registered handler
    ///
    /// Returns `None` when no stream is open or the stream is not started,
    /// otherwise the bytes the handler produced for playback (empty for
    /// capture-only streams).
    pub fn deliver(&self, input: &[u8], timing: TimingInfo) -> Option<Vec<u8>> {
        if !self.shared.running.load(Ordering::SeqCst) {
            return None;
        }
        let params = (*lock(&self.shared.params))?;

        let mut handler = lock(&self.shared.handler);
        let handler = handler.as_mut()?;

        let mut output = if params.output {
            vec![0u8; input.len()]
        } else {
            Vec::new()
        };
        let bytes_per_frame = params.channels as usize * params.sample_width;
        let event = FrameEvent {
            input,
            frame_count: input.len() / bytes_per_frame.max(1),
            timing,
        };

        if handler(&event, &mut output[..]) == FrameSignal::Complete {
            self.shared.running.store(false, Ordering::SeqCst);
        }
        self.shared.frames_delivered.fetch_add(1, Ordering::SeqCst);
        Some(output)
    }

    /// Simulate the playback side dropping a frame it had no room for
    pub fn record_output_overrun(&self) {
        self.shared.output_overruns.fetch_add(1, Ordering::SeqCst);
    }

    /// Parameters of the most recently opened stream
    pub fn params(&self) -> Option<StreamParams> {
        *lock(&self.shared.params)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Whether a handler is still registered (not yet terminated)
    pub fn has_handler(&self) -> bool {
        lock(&self.shared.handler).is_some()
    }

    pub fn open_count(&self) -> usize {
        self.shared.opens.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.shared.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.shared.stops.load(Ordering::SeqCst)
    }

    pub fn terminate_count(&self) -> usize {
        self.shared.terminates.load(Ordering::SeqCst)
    }

    pub fn frames_delivered(&self) -> usize {
        self.shared.frames_delivered.load(Ordering::SeqCst)
    }
}

impl AudioBackend for MockBackend {
    fn open_stream(
        &self,
        params: StreamParams,
        handler: FrameHandler,
    ) -> BridgeResult<Box<dyn AudioStream>> {
        if self.shared.fail_open.load(Ordering::SeqCst) {
            return Err(BridgeError::DeviceOpen("mock device busy".into()));
        }

        *lock(&self.shared.params) = Some(params);
        *lock(&self.shared.handler) = Some(handler);
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.opens.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockStream {
            shared: Arc::clone(&self.shared),
            terminated: false,
        }))
    }
}

struct MockStream {
    shared: Arc<MockShared>,
    terminated: bool,
}

impl AudioStream for MockStream {
    fn start(&mut self) -> BridgeResult<()> {
        if self.terminated {
            return Err(BridgeError::Stream("mock stream terminated".into()));
        }
        self.shared.running.store(true, Ordering::SeqCst);
        self.shared.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> BridgeResult<()> {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn terminate(&mut self) -> BridgeResult<()> {
        if self.terminated {
            return Ok(());
        }
        self.terminated = true;
        self.shared.running.store(false, Ordering::SeqCst);
        *lock(&self.shared.handler) = None;
        self.shared.terminates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn output_overruns(&self) -> u64 {
        self.shared.output_overruns.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
