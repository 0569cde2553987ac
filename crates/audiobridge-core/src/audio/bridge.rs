//! Audio bridge: one stream session wired to one DSP callback
//!
//! The bridge opens a stream through an [`AudioBackend`], registers a frame
//! handler and exposes a start/stop lifecycle. On every hardware frame the
//! handler:
//!
//! 1. measures input latency and applies the [`AdmissionPolicy`],
//! 2. decodes admitted frames with the [`SampleCodec`],
//! 3. invokes the [`DspCallback`] with the sample rate and extra params,
//! 4. encodes a replacement buffer, or passes the captured bytes through.
//!
//! ## Real-time path
//!
//! The handler never blocks: the callback lock is taken with `try_lock`,
//! events go through a bounded channel with `try_send`, and decode/encode
//! reuse buffers allocated at open time. Callback errors and panics are
//! caught at the frame boundary and reported as events.
//!
//! ## Stopping
//!
//! A frame gate tracks whether the bridge is started and how many
//! handlers are in flight. `stop()` closes the gate and waits for in-flight
//! handlers to return, so no callback runs after `stop()` returns.

use crate::audio::admission::{Admission, AdmissionPolicy};
use crate::audio::callback::{panic_message, DspCallback};
use crate::audio::codec::SampleCodec;
use crate::audio::noise::{NoiseSource, DEFAULT_SEED};
use crate::audio::stream::{
    AudioBackend, AudioStream, FrameEvent, FrameHandler, FrameSignal, StreamParams,
};
use crate::config::StreamConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::events::{EventDispatcher, EventEmitter, EventKind, EventSink, TracingSink};
use crate::stats::counters::{BridgeStats, StatsSnapshot};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

/// Lifecycle state of the bridged stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Stream opened but never started
    Created,
    /// Stream is delivering frames to the callback
    Started,
    /// Stream halted; can be started again
    Stopped,
    /// Stream released; no further operations are valid
    Terminated,
}

/// What the frame handler did with one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Callback ran; `replaced` is true when its output was encoded
    Admitted { replaced: bool },
    /// Latency budget exceeded, callback skipped
    Dropped,
    /// Callback failed; captured audio passed through
    Failed,
    /// Callback busy on another thread; captured audio passed through
    Skipped,
    /// Bridge not started; silence emitted
    Inactive,
}

/// Start/stop gate shared between the control thread and the frame handler
#[derive(Debug, Default)]
struct FrameGate {
    active: AtomicBool,
    in_flight: AtomicUsize,
}

/// Marks a frame handler as in flight until dropped
struct GatePass<'a> {
    gate: &'a FrameGate,
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FrameGate {
    /// Enter the gate; `None` when the bridge is not started
    fn enter(&self) -> Option<GatePass<'_>> {
        // Increment before checking `active` so close_and_wait cannot miss us
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let pass = GatePass { gate: self };
        if self.active.load(Ordering::SeqCst) {
            Some(pass)
        } else {
            None
        }
    }

    fn open(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    /// Close the gate and wait until no handler is inside
    fn close_and_wait(&self) {
        self.active.store(false, Ordering::SeqCst);
        let mut spins = 0u32;
        while self.in_flight.load(Ordering::SeqCst) != 0 {
            if spins < 64 {
                std::hint::spin_loop();
                spins += 1;
            } else {
                std::thread::yield_now();
            }
        }
    }

    fn is_open(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

type SharedCallback = Arc<Mutex<Box<dyn DspCallback>>>;

/// Per-frame admission, decode, callback and encode
///
/// Moved into the backend's frame handler; owns its scratch buffer.
struct FrameProcessor {
    config: Arc<StreamConfig>,
    codec: SampleCodec,
    policy: AdmissionPolicy,
    callback: SharedCallback,
    gate: Arc<FrameGate>,
    stats: Arc<BridgeStats>,
    events: EventEmitter,
    samples: Vec<f32>,
}

impl FrameProcessor {
    fn new(
        config: Arc<StreamConfig>,
        codec: SampleCodec,
        callback: SharedCallback,
        gate: Arc<FrameGate>,
        stats: Arc<BridgeStats>,
        events: EventEmitter,
    ) -> Self {
        let policy = AdmissionPolicy::new(config.drop_frames, config.sample_rate, config.frame_size);
        let samples = Vec::with_capacity(config.samples_per_frame());
        Self {
            config,
            codec,
            policy,
            callback,
            gate,
            stats,
            events,
            samples,
        }
    }

    /// Handle one frame, filling `output` (empty for capture-only streams)
    fn process(&mut self, event: &FrameEvent<'_>, output: &mut [u8]) -> FrameOutcome {
        let Some(_pass) = self.gate.enter() else {
            self.stats.record_inactive();
            output.fill(0);
            return FrameOutcome::Inactive;
        };

        let latency = event.timing.input_latency();
        self.stats.record_latency(latency);

        if self.policy.check(latency) == Admission::Drop {
            self.stats.record_dropped();
            passthrough(event.input, output);
            return FrameOutcome::Dropped;
        }

        if let Err(e) = self.codec.decode_into(event.input, &mut self.samples) {
            self.stats.record_failed();
            self.events.emit(EventKind::StreamError, e.to_string());
            passthrough(event.input, output);
            return FrameOutcome::Failed;
        }

        let mut callback = match self.callback.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                self.stats.record_skipped();
                passthrough(event.input, output);
                return FrameOutcome::Skipped;
            }
        };

        self.stats.record_admitted();
        let samples = &self.samples;
        let sample_rate = self.config.sample_rate;
        let params = &self.config.extra_params;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            callback.process(samples, sample_rate, params)
        }));
        drop(callback);

        let failure = match result {
            Ok(Ok(None)) => {
                passthrough(event.input, output);
                return FrameOutcome::Admitted { replaced: false };
            }
            Ok(Ok(Some(replacement))) if replacement.len() == samples.len() => {
                if !output.is_empty() {
                    if let Err(e) = self.codec.encode_into(&replacement, output) {
                        self.stats.record_failed();
                        self.events.emit(EventKind::StreamError, e.to_string());
                        passthrough(event.input, output);
                        return FrameOutcome::Failed;
                    }
                }
                return FrameOutcome::Admitted { replaced: true };
            }
            Ok(Ok(Some(replacement))) => format!(
                "callback returned {} samples, expected {}",
                replacement.len(),
                samples.len()
            ),
            Ok(Err(e)) => format!("callback error: {:#}", e),
            Err(payload) => format!("callback panicked: {}", panic_message(payload.as_ref())),
        };

        self.stats.record_failed();
        self.events.emit(EventKind::CallbackFailed, failure);
        passthrough(event.input, output);
        FrameOutcome::Failed
    }
}

/// Copy captured bytes to the output; no-op for capture-only streams
fn passthrough(input: &[u8], output: &mut [u8]) {
    if output.is_empty() {
        return;
    }
    let n = input.len().min(output.len());
    output[..n].copy_from_slice(&input[..n]);
    output[n..].fill(0);
}

/// Lifecycle fields guarded by the control lock
struct Control {
    state: StreamState,
    stream: Option<Box<dyn AudioStream>>,
    /// Overruns reported by the stream before it was released
    output_overruns: u64,
}

/// Builder for [`AudioBridge`] with a custom event sink or noise seed
pub struct BridgeBuilder {
    config: StreamConfig,
    sink: Box<dyn EventSink>,
    noise_seed: u64,
}

impl BridgeBuilder {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            sink: Box::new(TracingSink),
            noise_seed: DEFAULT_SEED,
        }
    }

    /// Receiver for lifecycle and callback-failure events (default: tracing)
    pub fn event_sink(mut self, sink: impl EventSink) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Seed for the synthetic buffers generated by [`AudioBridge::test_callback`]
    pub fn noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = seed;
        self
    }

    /// Validate the config and open a stopped stream on `backend`
    pub fn open(
        self,
        backend: &dyn AudioBackend,
        callback: impl DspCallback,
    ) -> BridgeResult<AudioBridge> {
        let config = self.config;
        config.validate()?;
        let codec = SampleCodec::new(config.sample_width)?;
        let config = Arc::new(config);

        let events = EventDispatcher::spawn(self.sink)
            .map_err(|e| BridgeError::DeviceOpen(format!("failed to spawn event thread: {}", e)))?;

        let callback: Box<dyn DspCallback> = Box::new(callback);
        let callback: SharedCallback = Arc::new(Mutex::new(callback));
        let gate = Arc::new(FrameGate::default());
        let stats = Arc::new(BridgeStats::new());

        let mut processor = FrameProcessor::new(
            Arc::clone(&config),
            codec,
            Arc::clone(&callback),
            Arc::clone(&gate),
            Arc::clone(&stats),
            events.emitter(),
        );
        let handler: FrameHandler = Box::new(move |event: &FrameEvent<'_>, output: &mut [u8]| {
            processor.process(event, output);
            FrameSignal::Continue
        });

        let params = StreamParams {
            sample_rate: config.sample_rate,
            frame_size: config.frame_size,
            channels: config.channels,
            sample_width: config.sample_width,
            input: true,
            output: config.output_enabled,
        };

        // The dispatcher shuts itself down on drop if this fails
        let stream = backend.open_stream(params, handler).map_err(|e| match e {
            BridgeError::DeviceOpen(_) => e,
            other => BridgeError::DeviceOpen(other.to_string()),
        })?;

        tracing::info!(
            sample_rate = config.sample_rate,
            frame_size = config.frame_size,
            channels = config.channels,
            format = %codec.format(),
            output = config.output_enabled,
            drop_frames = config.drop_frames,
            "Audio bridge opened"
        );
        events.emitter().emit(
            EventKind::StreamOpened,
            format!(
                "{} Hz, {} frames x {} ch, {}, budget {:.1} ms",
                config.sample_rate,
                config.frame_size,
                config.channels,
                codec.format(),
                config.frame_duration_secs() * 1000.0
            ),
        );

        Ok(AudioBridge {
            config,
            codec,
            control: Mutex::new(Control {
                state: StreamState::Created,
                stream: Some(stream),
                output_overruns: 0,
            }),
            gate,
            callback,
            stats,
            noise: Mutex::new(NoiseSource::new(self.noise_seed)),
            events,
        })
    }
}

/// A single audio stream session bridged to a DSP callback
///
/// All methods take `&self`; the bridge can be shared between a UI thread
/// and an automation thread. Dropping it closes the stream.
pub struct AudioBridge {
    config: Arc<StreamConfig>,
    codec: SampleCodec,
    control: Mutex<Control>,
    gate: Arc<FrameGate>,
    callback: SharedCallback,
    stats: Arc<BridgeStats>,
    noise: Mutex<NoiseSource>,
    events: EventDispatcher,
}

impl AudioBridge {
    /// Open a bridge that reports events through `tracing`
    ///
    /// # Errors
    /// - [`BridgeError::InvalidConfig`] / [`BridgeError::UnsupportedSampleWidth`]
    ///   for a bad config, before the backend is touched
    /// - [`BridgeError::DeviceOpen`] when the backend cannot open the stream
    pub fn open(
        backend: &dyn AudioBackend,
        config: StreamConfig,
        callback: impl DspCallback,
    ) -> BridgeResult<Self> {
        BridgeBuilder::new(config).open(backend, callback)
    }

    pub fn builder(config: StreamConfig) -> BridgeBuilder {
        BridgeBuilder::new(config)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn codec(&self) -> &SampleCodec {
        &self.codec
    }

    /// Current lifecycle state
    pub fn state(&self) -> StreamState {
        self.lock_control().state
    }

    /// Snapshot of the frame counters
    pub fn stats(&self) -> StatsSnapshot {
        let output_overruns = {
            let control = self.lock_control();
            match control.stream.as_ref() {
                Some(stream) => stream.output_overruns(),
                None => control.output_overruns,
            }
        };
        self.stats.snapshot(self.events.emitter().dropped(), output_overruns)
    }

    /// Begin delivering frames to the callback
    ///
    /// No-op when already started.
    pub fn start(&self) -> BridgeResult<()> {
        let mut control = self.lock_control();
        match control.state {
            StreamState::Started => return Ok(()),
            StreamState::Terminated => {
                return Err(BridgeError::InvalidState {
                    operation: "start",
                    state: StreamState::Terminated,
                })
            }
            StreamState::Created | StreamState::Stopped => {}
        }

        // Open first so the very first hardware frame is admitted
        self.gate.open();
        let result = match control.stream.as_mut() {
            Some(stream) => stream.start(),
            None => Err(BridgeError::Stream("stream already released".into())),
        };
        if let Err(e) = result {
            self.gate.close_and_wait();
            tracing::error!(error = %e, "Failed to start audio stream");
            self.events.emitter().emit(EventKind::StreamError, e.to_string());
            return Err(e);
        }

        control.state = StreamState::Started;
        tracing::info!("Audio stream started");
        self.events.emitter().emit(EventKind::StreamStarted, "stream started");
        Ok(())
    }

    /// Halt callback delivery; returns once no frame handler is running
    ///
    /// No-op when never started or already stopped.
    pub fn stop(&self) -> BridgeResult<()> {
        let mut control = self.lock_control();
        match control.state {
            StreamState::Created | StreamState::Stopped => Ok(()),
            StreamState::Terminated => Err(BridgeError::InvalidState {
                operation: "stop",
                state: StreamState::Terminated,
            }),
            StreamState::Started => self.stop_locked(&mut control),
        }
    }

    /// `start()` when `active`, otherwise `stop()`
    pub fn set_state(&self, active: bool) -> BridgeResult<()> {
        if active {
            self.start()
        } else {
            self.stop()
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == StreamState::Started
    }

    /// Run the callback directly, without touching the stream
    ///
    /// With `None`, a fresh standard-normal buffer of `frame_size` samples is
    /// generated. Waits if the audio thread is inside the callback.
    pub fn test_callback(&self, samples: Option<&[f32]>) -> BridgeResult<Option<Vec<f32>>> {
        if self.state() == StreamState::Terminated {
            return Err(BridgeError::InvalidState {
                operation: "test callback",
                state: StreamState::Terminated,
            });
        }

        let generated;
        let samples = match samples {
            Some(s) => s,
            None => {
                let mut noise = match self.noise.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                generated = noise.buffer(self.config.frame_size);
                &generated[..]
            }
        };

        let mut callback = match self.callback.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let sample_rate = self.config.sample_rate;
        let params = &self.config.extra_params;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            callback.process(samples, sample_rate, params)
        }));

        match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(BridgeError::Callback(format!("{:#}", e))),
            Err(payload) => Err(BridgeError::Callback(format!(
                "panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }

    /// Stop if needed, release the stream and enter `Terminated`
    ///
    /// Safe to call more than once; teardown failures are reported as
    /// events and never returned.
    pub fn close(&self) {
        let mut control = self.lock_control();
        if control.state == StreamState::Terminated {
            return;
        }

        if control.state == StreamState::Started {
            if let Err(e) = self.stop_locked(&mut control) {
                tracing::warn!(error = %e, "Stream stop failed during close");
            }
        }

        if let Some(mut stream) = control.stream.take() {
            control.output_overruns = stream.output_overruns();
            if let Err(e) = stream.terminate() {
                tracing::error!(error = %e, "Failed to terminate audio stream");
                self.events
                    .emitter()
                    .emit(EventKind::TeardownFailed, e.to_string());
            }
        }

        control.state = StreamState::Terminated;
        drop(control);

        tracing::info!("Audio bridge closed");
        self.events.emitter().emit(EventKind::StreamClosed, "stream closed");
        self.events.shutdown();
    }

    fn stop_locked(&self, control: &mut Control) -> BridgeResult<()> {
        self.gate.close_and_wait();
        control.state = StreamState::Stopped;

        let result = match control.stream.as_mut() {
            Some(stream) => stream.stop(),
            None => Ok(()),
        };
        match result {
            Ok(()) => {
                tracing::info!("Audio stream stopped");
                self.events.emitter().emit(EventKind::StreamStopped, "stream stopped");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to stop audio stream");
                self.events.emitter().emit(EventKind::StreamError, e.to_string());
                Err(e)
            }
        }
    }

    fn lock_control(&self) -> MutexGuard<'_, Control> {
        match self.control.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for AudioBridge {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::callback::CallbackResult;
    use crate::audio::stream::TimingInfo;
    use crate::config::ExtraParams;

    fn processor_with(
        config: StreamConfig,
        callback: impl DspCallback,
    ) -> (FrameProcessor, Arc<FrameGate>, Arc<BridgeStats>, EventDispatcher) {
        let codec = SampleCodec::new(config.sample_width).unwrap();
        let gate = Arc::new(FrameGate::default());
        let stats = Arc::new(BridgeStats::new());
        let events = EventDispatcher::spawn(Box::new(TracingSink)).unwrap();
        let callback: Box<dyn DspCallback> = Box::new(callback);
        let processor = FrameProcessor::new(
            Arc::new(config),
            codec,
            Arc::new(Mutex::new(callback)),
            Arc::clone(&gate),
            Arc::clone(&stats),
            events.emitter(),
        );
        (processor, gate, stats, events)
    }

    fn frame(input: &[u8], latency: f64) -> FrameEvent<'_> {
        FrameEvent {
            input,
            frame_count: input.len() / 2,
            timing: TimingInfo::with_latency(latency),
        }
    }

    fn silent(_: &[f32], _: u32, _: &ExtraParams) -> CallbackResult {
        Ok(None)
    }

    #[test]
    fn test_gate_closed_by_default() {
        let gate = FrameGate::default();
        assert!(!gate.is_open());
        assert!(gate.enter().is_none());
        assert_eq!(gate.in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_gate_counts_in_flight() {
        let gate = FrameGate::default();
        gate.open();
        let pass = gate.enter();
        assert!(pass.is_some());
        assert_eq!(gate.in_flight.load(Ordering::SeqCst), 1);
        drop(pass);
        assert_eq!(gate.in_flight.load(Ordering::SeqCst), 0);
        gate.close_and_wait();
        assert!(!gate.is_open());
    }

    #[test]
    fn test_inactive_frame_emits_silence() {
        let config = StreamConfig {
            frame_size: 2,
            output_enabled: true,
            ..Default::default()
        };
        let (mut processor, _gate, stats, _events) = processor_with(config, silent);

        let input = [1u8, 2, 3, 4];
        let mut output = [9u8; 4];
        let outcome = processor.process(&frame(&input, 0.0), &mut output);

        assert_eq!(outcome, FrameOutcome::Inactive);
        assert_eq!(output, [0; 4]);
        assert_eq!(stats.snapshot(0, 0).frames_inactive, 1);
    }

    #[test]
    fn test_replacement_is_encoded() {
        let config = StreamConfig {
            frame_size: 2,
            output_enabled: true,
            ..Default::default()
        };
        let invert = |s: &[f32], _: u32, _: &ExtraParams| -> CallbackResult {
            Ok(Some(s.iter().map(|x| -x).collect()))
        };
        let (mut processor, gate, _stats, _events) = processor_with(config, invert);
        gate.open();

        // 0.5, -0.5
        let input = [0x00, 0x40, 0x00, 0xC0];
        let mut output = [0u8; 4];
        let outcome = processor.process(&frame(&input, 0.0), &mut output);

        assert_eq!(outcome, FrameOutcome::Admitted { replaced: true });
        assert_eq!(output, [0x00, 0xC0, 0x00, 0x40]);
    }

    #[test]
    fn test_wrong_length_replacement_passes_through() {
        let config = StreamConfig {
            frame_size: 2,
            output_enabled: true,
            ..Default::default()
        };
        let short = |_: &[f32], _: u32, _: &ExtraParams| -> CallbackResult { Ok(Some(vec![0.0])) };
        let (mut processor, gate, stats, _events) = processor_with(config, short);
        gate.open();

        let input = [1u8, 2, 3, 4];
        let mut output = [0u8; 4];
        let outcome = processor.process(&frame(&input, 0.0), &mut output);

        assert_eq!(outcome, FrameOutcome::Failed);
        assert_eq!(output, input);
        assert_eq!(stats.frames_failed(), 1);
    }

    #[test]
    fn test_capture_only_output_stays_empty() {
        let config = StreamConfig {
            frame_size: 2,
            ..Default::default()
        };
        let (mut processor, gate, stats, _events) = processor_with(config, silent);
        gate.open();

        let input = [1u8, 2, 3, 4];
        let mut output: [u8; 0] = [];
        let outcome = processor.process(&frame(&input, 0.0), &mut output);

        assert_eq!(outcome, FrameOutcome::Admitted { replaced: false });
        assert_eq!(stats.frames_admitted(), 1);
    }

    #[test]
    fn test_odd_length_input_fails_without_callback() {
        let config = StreamConfig {
            frame_size: 2,
            output_enabled: true,
            ..Default::default()
        };
        let (mut processor, gate, stats, _events) = processor_with(config, silent);
        gate.open();

        let input = [1u8, 2, 3];
        let mut output = [0u8; 3];
        let outcome = processor.process(&frame(&input, 0.0), &mut output);

        assert_eq!(outcome, FrameOutcome::Failed);
        assert_eq!(output, input);
        assert_eq!(stats.frames_admitted(), 0);
    }

    #[test]
    fn test_busy_callback_skips_frame() {
        let config = StreamConfig {
            frame_size: 2,
            output_enabled: true,
            ..Default::default()
        };
        let (mut processor, gate, stats, _events) = processor_with(config, silent);
        gate.open();

        let callback = Arc::clone(&processor.callback);
        let _held = callback.lock().unwrap();

        let input = [1u8, 2, 3, 4];
        let mut output = [0u8; 4];
        let outcome = processor.process(&frame(&input, 0.0), &mut output);

        assert_eq!(outcome, FrameOutcome::Skipped);
        assert_eq!(output, input);
        assert_eq!(stats.snapshot(0, 0).frames_skipped, 1);
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let config = StreamConfig {
            frame_size: 1,
            output_enabled: true,
            ..Default::default()
        };
        let mut calls = 0;
        let flaky = move |_: &[f32], _: u32, _: &ExtraParams| -> CallbackResult {
            calls += 1;
            if calls == 1 {
                panic!("first frame explodes");
            }
            Ok(Some(vec![0.5]))
        };
        let (mut processor, gate, _stats, _events) = processor_with(config, flaky);
        gate.open();

        let input = [0x00, 0x00];
        let mut output = [0u8; 2];
        assert_eq!(
            processor.process(&frame(&input, 0.0), &mut output),
            FrameOutcome::Failed
        );
        assert_eq!(output, input);

        assert_eq!(
            processor.process(&frame(&input, 0.0), &mut output),
            FrameOutcome::Admitted { replaced: true }
        );
        assert_eq!(output, [0x00, 0x40]);
    }

    #[test]
    fn test_passthrough_pads_short_input() {
        let mut output = [7u8; 4];
        passthrough(&[1, 2], &mut output);
        assert_eq!(output, [1, 2, 0, 0]);
    }
}
