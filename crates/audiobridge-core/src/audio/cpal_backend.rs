//! cpal hardware backend
//!
//! Opens the default input device (and the default output device when
//! playback is requested) of the default cpal host.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  Start/Stop/Terminate   ┌──────────────────────┐
//! │  Control thread  │────────────────────────►│  audio-stream thread │
//! │  (AudioBridge)   │◄──────── reply ─────────│  (owns cpal streams) │
//! └──────────────────┘                         └──────────────────────┘
//!
//! ┌──────────────────┐   encoded output bytes  ┌──────────────────────┐
//! │  Input callback  │────────────────────────►│   Output callback    │
//! │  (frame handler) │   lock-free SPSC ring   │  (underrun = silence)│
//! └──────────────────┘                         └──────────────────────┘
//! ```
//!
//! cpal streams are not `Send`, so they live on a dedicated thread that
//! executes commands sent over a crossbeam channel. Capture and playback are
//! separate cpal streams; pass-through audio crosses between them in a ring
//! buffer sized for a few frames.

use crate::audio::stream::{
    AudioBackend, AudioStream, FrameEvent, FrameHandler, FrameSignal, StreamParams, TimingInfo,
};
use crate::error::{BridgeError, BridgeResult};
use crossbeam_channel::{bounded, Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig, StreamInstant};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Output ring buffer capacity, in frames
const RING_FRAMES: usize = 4;

/// A sample type cpal can stream, packed as little-endian PCM of a given width
trait WireSample: cpal::SizedSample + Send + 'static {
    /// Write this sample into `bytes` (one sample slot)
    fn write_le(self, bytes: &mut [u8]);

    /// Read a sample from `bytes` (one sample slot)
    fn read_le(bytes: &[u8]) -> Self;
}

impl WireSample for i8 {
    fn write_le(self, bytes: &mut [u8]) {
        bytes[0] = self as u8;
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }
}

impl WireSample for i16 {
    fn write_le(self, bytes: &mut [u8]) {
        bytes.copy_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        i16::from_le_bytes([bytes[0], bytes[1]])
    }
}

/// 24-bit audio is carried in the upper three bytes of an `i32`
impl WireSample for i32 {
    fn write_le(self, bytes: &mut [u8]) {
        if bytes.len() == 3 {
            bytes.copy_from_slice(&(self >> 8).to_le_bytes()[..3]);
        } else {
            bytes.copy_from_slice(&self.to_le_bytes());
        }
    }

    fn read_le(bytes: &[u8]) -> Self {
        if bytes.len() == 3 {
            i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]])
        } else {
            i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
        }
    }
}

/// Backend for the default cpal host and its default devices
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }

    /// Name of the device frames will be captured from, if any
    pub fn default_input_name() -> Option<String> {
        cpal::default_host()
            .default_input_device()
            .and_then(|d| d.name().ok())
    }
}

impl AudioBackend for CpalBackend {
    fn open_stream(
        &self,
        params: StreamParams,
        handler: FrameHandler,
    ) -> BridgeResult<Box<dyn AudioStream>> {
        let (cmd_tx, cmd_rx) = bounded::<Command>(4);
        let (reply_tx, reply_rx) = bounded::<BridgeResult<()>>(1);
        let overruns = Arc::new(AtomicU64::new(0));
        let thread_overruns = Arc::clone(&overruns);

        let thread = std::thread::Builder::new()
            .name("audio-stream".into())
            .spawn(move || stream_owner(params, handler, thread_overruns, cmd_rx, reply_tx))
            .map_err(|e| BridgeError::DeviceOpen(format!("failed to spawn audio thread: {}", e)))?;

        // First reply is the outcome of building the streams
        let opened = reply_rx
            .recv()
            .unwrap_or_else(|_| Err(BridgeError::DeviceOpen("audio thread exited".into())));
        if let Err(e) = opened {
            let _ = thread.join();
            return Err(e);
        }

        Ok(Box::new(CpalStream {
            cmd_tx,
            reply_rx,
            thread: Some(thread),
            overruns,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Stop,
    Terminate,
}

/// Handle to the cpal streams living on the `audio-stream` thread
struct CpalStream {
    cmd_tx: Sender<Command>,
    reply_rx: Receiver<BridgeResult<()>>,
    thread: Option<JoinHandle<()>>,
    overruns: Arc<AtomicU64>,
}

impl CpalStream {
    fn request(&mut self, cmd: Command) -> BridgeResult<()> {
        if self.thread.is_none() {
            return Err(BridgeError::Stream("stream already terminated".into()));
        }
        self.cmd_tx
            .send(cmd)
            .map_err(|_| BridgeError::Stream("audio thread is gone".into()))?;
        self.reply_rx
            .recv()
            .map_err(|_| BridgeError::Stream("audio thread is gone".into()))?
    }
}

impl AudioStream for CpalStream {
    fn start(&mut self) -> BridgeResult<()> {
        self.request(Command::Start)
    }

    fn stop(&mut self) -> BridgeResult<()> {
        self.request(Command::Stop)
    }

    fn terminate(&mut self) -> BridgeResult<()> {
        if self.thread.is_none() {
            return Ok(());
        }
        let result = self.request(Command::Terminate);
        if let Some(h) = self.thread.take() {
            if h.join().is_err() {
                return Err(BridgeError::Stream("audio thread panicked".into()));
            }
        }
        result
    }

    fn output_overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        if let Err(e) = self.terminate() {
            tracing::error!(error = %e, "Failed to release cpal stream");
        }
    }
}

/// Capture stream plus optional playback stream
struct CpalStreams {
    input: Stream,
    output: Option<Stream>,
}

impl CpalStreams {
    fn play(&self) -> BridgeResult<()> {
        // Output first so pass-through bytes have a consumer
        if let Some(output) = &self.output {
            output
                .play()
                .map_err(|e| BridgeError::Stream(format!("output play failed: {}", e)))?;
        }
        self.input
            .play()
            .map_err(|e| BridgeError::Stream(format!("input play failed: {}", e)))
    }

    fn pause(&self) -> BridgeResult<()> {
        self.input
            .pause()
            .map_err(|e| BridgeError::Stream(format!("input pause failed: {}", e)))?;
        if let Some(output) = &self.output {
            output
                .pause()
                .map_err(|e| BridgeError::Stream(format!("output pause failed: {}", e)))?;
        }
        Ok(())
    }
}

/// Body of the `audio-stream` thread
fn stream_owner(
    params: StreamParams,
    handler: FrameHandler,
    overruns: Arc<AtomicU64>,
    cmd_rx: Receiver<Command>,
    reply_tx: Sender<BridgeResult<()>>,
) {
    let streams = match build_streams(params, handler, overruns) {
        Ok(streams) => {
            let _ = reply_tx.send(Ok(()));
            streams
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to open cpal stream");
            let _ = reply_tx.send(Err(e));
            return;
        }
    };

    while let Ok(cmd) = cmd_rx.recv() {
        let result = match cmd {
            Command::Start => streams.play(),
            Command::Stop => streams.pause(),
            Command::Terminate => break,
        };
        let _ = reply_tx.send(result);
    }

    // Dropping the streams closes the devices and releases the handler
    drop(streams);
    let _ = reply_tx.send(Ok(()));
    tracing::debug!("cpal streams released");
}

fn build_streams(
    params: StreamParams,
    handler: FrameHandler,
    overruns: Arc<AtomicU64>,
) -> BridgeResult<CpalStreams> {
    let host = cpal::default_host();
    let input_device = host
        .default_input_device()
        .ok_or_else(|| BridgeError::DeviceOpen("no default input device".into()))?;

    tracing::info!(
        device = %input_device.name().unwrap_or_else(|_| "Unknown".to_string()),
        "Opening cpal input stream"
    );

    let config = StreamConfig {
        channels: params.channels,
        sample_rate: SampleRate(params.sample_rate),
        buffer_size: cpal::BufferSize::Fixed(params.frame_size as u32),
    };

    let frame_bytes = params.frame_size * params.channels as usize * params.sample_width;
    let (queue, consumer) = if params.output {
        let ring = HeapRb::<u8>::new(frame_bytes * RING_FRAMES);
        let (producer, c) = ring.split();
        (Some(OutputQueue { producer, overruns }), Some(c))
    } else {
        (None, None)
    };

    let input = match params.sample_width {
        1 => build_input::<i8>(&input_device, &config, params, handler, queue)?,
        2 => build_input::<i16>(&input_device, &config, params, handler, queue)?,
        3 | 4 => build_input::<i32>(&input_device, &config, params, handler, queue)?,
        w => return Err(BridgeError::UnsupportedSampleWidth(w)),
    };

    let output = match consumer {
        Some(consumer) => {
            let output_device = host
                .default_output_device()
                .ok_or_else(|| BridgeError::DeviceOpen("no default output device".into()))?;
            let stream = match params.sample_width {
                1 => build_output::<i8>(&output_device, &config, params, consumer)?,
                2 => build_output::<i16>(&output_device, &config, params, consumer)?,
                _ => build_output::<i32>(&output_device, &config, params, consumer)?,
            };
            Some(stream)
        }
        None => None,
    };

    let streams = CpalStreams { input, output };
    // Some hosts start streams on creation; the bridge expects them stopped
    if let Err(e) = streams.pause() {
        tracing::debug!(error = %e, "Initial pause not supported");
    }
    Ok(streams)
}

/// Producer side of the pass-through ring plus its overrun counter
struct OutputQueue {
    producer: HeapProd<u8>,
    overruns: Arc<AtomicU64>,
}

impl OutputQueue {
    /// Queue one frame for playback, or count an overrun when it does not fit
    ///
    /// Whole frames only, so the output side stays sample-aligned.
    fn push_frame(&mut self, bytes: &[u8]) {
        if self.producer.vacant_len() >= bytes.len() {
            self.producer.push_slice(bytes);
        } else {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Seconds from `earlier` to `later` on the stream clock, 0 if out of order
fn secs_between(later: &StreamInstant, earlier: &StreamInstant) -> f64 {
    later
        .duration_since(earlier)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn build_input<T: WireSample>(
    device: &Device,
    config: &StreamConfig,
    params: StreamParams,
    mut handler: FrameHandler,
    mut queue: Option<OutputQueue>,
) -> BridgeResult<Stream> {
    let width = params.sample_width;
    let channels = params.channels as usize;
    let frame_bytes = params.frame_size * channels * width;

    let mut raw: Vec<u8> = Vec::with_capacity(frame_bytes);
    let mut out: Vec<u8> = Vec::with_capacity(if queue.is_some() { frame_bytes } else { 0 });
    let mut no_output: [u8; 0] = [];
    let mut clock_base: Option<StreamInstant> = None;
    let mut complete = false;

    device
        .build_input_stream(
            config,
            move |data: &[T], info: &cpal::InputCallbackInfo| {
                if complete {
                    return;
                }

                let ts = info.timestamp();
                let base = *clock_base.get_or_insert(ts.capture);
                let timing = TimingInfo {
                    current_time: secs_between(&ts.callback, &base),
                    input_adc_time: secs_between(&ts.capture, &base),
                };

                raw.resize(data.len() * width, 0);
                for (sample, bytes) in data.iter().zip(raw.chunks_exact_mut(width)) {
                    sample.write_le(bytes);
                }

                let event = FrameEvent {
                    input: &raw,
                    frame_count: data.len() / channels,
                    timing,
                };

                let signal = match queue.as_mut() {
                    Some(queue) => {
                        out.resize(raw.len(), 0);
                        let signal = handler(&event, &mut out[..]);
                        queue.push_frame(&out);
                        signal
                    }
                    None => handler(&event, &mut no_output[..]),
                };
                complete = signal == FrameSignal::Complete;
            },
            move |err| {
                tracing::error!("Input stream error: {}", err);
            },
            None,
        )
        .map_err(|e| BridgeError::DeviceOpen(format!("input stream: {}", e)))
}

fn build_output<T: WireSample>(
    device: &Device,
    config: &StreamConfig,
    params: StreamParams,
    mut consumer: HeapCons<u8>,
) -> BridgeResult<Stream> {
    let width = params.sample_width;
    let mut bytes: Vec<u8> =
        Vec::with_capacity(params.frame_size * params.channels as usize * width);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                bytes.resize(data.len() * width, 0);

                let available = consumer.occupied_len() / width * width;
                let len = bytes.len();
                let read = consumer.pop_slice(&mut bytes[..available.min(len)]);
                // Underrun: pad with silence
                bytes[read..].fill(0);

                for (sample, chunk) in data.iter_mut().zip(bytes.chunks_exact(width)) {
                    *sample = T::read_le(chunk);
                }
            },
            move |err| {
                tracing::error!("Output stream error: {}", err);
            },
            None,
        )
        .map_err(|e| BridgeError::DeviceOpen(format!("output stream: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i16_wire_round_trip() {
        let mut bytes = [0u8; 2];
        (-12345i16).write_le(&mut bytes);
        assert_eq!(bytes, (-12345i16).to_le_bytes());
        assert_eq!(i16::read_le(&bytes), -12345);
    }

    #[test]
    fn test_i8_wire_round_trip() {
        let mut bytes = [0u8; 1];
        (-100i8).write_le(&mut bytes);
        assert_eq!(i8::read_le(&bytes), -100);
    }

    #[test]
    fn test_i32_carries_24bit() {
        let mut bytes = [0u8; 3];
        // 24-bit value 0x123456 left-aligned in i32
        0x1234_5600i32.write_le(&mut bytes);
        assert_eq!(bytes, [0x56, 0x34, 0x12]);
        assert_eq!(i32::read_le(&bytes), 0x1234_5600);

        (-256i32).write_le(&mut bytes);
        assert_eq!(bytes, [0xFF, 0xFF, 0xFF]);
        assert_eq!(i32::read_le(&bytes), -256);
    }

    #[test]
    fn test_i32_full_width() {
        let mut bytes = [0u8; 4];
        i32::MIN.write_le(&mut bytes);
        assert_eq!(i32::read_le(&bytes), i32::MIN);
    }

    #[test]
    fn test_full_output_ring_counts_overrun() {
        let (producer, mut consumer) = HeapRb::<u8>::new(8).split();
        let overruns = Arc::new(AtomicU64::new(0));
        let mut queue = OutputQueue {
            producer,
            overruns: Arc::clone(&overruns),
        };

        queue.push_frame(&[1, 2, 3, 4]);
        queue.push_frame(&[5, 6, 7, 8]);
        queue.push_frame(&[9, 10, 11, 12]);
        assert_eq!(overruns.load(Ordering::Relaxed), 1);

        // Nothing partial was written
        let mut played = [0u8; 8];
        assert_eq!(consumer.pop_slice(&mut played), 8);
        assert_eq!(played, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(consumer.occupied_len(), 0);

        queue.push_frame(&[9, 10, 11, 12]);
        assert_eq!(overruns.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_open_without_device_does_not_panic() {
        // CI machines usually have no audio device; either outcome is fine
        let params = StreamParams {
            sample_rate: 22050,
            frame_size: 256,
            channels: 1,
            sample_width: 2,
            input: true,
            output: false,
        };
        let handler: FrameHandler = Box::new(|_: &FrameEvent<'_>, _: &mut [u8]| FrameSignal::Continue);
        match CpalBackend::new().open_stream(params, handler) {
            Ok(mut stream) => {
                stream.terminate().unwrap();
            }
            Err(e) => println!("No audio device available: {}", e),
        }
    }
}
