//! Audio stream capability consumed by the bridge
//!
//! A backend opens a stream in the stopped state and registers a
//! [`FrameHandler`]. While started, it calls the handler once per hardware
//! buffer from its real-time context, one call at a time.

use crate::error::BridgeResult;

/// Timing metadata attached to a frame, in seconds on the stream clock
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimingInfo {
    /// Stream time at which the handler was invoked
    pub current_time: f64,
    /// Stream time at which the first input sample was captured by the ADC
    pub input_adc_time: f64,
}

impl TimingInfo {
    /// Timing for a frame delivered `latency` seconds after capture
    pub fn with_latency(latency: f64) -> Self {
        Self {
            current_time: latency,
            input_adc_time: 0.0,
        }
    }

    /// Seconds between capture and delivery
    pub fn input_latency(&self) -> f64 {
        self.current_time - self.input_adc_time
    }
}

/// One hardware buffer handed to the frame handler
#[derive(Debug, Clone, Copy)]
pub struct FrameEvent<'a> {
    /// Raw interleaved little-endian PCM
    pub input: &'a [u8],
    /// Sample frames (per channel) contained in `input`
    pub frame_count: usize,
    pub timing: TimingInfo,
}

/// Whether the backend should keep delivering frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSignal {
    Continue,
    Complete,
}

/// Frame handler registered with a backend
///
/// The output slice is the same length as `input` when the stream plays
/// audio back and empty for capture-only streams.
pub type FrameHandler = Box<dyn FnMut(&FrameEvent<'_>, &mut [u8]) -> FrameSignal + Send + 'static>;

/// Parameters for opening a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    pub sample_rate: u32,
    /// Sample frames per hardware buffer
    pub frame_size: usize,
    pub channels: u16,
    /// Bytes per sample, little-endian signed
    pub sample_width: usize,
    pub input: bool,
    pub output: bool,
}

/// Something that can open audio streams
pub trait AudioBackend {
    /// Open a stream in the stopped state with `handler` registered
    ///
    /// # Errors
    /// [`BridgeError::DeviceOpen`](crate::error::BridgeError::DeviceOpen) when
    /// no compatible stream can be opened
    fn open_stream(
        &self,
        params: StreamParams,
        handler: FrameHandler,
    ) -> BridgeResult<Box<dyn AudioStream>>;
}

/// Control surface of an open stream
pub trait AudioStream: Send {
    fn start(&mut self) -> BridgeResult<()>;

    fn stop(&mut self) -> BridgeResult<()>;

    /// Release the hardware session; the handler is dropped
    fn terminate(&mut self) -> BridgeResult<()>;

    /// Output frames discarded because the playback side fell behind
    fn output_overruns(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_latency() {
        let timing = TimingInfo {
            current_time: 10.25,
            input_adc_time: 10.20,
        };
        assert!((timing.input_latency() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_with_latency() {
        assert_eq!(TimingInfo::with_latency(0.06).input_latency(), 0.06);
    }
}
