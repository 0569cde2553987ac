//! Error types shared by the codec, the bridge and the stream backends

use crate::audio::bridge::StreamState;
use thiserror::Error;

/// Errors that can occur while bridging an audio stream
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to open audio stream: {0}")]
    DeviceOpen(String),

    #[error("Cannot {operation} while stream is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: StreamState,
    },

    #[error("Buffer length {len} is not a multiple of sample width {width}")]
    InvalidBufferLength { len: usize, width: usize },

    #[error("Unsupported sample width: {0} bytes")]
    UnsupportedSampleWidth(usize),

    #[error("Invalid stream configuration: {0}")]
    InvalidConfig(String),

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("DSP callback failed: {0}")]
    Callback(String),
}

/// Result alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
