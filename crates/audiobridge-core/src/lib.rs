//! Audiobridge Core - real-time audio callback engine
//!
//! This library bridges a live audio input/output stream to a user-supplied
//! DSP callback. Every hardware frame is checked against a latency budget,
//! decoded from fixed-width PCM into normalized floats, handed to the
//! callback, and optionally re-encoded for pass-through playback.

pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod stats;

pub use audio::bridge::{AudioBridge, BridgeBuilder, StreamState};
pub use audio::callback::{CallbackResult, DspCallback};
pub use audio::codec::SampleCodec;
pub use audio::cpal_backend::CpalBackend;
pub use audio::mock::MockBackend;
pub use config::{ExtraParams, ParamValue, StreamConfig};
pub use error::BridgeError;
pub use events::{BridgeEvent, EventKind, EventSink, TracingSink};
pub use stats::counters::{BridgeStats, StatsSnapshot};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date stamped by build.rs
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

/// Default number of samples per callback frame
pub const DEFAULT_FRAME_SIZE: usize = 1024;

/// Default sample width in bytes (16-bit PCM)
pub const DEFAULT_SAMPLE_WIDTH: usize = 2;
