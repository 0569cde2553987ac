//! Audiobridge - real-time audio callback bridge
//!
//! This library re-exports the callback engine, sample codec and backends
//! from `audiobridge-core`, plus the [`meter::LevelMeter`] callback used by
//! the command-line tool.

pub mod meter;

pub use audiobridge_core::audio;
pub use audiobridge_core::config;
pub use audiobridge_core::events;
pub use audiobridge_core::stats;

pub use audiobridge_core::{
    AudioBridge, BridgeBuilder, BridgeError, BridgeEvent, CallbackResult, CpalBackend,
    DspCallback, EventKind, EventSink, ExtraParams, MockBackend, ParamValue, SampleCodec,
    StatsSnapshot, StreamConfig, StreamState, TracingSink,
};
pub use audiobridge_core::{
    DEFAULT_FRAME_SIZE, DEFAULT_SAMPLE_RATE, DEFAULT_SAMPLE_WIDTH, VERSION,
};
