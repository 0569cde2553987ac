//! Audio processing module
//!
//! This module contains the real-time callback engine:
//! - PCM <-> float conversion ([`codec`])
//! - Latency-based frame admission ([`admission`])
//! - The user DSP callback contract ([`callback`])
//! - Stream capability traits implemented by backends ([`stream`])
//! - The bridge that ties them together ([`bridge`])
//! - Backends: cpal hardware ([`cpal_backend`]) and a synthetic one for tests ([`mock`])

pub mod admission;
pub mod bridge;
pub mod callback;
pub mod codec;
pub mod cpal_backend;
pub mod mock;
pub mod noise;
pub mod stream;
