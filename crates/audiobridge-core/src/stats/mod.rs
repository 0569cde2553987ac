//! Statistics module
//!
//! Lock-free counters shared with the frame handler.

pub mod counters;
