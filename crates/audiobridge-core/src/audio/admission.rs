//! Latency-based frame admission
//!
//! A frame is dropped when the time between its capture and its delivery
//! already exceeds one frame period, measured in samples:
//!
//! ```text
//! drop  <=>  input_latency * sample_rate > frame_size
//! ```
//!
//! Under sustained overload this sheds late frames instead of letting the
//! backlog grow. Dropped frames still flow to the output unmodified.

/// Decision for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Drop,
}

/// Frame admission policy for one stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmissionPolicy {
    enabled: bool,
    sample_rate: f64,
    frame_size: f64,
}

impl AdmissionPolicy {
    /// # Example
    /// ```
    /// use audiobridge_core::audio::admission::{Admission, AdmissionPolicy};
    ///
    /// let policy = AdmissionPolicy::new(true, 22050, 1024);
    /// assert_eq!(policy.check(0.06), Admission::Drop);
    /// assert_eq!(policy.check(0.01), Admission::Admit);
    /// ```
    pub fn new(enabled: bool, sample_rate: u32, frame_size: usize) -> Self {
        Self {
            enabled,
            sample_rate: sample_rate as f64,
            frame_size: frame_size as f64,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Latency in seconds above which frames are dropped
    pub fn budget_secs(&self) -> f64 {
        self.frame_size / self.sample_rate
    }

    /// Decide whether a frame with the given input latency (seconds) runs the callback
    pub fn check(&self, input_latency: f64) -> Admission {
        if self.enabled && input_latency * self.sample_rate > self.frame_size {
            Admission::Drop
        } else {
            Admission::Admit
        }
    }
}
