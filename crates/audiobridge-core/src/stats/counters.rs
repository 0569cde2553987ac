//! Per-bridge frame counters
//!
//! Written from the audio thread with relaxed atomics, read from any thread
//! through [`BridgeStats::snapshot`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters updated by the frame handler
#[derive(Debug, Default)]
pub struct BridgeStats {
    frames_admitted: AtomicU64,
    frames_dropped: AtomicU64,
    frames_failed: AtomicU64,
    frames_skipped: AtomicU64,
    frames_inactive: AtomicU64,
    /// Last measured input latency, `f64` bits
    last_latency: AtomicU64,
    /// Largest measured input latency, `f64` bits
    max_latency: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`]
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// When the snapshot was taken
    pub captured_at: DateTime<Utc>,
    /// Frames handed to the DSP callback
    pub frames_admitted: u64,
    /// Frames discarded by the latency policy
    pub frames_dropped: u64,
    /// Admitted frames whose callback failed
    pub frames_failed: u64,
    /// Frames passed through because the callback was busy elsewhere
    pub frames_skipped: u64,
    /// Frames delivered while the bridge was not started
    pub frames_inactive: u64,
    /// Events lost to a full event queue
    pub events_dropped: u64,
    /// Processed frames the playback side had no room for
    pub output_overruns: u64,
    /// Last measured input latency in seconds
    pub last_input_latency: f64,
    /// Largest measured input latency in seconds
    pub max_input_latency: f64,
}

impl StatsSnapshot {
    /// Fraction of latency-checked frames that were dropped (0.0 to 1.0)
    pub fn drop_ratio(&self) -> f64 {
        let seen = self.frames_admitted + self.frames_dropped;
        if seen == 0 {
            0.0
        } else {
            self.frames_dropped as f64 / seen as f64
        }
    }
}

impl BridgeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_admitted(&self) {
        self.frames_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.frames_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.frames_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inactive(&self) {
        self.frames_inactive.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the input latency of a frame in seconds
    pub fn record_latency(&self, seconds: f64) {
        self.last_latency.store(seconds.to_bits(), Ordering::Relaxed);
        // Single writer (the audio thread), so load-compare-store is enough
        let max = f64::from_bits(self.max_latency.load(Ordering::Relaxed));
        if seconds > max {
            self.max_latency.store(seconds.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn frames_admitted(&self) -> u64 {
        self.frames_admitted.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    pub fn frames_failed(&self) -> u64 {
        self.frames_failed.load(Ordering::Relaxed)
    }

    /// Copy all counters; `events_dropped` comes from the event emitter and
    /// `output_overruns` from the stream backend
    pub fn snapshot(&self, events_dropped: u64, output_overruns: u64) -> StatsSnapshot {
        StatsSnapshot {
            captured_at: Utc::now(),
            frames_admitted: self.frames_admitted.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            frames_failed: self.frames_failed.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            frames_inactive: self.frames_inactive.load(Ordering::Relaxed),
            events_dropped,
            output_overruns,
            last_input_latency: f64::from_bits(self.last_latency.load(Ordering::Relaxed)),
            max_input_latency: f64::from_bits(self.max_latency.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_creation() {
        let stats = BridgeStats::new();
        let snap = stats.snapshot(0, 0);
        assert_eq!(snap.frames_admitted, 0);
        assert_eq!(snap.frames_dropped, 0);
        assert_eq!(snap.last_input_latency, 0.0);
        assert_eq!(snap.drop_ratio(), 0.0);
    }

    #[test]
    fn test_counters() {
        let stats = BridgeStats::new();
        stats.record_admitted();
        stats.record_admitted();
        stats.record_admitted();
        stats.record_dropped();
        stats.record_failed();
        stats.record_skipped();
        stats.record_inactive();

        let snap = stats.snapshot(2, 5);
        assert_eq!(snap.frames_admitted, 3);
        assert_eq!(snap.frames_dropped, 1);
        assert_eq!(snap.frames_failed, 1);
        assert_eq!(snap.frames_skipped, 1);
        assert_eq!(snap.frames_inactive, 1);
        assert_eq!(snap.events_dropped, 2);
        assert_eq!(snap.output_overruns, 5);
        assert!((snap.drop_ratio() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_latency_tracking() {
        let stats = BridgeStats::new();
        stats.record_latency(0.01);
        stats.record_latency(0.06);
        stats.record_latency(0.02);

        let snap = stats.snapshot(0, 0);
        assert_eq!(snap.last_input_latency, 0.02);
        assert_eq!(snap.max_input_latency, 0.06);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = BridgeStats::new();
        stats.record_dropped();
        let json = serde_json::to_value(stats.snapshot(0, 0)).unwrap();
        assert_eq!(json["frames_dropped"], 1);
        assert!(json["captured_at"].is_string());
    }
}
