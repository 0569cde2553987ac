//! Stream configuration
//!
//! A [`StreamConfig`] is fixed for the lifetime of a bridge. It can be built
//! in code or loaded from a JSON file; missing fields take the defaults
//! below.

use crate::audio::codec::SUPPORTED_WIDTHS;
use crate::error::{BridgeError, BridgeResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn default_sample_rate() -> u32 {
    crate::DEFAULT_SAMPLE_RATE
}

fn default_frame_size() -> usize {
    crate::DEFAULT_FRAME_SIZE
}

fn default_channels() -> u16 {
    1
}

fn default_sample_width() -> usize {
    crate::DEFAULT_SAMPLE_WIDTH
}

/// A named value forwarded to the DSP callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Extra named parameters handed by reference to every callback invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraParams(BTreeMap<String, ParamValue>);

impl ExtraParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Numeric lookup; integers are widened to `f64`
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.0.get(name)? {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.0.get(name)? {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.0.get(name)? {
            ParamValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Audio stream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Samples per channel delivered to each callback
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
    /// Interleaved channel count
    #[serde(default = "default_channels")]
    pub channels: u16,
    /// Bytes per sample on the wire (1-4)
    #[serde(default = "default_sample_width")]
    pub sample_width: usize,
    /// Play callback output back through the device
    #[serde(default)]
    pub output_enabled: bool,
    /// Skip the callback for frames that arrive later than one frame period
    #[serde(default)]
    pub drop_frames: bool,
    /// Named values forwarded to the callback
    #[serde(default)]
    pub extra_params: ExtraParams,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            frame_size: default_frame_size(),
            channels: default_channels(),
            sample_width: default_sample_width(),
            output_enabled: false,
            drop_frames: false,
            extra_params: ExtraParams::default(),
        }
    }
}

impl StreamConfig {
    /// Check every field before any device is touched
    pub fn validate(&self) -> BridgeResult<()> {
        if self.sample_rate == 0 {
            return Err(BridgeError::InvalidConfig(
                "sample_rate must be positive".into(),
            ));
        }
        if self.frame_size == 0 {
            return Err(BridgeError::InvalidConfig(
                "frame_size must be positive".into(),
            ));
        }
        if self.channels == 0 {
            return Err(BridgeError::InvalidConfig(
                "channels must be positive".into(),
            ));
        }
        if !SUPPORTED_WIDTHS.contains(&self.sample_width) {
            return Err(BridgeError::UnsupportedSampleWidth(self.sample_width));
        }
        Ok(())
    }

    /// Interleaved samples per frame (all channels)
    pub fn samples_per_frame(&self) -> usize {
        self.frame_size * self.channels as usize
    }

    /// Raw bytes per frame on the wire
    pub fn bytes_per_frame(&self) -> usize {
        self.samples_per_frame() * self.sample_width
    }

    /// Real-time deadline of one frame in seconds
    pub fn frame_duration_secs(&self) -> f64 {
        self.frame_size as f64 / self.sample_rate as f64
    }

    /// Load config from disk, falling back to defaults on any error
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Loaded stream config");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from disk, failing on a missing or malformed file
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Stream config saved");
        Ok(())
    }
}
