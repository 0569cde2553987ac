//! Fixed-point PCM <-> normalized float conversion
//!
//! Samples travel over the device boundary as little-endian signed integers
//! of 1 to 4 bytes. The DSP side sees `f32` values scaled by
//! `1 / 2^(8 * width - 1)`, so full scale maps to `[-1.0, 1.0)`.

use crate::error::{BridgeError, BridgeResult};
use std::ops::RangeInclusive;

/// Sample widths (in bytes) the codec can pack and unpack
pub const SUPPORTED_WIDTHS: RangeInclusive<usize> = 1..=4;

/// Stateless PCM codec for a single sample width
///
/// # Example
/// ```
/// use audiobridge_core::audio::codec::SampleCodec;
///
/// let codec = SampleCodec::new(2).unwrap();
/// let samples = codec.decode(&[0x00, 0x40, 0x00, 0xC0]).unwrap();
/// assert_eq!(samples, vec![0.5, -0.5]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleCodec {
    width: usize,
    scale: f64,
}

impl SampleCodec {
    /// Create a codec for samples of `width` bytes
    ///
    /// # Errors
    /// [`BridgeError::UnsupportedSampleWidth`] when `width` is outside 1..=4
    pub fn new(width: usize) -> BridgeResult<Self> {
        if !SUPPORTED_WIDTHS.contains(&width) {
            return Err(BridgeError::UnsupportedSampleWidth(width));
        }

        Ok(Self {
            width,
            scale: 1.0 / (1u64 << (8 * width - 1)) as f64,
        })
    }

    /// Sample width in bytes
    pub fn width(&self) -> usize {
        self.width
    }

    /// Multiplier applied to integer samples on decode
    pub fn scale(&self) -> f32 {
        self.scale as f32
    }

    /// Wire format descriptor, e.g. `<i2` for 16-bit little-endian
    pub fn format(&self) -> String {
        format!("<i{}", self.width)
    }

    /// Largest representable integer sample
    pub fn max_value(&self) -> i32 {
        ((1i64 << (8 * self.width - 1)) - 1) as i32
    }

    /// Smallest representable integer sample
    pub fn min_value(&self) -> i32 {
        (-(1i64 << (8 * self.width - 1))) as i32
    }

    /// Decode raw little-endian PCM into a fresh sample buffer
    pub fn decode(&self, raw: &[u8]) -> BridgeResult<Vec<f32>> {
        let mut out = Vec::with_capacity(raw.len() / self.width);
        self.decode_into(raw, &mut out)?;
        Ok(out)
    }

    /// Decode into a caller-owned buffer, replacing its contents
    ///
    /// Does not allocate when `out` already has enough capacity.
    pub fn decode_into(&self, raw: &[u8], out: &mut Vec<f32>) -> BridgeResult<()> {
        self.check_len(raw.len())?;

        out.clear();
        out.extend(
            raw.chunks_exact(self.width)
                .map(|bytes| (read_int(bytes) as f64 * self.scale) as f32),
        );
        Ok(())
    }

    /// Encode samples into fresh little-endian PCM, saturating out-of-range values
    pub fn encode(&self, samples: &[f32]) -> Vec<u8> {
        let mut out = vec![0u8; samples.len() * self.width];
        for (sample, bytes) in samples.iter().zip(out.chunks_exact_mut(self.width)) {
            write_int(self.quantize(*sample), bytes);
        }
        out
    }

    /// Encode into a caller-owned byte buffer of exactly `samples.len() * width` bytes
    pub fn encode_into(&self, samples: &[f32], out: &mut [u8]) -> BridgeResult<()> {
        if out.len() != samples.len() * self.width {
            return Err(BridgeError::InvalidBufferLength {
                len: out.len(),
                width: self.width,
            });
        }

        for (sample, bytes) in samples.iter().zip(out.chunks_exact_mut(self.width)) {
            write_int(self.quantize(*sample), bytes);
        }
        Ok(())
    }

    /// Map a float sample to the nearest representable integer
    fn quantize(&self, sample: f32) -> i32 {
        let value = (sample as f64 / self.scale).round();
        // NaN survives clamp and casts to 0
        value.clamp(self.min_value() as f64, self.max_value() as f64) as i32
    }

    fn check_len(&self, len: usize) -> BridgeResult<()> {
        if len % self.width != 0 {
            return Err(BridgeError::InvalidBufferLength {
                len,
                width: self.width,
            });
        }
        Ok(())
    }
}

/// Sign-extend a 1-4 byte little-endian integer
fn read_int(bytes: &[u8]) -> i32 {
    let n = bytes.len();
    let mut buf = [0u8; 4];
    buf[4 - n..].copy_from_slice(bytes);
    i32::from_le_bytes(buf) >> (8 * (4 - n))
}

/// Write the low `bytes.len()` bytes of `value` in little-endian order
fn write_int(value: i32, bytes: &mut [u8]) {
    let n = bytes.len();
    bytes.copy_from_slice(&value.to_le_bytes()[..n]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_scale_per_width() {
        assert_eq!(SampleCodec::new(1).unwrap().scale(), 1.0 / 128.0);
        assert_eq!(SampleCodec::new(2).unwrap().scale(), 1.0 / 32768.0);
        assert_eq!(SampleCodec::new(3).unwrap().scale(), 1.0 / 8388608.0);
        assert_eq!(SampleCodec::new(4).unwrap().scale(), 1.0 / 2147483648.0);
    }

    #[test]
    fn test_unsupported_width() {
        assert!(matches!(
            SampleCodec::new(0),
            Err(BridgeError::UnsupportedSampleWidth(0))
        ));
        assert!(matches!(
            SampleCodec::new(5),
            Err(BridgeError::UnsupportedSampleWidth(5))
        ));
    }

    #[test]
    fn test_format_string() {
        assert_eq!(SampleCodec::new(2).unwrap().format(), "<i2");
        assert_eq!(SampleCodec::new(3).unwrap().format(), "<i3");
    }

    #[test]
    fn test_integer_range() {
        let codec = SampleCodec::new(3).unwrap();
        assert_eq!(codec.max_value(), 8388607);
        assert_eq!(codec.min_value(), -8388608);

        let codec = SampleCodec::new(4).unwrap();
        assert_eq!(codec.max_value(), i32::MAX);
        assert_eq!(codec.min_value(), i32::MIN);
    }

    #[test]
    fn test_decode_16bit() {
        let codec = SampleCodec::new(2).unwrap();
        let raw = [0x00, 0x00, 0xFF, 0x7F, 0x00, 0x80, 0xFF, 0xFF];
        let samples = codec.decode(&raw).unwrap();

        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0.0);
        assert_abs_diff_eq!(samples[1], 32767.0 / 32768.0);
        assert_eq!(samples[2], -1.0);
        assert_abs_diff_eq!(samples[3], -1.0 / 32768.0);
    }

    #[test]
    fn test_decode_24bit_sign_extension() {
        let codec = SampleCodec::new(3).unwrap();
        // -1 and the most negative 24-bit value
        let raw = [0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x80];
        let samples = codec.decode(&raw).unwrap();

        assert_abs_diff_eq!(samples[0], -1.0 / 8388608.0);
        assert_eq!(samples[1], -1.0);
    }

    #[test]
    fn test_decode_8bit_is_signed() {
        let codec = SampleCodec::new(1).unwrap();
        let samples = codec.decode(&[0x40, 0xC0, 0x80]).unwrap();
        assert_eq!(samples, vec![0.5, -0.5, -1.0]);
    }

    #[test]
    fn test_decode_rejects_partial_sample() {
        let codec = SampleCodec::new(2).unwrap();
        let result = codec.decode(&[0x00, 0x01, 0x02]);
        assert!(matches!(
            result,
            Err(BridgeError::InvalidBufferLength { len: 3, width: 2 })
        ));
    }

    #[test]
    fn test_decode_empty() {
        let codec = SampleCodec::new(4).unwrap();
        assert!(codec.decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_into_reuses_buffer() {
        let codec = SampleCodec::new(2).unwrap();
        let mut out = Vec::with_capacity(16);
        out.push(9.0);

        codec.decode_into(&[0x00, 0x40], &mut out).unwrap();
        assert_eq!(out, vec![0.5]);
        assert!(out.capacity() >= 16);
    }

    #[test]
    fn test_encode_saturates() {
        for width in SUPPORTED_WIDTHS {
            let codec = SampleCodec::new(width).unwrap();
            let raw = codec.encode(&[1.0, 7.5, -1.0, -3.0]);
            let ints: Vec<i32> = raw.chunks_exact(width).map(read_int).collect();

            assert_eq!(ints[0], codec.max_value(), "width {}", width);
            assert_eq!(ints[1], codec.max_value(), "width {}", width);
            assert_eq!(ints[2], codec.min_value(), "width {}", width);
            assert_eq!(ints[3], codec.min_value(), "width {}", width);
        }
    }

    #[test]
    fn test_encode_nan_is_silence() {
        let codec = SampleCodec::new(2).unwrap();
        assert_eq!(codec.encode(&[f32::NAN]), vec![0, 0]);
    }

    #[test]
    fn test_round_trip_within_one_step() {
        let input: Vec<f32> = (0..200).map(|i| (i as f32 / 100.0) - 1.0).collect();

        for width in SUPPORTED_WIDTHS {
            let codec = SampleCodec::new(width).unwrap();
            let decoded = codec.decode(&codec.encode(&input)).unwrap();

            assert_eq!(decoded.len(), input.len());
            for (a, b) in input.iter().zip(&decoded) {
                assert!(
                    (a - b).abs() <= codec.scale(),
                    "width {}: {} vs {}",
                    width,
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_encode_into_checks_length() {
        let codec = SampleCodec::new(2).unwrap();
        let mut out = [0u8; 3];
        assert!(codec.encode_into(&[0.0, 0.0], &mut out).is_err());

        let mut out = [0u8; 4];
        codec.encode_into(&[0.5, -0.5], &mut out).unwrap();
        assert_eq!(out, [0x00, 0x40, 0x00, 0xC0]);
    }

    #[test]
    fn test_read_write_int() {
        let mut bytes = [0u8; 3];
        write_int(-2, &mut bytes);
        assert_eq!(bytes, [0xFE, 0xFF, 0xFF]);
        assert_eq!(read_int(&bytes), -2);
    }
}
