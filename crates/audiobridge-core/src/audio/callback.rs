//! User DSP callback contract
//!
//! The callback receives one decoded frame of interleaved samples, the
//! stream sample rate and the configured extra parameters. Returning
//! `Ok(None)` leaves the captured audio untouched; `Ok(Some(buffer))`
//! replaces it for playback and must have the same length as the input.

use crate::config::ExtraParams;

/// Result returned by a DSP callback
pub type CallbackResult = anyhow::Result<Option<Vec<f32>>>;

/// A user-supplied DSP routine invoked once per admitted frame
///
/// Runs on the audio thread. Slow callbacks raise the measured input latency
/// of the following frames, which makes the drop policy kick in sooner.
///
/// # Panics
///
/// A panic is caught at the frame boundary and reported as a
/// `CallbackFailed` event, but the process-wide panic hook still runs first,
/// on the audio thread. The default hook writes the message (and possibly a
/// backtrace) to stderr. Prefer returning `Err`; hosts that must tolerate
/// panicking callbacks should install a quiet hook with
/// [`std::panic::set_hook`] before starting the stream.
pub trait DspCallback: Send + 'static {
    fn process(&mut self, samples: &[f32], sample_rate: u32, params: &ExtraParams) -> CallbackResult;
}

impl<F> DspCallback for F
where
    F: FnMut(&[f32], u32, &ExtraParams) -> CallbackResult + Send + 'static,
{
    fn process(&mut self, samples: &[f32], sample_rate: u32, params: &ExtraParams) -> CallbackResult {
        self(samples, sample_rate, params)
    }
}

/// Human-readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gain(f32);

    impl DspCallback for Gain {
        fn process(&mut self, samples: &[f32], _: u32, _: &ExtraParams) -> CallbackResult {
            Ok(Some(samples.iter().map(|s| s * self.0).collect()))
        }
    }

    #[test]
    fn test_struct_callback() {
        let mut gain = Gain(2.0);
        let out = gain.process(&[0.25, -0.5], 22050, &ExtraParams::new()).unwrap();
        assert_eq!(out, Some(vec![0.5, -1.0]));
    }

    #[test]
    fn test_closure_callback_sees_params() {
        let mut cb = |_: &[f32], sr: u32, params: &ExtraParams| -> CallbackResult {
            let gain = params.get_f64("gain").unwrap_or(1.0);
            Ok(Some(vec![sr as f32, gain as f32]))
        };
        let params = ExtraParams::new().with("gain", 0.5);
        let out = DspCallback::process(&mut cb, &[0.0], 44100, &params).unwrap();
        assert_eq!(out, Some(vec![44100.0, 0.5]));
    }

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("bad frame")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "bad frame");

        let payload = std::panic::catch_unwind(|| panic!("{} samples", 3)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "3 samples");
    }
}
