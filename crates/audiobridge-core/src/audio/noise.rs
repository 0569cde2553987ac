//! Deterministic Gaussian noise for exercising DSP callbacks without hardware

/// Default seed for [`NoiseSource::new`]
pub const DEFAULT_SEED: u64 = 0xDEADBEEF;

/// Standard-normal noise generator
///
/// A 64-bit LCG feeds a Box-Muller transform. The same seed always yields
/// the same sequence, so callback tests are reproducible.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    state: u64,
    spare: Option<f32>,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        Self { state: seed, spare: None }
    }

    /// Uniform sample in (0.0, 1.0]
    fn next_uniform(&mut self) -> f64 {
        // LCG parameters from Knuth's MMIX
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 11) as f64 + 1.0) / (1u64 << 53) as f64
    }

    /// Next standard-normal sample (mean 0, variance 1)
    pub fn next_sample(&mut self) -> f32 {
        if let Some(z) = self.spare.take() {
            return z;
        }

        let u1 = self.next_uniform();
        let u2 = self.next_uniform();
        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;

        self.spare = Some((radius * theta.sin()) as f32);
        (radius * theta.cos()) as f32
    }

    /// Fresh buffer of `len` samples
    pub fn buffer(&mut self, len: usize) -> Vec<f32> {
        (0..len).map(|_| self.next_sample()).collect()
    }
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
