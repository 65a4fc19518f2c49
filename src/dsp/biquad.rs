use std::f32::consts::PI;

/// Normalised biquad coefficients (a0 == 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoeffs {
    /// Unity pass-through
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// RBJ cookbook bandpass, constant 0 dB peak gain
    pub fn bandpass(center_hz: f32, sample_rate: f32, q: f32) -> Self {
        let omega = 2.0 * PI * center_hz / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q.max(1e-3));
        let a0 = 1.0 + alpha;

        Self {
            b0: alpha / a0,
            b1: 0.0,
            b2: -alpha / a0,
            a1: -2.0 * cos_omega / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Resonant stereo bandpass built from output recursion only.
///
/// `z1`/`z2` hold the two previous outputs per channel; no input history is
/// kept. Coefficients are only recomputed by [`retune`](Self::retune) once the
/// centre frequency has moved further than the hysteresis step.
#[derive(Debug, Clone)]
pub struct BiquadBandpass {
    coeffs: BiquadCoeffs,
    z1: [f32; 2],
    z2: [f32; 2],
    tuned_freq: f32,
    tuned_q: f32,
}

impl BiquadBandpass {
    pub fn new() -> Self {
        Self {
            coeffs: BiquadCoeffs::IDENTITY,
            z1: [0.0; 2],
            z2: [0.0; 2],
            tuned_freq: 0.0,
            tuned_q: 0.0,
        }
    }

    pub fn coeffs(&self) -> BiquadCoeffs {
        self.coeffs
    }

    /// Recompute coefficients when `freq` drifts more than `min_step` Hz from
    /// the last tuned value, or when Q changed. Returns true if it recomputed.
    pub fn retune(&mut self, freq: f32, q: f32, sample_rate: f32, min_step: f32) -> bool {
        if (freq - self.tuned_freq).abs() <= min_step && q == self.tuned_q {
            return false;
        }
        self.coeffs = BiquadCoeffs::bandpass(freq, sample_rate, q);
        self.tuned_freq = freq;
        self.tuned_q = q;
        true
    }

    #[inline]
    pub fn process(&mut self, input: f32, channel: usize) -> f32 {
        let ch = channel.min(1);
        let c = &self.coeffs;
        let z1 = self.z1[ch];
        let z2 = self.z2[ch];
        let out = c.b0 * input + c.b1 * z1 + c.b2 * z2 - c.a1 * z1 - c.a2 * z2;
        self.z2[ch] = z1;
        self.z1[ch] = out;
        out
    }

    /// Clear history and force the next `retune` to recompute
    pub fn reset(&mut self) {
        self.z1 = [0.0; 2];
        self.z2 = [0.0; 2];
        self.coeffs = BiquadCoeffs::IDENTITY;
        self.tuned_freq = 0.0;
        self.tuned_q = 0.0;
    }

    pub fn is_clear(&self) -> bool {
        self.z1 == [0.0; 2] && self.z2 == [0.0; 2]
    }
}

impl Default for BiquadBandpass {
    fn default() -> Self {
        Self::new()
    }
}
