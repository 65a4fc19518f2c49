pub mod allpass;
pub mod biquad;
pub mod comb;

pub use allpass::AllpassFilter;
pub use biquad::{BiquadBandpass, BiquadCoeffs};
pub use comb::CombFilter;

/// One-pole smoothing coefficient `exp(-1 / (seconds * sample_rate))`
#[inline]
pub fn time_constant_coef(seconds: f32, sample_rate: f32) -> f32 {
    (-1.0 / (seconds * sample_rate)).exp()
}

/// Soft limiter shared by the drive stages: magnitudes above `knee` are
/// compressed by `slope` and capped at `ceiling`.
#[inline]
pub fn soft_limit(x: f32, knee: f32, slope: f32, ceiling: f32) -> f32 {
    let mag = x.abs();
    if mag > knee {
        let limited = (knee + (mag - knee) * slope).min(ceiling);
        limited.copysign(x)
    } else {
        x
    }
}
