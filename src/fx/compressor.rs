use std::sync::Arc;

use super::{Effect, EffectKind, ParamId, ParamStore};
use crate::audio::AudioBuffer;
use crate::dsp::{soft_limit, time_constant_coef};

pub const THRESHOLD: f32 = 0.15;
pub const RATIO: f32 = 8.0;
pub const KNEE_WIDTH: f32 = 0.1;
const MAKEUP_GAIN: f32 = 2.5;
const GAIN_SMOOTHING: f32 = 0.001;
const LOW_SHELF_COEF: f32 = 0.03;

/// Soft-knee gain for an envelope level.
///
/// Unity below `threshold - knee`, quadratic knee blend inside the knee,
/// full-ratio dB reduction above `threshold + knee`.
pub fn soft_knee_gain(env: f32, threshold: f32, knee: f32, ratio: f32) -> f32 {
    let over_db = if env > threshold - knee && env < threshold + knee {
        let knee_in = env - threshold + knee;
        let knee_out = knee_in * knee_in / (4.0 * knee);
        20.0 * ((threshold + knee_out) / threshold + 1e-20).log10()
    } else if env >= threshold + knee {
        20.0 * (env / threshold + 1e-20).log10()
    } else {
        return 1.0;
    };
    let reduce_db = over_db - over_db / ratio;
    10.0f32.powf(-reduce_db / 20.0)
}

/// Sustainer-style compressor: peak envelope, soft knee, slow gain smoothing
pub struct Compressor {
    params: Arc<ParamStore>,
    sample_rate: f32,
    // Per-channel state, sized by `ensure_channels`
    env: Vec<f32>,
    // Smoothed gain reduction (1 - gain), zero at rest
    reduction: Vec<f32>,
    low: Vec<f32>,
}

impl Compressor {
    pub fn new(params: Arc<ParamStore>, sample_rate: f32) -> Self {
        Self {
            params,
            sample_rate,
            env: Vec::new(),
            reduction: Vec::new(),
            low: Vec::new(),
        }
    }

    fn ensure_channels(&mut self, channels: usize) {
        if self.env.len() < channels {
            self.env.resize(channels, 0.0);
            self.reduction.resize(channels, 0.0);
            self.low.resize(channels, 0.0);
        }
    }

    pub fn envelope(&self, channel: usize) -> f32 {
        self.env.get(channel).copied().unwrap_or(0.0)
    }

    /// Currently applied (smoothed) gain before makeup
    pub fn smoothed_gain(&self, channel: usize) -> f32 {
        1.0 - self.reduction.get(channel).copied().unwrap_or(0.0)
    }
}

impl Effect for Compressor {
    fn kind(&self) -> EffectKind {
        EffectKind::Compressor
    }

    fn is_enabled(&self) -> bool {
        self.params.is_enabled(EffectKind::Compressor)
    }

    fn prepare(&mut self, sample_rate: f32, channels: usize) {
        self.sample_rate = sample_rate;
        self.ensure_channels(channels);
    }

    fn process(&mut self, buffer: &mut AudioBuffer<'_>) {
        self.ensure_channels(buffer.channels());
        let level = self.params.get(ParamId::CompLevel);
        let tone = self.params.get(ParamId::CompTone);
        let attack_ms = self.params.get(ParamId::CompAttack);
        let sustain_ms = self.params.get(ParamId::CompSustain);

        let attack_sec = attack_ms.max(0.1) / 1000.0;
        let release_sec = sustain_ms.max(10.0) / 1000.0;
        let sustain = sustain_ms / 1000.0;

        // Attack sets the rise time; the release is stretched by sustain
        let attack_coef = time_constant_coef(attack_sec, self.sample_rate);
        let release_coef =
            time_constant_coef(release_sec * (1.0 + sustain * 2.0), self.sample_rate);

        let mid_boost = 1.0 + (1.0 - (tone - 0.5).abs() * 2.0) * 0.3;

        for frame in buffer.frames_mut() {
            for (ch, sample) in frame.iter_mut().enumerate() {
                let x = *sample;
                let mag = x.abs();

                let env = &mut self.env[ch];
                let coef = if mag > *env { attack_coef } else { release_coef };
                *env = coef * *env + (1.0 - coef) * mag;

                let gain = soft_knee_gain(*env, THRESHOLD, KNEE_WIDTH, RATIO);
                let reduction = &mut self.reduction[ch];
                *reduction = *reduction * (1.0 - GAIN_SMOOTHING) + (1.0 - gain) * GAIN_SMOOTHING;

                let mut compressed = x * (1.0 - *reduction) * MAKEUP_GAIN * level;
                compressed += compressed * compressed.abs() * 0.08 * sustain;

                let low = &mut self.low[ch];
                *low += LOW_SHELF_COEF * (compressed - *low);
                let high = compressed - *low;

                let out = *low * (1.0 - tone) * 1.2 + compressed * mid_boost * 0.4 + high * tone * 1.5;
                *sample = soft_limit(out, 0.9, 0.1, 0.98);
            }
        }
    }

    fn reset(&mut self) {
        self.env.fill(0.0);
        self.reduction.fill(0.0);
        self.low.fill(0.0);
    }

    fn is_reset(&self) -> bool {
        self.env.iter().chain(&self.reduction).chain(&self.low).all(|&s| s == 0.0)
    }
}
