use std::f32::consts::TAU;
use std::sync::Arc;

use super::{Effect, EffectKind, ParamId, ParamStore};
use crate::audio::AudioBuffer;
use crate::dsp::{time_constant_coef, BiquadBandpass};

pub const FREQ_MIN: f32 = 200.0;
pub const FREQ_MAX: f32 = 3000.0;
const ENV_SENSITIVITY: f32 = 3.0;
const MANUAL_WEIGHT: f32 = 0.1;
const FREQ_SMOOTHING: f32 = 0.08;
const RETUNE_STEP_HZ: f32 = 1.0;

/// Envelope + LFO driven bandpass wah on the stereo pair
pub struct AutoWah {
    params: Arc<ParamStore>,
    sample_rate: f32,
    filter: BiquadBandpass,
    env: f32,
    lfo_phase: f32,
    smooth_freq: f32,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl AutoWah {
    pub fn new(params: Arc<ParamStore>, sample_rate: f32) -> Self {
        let smooth_freq = params.get(ParamId::WahFreq);
        Self {
            params,
            sample_rate,
            filter: BiquadBandpass::new(),
            env: 0.0,
            lfo_phase: 0.0,
            smooth_freq,
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    pub fn envelope(&self) -> f32 {
        self.env
    }

    /// Smoothed center frequency the filter is tracking
    pub fn center_freq(&self) -> f32 {
        self.smooth_freq
    }

    fn run(&mut self, frames: usize) {
        let manual = self.params.get(ParamId::WahFreq);
        let q = self.params.get(ParamId::WahQ);
        let mix = self.params.get(ParamId::WahMix);
        let lfo_rate = self.params.get(ParamId::WahLfoRate);
        let lfo_depth = self.params.get(ParamId::WahLfoDepth);
        let attack_ms = self.params.get(ParamId::WahAttack);
        let release_ms = self.params.get(ParamId::WahRelease);

        let sr = self.sample_rate;
        let attack_coef = time_constant_coef(attack_ms.max(0.001) * 0.001, sr);
        let release_coef = time_constant_coef(release_ms.max(1.0) * 0.001, sr);
        let lfo_increment = TAU * lfo_rate / sr;
        let lfo_active = lfo_rate > 0.0 && lfo_depth > 0.0;

        for i in 0..frames {
            let in_l = self.left[i];
            let in_r = self.right[i];
            let level = (in_l.abs() + in_r.abs()) * 0.5;

            let coef = if level > self.env { attack_coef } else { release_coef };
            self.env = coef * self.env + (1.0 - coef) * level;
            let env_mod = (self.env * ENV_SENSITIVITY).min(1.0);

            let mut lfo = 0.0;
            if lfo_active {
                lfo = 0.5 * (1.0 + self.lfo_phase.sin());
                self.lfo_phase = (self.lfo_phase + lfo_increment).rem_euclid(TAU);
            }

            let combined = if lfo_depth <= 0.0001 {
                env_mod
            } else {
                (env_mod * lfo_depth + lfo * lfo_depth) / (lfo_depth + lfo_depth).max(0.0001)
            };

            let target = FREQ_MIN + combined * (FREQ_MAX - FREQ_MIN);
            let target = target * (1.0 - MANUAL_WEIGHT) + manual * MANUAL_WEIGHT;
            self.smooth_freq += (target - self.smooth_freq) * FREQ_SMOOTHING;
            self.filter.retune(self.smooth_freq, q, sr, RETUNE_STEP_HZ);

            let out_l = self.filter.process(in_l, 0);
            let out_r = self.filter.process(in_r, 1);
            self.left[i] = in_l * (1.0 - mix) + out_l * mix;
            self.right[i] = in_r * (1.0 - mix) + out_r * mix;
        }
    }
}

impl Effect for AutoWah {
    fn kind(&self) -> EffectKind {
        EffectKind::Wah
    }

    fn is_enabled(&self) -> bool {
        self.params.is_enabled(EffectKind::Wah)
    }

    fn prepare(&mut self, sample_rate: f32, _channels: usize) {
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            // Coefficients depend on the rate
            self.filter.reset();
        }
    }

    fn process(&mut self, buffer: &mut AudioBuffer<'_>) {
        if buffer.channels() < 2 {
            return;
        }
        let frames = buffer.frames();

        self.left.clear();
        self.right.clear();
        for frame in buffer.frames_mut() {
            self.left.push(frame[0]);
            self.right.push(frame[1]);
        }

        self.run(frames);

        for (i, frame) in buffer.frames_mut().enumerate() {
            frame[0] = self.left[i];
            frame[1] = self.right[i];
        }
        buffer.mirror_extra_channels();
    }

    fn reset(&mut self) {
        self.filter.reset();
        self.env = 0.0;
        self.lfo_phase = 0.0;
        self.smooth_freq = self.params.get(ParamId::WahFreq);
    }

    fn is_reset(&self) -> bool {
        self.filter.is_clear() && self.env == 0.0 && self.lfo_phase == 0.0
    }
}
