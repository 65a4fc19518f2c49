use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use super::{Effect, EffectKind, ParamId, ParamStore};
use crate::audio::AudioBuffer;

const BASE_DELAY_MS: f32 = 15.0;
const MOD_DEPTH_MS: f32 = 10.0;
const MAX_DELAY_MS: f32 = 40.0;
const WET_MIX: f32 = 0.5;

/// Modulated delay chorus with per-channel LFO spread
pub struct Chorus {
    params: Arc<ParamStore>,
    sample_rate: f32,
    // Interleaved ring, `channels` samples per slot
    delay: Vec<f32>,
    write_index: usize,
    phase: f32,
}

impl Chorus {
    pub fn new(params: Arc<ParamStore>, sample_rate: f32) -> Self {
        Self {
            params,
            sample_rate,
            delay: Vec::new(),
            write_index: 0,
            phase: 0.0,
        }
    }

    fn max_delay_frames(&self) -> usize {
        (self.sample_rate * MAX_DELAY_MS / 1000.0) as usize
    }

    /// Grow the delay line to the worst case for this rate and channel count
    fn ensure_capacity(&mut self, channels: usize) {
        let needed = self.max_delay_frames() * channels;
        if self.delay.len() < needed {
            self.delay = vec![0.0; needed];
            self.write_index = 0;
        }
    }

    #[inline]
    fn lfo(phase: f32) -> f32 {
        0.6 * phase.sin() + 0.4 * (phase * 1.5).sin()
    }
}

impl Effect for Chorus {
    fn kind(&self) -> EffectKind {
        EffectKind::Chorus
    }

    fn is_enabled(&self) -> bool {
        self.params.is_enabled(EffectKind::Chorus)
    }

    fn prepare(&mut self, sample_rate: f32, channels: usize) {
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.delay.clear();
        }
        self.ensure_capacity(channels);
    }

    fn process(&mut self, buffer: &mut AudioBuffer<'_>) {
        let channels = buffer.channels();
        self.ensure_capacity(channels);
        let len = self.delay.len();
        if len < channels {
            return;
        }
        let slots = len / channels;

        let mod_depth_ms = MOD_DEPTH_MS * self.params.get(ParamId::ChorusDepth);
        let feedback = self.params.get(ParamId::ChorusFeedback);
        let width = self.params.get(ParamId::ChorusWidth);
        let increment = TAU * self.params.get(ParamId::ChorusRate) / self.sample_rate;
        let dry_mix = 1.0 - WET_MIX;

        for frame in buffer.frames_mut() {
            for (ch, sample) in frame.iter_mut().enumerate() {
                let dry = *sample;
                let lfo = Self::lfo(self.phase + ch as f32 * width * PI);
                let delay_ms = BASE_DELAY_MS + mod_depth_ms * lfo;
                let delay_samples = self.sample_rate * delay_ms / 1000.0;

                let read_pos = (self.write_index as f32 - delay_samples).rem_euclid(slots as f32);
                let base = read_pos.floor();
                let frac = read_pos - base;
                let slot_a = (base as usize) % slots;
                let slot_b = (slot_a + 1) % slots;
                let a = self.delay[slot_a * channels + ch];
                let b = self.delay[slot_b * channels + ch];
                let wet = a * (1.0 - frac) + b * frac;

                *sample = dry_mix * dry + WET_MIX * wet;
                self.delay[self.write_index * channels + ch] = dry + wet * feedback;
            }

            self.phase = (self.phase + increment).rem_euclid(TAU);
            self.write_index += 1;
            if self.write_index >= slots {
                self.write_index = 0;
            }
        }
    }

    fn reset(&mut self) {
        self.delay.fill(0.0);
        self.write_index = 0;
        self.phase = 0.0;
    }

    fn is_reset(&self) -> bool {
        self.phase == 0.0 && self.write_index == 0 && self.delay.iter().all(|&s| s == 0.0)
    }
}
