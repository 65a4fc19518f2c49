use std::f32::consts::TAU;
use std::sync::Arc;

use super::{Effect, EffectKind, ParamId, ParamStore};
use crate::audio::AudioBuffer;

/// Sine amplitude modulation, identical gain on every channel
pub struct Tremolo {
    params: Arc<ParamStore>,
    sample_rate: f32,
    phase: f32,
}

impl Tremolo {
    pub fn new(params: Arc<ParamStore>, sample_rate: f32) -> Self {
        Self {
            params,
            sample_rate,
            phase: 0.0,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl Effect for Tremolo {
    fn kind(&self) -> EffectKind {
        EffectKind::Tremolo
    }

    fn is_enabled(&self) -> bool {
        self.params.is_enabled(EffectKind::Tremolo)
    }

    fn prepare(&mut self, sample_rate: f32, _channels: usize) {
        self.sample_rate = sample_rate;
    }

    fn process(&mut self, buffer: &mut AudioBuffer<'_>) {
        let rate = self.params.get(ParamId::TremoloRate);
        let depth = self.params.get(ParamId::TremoloDepth);
        let increment = TAU * rate / self.sample_rate;

        for frame in buffer.frames_mut() {
            let gain = 1.0 + depth * self.phase.sin();
            for sample in frame.iter_mut() {
                *sample *= gain;
            }
            self.phase = (self.phase + increment).rem_euclid(TAU);
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }

    fn is_reset(&self) -> bool {
        self.phase == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_wraps_when_increment_exceeds_a_cycle() {
        let params = Arc::new(ParamStore::new());
        params.set(ParamId::TremoloRate, 50.0);
        // 50 Hz at 8 Hz sample rate advances more than 2π per sample
        let mut tremolo = Tremolo::new(params, 8.0);
        let mut data = vec![0.5f32; 64];
        tremolo.process(&mut AudioBuffer::new(&mut data, 1).unwrap());
        assert!((0.0..TAU).contains(&tremolo.phase()));
        assert!(data.iter().all(|s| s.is_finite()));
    }
}
