use std::sync::Arc;

use super::{Effect, EffectKind, ParamId, ParamStore};
use crate::audio::AudioBuffer;

const COMPRESS_THRESHOLD: f32 = 0.2;
const LOWPASS_COEF: f32 = 0.3;
const OUTPUT_CEILING: f32 = 0.95;

/// Tube-style warmth: bass lift, glue compression, polynomial saturation
pub struct Warm {
    params: Arc<ParamStore>,
    lowpass: [f32; 2],
}

struct Stage {
    compress_ratio: f32,
    drive: f32,
    harmonic_amount: f32,
    bass_boost: f32,
    treble_roll: f32,
    mid_warmth: f32,
    output_gain: f32,
}

impl Stage {
    fn new(amount: f32, tone: f32, saturation: f32) -> Self {
        Self {
            compress_ratio: 0.3 + amount * 0.4,
            drive: 1.0 + saturation * 3.0,
            harmonic_amount: saturation * 0.5,
            bass_boost: 1.0 + (1.0 - tone) * 0.8,
            treble_roll: 1.0 - tone * 0.3,
            mid_warmth: 1.0 + amount * 0.4,
            output_gain: 0.8 + amount * 0.4,
        }
    }

    /// Everything up to the tone filter
    #[inline]
    fn saturate(&self, input: f32) -> f32 {
        let mut x = input * self.bass_boost;

        let mag = x.abs();
        if mag > COMPRESS_THRESHOLD {
            x = (COMPRESS_THRESHOLD + (mag - COMPRESS_THRESHOLD) * self.compress_ratio).copysign(x);
        }

        let driven = x * self.drive;
        let mut saturated = if driven.abs() <= 1.0 {
            let d2 = driven * driven;
            driven - d2 * driven * 0.33 + d2 * self.harmonic_amount * 0.1
        } else {
            (1.0 - (-(driven.abs() - 1.0) * 0.5).exp()).copysign(driven)
        };
        saturated *= 0.7;

        if self.harmonic_amount > 0.01 {
            let s2 = saturated * saturated;
            saturated += s2 * self.harmonic_amount * 0.15 + s2 * saturated * self.harmonic_amount * 0.05;
        }
        saturated * self.mid_warmth
    }
}

impl Warm {
    pub fn new(params: Arc<ParamStore>) -> Self {
        Self {
            params,
            lowpass: [0.0; 2],
        }
    }
}

impl Effect for Warm {
    fn kind(&self) -> EffectKind {
        EffectKind::Warm
    }

    fn is_enabled(&self) -> bool {
        self.params.is_enabled(EffectKind::Warm)
    }

    fn process(&mut self, buffer: &mut AudioBuffer<'_>) {
        let amount = self.params.get(ParamId::WarmAmount);
        let stage = Stage::new(
            amount,
            self.params.get(ParamId::WarmTone),
            self.params.get(ParamId::WarmSaturation),
        );
        let wet_mix = amount;
        let dry_mix = 1.0 - wet_mix;

        for frame in buffer.frames_mut() {
            for (ch, sample) in frame.iter_mut().enumerate().take(2) {
                let input = *sample;
                let saturated = stage.saturate(input);

                let state = &mut self.lowpass[ch];
                *state += LOWPASS_COEF * (saturated * stage.treble_roll - *state);
                let toned = (*state * stage.output_gain).clamp(-OUTPUT_CEILING, OUTPUT_CEILING);

                *sample = dry_mix * input + wet_mix * toned;
            }
        }
        buffer.mirror_extra_channels();
    }

    fn reset(&mut self) {
        self.lowpass = [0.0; 2];
    }

    fn is_reset(&self) -> bool {
        self.lowpass == [0.0; 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturation_is_odd_without_harmonics() {
        let stage = Stage::new(0.5, 0.5, 0.0);
        let pos = stage.saturate(0.3);
        let neg = stage.saturate(-0.3);
        assert!((pos + neg).abs() < 1e-6);
    }

    #[test]
    fn wet_output_never_exceeds_ceiling() {
        let params = Arc::new(ParamStore::new());
        params.set(ParamId::WarmAmount, 1.0);
        params.set(ParamId::WarmSaturation, 1.0);
        let mut warm = Warm::new(params);

        let mut data: Vec<f32> = (0..512).map(|i| if i % 4 < 2 { 5.0 } else { -5.0 }).collect();
        let mut buffer = AudioBuffer::new(&mut data, 2).unwrap();
        warm.process(&mut buffer);
        assert!(data.iter().all(|s| s.abs() <= OUTPUT_CEILING + 1e-6));
    }
}
