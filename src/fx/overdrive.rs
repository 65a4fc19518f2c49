use std::sync::Arc;

use super::{Effect, EffectKind, ParamId, ParamStore};
use crate::audio::AudioBuffer;
use crate::dsp::soft_limit;

/// Final bound after output compensation
const OUTPUT_CEILING: f32 = 1.0;

/// Asymmetric tube-style overdrive with a one-pole tone split
pub struct Overdrive {
    params: Arc<ParamStore>,
    filter_state: [f32; 2],
}

struct Voicing {
    drive: f32,
    threshold: f32,
    sensitivity: f32,
    output_gain: f32,
    saturation: f32,
    pre_emphasis: f32,
    bass_rolloff: f32,
    treble_boost: f32,
}

impl Voicing {
    fn new(drive: f32, threshold: f32, tone: f32) -> Self {
        // Lower threshold drives harder and compensates more
        let sensitivity = 1.0 - threshold;
        Self {
            drive,
            threshold,
            sensitivity,
            output_gain: 1.0 + sensitivity * 2.0,
            saturation: 1.5 + sensitivity * 3.0,
            pre_emphasis: 1.0 + sensitivity * 0.8,
            bass_rolloff: 0.3 + tone * 0.4,
            treble_boost: 1.0 + tone * 1.5,
        }
    }

    #[inline]
    fn shape(&self, input: f32) -> f32 {
        let signal = input * self.drive * self.pre_emphasis;
        let mag = signal.abs();
        let t = self.threshold;

        if mag <= t {
            return signal * (1.0 + (mag / t) * 0.3);
        }

        let excess = (mag - t) / (1.0 - t + 0.001);
        let clipped = if signal > 0.0 {
            let sat = 1.0 - (-excess * self.saturation).exp();
            t + sat * (1.0 - t) * 0.85
        } else {
            let sat = 1.0 - (-excess * self.saturation * 0.8).exp();
            -(t + sat * (1.0 - t) * 0.75)
        };
        clipped + signal * mag * 0.15 * self.sensitivity
    }
}

impl Overdrive {
    pub fn new(params: Arc<ParamStore>) -> Self {
        Self {
            params,
            filter_state: [0.0; 2],
        }
    }
}

impl Effect for Overdrive {
    fn kind(&self) -> EffectKind {
        EffectKind::Overdrive
    }

    fn is_enabled(&self) -> bool {
        self.params.is_enabled(EffectKind::Overdrive)
    }

    fn process(&mut self, buffer: &mut AudioBuffer<'_>) {
        let voicing = Voicing::new(
            self.params.get(ParamId::OverdriveDrive),
            self.params.get(ParamId::OverdriveThreshold),
            self.params.get(ParamId::OverdriveTone),
        );
        let wet_mix = self.params.get(ParamId::OverdriveMix);
        let dry_mix = 1.0 - wet_mix;

        for frame in buffer.frames_mut() {
            for (ch, sample) in frame.iter_mut().enumerate() {
                let input = *sample;
                let driven = voicing.shape(input);

                // Tone stack only has state for the first two channels
                let mut toned = driven;
                if ch < 2 {
                    let bass = driven * voicing.bass_rolloff
                        + self.filter_state[ch] * (1.0 - voicing.bass_rolloff);
                    self.filter_state[ch] = bass;
                    toned = bass + (driven - bass) * voicing.treble_boost;
                }

                let out = (soft_limit(toned, 0.9, 0.1, 0.98) * voicing.output_gain)
                    .clamp(-OUTPUT_CEILING, OUTPUT_CEILING);
                *sample = dry_mix * input + wet_mix * out;
            }
        }
    }

    fn reset(&mut self) {
        self.filter_state = [0.0; 2];
    }

    fn is_reset(&self) -> bool {
        self.filter_state == [0.0; 2]
    }
}
