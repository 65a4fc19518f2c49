use std::sync::Arc;

use super::{Effect, EffectKind, ParamId, ParamStore};
use crate::audio::AudioBuffer;
use crate::dsp::soft_limit;

const PRE_BOOST: f32 = 1.4;
const SOFT_THRESHOLD: f32 = 0.3;
const HARD_THRESHOLD: f32 = 0.65;
const HARMONIC_DRIVE: f32 = 0.3;
const PRESENCE: f32 = 0.15;
const BASS_COEF: f32 = 0.08;

/// Three-region diode clipper with a bass/mid/treble/presence tone stack
pub struct BluesDriver {
    params: Arc<ParamStore>,
    // One low-pass slot per channel pair (`ch % 2`)
    filter_state: [f32; 2],
}

impl BluesDriver {
    pub fn new(params: Arc<ParamStore>) -> Self {
        Self {
            params,
            filter_state: [0.0; 2],
        }
    }

    /// clean / soft-saturation / asymmetric hard clip
    #[inline]
    fn clip(signal: f32) -> f32 {
        let mag = signal.abs();
        if mag < SOFT_THRESHOLD {
            signal * (1.0 + mag * 0.2)
        } else if mag < HARD_THRESHOLD {
            let span = HARD_THRESHOLD - SOFT_THRESHOLD;
            let excess = (mag - SOFT_THRESHOLD) / span;
            let curve = excess - excess * excess * excess * 0.33;
            (SOFT_THRESHOLD + curve * span).copysign(signal)
        } else {
            let excess = mag - HARD_THRESHOLD;
            let headroom = 1.0 - HARD_THRESHOLD;
            if signal > 0.0 {
                (HARD_THRESHOLD + headroom * (1.0 - (-excess * 2.0).exp())).min(0.95)
            } else {
                -(HARD_THRESHOLD + headroom * (1.0 - (-excess * 1.2).exp())).min(0.90)
            }
        }
    }
}

impl Effect for BluesDriver {
    fn kind(&self) -> EffectKind {
        EffectKind::BluesDrive
    }

    fn is_enabled(&self) -> bool {
        self.params.is_enabled(EffectKind::BluesDrive)
    }

    fn process(&mut self, buffer: &mut AudioBuffer<'_>) {
        let gain = self.params.get(ParamId::BluesGain);
        let tone = self.params.get(ParamId::BluesTone);
        let level = self.params.get(ParamId::BluesLevel);

        let input_gain = gain * 1.8 * PRE_BOOST;
        let bass_presence = 1.2 + (1.0 - tone) * 0.5;
        let mid_scoop = 0.6 + tone * 0.2;
        let treble_boost = 1.5 + tone;

        for frame in buffer.frames_mut() {
            for (ch, sample) in frame.iter_mut().enumerate() {
                let mut clipped = Self::clip(*sample * input_gain);

                let x2 = clipped * clipped;
                let x3 = x2 * clipped;
                clipped += x2 * HARMONIC_DRIVE * 0.15 + x3 * HARMONIC_DRIVE * 0.25;

                let slot = ch % 2;
                let state = &mut self.filter_state[slot];
                *state += BASS_COEF * (clipped * bass_presence - *state);
                let bass = *state;

                let highpass = clipped - bass;
                let treble = highpass * treble_boost;
                let mid = (clipped - bass * 0.5 - highpass * 0.5) * mid_scoop;
                let presence = highpass * PRESENCE * 2.5;

                let mixed = bass * 0.35 + mid * 0.25 + treble * 0.3 + presence * 0.1;
                *sample = soft_limit(mixed, 0.85, 0.3, 0.98) * level * 1.1;
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
