use std::sync::Arc;

use super::{Effect, EffectKind, ParamId, ParamStore};
use crate::audio::AudioBuffer;
use crate::dsp::{AllpassFilter, CombFilter};

/// Delay lengths in samples at 44.1 kHz
const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];
const STEREO_SPREAD: f32 = 1.1;
const ALLPASS_FEEDBACK: f32 = 0.5;
const INPUT_SCALE: f32 = 0.015;
const WET_SCALE: f32 = 3.0;

/// 8 parallel combs + 4 series allpasses per side
struct Tank {
    sample_rate: f32,
    comb_l: [CombFilter; 8],
    comb_r: [CombFilter; 8],
    allpass_l: [AllpassFilter; 4],
    allpass_r: [AllpassFilter; 4],
}

impl Tank {
    fn new(sample_rate: f32) -> Self {
        let scale = sample_rate / 44100.0;
        let left = |tuning: usize| (tuning as f32 * scale) as usize;
        let right = |tuning: usize| (tuning as f32 * scale * STEREO_SPREAD) as usize;

        Self {
            sample_rate,
            comb_l: COMB_TUNINGS.map(|t| CombFilter::new(left(t))),
            comb_r: COMB_TUNINGS.map(|t| CombFilter::new(right(t))),
            allpass_l: ALLPASS_TUNINGS.map(|t| AllpassFilter::new(left(t), ALLPASS_FEEDBACK)),
            allpass_r: ALLPASS_TUNINGS.map(|t| AllpassFilter::new(right(t), ALLPASS_FEEDBACK)),
        }
    }

    fn set_room(&mut self, feedback: f32, damp: f32) {
        for comb in self.comb_l.iter_mut().chain(self.comb_r.iter_mut()) {
            comb.set_feedback(feedback);
            comb.set_damp(damp);
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> (f32, f32) {
        let mut wet_l = 0.0f32;
        let mut wet_r = 0.0f32;
        for comb in &mut self.comb_l {
            wet_l += comb.process(input);
        }
        for comb in &mut self.comb_r {
            wet_r += comb.process(input);
        }
        for ap in &mut self.allpass_l {
            wet_l = ap.process(wet_l);
        }
        for ap in &mut self.allpass_r {
            wet_r = ap.process(wet_r);
        }
        (wet_l, wet_r)
    }

    fn clear(&mut self) {
        self.comb_l.iter_mut().chain(&mut self.comb_r).for_each(CombFilter::clear);
        self.allpass_l.iter_mut().chain(&mut self.allpass_r).for_each(AllpassFilter::clear);
    }

    fn is_clear(&self) -> bool {
        self.comb_l.iter().chain(&self.comb_r).all(CombFilter::is_clear)
            && self.allpass_l.iter().chain(&self.allpass_r).all(AllpassFilter::is_clear)
    }
}

/// Freeverb-style stereo reverb.
///
/// The delay network is sized from the sample rate on first use and cached;
/// repeated initialisation at the same rate is a no-op.
pub struct Reverb {
    params: Arc<ParamStore>,
    sample_rate: f32,
    /// Uninitialized until the first prepare or process, then Ready at `sample_rate`
    tank: Option<Box<Tank>>,
}

impl Reverb {
    pub fn new(params: Arc<ParamStore>, sample_rate: f32) -> Self {
        Self {
            params,
            sample_rate,
            tank: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.tank.is_some()
    }

    fn ensure_ready(&mut self) -> &mut Tank {
        let sample_rate = self.sample_rate;
        if self.tank.as_ref().is_some_and(|t| t.sample_rate != sample_rate) {
            self.tank = None;
        }
        self.tank.get_or_insert_with(|| Box::new(Tank::new(sample_rate)))
    }
}

impl Effect for Reverb {
    fn kind(&self) -> EffectKind {
        EffectKind::Reverb
    }

    fn is_enabled(&self) -> bool {
        self.params.is_enabled(EffectKind::Reverb)
    }

    fn prepare(&mut self, sample_rate: f32, _channels: usize) {
        self.sample_rate = sample_rate;
        self.ensure_ready();
    }

    fn process(&mut self, buffer: &mut AudioBuffer<'_>) {
        if buffer.channels() < 2 {
            return;
        }

        let room = self.params.get(ParamId::ReverbSize) * 0.28 + 0.7;
        let damp = self.params.get(ParamId::ReverbDamping) * 0.4;
        let width = self.params.get(ParamId::ReverbWidth);
        let mix = self.params.get(ParamId::ReverbMix);
        let wet_gain = mix * WET_SCALE;
        let dry_gain = 1.0 - mix;

        let tank = self.ensure_ready();
        tank.set_room(room, damp);

        let direct = (1.0 + width) * 0.5;
        let cross = (1.0 - width) * 0.5;

        for frame in buffer.frames_mut() {
            let in_l = frame[0];
            let in_r = frame[1];
            let (wet_l, wet_r) = tank.process((in_l + in_r) * INPUT_SCALE);

            let rev_l = wet_l * direct + wet_r * cross;
            let rev_r = wet_r * direct + wet_l * cross;

            frame[0] = in_l * dry_gain + rev_l * wet_gain;
            frame[1] = in_r * dry_gain + rev_r * wet_gain;
        }
        buffer.mirror_extra_channels();
    }

    fn reset(&mut self) {
        if let Some(tank) = &mut self.tank {
            tank.clear();
        }
    }

    fn is_reset(&self) -> bool {
        self.tank.as_ref().map_or(true, |t| t.is_clear())
    }
}
