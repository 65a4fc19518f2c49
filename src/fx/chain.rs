use std::sync::Arc;

use super::{
    AutoWah, BluesDriver, Chorus, Compressor, Effect, EffectKind, Overdrive, ParamStore, Reverb,
    Tremolo, Warm,
};
use crate::audio::AudioBuffer;

/// Ordered effect stages plus the master volume.
///
/// Owned by the audio thread. Parameters come from the shared store; filter
/// state never leaves this struct.
pub struct EffectChain {
    params: Arc<ParamStore>,
    stages: Vec<Box<dyn Effect>>,
    sample_rate: f32,
    channels: usize,
    seen_epoch: u64,
}

impl EffectChain {
    pub fn new(params: Arc<ParamStore>, sample_rate: f32) -> Self {
        let stages: Vec<Box<dyn Effect>> = EffectKind::ALL
            .iter()
            .map(|&kind| -> Box<dyn Effect> {
                let p = Arc::clone(&params);
                match kind {
                    EffectKind::Tremolo => Box::new(Tremolo::new(p, sample_rate)),
                    EffectKind::Chorus => Box::new(Chorus::new(p, sample_rate)),
                    EffectKind::BluesDrive => Box::new(BluesDriver::new(p)),
                    EffectKind::Overdrive => Box::new(Overdrive::new(p)),
                    EffectKind::Compressor => Box::new(Compressor::new(p, sample_rate)),
                    EffectKind::Reverb => Box::new(Reverb::new(p, sample_rate)),
                    EffectKind::Warm => Box::new(Warm::new(p)),
                    EffectKind::Wah => Box::new(AutoWah::new(p, sample_rate)),
                }
            })
            .collect();

        let seen_epoch = params.reset_epoch();
        Self {
            params,
            stages,
            sample_rate,
            channels: 0,
            seen_epoch,
        }
    }

    /// Stage order as applied to each buffer
    pub fn order(&self) -> Vec<EffectKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    /// Size buffers for a stream format. Safe to call repeatedly.
    pub fn prepare(&mut self, sample_rate: f32, channels: usize) {
        self.sample_rate = sample_rate;
        self.channels = channels;
        for stage in &mut self.stages {
            stage.prepare(sample_rate, channels);
        }
    }

    /// Run one interleaved buffer through every enabled stage, then apply
    /// master volume. A buffer that cannot be viewed as whole frames is left
    /// untouched.
    pub fn process(&mut self, data: &mut [f32], channels: usize) {
        let epoch = self.params.reset_epoch();
        if epoch != self.seen_epoch {
            self.seen_epoch = epoch;
            self.reset_state();
        }

        let len = data.len();
        let Some(mut buffer) = AudioBuffer::new(data, channels) else {
            log::trace!("skipping buffer of {} samples for {} channels", len, channels);
            return;
        };
        if buffer.is_empty() {
            return;
        }
        if channels != self.channels {
            self.prepare(self.sample_rate, channels);
        }

        for stage in &mut self.stages {
            stage.apply(&mut buffer);
        }
        buffer.scale(self.params.master_volume());
    }

    /// Restore default parameters and zero every stage's state
    pub fn reset_all(&mut self) {
        self.params.reset_all();
        self.seen_epoch = self.params.reset_epoch();
        self.reset_state();
    }

    fn reset_state(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    /// True when every stage's state arrays are zeroed
    pub fn state_is_clear(&self) -> bool {
        self.stages.iter().all(|s| s.is_reset())
    }
}
