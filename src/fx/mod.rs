pub mod blues;
pub mod chain;
pub mod chorus;
pub mod compressor;
pub mod overdrive;
pub mod params;
pub mod reverb;
pub mod tremolo;
pub mod wah;
pub mod warm;

pub use blues::BluesDriver;
pub use chain::EffectChain;
pub use chorus::Chorus;
pub use compressor::Compressor;
pub use overdrive::Overdrive;
pub use params::{AtomicF32, EffectKind, ParamId, ParamSnapshot, ParamStore};
pub use reverb::Reverb;
pub use tremolo::Tremolo;
pub use wah::AutoWah;
pub use warm::Warm;

use crate::audio::AudioBuffer;

/// One stage of the pedalboard.
///
/// Effects read their knobs from the shared [`ParamStore`] at the start of
/// every buffer and own all of their filter state. `process` runs on the
/// audio thread and must not block or allocate in steady state.
pub trait Effect: Send {
    fn kind(&self) -> EffectKind;

    fn is_enabled(&self) -> bool;

    /// Called when the stream format is known or changes
    fn prepare(&mut self, _sample_rate: f32, _channels: usize) {}

    /// Transform the buffer in place
    fn process(&mut self, buffer: &mut AudioBuffer<'_>);

    /// Zero all internal state
    fn reset(&mut self);

    /// True when every state array is zeroed
    fn is_reset(&self) -> bool;

    /// Process only when enabled and there is something to process
    fn apply(&mut self, buffer: &mut AudioBuffer<'_>) {
        if self.is_enabled() && !buffer.is_empty() {
            self.process(buffer);
        }
    }
}
