use std::f32::consts::TAU;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use pedalboard::audio::AudioBuffer;
use pedalboard::fx::{
    AutoWah, BluesDriver, Chorus, Compressor, Effect, EffectChain, EffectKind, Overdrive, ParamId,
    ParamStore, Reverb, Tremolo, Warm,
};

const SR: f32 = 44100.0;

fn sine(frames: usize, channels: usize, freq: f32, amp: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(frames * channels);
    for i in 0..frames {
        let s = amp * (TAU * freq * i as f32 / SR).sin();
        out.extend(std::iter::repeat(s).take(channels));
    }
    out
}

#[test]
fn disabled_chain_only_applies_volume() {
    let params = Arc::new(ParamStore::new());
    params.set_master_volume(0.5);
    let mut chain = EffectChain::new(Arc::clone(&params), SR);
    chain.prepare(SR, 2);

    let input = sine(512, 2, 440.0, 1.0);
    let mut data = input.clone();
    chain.process(&mut data, 2);

    for (out, inp) in data.iter().zip(&input) {
        assert_abs_diff_eq!(*out, inp * 0.5, epsilon = 1e-6);
    }
}

#[test]
fn disabled_effects_are_bit_identical() {
    let params = Arc::new(ParamStore::new());
    let mut effects: Vec<Box<dyn Effect>> = vec![
        Box::new(Tremolo::new(Arc::clone(&params), SR)),
        Box::new(Chorus::new(Arc::clone(&params), SR)),
        Box::new(BluesDriver::new(Arc::clone(&params))),
        Box::new(Overdrive::new(Arc::clone(&params))),
        Box::new(Compressor::new(Arc::clone(&params), SR)),
        Box::new(Reverb::new(Arc::clone(&params), SR)),
        Box::new(Warm::new(Arc::clone(&params))),
        Box::new(AutoWah::new(Arc::clone(&params), SR)),
    ];
    assert_eq!(effects.len(), EffectKind::COUNT);

    let input = sine(300, 2, 220.0, 0.7);
    for effect in &mut effects {
        let mut data = input.clone();
        effect.apply(&mut AudioBuffer::new(&mut data, 2).unwrap());
        assert_eq!(data, input, "{:?} changed the buffer", effect.kind());
    }
}

#[test]
fn zero_frames_is_a_no_op_for_every_effect() {
    let params = Arc::new(ParamStore::new());
    for kind in EffectKind::ALL {
        params.set_enabled(kind, true);
    }
    let mut chain = EffectChain::new(Arc::clone(&params), SR);
    for channels in 1..=4 {
        let mut empty: Vec<f32> = Vec::new();
        chain.process(&mut empty, channels);
        assert!(empty.is_empty());
    }
    assert!(chain.state_is_clear());
}

#[test]
fn tremolo_matches_closed_form() {
    let params = Arc::new(ParamStore::new());
    params.set_enabled(EffectKind::Tremolo, true);
    let rate = params.set(ParamId::TremoloRate, 7.0);
    let depth = params.set(ParamId::TremoloDepth, 0.8);

    let mut tremolo = Tremolo::new(Arc::clone(&params), SR);
    let mut data = vec![1.0f32; 1000 * 2];
    tremolo.apply(&mut AudioBuffer::new(&mut data, 2).unwrap());

    let increment = TAU * rate / SR;
    let mut phase = 0.0f32;
    for frame in data.chunks(2) {
        let expected = 1.0 + depth * phase.sin();
        assert_abs_diff_eq!(frame[0], expected, epsilon = 1e-5);
        assert_eq!(frame[0], frame[1]);
        phase += increment;
        if phase >= TAU {
            phase -= TAU;
        }
    }
    assert!(tremolo.phase() >= 0.0 && tremolo.phase() < TAU);
}

#[test]
fn tremolo_without_depth_is_transparent() {
    let params = Arc::new(ParamStore::new());
    params.set_enabled(EffectKind::Tremolo, true);
    params.set(ParamId::TremoloDepth, 0.0);
    params.set(ParamId::TremoloRate, 50.0);

    let mut tremolo = Tremolo::new(params, SR);
    let input = sine(512, 2, 330.0, 0.9);
    let mut data = input.clone();
    tremolo.apply(&mut AudioBuffer::new(&mut data, 2).unwrap());
    assert_eq!(data, input);
}

#[test]
fn silence_stays_silent_through_time_based_effects() {
    let params = Arc::new(ParamStore::new());
    params.set_enabled(EffectKind::Chorus, true);
    params.set_enabled(EffectKind::Reverb, true);
    params.set_enabled(EffectKind::Wah, true);
    params.set(ParamId::ChorusFeedback, 0.95);
    params.set(ParamId::ReverbSize, 1.0);

    let mut chain = EffectChain::new(Arc::clone(&params), SR);
    chain.prepare(SR, 2);
    for _ in 0..50 {
        let mut data = vec![0.0f32; 512 * 2];
        chain.process(&mut data, 2);
        assert!(data.iter().all(|&s| s == 0.0));
    }
}

#[test]
fn reverb_leaves_mono_untouched() {
    let params = Arc::new(ParamStore::new());
    params.set_enabled(EffectKind::Reverb, true);
    params.set(ParamId::ReverbMix, 1.0);

    let mut reverb = Reverb::new(params, SR);
    let input = sine(512, 1, 440.0, 0.5);
    let mut data = input.clone();
    reverb.apply(&mut AudioBuffer::new(&mut data, 1).unwrap());
    assert_eq!(data, input);
}

#[test]
fn reverb_mirrors_extra_channels() {
    let params = Arc::new(ParamStore::new());
    params.set_enabled(EffectKind::Reverb, true);

    let mut reverb = Reverb::new(params, SR);
    reverb.prepare(SR, 4);
    let mut data = sine(256, 4, 440.0, 0.5);
    reverb.apply(&mut AudioBuffer::new(&mut data, 4).unwrap());
    for frame in data.chunks(4) {
        assert_eq!(frame[2], frame[0]);
        assert_eq!(frame[3], frame[1]);
    }
}

#[test]
fn clean_overdrive_stays_in_bounds() {
    let params = Arc::new(ParamStore::new());
    params.set_enabled(EffectKind::Overdrive, true);
    params.set(ParamId::OverdriveDrive, 1.0);
    params.set(ParamId::OverdriveThreshold, 0.9);
    params.set(ParamId::OverdriveMix, 1.0);

    // Up to just under threshold / pre-emphasis (0.9 / 1.08)
    for amp in [0.1, 0.3, 0.5, 0.7, 0.8, 0.83] {
        let mut chain = EffectChain::new(Arc::clone(&params), SR);
        chain.prepare(SR, 2);
        let input = sine(512, 2, 440.0, amp);
        let mut data = input.clone();
        chain.process(&mut data, 2);

        for (out, inp) in data.iter().zip(&input) {
            assert!(out.abs() <= 1.0, "amp {}: sample {} out of range", amp, out);
            if inp.abs() > 0.1 {
                assert_eq!(out.signum(), inp.signum(), "amp {}", amp);
            }
        }
    }
}

#[test]
fn compressor_envelope_converges_on_sustained_sine() {
    let params = Arc::new(ParamStore::new());
    params.set_enabled(EffectKind::Compressor, true);
    params.set(ParamId::CompAttack, 1.0);
    params.set(ParamId::CompSustain, 10.0);

    let mut comp = Compressor::new(params, SR);
    // 441 Hz at 44.1 kHz has an exact 100-sample period
    let period = 100;
    let block = sine(period * 20, 1, 441.0, 1.0);

    let mut last_peak = 0.0f32;
    for _ in 0..20 {
        let mut data = block.clone();
        comp.apply(&mut AudioBuffer::new(&mut data, 1).unwrap());
        last_peak = comp.envelope(0);
    }
    let mut data = block.clone();
    comp.apply(&mut AudioBuffer::new(&mut data, 1).unwrap());
    let settled = comp.envelope(0);

    assert!(settled > 0.0);
    assert!((settled - last_peak).abs() / settled < 0.01);
}

#[test]
fn compressor_is_unity_gain_below_knee() {
    let params = Arc::new(ParamStore::new());
    params.set_enabled(EffectKind::Compressor, true);
    let mut comp = Compressor::new(params, SR);

    let mut data = sine(4096, 1, 441.0, 0.02);
    comp.apply(&mut AudioBuffer::new(&mut data, 1).unwrap());
    assert!(comp.envelope(0) < 0.05);
    assert_eq!(comp.smoothed_gain(0), 1.0);
}

#[test]
fn reset_restores_defaults_and_clears_state() {
    let params = Arc::new(ParamStore::new());
    for kind in EffectKind::ALL {
        params.set_enabled(kind, true);
    }
    params.set(ParamId::ReverbMix, 0.9);
    params.set(ParamId::WahQ, 2.0);
    params.set_master_volume(0.1);

    let mut chain = EffectChain::new(Arc::clone(&params), SR);
    chain.prepare(SR, 2);
    let mut data = sine(2048, 2, 440.0, 0.8);
    chain.process(&mut data, 2);
    assert!(!chain.state_is_clear());

    chain.reset_all();
    for param in ParamId::ALL {
        assert_eq!(params.get(param), param.default_value(), "{}", param.key());
    }
    for kind in EffectKind::ALL {
        assert!(!params.is_enabled(kind));
    }
    assert!(chain.state_is_clear());
}

#[test]
fn output_stays_finite_with_everything_on() {
    let params = Arc::new(ParamStore::new());
    for kind in EffectKind::ALL {
        params.set_enabled(kind, true);
    }
    params.set(ParamId::ChorusFeedback, 0.95);
    params.set(ParamId::OverdriveDrive, 10.0);
    params.set(ParamId::BluesGain, 10.0);

    let mut chain = EffectChain::new(Arc::clone(&params), SR);
    chain.prepare(SR, 2);
    for _ in 0..40 {
        let mut data = sine(512, 2, 110.0, 1.0);
        chain.process(&mut data, 2);
        assert!(data.iter().all(|s| s.is_finite()));
    }
}
