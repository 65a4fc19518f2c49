use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Effect stages, declared in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Tremolo,
    Chorus,
    BluesDrive,
    Overdrive,
    Compressor,
    Reverb,
    Warm,
    Wah,
}

impl EffectKind {
    pub const COUNT: usize = 8;

    /// Chain order: tremolo -> chorus -> blues -> overdrive -> compressor -> reverb -> warm -> wah
    pub const ALL: [EffectKind; Self::COUNT] = [
        EffectKind::Tremolo,
        EffectKind::Chorus,
        EffectKind::BluesDrive,
        EffectKind::Overdrive,
        EffectKind::Compressor,
        EffectKind::Reverb,
        EffectKind::Warm,
        EffectKind::Wah,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Tremolo => "Tremolo",
            EffectKind::Chorus => "Chorus",
            EffectKind::BluesDrive => "Blues Driver",
            EffectKind::Overdrive => "Overdrive",
            EffectKind::Compressor => "Compressor",
            EffectKind::Reverb => "Reverb",
            EffectKind::Warm => "Warm",
            EffectKind::Wah => "Auto-Wah",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            EffectKind::Tremolo => "tremolo",
            EffectKind::Chorus => "chorus",
            EffectKind::BluesDrive => "blues",
            EffectKind::Overdrive => "overdrive",
            EffectKind::Compressor => "compressor",
            EffectKind::Reverb => "reverb",
            EffectKind::Warm => "warm",
            EffectKind::Wah => "wah",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "tremolo" => Some(EffectKind::Tremolo),
            "chorus" => Some(EffectKind::Chorus),
            "blues" => Some(EffectKind::BluesDrive),
            "overdrive" => Some(EffectKind::Overdrive),
            "compressor" | "comp" => Some(EffectKind::Compressor),
            "reverb" => Some(EffectKind::Reverb),
            "warm" => Some(EffectKind::Warm),
            "wah" => Some(EffectKind::Wah),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Every user-adjustable knob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    MasterVolume,
    TremoloRate,
    TremoloDepth,
    ChorusRate,
    ChorusDepth,
    ChorusFeedback,
    ChorusWidth,
    OverdriveDrive,
    OverdriveThreshold,
    OverdriveTone,
    OverdriveMix,
    BluesGain,
    BluesTone,
    BluesLevel,
    CompLevel,
    CompTone,
    CompAttack,
    CompSustain,
    ReverbSize,
    ReverbDamping,
    ReverbWidth,
    ReverbMix,
    WarmAmount,
    WarmTone,
    WarmSaturation,
    WahFreq,
    WahQ,
    WahMix,
    WahLfoRate,
    WahLfoDepth,
    WahAttack,
    WahRelease,
}

impl ParamId {
    pub const COUNT: usize = 32;

    pub const ALL: [ParamId; Self::COUNT] = [
        ParamId::MasterVolume,
        ParamId::TremoloRate,
        ParamId::TremoloDepth,
        ParamId::ChorusRate,
        ParamId::ChorusDepth,
        ParamId::ChorusFeedback,
        ParamId::ChorusWidth,
        ParamId::OverdriveDrive,
        ParamId::OverdriveThreshold,
        ParamId::OverdriveTone,
        ParamId::OverdriveMix,
        ParamId::BluesGain,
        ParamId::BluesTone,
        ParamId::BluesLevel,
        ParamId::CompLevel,
        ParamId::CompTone,
        ParamId::CompAttack,
        ParamId::CompSustain,
        ParamId::ReverbSize,
        ParamId::ReverbDamping,
        ParamId::ReverbWidth,
        ParamId::ReverbMix,
        ParamId::WarmAmount,
        ParamId::WarmTone,
        ParamId::WarmSaturation,
        ParamId::WahFreq,
        ParamId::WahQ,
        ParamId::WahMix,
        ParamId::WahLfoRate,
        ParamId::WahLfoDepth,
        ParamId::WahAttack,
        ParamId::WahRelease,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ParamId::MasterVolume => "Master Volume",
            ParamId::TremoloRate => "Rate",
            ParamId::TremoloDepth => "Depth",
            ParamId::ChorusRate => "Rate",
            ParamId::ChorusDepth => "Depth",
            ParamId::ChorusFeedback => "Feedback",
            ParamId::ChorusWidth => "Width",
            ParamId::OverdriveDrive => "Drive",
            ParamId::OverdriveThreshold => "Threshold",
            ParamId::OverdriveTone => "Tone",
            ParamId::OverdriveMix => "Mix",
            ParamId::BluesGain => "Gain",
            ParamId::BluesTone => "Tone",
            ParamId::BluesLevel => "Level",
            ParamId::CompLevel => "Level",
            ParamId::CompTone => "Tone",
            ParamId::CompAttack => "Attack",
            ParamId::CompSustain => "Sustain",
            ParamId::ReverbSize => "Size",
            ParamId::ReverbDamping => "Damping",
            ParamId::ReverbWidth => "Width",
            ParamId::ReverbMix => "Mix",
            ParamId::WarmAmount => "Amount",
            ParamId::WarmTone => "Tone",
            ParamId::WarmSaturation => "Saturation",
            ParamId::WahFreq => "Frequency",
            ParamId::WahQ => "Q",
            ParamId::WahMix => "Mix",
            ParamId::WahLfoRate => "LFO Rate",
            ParamId::WahLfoDepth => "LFO Depth",
            ParamId::WahAttack => "Env Attack",
            ParamId::WahRelease => "Env Release",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ParamId::MasterVolume => "master_volume",
            ParamId::TremoloRate => "tremolo_rate",
            ParamId::TremoloDepth => "tremolo_depth",
            ParamId::ChorusRate => "chorus_rate",
            ParamId::ChorusDepth => "chorus_depth",
            ParamId::ChorusFeedback => "chorus_feedback",
            ParamId::ChorusWidth => "chorus_width",
            ParamId::OverdriveDrive => "overdrive_drive",
            ParamId::OverdriveThreshold => "overdrive_threshold",
            ParamId::OverdriveTone => "overdrive_tone",
            ParamId::OverdriveMix => "overdrive_mix",
            ParamId::BluesGain => "blues_gain",
            ParamId::BluesTone => "blues_tone",
            ParamId::BluesLevel => "blues_level",
            ParamId::CompLevel => "comp_level",
            ParamId::CompTone => "comp_tone",
            ParamId::CompAttack => "comp_attack",
            ParamId::CompSustain => "comp_sustain",
            ParamId::ReverbSize => "reverb_size",
            ParamId::ReverbDamping => "reverb_damping",
            ParamId::ReverbWidth => "reverb_width",
            ParamId::ReverbMix => "reverb_mix",
            ParamId::WarmAmount => "warm_amount",
            ParamId::WarmTone => "warm_tone",
            ParamId::WarmSaturation => "warm_saturation",
            ParamId::WahFreq => "wah_freq",
            ParamId::WahQ => "wah_q",
            ParamId::WahMix => "wah_mix",
            ParamId::WahLfoRate => "wah_lfo_rate",
            ParamId::WahLfoDepth => "wah_lfo_depth",
            ParamId::WahAttack => "wah_attack",
            ParamId::WahRelease => "wah_release",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.key() == key)
    }

    /// Returns (min, max, default) for this parameter
    pub fn range(&self) -> (f32, f32, f32) {
        match self {
            ParamId::MasterVolume => (0.0, 2.0, 1.0),
            ParamId::TremoloRate => (0.1, 50.0, 5.0),
            ParamId::TremoloDepth => (0.0, 1.0, 0.5),
            ParamId::ChorusRate => (0.1, 5.0, 1.5),
            ParamId::ChorusDepth => (0.0, 1.0, 0.02),
            ParamId::ChorusFeedback => (0.0, 0.95, 0.3),
            ParamId::ChorusWidth => (0.0, 1.0, 0.5),
            ParamId::OverdriveDrive => (0.1, 10.0, 3.0),
            ParamId::OverdriveThreshold => (0.1, 0.9, 0.3),
            ParamId::OverdriveTone => (0.0, 1.0, 0.5),
            ParamId::OverdriveMix => (0.0, 1.0, 0.8),
            ParamId::BluesGain => (0.1, 10.0, 1.5),
            ParamId::BluesTone => (0.0, 1.0, 0.5),
            ParamId::BluesLevel => (0.0, 2.0, 0.8),
            ParamId::CompLevel => (0.0, 2.0, 1.0),
            ParamId::CompTone => (0.0, 1.0, 0.5),
            ParamId::CompAttack => (0.1, 200.0, 10.0),
            ParamId::CompSustain => (10.0, 2000.0, 300.0),
            ParamId::ReverbSize => (0.0, 1.0, 0.5),
            ParamId::ReverbDamping => (0.0, 1.0, 0.5),
            ParamId::ReverbWidth => (0.0, 1.0, 1.0),
            ParamId::ReverbMix => (0.0, 1.0, 0.3),
            ParamId::WarmAmount => (0.0, 1.0, 0.5),
            ParamId::WarmTone => (0.0, 1.0, 0.5),
            ParamId::WarmSaturation => (0.0, 1.0, 0.3),
            ParamId::WahFreq => (200.0, 3000.0, 1000.0),
            ParamId::WahQ => (0.5, 20.0, 10.0),
            ParamId::WahMix => (0.0, 1.0, 0.5),
            ParamId::WahLfoRate => (0.0, 10.0, 0.5),
            ParamId::WahLfoDepth => (0.0, 1.0, 0.5),
            ParamId::WahAttack => (0.1, 100.0, 5.0),
            ParamId::WahRelease => (1.0, 2000.0, 80.0),
        }
    }

    pub fn default_value(&self) -> f32 {
        self.range().2
    }

    pub fn clamp(&self, value: f32) -> f32 {
        let (min, max, default) = self.range();
        if value.is_nan() {
            default
        } else {
            value.clamp(min, max)
        }
    }

    /// The effect this knob belongs to (`None` for master volume)
    pub fn effect(&self) -> Option<EffectKind> {
        use ParamId::*;
        match self {
            MasterVolume => None,
            TremoloRate | TremoloDepth => Some(EffectKind::Tremolo),
            ChorusRate | ChorusDepth | ChorusFeedback | ChorusWidth => Some(EffectKind::Chorus),
            OverdriveDrive | OverdriveThreshold | OverdriveTone | OverdriveMix => {
                Some(EffectKind::Overdrive)
            }
            BluesGain | BluesTone | BluesLevel => Some(EffectKind::BluesDrive),
            CompLevel | CompTone | CompAttack | CompSustain => Some(EffectKind::Compressor),
            ReverbSize | ReverbDamping | ReverbWidth | ReverbMix => Some(EffectKind::Reverb),
            WarmAmount | WarmTone | WarmSaturation => Some(EffectKind::Warm),
            WahFreq | WahQ | WahMix | WahLfoRate | WahLfoDepth | WahAttack | WahRelease => {
                Some(EffectKind::Wah)
            }
        }
    }

    /// Knobs of one effect in display order
    pub fn for_effect(kind: EffectKind) -> Vec<ParamId> {
        Self::ALL
            .iter()
            .copied()
            .filter(|p| p.effect() == Some(kind))
            .collect()
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// `f32` stored as raw bits in an `AtomicU32`
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Lock-free parameter store shared between the control surface and the
/// audio thread.
///
/// Each knob and enable flag is an independent atomic scalar; there is no
/// cross-field consistency. Values are clamped on the way in, so readers can
/// use them directly.
#[derive(Debug)]
pub struct ParamStore {
    values: [AtomicF32; ParamId::COUNT],
    enabled: [AtomicBool; EffectKind::COUNT],
    reset_epoch: AtomicU64,
}

impl ParamStore {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| AtomicF32::new(ParamId::ALL[i].default_value())),
            enabled: std::array::from_fn(|_| AtomicBool::new(false)),
            reset_epoch: AtomicU64::new(0),
        }
    }

    /// Clamp and store; returns the value actually stored
    pub fn set(&self, param: ParamId, value: f32) -> f32 {
        let clamped = param.clamp(value);
        self.values[param.index()].store(clamped);
        clamped
    }

    #[inline]
    pub fn get(&self, param: ParamId) -> f32 {
        self.values[param.index()].load()
    }

    pub fn set_enabled(&self, effect: EffectKind, enabled: bool) {
        self.enabled[effect.index()].store(enabled, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_enabled(&self, effect: EffectKind) -> bool {
        self.enabled[effect.index()].load(Ordering::Relaxed)
    }

    /// Flip an enable flag, returning the new state
    pub fn toggle(&self, effect: EffectKind) -> bool {
        !self.enabled[effect.index()].fetch_xor(true, Ordering::Relaxed)
    }

    pub fn master_volume(&self) -> f32 {
        self.get(ParamId::MasterVolume)
    }

    pub fn set_master_volume(&self, volume: f32) -> f32 {
        self.set(ParamId::MasterVolume, volume)
    }

    /// Restore every default, disable every effect and ask the audio thread
    /// to clear its filter state before the next buffer.
    pub fn reset_all(&self) {
        for param in ParamId::ALL {
            self.values[param.index()].store(param.default_value());
        }
        for flag in &self.enabled {
            flag.store(false, Ordering::Relaxed);
        }
        self.reset_epoch.fetch_add(1, Ordering::Release);
    }

    /// Incremented by every [`reset_all`](Self::reset_all)
    pub fn reset_epoch(&self) -> u64 {
        self.reset_epoch.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            enabled: EffectKind::ALL
                .iter()
                .map(|&e| (e.key().to_string(), self.is_enabled(e)))
                .collect(),
            values: ParamId::ALL
                .iter()
                .map(|&p| (p.key().to_string(), self.get(p)))
                .collect(),
        }
    }

    /// Apply a snapshot; unknown keys are ignored and values are clamped
    pub fn apply_snapshot(&self, snapshot: &ParamSnapshot) {
        for (key, &value) in &snapshot.values {
            if let Some(param) = ParamId::from_key(key) {
                self.set(param, value);
            }
        }
        for (key, &on) in &snapshot.enabled {
            if let Some(effect) = EffectKind::from_key(key) {
                self.set_enabled(effect, on);
            }
        }
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of every parameter, keyed by its console key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSnapshot {
    pub enabled: BTreeMap<String, bool>,
    pub values: BTreeMap<String, f32>,
}
