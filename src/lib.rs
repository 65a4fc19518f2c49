//! Real-time guitar effects processor.
//!
//! Captured audio runs through a fixed chain of eight effects (tremolo,
//! chorus, blues driver, overdrive, compressor, reverb, warm, auto-wah) and a
//! master volume before being rendered. Parameters live in a lock-free
//! [`fx::ParamStore`] shared between the control side and the audio thread.

pub mod app;
pub mod audio;
pub mod command;
pub mod dsp;
pub mod error;
pub mod event;
pub mod fx;
pub mod render;

pub use error::{EngineError, EngineResult};
