use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::fx::EffectChain;

/// Frames handed to the chain per call, matching a typical device period
pub const BLOCK_FRAMES: usize = 512;
pub const DEFAULT_TAIL_SECONDS: f32 = 2.0;

/// Result of an offline render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub sample_rate: u32,
    pub channels: usize,
    /// Frames written, tail included
    pub frames: usize,
    pub duration_secs: f32,
}

/// Read a WAV file as interleaved f32 in [-1, 1]
pub fn read_wav(path: &Path) -> Result<(hound::WavSpec, Vec<f32>)> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV: {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1u32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<Result<_, _>>()
        }
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>(),
    }
    .with_context(|| format!("Failed to decode WAV: {}", path.display()))?;

    Ok((spec, samples))
}

/// Run a WAV file through the chain and write the result as 32-bit float.
///
/// `tail_secs` of silence is appended so time-based effects can ring out.
/// The chain is prepared for the file's rate and channel count.
pub fn render_file(
    input: &Path,
    output: &Path,
    chain: &mut EffectChain,
    tail_secs: f32,
) -> Result<RenderResult> {
    let (in_spec, mut samples) = read_wav(input)?;
    let channels = in_spec.channels as usize;
    if channels == 0 {
        bail!("WAV file has no channels: {}", input.display());
    }
    if samples.is_empty() {
        bail!("WAV file is empty: {}", input.display());
    }

    let tail_frames = (in_spec.sample_rate as f32 * tail_secs.max(0.0)) as usize;
    samples.resize(samples.len() + tail_frames * channels, 0.0);

    chain.prepare(in_spec.sample_rate as f32, channels);
    for block in samples.chunks_mut(BLOCK_FRAMES * channels) {
        chain.process(block, channels);
    }

    let spec = hound::WavSpec {
        channels: in_spec.channels,
        sample_rate: in_spec.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(output, spec)
        .with_context(|| format!("Failed to create WAV file: {}", output.display()))?;
    for &sample in &samples {
        writer.write_sample(sample)?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {}", output.display()))?;

    let frames = samples.len() / channels;
    log::info!(
        "rendered {} frames ({} tail) to {}",
        frames,
        tail_frames,
        output.display()
    );
    Ok(RenderResult {
        sample_rate: in_spec.sample_rate,
        channels,
        frames,
        duration_secs: frames as f32 / in_spec.sample_rate as f32,
    })
}
