use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Host, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use parking_lot::Mutex;
use rtrb::{Consumer, Producer, RingBuffer};

use super::io::{
    AudioHost, DeviceInfo, OpenStream, PushOutcome, StreamFormat, StreamGuard, StreamPort,
};
use crate::error::{EngineError, EngineResult};

/// Raised from the cpal error callbacks, checked by the processing thread
#[derive(Default)]
struct FaultFlag {
    raised: AtomicBool,
    message: Mutex<Option<String>>,
}

impl FaultFlag {
    fn raise(&self, message: String) {
        let mut slot = self.message.lock();
        if slot.is_none() {
            *slot = Some(message);
        }
        self.raised.store(true, Ordering::Release);
    }

    fn check(&self) -> EngineResult<()> {
        if !self.raised.load(Ordering::Acquire) {
            return Ok(());
        }
        let message = self
            .message
            .lock()
            .clone()
            .unwrap_or_else(|| "unknown stream error".to_string());
        Err(EngineError::StreamFault(message))
    }
}

const MIN_RING_FRAMES: usize = 256;

/// cpal-backed audio I/O.
///
/// Capture and render are separate cpal streams joined by two SPSC rings of
/// `ring_frames` frames each. One pull delivers at most a quarter ring.
pub struct CpalHost {
    host: Host,
    ring_frames: usize,
}

impl CpalHost {
    pub fn new(ring_frames: usize) -> Self {
        Self {
            host: cpal::default_host(),
            ring_frames: ring_frames.max(MIN_RING_FRAMES),
        }
    }

    fn find_input(&self, device_id: Option<&str>) -> EngineResult<Device> {
        match device_id {
            None => self.host.default_input_device().ok_or(EngineError::NoDevice),
            Some(id) => {
                let mut devices = self
                    .host
                    .input_devices()
                    .map_err(|e| EngineError::Device(e.to_string()))?;
                devices
                    .find(|d| d.name().map(|n| n == id).unwrap_or(false))
                    .ok_or_else(|| EngineError::DeviceNotFound(id.to_string()))
            }
        }
    }

    /// Output config at the capture rate, preferring the capture channel count
    fn output_config(
        device: &Device,
        sample_rate: cpal::SampleRate,
        channels: u16,
    ) -> EngineResult<(StreamConfig, SampleFormat)> {
        let ranges: Vec<_> = device
            .supported_output_configs()
            .map_err(|e| EngineError::Device(e.to_string()))?
            .filter(|r| r.min_sample_rate() <= sample_rate && r.max_sample_rate() >= sample_rate)
            .collect();

        let chosen = ranges
            .iter()
            .find(|r| r.channels() == channels)
            .or_else(|| ranges.first())
            .cloned()
            .ok_or_else(|| {
                EngineError::UnsupportedFormat(format!(
                    "output device cannot render at {} Hz",
                    sample_rate.0
                ))
            })?
            .with_sample_rate(sample_rate);

        Ok((chosen.config(), chosen.sample_format()))
    }
}

impl AudioHost for CpalHost {
    type Port = CpalPort;

    fn input_devices(&self) -> EngineResult<Vec<DeviceInfo>> {
        let default_name = self.host.default_input_device().and_then(|d| d.name().ok());
        let devices = self
            .host
            .input_devices()
            .map_err(|e| EngineError::Device(e.to_string()))?;

        let mut infos = Vec::new();
        for device in devices {
            let Ok(name) = device.name() else { continue };
            let Ok(config) = device.default_input_config() else {
                log::debug!("skipping input {name}: no default config");
                continue;
            };
            infos.push(DeviceInfo {
                id: name.clone(),
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                channels: config.channels(),
                sample_rate: config.sample_rate().0,
            });
        }
        Ok(infos)
    }

    fn open_stream(&self, device_id: Option<&str>) -> EngineResult<OpenStream<CpalPort>> {
        let input = self.find_input(device_id)?;
        let input_name = input.name().unwrap_or_else(|_| "<unnamed>".to_string());
        let supported = input
            .default_input_config()
            .map_err(|e| EngineError::Device(e.to_string()))?;
        let input_format = supported.sample_format();
        let input_config: StreamConfig = supported.config();
        let channels = input_config.channels as usize;

        let output = self.host.default_output_device().ok_or(EngineError::NoDevice)?;
        let (output_config, output_format) =
            Self::output_config(&output, input_config.sample_rate, input_config.channels)?;

        let ring_len = self.ring_frames * channels;
        let (capture_tx, capture_rx) = RingBuffer::<f32>::new(ring_len);
        let (render_tx, render_rx) = RingBuffer::<f32>::new(ring_len);
        let fault = Arc::new(FaultFlag::default());
        let overruns = Arc::new(AtomicU64::new(0));

        let input_stream = match input_format {
            SampleFormat::F32 => {
                build_capture::<f32>(&input, &input_config, capture_tx, &fault, &overruns)?
            }
            SampleFormat::I16 => {
                build_capture::<i16>(&input, &input_config, capture_tx, &fault, &overruns)?
            }
            SampleFormat::U16 => {
                build_capture::<u16>(&input, &input_config, capture_tx, &fault, &overruns)?
            }
            format => {
                return Err(EngineError::UnsupportedFormat(format!("capture {format:?}")));
            }
        };
        let output_stream = match output_format {
            SampleFormat::F32 => {
                build_render::<f32>(&output, &output_config, channels, render_rx, &fault)?
            }
            SampleFormat::I16 => {
                build_render::<i16>(&output, &output_config, channels, render_rx, &fault)?
            }
            SampleFormat::U16 => {
                build_render::<u16>(&output, &output_config, channels, render_rx, &fault)?
            }
            format => {
                return Err(EngineError::UnsupportedFormat(format!("render {format:?}")));
            }
        };

        input_stream.play().map_err(|e| EngineError::Device(e.to_string()))?;
        output_stream.play().map_err(|e| EngineError::Device(e.to_string()))?;

        let format = StreamFormat {
            sample_rate: input_config.sample_rate.0,
            channels,
            frame_capacity: self.ring_frames / 4,
        };
        log::info!(
            "opened {} ({} ch @ {} Hz), render on {} ch",
            input_name,
            channels,
            format.sample_rate,
            output_config.channels
        );

        Ok(OpenStream {
            format,
            port: CpalPort {
                format,
                capture: capture_rx,
                render: render_tx,
                fault,
                overruns,
            },
            guard: StreamGuard::new((input_stream, output_stream)),
        })
    }
}

fn build_capture<T>(
    device: &Device,
    config: &StreamConfig,
    mut producer: Producer<f32>,
    fault: &Arc<FaultFlag>,
    overruns: &Arc<AtomicU64>,
) -> EngineResult<Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let fault = Arc::clone(fault);
    let overruns = Arc::clone(overruns);
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                // Whole callback blocks only, so frames never split across a full ring
                if producer.slots() < data.len() {
                    overruns.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                for &sample in data {
                    let _ = producer.push(f32::from_sample(sample));
                }
            },
            move |err| {
                log::error!("Audio input stream error: {}", err);
                fault.raise(err.to_string());
            },
            None,
        )
        .map_err(|e| EngineError::Device(e.to_string()))
}

fn build_render<T>(
    device: &Device,
    config: &StreamConfig,
    source_channels: usize,
    mut consumer: Consumer<f32>,
    fault: &Arc<FaultFlag>,
) -> EngineResult<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let fault = Arc::clone(fault);
    let out_channels = config.channels as usize;
    let mut frame = vec![0.0f32; source_channels];

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for out in data.chunks_mut(out_channels) {
                    if consumer.slots() >= source_channels {
                        for slot in frame.iter_mut() {
                            *slot = consumer.pop().unwrap_or(0.0);
                        }
                    } else {
                        frame.fill(0.0);
                    }
                    for (ch, sample) in out.iter_mut().enumerate() {
                        *sample = T::from_sample(frame[ch % source_channels]);
                    }
                }
            },
            move |err| {
                log::error!("Audio output stream error: {}", err);
                fault.raise(err.to_string());
            },
            None,
        )
        .map_err(|e| EngineError::Device(e.to_string()))
}

/// Ring-buffer side of a cpal stream pair
pub struct CpalPort {
    format: StreamFormat,
    capture: Consumer<f32>,
    render: Producer<f32>,
    fault: Arc<FaultFlag>,
    overruns: Arc<AtomicU64>,
}

impl StreamPort for CpalPort {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn pull_captured(&mut self, out: &mut [f32]) -> EngineResult<usize> {
        self.fault.check()?;
        let channels = self.format.channels;
        let frames = (self.capture.slots() / channels).min(out.len() / channels);
        let n = frames * channels;
        let chunk = self
            .capture
            .read_chunk(n)
            .map_err(|e| EngineError::StreamFault(e.to_string()))?;
        let (first, second) = chunk.as_slices();
        out[..first.len()].copy_from_slice(first);
        out[first.len()..n].copy_from_slice(second);
        chunk.commit_all();
        Ok(frames)
    }

    fn render_headroom(&self) -> usize {
        self.render.slots() / self.format.channels
    }

    fn push_render(&mut self, block: &[f32]) -> EngineResult<PushOutcome> {
        self.fault.check()?;
        if self.render.slots() < block.len() {
            return Ok(PushOutcome::Backpressure);
        }
        let mut chunk = self
            .render
            .write_chunk(block.len())
            .map_err(|e| EngineError::StreamFault(e.to_string()))?;
        let (first, second) = chunk.as_mut_slices();
        let split = first.len();
        first.copy_from_slice(&block[..split]);
        second.copy_from_slice(&block[split..]);
        chunk.commit_all();
        Ok(PushOutcome::Rendered)
    }

    /// Capture callbacks dropped because the ring was full
    fn capture_overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }
}
