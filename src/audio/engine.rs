use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Serialize;

use super::io::{AudioHost, DeviceInfo, PushOutcome, StreamFormat, StreamGuard, StreamPort};
use crate::error::{EngineError, EngineResult};
use crate::fx::{EffectChain, ParamStore};

/// Engine tuning knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Capacity of each capture/render ring, in frames
    pub ring_frames: usize,
    /// Sleep between polls when no captured audio is ready
    pub idle_poll: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ring_frames: 4096,
            idle_poll: Duration::from_millis(1),
        }
    }
}

/// Cooperative stop flag polled once per loop iteration
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Summary of one processing session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoopStats {
    pub buffers_processed: u64,
    pub frames_processed: u64,
    /// Buffers skipped for lack of render headroom
    pub buffers_dropped: u64,
    pub idle_polls: u64,
    /// Capture blocks the device side had to discard
    pub capture_overruns: u64,
    /// Set when the session ended on a stream fault
    pub fault: Option<String>,
}

/// Pull, process and push until cancelled or the stream faults.
///
/// A buffer that does not fit in the render headroom is dropped whole, never
/// rendered partially. Worst-case stop latency is one buffer plus one
/// `idle_poll`.
pub fn process_loop<P: StreamPort + ?Sized>(
    port: &mut P,
    chain: &mut EffectChain,
    token: &CancelToken,
    idle_poll: Duration,
) -> LoopStats {
    let format = port.format();
    let channels = format.channels.max(1);
    let mut block = vec![0.0f32; format.frame_capacity.max(1) * channels];
    let mut stats = LoopStats::default();

    while !token.is_cancelled() {
        let frames = match port.pull_captured(&mut block) {
            Ok(frames) => frames,
            Err(err) => {
                log::error!("capture failed: {}", err);
                stats.fault = Some(err.to_string());
                break;
            }
        };

        if frames == 0 {
            stats.idle_polls += 1;
            thread::sleep(idle_poll);
            continue;
        }

        if port.render_headroom() < frames {
            stats.buffers_dropped += 1;
            if stats.buffers_dropped == 1 {
                log::warn!("render side is full, dropping {} frames", frames);
            }
            continue;
        }

        let samples = &mut block[..frames * channels];
        chain.process(samples, channels);

        match port.push_render(samples) {
            Ok(PushOutcome::Rendered) => {
                stats.buffers_processed += 1;
                stats.frames_processed += frames as u64;
            }
            Ok(PushOutcome::Backpressure) => {
                stats.buffers_dropped += 1;
            }
            Err(err) => {
                log::error!("render failed: {}", err);
                stats.fault = Some(err.to_string());
                break;
            }
        }
    }

    stats.capture_overruns = port.capture_overruns();
    if stats.buffers_dropped > 0 {
        log::warn!("{} buffers dropped this session", stats.buffers_dropped);
    }
    if stats.capture_overruns > 0 {
        log::warn!("{} capture blocks overran the ring", stats.capture_overruns);
    }
    stats
}

struct Session {
    token: CancelToken,
    handle: JoinHandle<LoopStats>,
    guard: StreamGuard,
    format: StreamFormat,
    device: Option<String>,
}

/// Starts and stops processing sessions on top of an [`AudioHost`].
///
/// The platform streams stay with the engine; only the stream port and the
/// effect chain move to the audio thread.
pub struct AudioEngine<H: AudioHost> {
    host: H,
    config: EngineConfig,
    params: Arc<ParamStore>,
    session: Option<Session>,
    last_stats: Option<LoopStats>,
}

impl<H: AudioHost> AudioEngine<H> {
    pub fn new(host: H, params: Arc<ParamStore>, config: EngineConfig) -> Self {
        Self {
            host,
            config,
            params,
            session: None,
            last_stats: None,
        }
    }

    pub fn params(&self) -> &Arc<ParamStore> {
        &self.params
    }

    pub fn input_devices(&self) -> EngineResult<Vec<DeviceInfo>> {
        self.host.input_devices()
    }

    /// Open `device` (default input when `None`) and start the audio thread.
    /// Any running session is stopped first.
    pub fn start_processing(&mut self, device: Option<&str>) -> EngineResult<StreamFormat> {
        self.stop();

        let open = self.host.open_stream(device)?;
        let format = open.format;
        let mut port = open.port;

        let mut chain = EffectChain::new(Arc::clone(&self.params), format.sample_rate as f32);
        chain.prepare(format.sample_rate as f32, format.channels);

        let token = CancelToken::new();
        let thread_token = token.clone();
        let idle_poll = self.config.idle_poll;
        let spawned = thread::Builder::new()
            .name("pedalboard-audio".into())
            .spawn(move || process_loop(&mut port, &mut chain, &thread_token, idle_poll));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                open.guard.close();
                return Err(EngineError::Device(format!("cannot spawn audio thread: {err}")));
            }
        };

        log::info!(
            "processing started on {} ({} ch @ {} Hz)",
            device.unwrap_or("default input"),
            format.channels,
            format.sample_rate
        );
        self.session = Some(Session {
            token,
            handle,
            guard: open.guard,
            format,
            device: device.map(str::to_string),
        });
        Ok(format)
    }

    /// Signal the audio thread, wait for it, then release the streams.
    /// Returns the session summary when a session was running.
    pub fn stop(&mut self) -> Option<LoopStats> {
        let session = self.session.take()?;
        session.token.cancel();
        let stats = Self::finish(session);
        self.last_stats = stats.clone();
        stats
    }

    /// Collect a session whose thread already exited on its own (stream
    /// fault). Returns its summary.
    pub fn reap(&mut self) -> Option<LoopStats> {
        let finished = self.session.as_ref().is_some_and(|s| s.handle.is_finished());
        if !finished {
            return None;
        }
        let session = self.session.take()?;
        let stats = Self::finish(session);
        self.last_stats = stats.clone();
        stats
    }

    fn finish(session: Session) -> Option<LoopStats> {
        let stats = match session.handle.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                log::error!("audio thread panicked");
                None
            }
        };
        session.guard.close();
        match &stats {
            Some(LoopStats { fault: Some(fault), .. }) => {
                log::error!("processing stopped on fault: {}", fault)
            }
            Some(s) => log::info!(
                "processing stopped after {} buffers ({} dropped)",
                s.buffers_processed,
                s.buffers_dropped
            ),
            None => {}
        }
        stats
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.handle.is_finished())
    }

    pub fn format(&self) -> Option<StreamFormat> {
        self.session.as_ref().map(|s| s.format)
    }

    pub fn device(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.device.as_deref())
    }

    pub fn last_stats(&self) -> Option<&LoopStats> {
        self.last_stats.as_ref()
    }
}

impl<H: AudioHost> Drop for AudioEngine<H> {
    fn drop(&mut self) {
        self.stop();
    }
}
