//! Contract between the processing loop and whatever moves audio in and out

use std::any::Any;

use serde::Serialize;

use crate::error::EngineResult;

/// A capture endpoint the user can pick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub channels: u16,
    pub sample_rate: u32,
}

/// Negotiated shape of an open stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: usize,
    /// Largest block, in frames, a single pull can deliver
    pub frame_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Rendered,
    /// Not enough render headroom; nothing was written
    Backpressure,
}

/// Sample-moving half of an open stream, owned by the processing thread.
///
/// All buffers are interleaved `f32` in the stream's channel layout.
pub trait StreamPort: Send {
    fn format(&self) -> StreamFormat;

    /// Copy up to `out.len() / channels` whole frames of captured audio into
    /// `out`. Returns the frame count; zero means nothing is ready yet.
    fn pull_captured(&mut self, out: &mut [f32]) -> EngineResult<usize>;

    /// Frames the render side can accept right now
    fn render_headroom(&self) -> usize;

    /// Queue a block for playback. Never writes a partial block.
    fn push_render(&mut self, block: &[f32]) -> EngineResult<PushOutcome>;

    /// Capture blocks lost because the processing side fell behind
    fn capture_overruns(&self) -> u64 {
        0
    }
}

/// Keeps the platform streams alive. Stays on the thread that opened them.
pub struct StreamGuard {
    streams: Option<Box<dyn Any>>,
}

impl StreamGuard {
    pub fn new<T: Any>(streams: T) -> Self {
        Self {
            streams: Some(Box::new(streams)),
        }
    }

    /// Guard with nothing to release, for in-memory ports
    pub fn detached() -> Self {
        Self { streams: None }
    }

    /// Release the streams
    pub fn close(mut self) {
        if self.streams.take().is_some() {
            log::debug!("audio streams closed");
        }
    }
}

pub struct OpenStream<P> {
    pub format: StreamFormat,
    pub port: P,
    pub guard: StreamGuard,
}

/// Device enumeration and stream setup
pub trait AudioHost {
    type Port: StreamPort + 'static;

    fn input_devices(&self) -> EngineResult<Vec<DeviceInfo>>;

    /// Open capture on `device_id` (the default input when `None`) paired with
    /// a render stream
    fn open_stream(&self, device_id: Option<&str>) -> EngineResult<OpenStream<Self::Port>>;
}
