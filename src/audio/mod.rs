pub mod buffer;
pub mod cpal_io;
pub mod engine;
pub mod io;

pub use buffer::AudioBuffer;
pub use cpal_io::{CpalHost, CpalPort};
pub use engine::{process_loop, AudioEngine, CancelToken, EngineConfig, LoopStats};
pub use io::{AudioHost, DeviceInfo, OpenStream, PushOutcome, StreamFormat, StreamGuard, StreamPort};
