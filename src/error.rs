use thiserror::Error;

/// Errors surfaced by the audio engine and its I/O adapters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("No audio input device found")]
    NoDevice,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Unsupported stream format: {0}")]
    UnsupportedFormat(String),

    #[error("Stream fault: {0}")]
    StreamFault(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
