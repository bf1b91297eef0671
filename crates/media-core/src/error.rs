//! Error types for media-core operations
//!
//! The jitter buffer itself is fire-and-forget and reports nothing through
//! this tree; errors come from the collaborator modules (codecs, container
//! output, prompt loading) and from downstream handlers behind the jitter
//! composition.

use thiserror::Error;

/// Result type alias for media-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for media-core
#[derive(Debug, Error)]
pub enum Error {
    /// Codec-related errors
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Container output errors
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Codec-related errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid codec parameters: {details}")]
    InvalidParameters { details: String },

    #[error("Codec initialization failed: {reason}")]
    InitializationFailed { reason: String },

    #[error("Encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Decoding failed: {reason}")]
    DecodingFailed { reason: String },

    #[error("Invalid frame size: expected {expected}, got {actual}")]
    InvalidFrameSize { expected: usize, actual: usize },
}

/// Container output errors
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Writer is closed")]
    WriterClosed,

    #[error("Stream already ended")]
    StreamEnded,
}

// Convenience constructors for common error patterns
impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
