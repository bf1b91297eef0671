//! Error types for rtp-core operations

use thiserror::Error;

/// Errors produced while handling RTP payloads
#[derive(Debug, Error)]
pub enum Error {
    /// The payload does not match the expected codec framing
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}
