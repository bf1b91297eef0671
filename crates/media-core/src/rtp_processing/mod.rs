//! RTP payload handling around the jitter buffer
//!
//! This module composes the jitter buffer with the handler chain a media
//! session feeds inbound RTP into: depacketizers declaring sample boundaries
//! and the jitter-buffered handler wrapper.

mod depacketizer;
mod jitter_handler;

pub use depacketizer::AudioDepacketizer;
pub use jitter_handler::{JitterHandler, RtpHandler, DEFAULT_JITTER_LATENCY};
