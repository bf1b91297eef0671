//! Media processing core for the rvox stack
//!
//! This crate receives RTP media from the transport layer and turns it into
//! ordered, whole media samples with a bounded added latency. The central
//! component is the jitter buffer in [`buffer::jitter`]; around it sit the
//! pieces a receiving pipeline needs: a jitter-buffered RTP handler
//! composition, an Opus codec wrapper, an Ogg container sink for received
//! samples, and a WAV prompt loader for playout.

pub mod audio;
pub mod buffer;
pub mod codec;
pub mod container;
pub mod error;
pub mod rtp_processing;
pub mod types;

pub use buffer::jitter::{
    ExtendedPacket, JitterBuffer, JitterBufferConfig, JitterBufferStats,
};
pub use error::{Error, Result};
pub use types::{AudioFrame, SampleRate};
