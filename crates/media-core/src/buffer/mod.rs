//! Packet buffering for inbound RTP

pub mod jitter;

pub use jitter::{
    ExtendedPacket, JitterBuffer, JitterBufferConfig, JitterBufferStats, PacketLossHandler,
    SampleHandler,
};
