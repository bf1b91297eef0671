//! Core RTP types for the rvox media stack
//!
//! This crate provides the already-parsed RTP packet structures consumed by
//! the media processing crates, together with the wrap-aware sequence number
//! arithmetic and the depacketization trait used to find media sample
//! boundaries. Wire-level parsing and serialization belong to the transport
//! layer and are not part of this crate.

pub mod error;
pub mod packet;
pub mod sequence;
pub mod traits;

pub use error::Error;

/// Result type alias for rtp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// RTP sequence number (16 bits, wraps freely)
pub type RtpSequenceNumber = u16;

/// RTP timestamp (media clock units)
pub type RtpTimestamp = u32;

/// RTP synchronization source identifier
pub type RtpSsrc = u32;

/// RTP contributing source identifier
pub type RtpCsrc = u32;

pub use packet::{RtpHeader, RtpPacket};
pub use traits::Depacketizer;
