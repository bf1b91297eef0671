//! RTP packet and header structures

mod header;
mod rtp;

pub use header::{RtpHeader, RTP_VERSION};
pub use rtp::RtpPacket;
