//! RTP header fields per RFC 3550
//!
//! The header is consumed here as an already-parsed structure; producing it
//! from (or encoding it to) the wire belongs to the transport layer.

use crate::{RtpCsrc, RtpSequenceNumber, RtpSsrc, RtpTimestamp};

/// RTP protocol version (always 2 in practice)
pub const RTP_VERSION: u8 = 2;

/// Parsed RTP header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpHeader {
    /// RTP version (should be 2)
    pub version: u8,

    /// Padding flag
    pub padding: bool,

    /// Extension flag
    pub extension: bool,

    /// CSRC count (number of contributing sources)
    pub cc: u8,

    /// Marker bit
    pub marker: bool,

    /// Payload type
    pub payload_type: u8,

    /// Sequence number
    pub sequence_number: RtpSequenceNumber,

    /// Timestamp
    pub timestamp: RtpTimestamp,

    /// Synchronization source identifier
    pub ssrc: RtpSsrc,

    /// Contributing source identifiers
    pub csrc: Vec<RtpCsrc>,
}

impl Default for RtpHeader {
    fn default() -> Self {
        Self {
            version: RTP_VERSION,
            padding: false,
            extension: false,
            cc: 0,
            marker: false,
            payload_type: 0,
            sequence_number: 0,
            timestamp: 0,
            ssrc: 0,
            csrc: Vec::new(),
        }
    }
}

impl RtpHeader {
    /// Create a new RTP header with the standard fields set
    pub fn new(
        payload_type: u8,
        sequence_number: RtpSequenceNumber,
        timestamp: RtpTimestamp,
        ssrc: RtpSsrc,
    ) -> Self {
        Self {
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_header() {
        let header = RtpHeader::default();
        assert_eq!(header.version, RTP_VERSION);
        assert!(!header.padding);
        assert!(!header.marker);
        assert!(header.csrc.is_empty());
    }

    #[test]
    fn test_new_header() {
        let header = RtpHeader::new(96, 1000, 12345, 0xabcdef01);
        assert_eq!(header.version, RTP_VERSION);
        assert_eq!(header.payload_type, 96);
        assert_eq!(header.sequence_number, 1000);
        assert_eq!(header.timestamp, 12345);
        assert_eq!(header.ssrc, 0xabcdef01);
    }
}
