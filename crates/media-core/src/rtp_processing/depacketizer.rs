//! Depacketizers for the supported payload formats

use bytes::Bytes;
use rvox_rtp_core::{Depacketizer, Result};

/// Depacketizer for audio payload formats that carry one whole sample per
/// packet (Opus, G.711, G.722): every packet both begins and ends a sample,
/// and the codec payload is the RTP payload itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioDepacketizer;

impl Depacketizer for AudioDepacketizer {
    fn unmarshal(&self, payload: &[u8]) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(payload))
    }

    fn is_partition_head(&self, _payload: &[u8]) -> bool {
        true
    }

    fn is_partition_tail(&self, _marker: bool, _payload: &[u8]) -> bool {
        true
    }
}
