//! Traits implemented by codec-specific collaborators

use bytes::Bytes;

use crate::Result;

/// Declares media sample boundaries for a codec's RTP payload format.
///
/// A sample (one media frame) may span several packets; the depacketizer
/// inspects each payload to decide whether it begins and/or ends a sample.
/// Audio payload formats typically carry one whole sample per packet and
/// return `true` from both boundary checks.
pub trait Depacketizer: Send {
    /// Extract the codec payload from an RTP payload
    fn unmarshal(&self, payload: &[u8]) -> Result<Bytes>;

    /// Whether this payload begins a sample
    fn is_partition_head(&self, payload: &[u8]) -> bool;

    /// Whether this payload ends a sample
    fn is_partition_tail(&self, marker: bool, payload: &[u8]) -> bool;
}
