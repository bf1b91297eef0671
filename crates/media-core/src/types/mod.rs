//! Core types and constants for media-core
//!
//! This module defines the fundamental audio data structures shared by the
//! codec wrappers, the container sink, and the prompt loader.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of media frames per second used throughout the receiving pipeline
/// (20 ms frames, the packetization interval of the supported codecs).
pub const DEFAULT_FRAMES_PER_SEC: u32 = 50;

/// Audio frame with PCM data and format information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFrame {
    /// PCM audio data (interleaved samples)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u8,
    /// Frame duration
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Timestamp (media clock units)
    pub timestamp: u32,
}

/// Custom serialization for Duration as milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl AudioFrame {
    /// Create a new audio frame
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u8, timestamp: u32) -> Self {
        let sample_count = samples.len() / channels.max(1) as usize;
        let duration = Duration::from_secs_f64(sample_count as f64 / sample_rate as f64);

        Self {
            samples,
            sample_rate,
            channels,
            duration,
            timestamp,
        }
    }

    /// Get the number of samples per channel
    pub fn samples_per_channel(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Check if frame is mono
    pub fn is_mono(&self) -> bool {
        self.channels == 1
    }

    /// Check if frame is stereo
    pub fn is_stereo(&self) -> bool {
        self.channels == 2
    }
}

/// Common sample rates for audio processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRate {
    /// 8 kHz (narrowband)
    Rate8000 = 8000,
    /// 16 kHz (wideband)
    Rate16000 = 16000,
    /// 32 kHz (super-wideband)
    Rate32000 = 32000,
    /// 48 kHz (fullband)
    Rate48000 = 48000,
}

impl SampleRate {
    /// Get the sample rate as Hz
    pub fn as_hz(&self) -> u32 {
        *self as u32
    }

    /// Create from Hz value
    pub fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            8000 => Some(Self::Rate8000),
            16000 => Some(Self::Rate16000),
            32000 => Some(Self::Rate32000),
            48000 => Some(Self::Rate48000),
            _ => None,
        }
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::Rate48000
    }
}
