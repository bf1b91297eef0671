//! WAV prompt loader
//!
//! Announcement prompts (greetings, PIN requests, error messages) are stored
//! as 16-bit PCM WAV files. This module loads one into the fixed-size frames
//! the playout path consumes, validating that the file matches the session's
//! audio format rather than silently converting.

use std::path::Path;

use hound::WavReader;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{AudioFrame, SampleRate, DEFAULT_FRAMES_PER_SEC};

/// Load a WAV file into playout frames.
///
/// The file must already be in the expected format: 16-bit PCM at
/// `sample_rate` with `channels` channels. Frames in the source file may have
/// any length, so the samples are collected and re-chunked into exact
/// playout-interval frames; the last frame may be shorter.
pub fn load_wav_frames(
    path: &Path,
    sample_rate: SampleRate,
    channels: u8,
) -> Result<Vec<AudioFrame>> {
    info!(path = %path.display(), "loading WAV prompt");
    let sample_rate_hz = sample_rate.as_hz();

    let reader = WavReader::open(path)
        .map_err(|e| Error::config(format!("Failed to open WAV file: {}", e)))?;

    let spec = reader.spec();
    if spec.bits_per_sample != 16 {
        return Err(Error::config(format!(
            "Unsupported bit depth: {} (only 16-bit supported)",
            spec.bits_per_sample
        )));
    }
    if spec.sample_rate != sample_rate_hz {
        return Err(Error::config(format!(
            "Unexpected sample rate: expected {}, got {}",
            sample_rate_hz, spec.sample_rate
        )));
    }
    if spec.channels != channels as u16 {
        return Err(Error::config(format!(
            "Unexpected number of channels: expected {}, got {}",
            channels, spec.channels
        )));
    }

    let samples: Vec<i16> = reader
        .into_samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::config(format!("Failed to read WAV samples: {}", e)))?;

    let per_frame = (sample_rate_hz / DEFAULT_FRAMES_PER_SEC) as usize * channels as usize;
    let mut frames = Vec::with_capacity(samples.len() / per_frame + 1);
    let mut timestamp: u32 = 0;
    for chunk in samples.chunks(per_frame) {
        let samples_per_channel = (chunk.len() / channels as usize) as u32;
        frames.push(AudioFrame::new(
            chunk.to_vec(),
            sample_rate_hz,
            channels,
            timestamp,
        ));
        timestamp = timestamp.wrapping_add(samples_per_channel);
    }

    debug!(frames = frames.len(), "loaded prompt frames");
    Ok(frames)
}
