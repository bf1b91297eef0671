//! Opus audio codec wrapper
//!
//! Thin layer over the `opus` crate for the receiving and sending pipelines.
//! The decoder adapts the inbound channel layout to the configured output:
//! it sniffs the channel count of every packet, re-creates the underlying
//! decoder when the sender switches between mono and stereo, and remaps the
//! decoded PCM toward the requested channel count.

use tracing::{debug, warn};

use crate::codec::audio::{mono_to_stereo, stereo_to_mono};
use crate::error::{CodecError, Result};
use crate::types::{AudioFrame, SampleRate, DEFAULT_FRAMES_PER_SEC};

/// Maximum size of an encoded Opus packet
const MAX_PACKET_SIZE: usize = 4000;

/// Number of consecutive corrupt packets tolerated before decoding fails
const MAX_SUCCESSIVE_DECODE_ERRORS: u32 = 5;

/// Opus codec configuration
#[derive(Debug, Clone)]
pub struct OpusConfig {
    /// Target bitrate (6000-510000 bps)
    pub bitrate: u32,
    /// Use variable bitrate
    pub vbr: bool,
    /// Application type
    pub application: OpusApplication,
    /// Frame size in milliseconds
    pub frame_size_ms: u32,
}

/// Opus application types
#[derive(Debug, Clone, Copy)]
pub enum OpusApplication {
    /// Voice over IP
    Voip,
    /// Audio streaming
    Audio,
}

impl Default for OpusConfig {
    fn default() -> Self {
        Self {
            bitrate: 64000,
            vbr: true,
            application: OpusApplication::Voip,
            frame_size_ms: 1000 / DEFAULT_FRAMES_PER_SEC,
        }
    }
}

fn channels_of(count: u8) -> Result<opus::Channels> {
    match count {
        1 => Ok(opus::Channels::Mono),
        2 => Ok(opus::Channels::Stereo),
        _ => Err(CodecError::InvalidParameters {
            details: format!("Invalid channel count: {}", count),
        }
        .into()),
    }
}

fn validate_sample_rate(sample_rate: u32) -> Result<()> {
    // Opus supports 8, 12, 16, 24, 48 kHz
    if !matches!(sample_rate, 8000 | 12000 | 16000 | 24000 | 48000) {
        return Err(CodecError::InvalidParameters {
            details: format!("Invalid sample rate: {}", sample_rate),
        }
        .into());
    }
    Ok(())
}

/// Opus encoder for outbound PCM frames
pub struct OpusEncoder {
    encoder: opus::Encoder,
    sample_rate: u32,
    channels: u8,
    /// Expected interleaved samples per frame
    frame_size: usize,
    buf: Vec<u8>,
}

impl OpusEncoder {
    /// Create a new encoder
    pub fn new(sample_rate: SampleRate, channels: u8, config: OpusConfig) -> Result<Self> {
        let sample_rate_hz = sample_rate.as_hz();
        validate_sample_rate(sample_rate_hz)?;

        let app = match config.application {
            OpusApplication::Voip => opus::Application::Voip,
            OpusApplication::Audio => opus::Application::Audio,
        };

        let mut encoder = opus::Encoder::new(sample_rate_hz, channels_of(channels)?, app)
            .map_err(|e| CodecError::InitializationFailed {
                reason: format!("Opus encoder creation failed: {}", e),
            })?;

        encoder
            .set_bitrate(opus::Bitrate::Bits(config.bitrate as i32))
            .map_err(|e| CodecError::InitializationFailed {
                reason: format!("Failed to set bitrate: {}", e),
            })?;

        encoder
            .set_vbr(config.vbr)
            .map_err(|e| CodecError::InitializationFailed {
                reason: format!("Failed to set VBR: {}", e),
            })?;

        let frame_size = (sample_rate_hz as usize * config.frame_size_ms as usize / 1000)
            * channels as usize;

        debug!(
            sample_rate = sample_rate_hz,
            channels,
            frame_size_ms = config.frame_size_ms,
            "created Opus encoder"
        );

        Ok(Self {
            encoder,
            sample_rate: sample_rate_hz,
            channels,
            frame_size,
            buf: vec![0u8; MAX_PACKET_SIZE],
        })
    }

    /// Sample rate this encoder operates at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of input channels
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Encode one PCM frame into an Opus packet
    pub fn encode(&mut self, frame: &AudioFrame) -> Result<Vec<u8>> {
        if frame.samples.len() != self.frame_size {
            return Err(CodecError::InvalidFrameSize {
                expected: self.frame_size,
                actual: frame.samples.len(),
            }
            .into());
        }

        let n = self
            .encoder
            .encode(&frame.samples, &mut self.buf)
            .map_err(|e| CodecError::EncodingFailed {
                reason: format!("Opus encoding failed: {}", e),
            })?;

        Ok(self.buf[..n].to_vec())
    }

    /// Reset the encoder state
    pub fn reset(&mut self) {
        let _ = self.encoder.reset_state();
    }
}

/// Opus decoder for inbound packets, with channel-layout adaptation
pub struct OpusDecoder {
    decoder: Option<opus::Decoder>,
    sample_rate: u32,
    target_channels: u8,
    last_channels: u8,
    successive_errors: u32,
}

impl OpusDecoder {
    /// Create a new decoder producing `target_channels` output
    pub fn new(sample_rate: SampleRate, target_channels: u8) -> Result<Self> {
        let sample_rate_hz = sample_rate.as_hz();
        validate_sample_rate(sample_rate_hz)?;
        if target_channels != 1 && target_channels != 2 {
            return Err(CodecError::InvalidParameters {
                details: "Opus decoder only supports mono or stereo output".to_string(),
            }
            .into());
        }

        Ok(Self {
            decoder: None,
            sample_rate: sample_rate_hz,
            target_channels,
            last_channels: target_channels,
            successive_errors: 0,
        })
    }

    /// Decode one Opus packet into a PCM frame.
    ///
    /// Returns `Ok(None)` for a tolerated corrupt packet; concatenated
    /// streams can produce a few of those without the stream being broken.
    pub fn decode(&mut self, packet: &[u8]) -> Result<Option<AudioFrame>> {
        let channels = self.reset_for_packet(packet)?;

        let mut buf =
            vec![0i16; self.sample_rate as usize / DEFAULT_FRAMES_PER_SEC as usize * channels as usize];

        let decoder = match self.decoder.as_mut() {
            Some(decoder) => decoder,
            None => {
                return Err(CodecError::DecodingFailed {
                    reason: "decoder not initialized".to_string(),
                }
                .into())
            }
        };

        let n = match decoder.decode(packet, &mut buf, false) {
            Ok(n) => n,
            Err(e) if e.code() == opus::ErrorCode::InvalidPacket
                && self.successive_errors < MAX_SUCCESSIVE_DECODE_ERRORS =>
            {
                debug!("opus decoder failed decoding a packet");
                self.successive_errors += 1;
                return Ok(None);
            }
            Err(e) => {
                return Err(CodecError::DecodingFailed {
                    reason: format!("Opus decoding failed: {}", e),
                }
                .into())
            }
        };
        self.successive_errors = 0;

        buf.truncate(n * channels as usize);
        let samples = if channels < self.target_channels {
            mono_to_stereo(&buf)
        } else if channels > self.target_channels {
            stereo_to_mono(&buf)
        } else {
            buf
        };

        Ok(Some(AudioFrame::new(
            samples,
            self.sample_rate,
            self.target_channels,
            0, // timestamp assigned by the caller
        )))
    }

    /// Make sure the underlying decoder matches the packet's channel count,
    /// re-creating it when the sender switched layouts
    fn reset_for_packet(&mut self, packet: &[u8]) -> Result<u8> {
        let channels = match opus::packet::get_nb_channels(packet) {
            Ok(opus::Channels::Mono) => 1,
            Ok(opus::Channels::Stereo) => 2,
            Err(e) => {
                return Err(CodecError::DecodingFailed {
                    reason: format!("Unreadable Opus packet: {}", e),
                }
                .into())
            }
        };

        if self.decoder.is_none() || self.last_channels != channels {
            let decoder = opus::Decoder::new(self.sample_rate, channels_of(channels)?).map_err(
                |e| {
                    warn!(channels, "opus decoder failed to reset");
                    CodecError::InitializationFailed {
                        reason: format!("Opus decoder creation failed: {}", e),
                    }
                },
            )?;
            self.decoder = Some(decoder);
            self.last_channels = channels;
        }

        Ok(channels)
    }
}
