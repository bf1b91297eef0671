//! Jitter-buffered RTP handler composition
//!
//! Wraps any [`RtpHandler`] behind a [`JitterBuffer`], so the inner handler
//! sees packets in sequence order regardless of network reordering. Samples
//! released by the buffer flow through a channel to a forwarding task; errors
//! from the inner handler are parked in a single-slot channel and surfaced on
//! the next `handle_packet` call. When the slot is already occupied the error
//! is dropped.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use rvox_rtp_core::{RtpHeader, RtpPacket};

use crate::buffer::jitter::{ExtendedPacket, JitterBuffer, JitterBufferConfig};
use crate::error::{Error, Result};

use super::AudioDepacketizer;

/// Jitter latency for audio sessions; should match the mixer's target buffer
/// size downstream.
pub const DEFAULT_JITTER_LATENCY: Duration = Duration::from_millis(60);

/// Handler for inbound RTP, invoked once per packet
pub trait RtpHandler: Send {
    /// Handle one RTP packet
    fn handle_packet(&mut self, header: &RtpHeader, payload: &[u8]) -> Result<()>;
}

/// An [`RtpHandler`] that reorders packets through a jitter buffer before
/// invoking the wrapped handler
pub struct JitterHandler {
    buffer: JitterBuffer,
    errors: mpsc::Receiver<Error>,
}

impl JitterHandler {
    /// Wrap `handler` behind a jitter buffer with the default audio latency
    pub fn new<H: RtpHandler + 'static>(handler: H) -> Self {
        Self::with_latency(handler, DEFAULT_JITTER_LATENCY)
    }

    /// Wrap `handler` behind a jitter buffer with the given latency
    pub fn with_latency<H: RtpHandler + 'static>(mut handler: H, latency: Duration) -> Self {
        let (sample_tx, mut sample_rx) = mpsc::unbounded_channel::<Vec<ExtendedPacket>>();
        let (error_tx, error_rx) = mpsc::channel::<Error>(1);

        tokio::spawn(async move {
            while let Some(sample) = sample_rx.recv().await {
                for pkt in sample {
                    if let Err(e) = handler.handle_packet(&pkt.packet.header, &pkt.packet.payload)
                    {
                        debug!(error = %e, "inbound handler failed");
                        // error slot full: drop it
                        let _ = error_tx.try_send(e);
                    }
                }
            }
        });

        let buffer = JitterBuffer::new(
            Box::new(AudioDepacketizer),
            JitterBufferConfig { latency },
            Box::new(move |sample| {
                // forwarding task gone means we are shutting down
                let _ = sample_tx.send(sample);
            }),
        );

        Self {
            buffer,
            errors: error_rx,
        }
    }

    /// The jitter buffer behind this handler, for stats and latency updates
    pub fn buffer(&self) -> &JitterBuffer {
        &self.buffer
    }

    /// Stop the jitter buffer and the forwarding task
    pub fn close(&self) {
        self.buffer.close();
    }
}

impl RtpHandler for JitterHandler {
    fn handle_packet(&mut self, header: &RtpHeader, payload: &[u8]) -> Result<()> {
        self.buffer.push(RtpPacket::new(
            header.clone(),
            Bytes::copy_from_slice(payload),
        ));

        match self.errors.try_recv() {
            Ok(e) => Err(e),
            Err(_) => Ok(()),
        }
    }
}
