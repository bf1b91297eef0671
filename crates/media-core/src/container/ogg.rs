//! Ogg Opus file sink
//!
//! Writes received Opus packets into an Ogg container so a capture of an RTP
//! session can be played back with standard tools. One logical stream per
//! writer: an OpusHead (BOS) page and an OpusTags page up front, one data
//! page per packet, and an EOS page on close.

use std::io::Write;

use tracing::debug;

use crate::error::{ContainerError, Result};
use crate::types::SampleRate;

const PAGE_HEADER_SIGNATURE: &[u8] = b"OggS";
const PAGE_HEADER_SIZE: usize = 27;

/// Fresh data page, no special flags
const PAGE_TYPE_FRESH: u8 = 0x00;
/// Beginning-of-stream page
const PAGE_TYPE_BOS: u8 = 0x02;
/// End-of-stream page
const PAGE_TYPE_EOS: u8 = 0x04;

/// 80 ms at 48 kHz (RFC 7845 section 5.1)
const PRE_SKIP_48K: u16 = 3840;

const VENDOR: &[u8] = b"rvox";

/// Writes Opus packets into an Ogg container
pub struct OggOpusWriter<W: Write> {
    writer: W,
    serial: u32,
    /// Running granule position in 48 kHz samples
    granule: u64,
    page_index: u32,
    crc_table: [u32; 256],
    closed: bool,
}

impl<W: Write> OggOpusWriter<W> {
    /// Create a writer and emit the stream header pages.
    ///
    /// `sample_rate` and `channels` describe the original audio and go into
    /// the OpusHead page; granule positions are always counted at 48 kHz.
    pub fn new(writer: W, sample_rate: SampleRate, channels: u8) -> Result<Self> {
        let mut w = Self {
            writer,
            serial: 1,
            granule: 0,
            page_index: 0,
            crc_table: crc_table(),
            closed: false,
        };
        w.write_id_header(sample_rate, channels)?;
        w.write_comment_header()?;
        Ok(w)
    }

    fn write_id_header(&mut self, sample_rate: SampleRate, channels: u8) -> Result<()> {
        let mut header = Vec::with_capacity(19);
        header.extend_from_slice(b"OpusHead");
        header.push(1); // version
        header.push(channels);
        header.extend_from_slice(&PRE_SKIP_48K.to_le_bytes());
        header.extend_from_slice(&sample_rate.as_hz().to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes()); // output gain
        header.push(0); // channel mapping family

        let page = self.build_page(&header, PAGE_TYPE_BOS, 0);
        self.writer.write_all(&page)?;
        Ok(())
    }

    fn write_comment_header(&mut self) -> Result<()> {
        let mut header = Vec::with_capacity(16 + VENDOR.len());
        header.extend_from_slice(b"OpusTags");
        header.extend_from_slice(&(VENDOR.len() as u32).to_le_bytes());
        header.extend_from_slice(VENDOR);
        header.extend_from_slice(&0u32.to_le_bytes()); // no user comments

        let page = self.build_page(&header, PAGE_TYPE_FRESH, 0);
        self.writer.write_all(&page)?;
        Ok(())
    }

    /// Append one Opus packet spanning `samples_48k` samples at 48 kHz
    /// (960 for a 20 ms frame)
    pub fn write_packet(&mut self, packet: &[u8], samples_48k: u64) -> Result<()> {
        if self.closed {
            return Err(ContainerError::WriterClosed.into());
        }

        self.granule += samples_48k;
        let page = self.build_page(packet, PAGE_TYPE_FRESH, self.granule);
        self.writer.write_all(&page)?;
        Ok(())
    }

    /// Current granule position in 48 kHz samples
    pub fn granule(&self) -> u64 {
        self.granule
    }

    /// Finish the stream with an EOS page. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        let page = self.build_page(&[], PAGE_TYPE_EOS, self.granule);
        self.writer.write_all(&page)?;
        self.writer.flush()?;
        self.closed = true;
        debug!(granule = self.granule, "closed Ogg Opus stream");
        Ok(())
    }

    fn build_page(&mut self, payload: &[u8], page_type: u8, granule: u64) -> Vec<u8> {
        // 255-byte lacing: a final segment shorter than 255 (possibly empty)
        // terminates the packet
        let segments = payload.len() / 255 + 1;

        let mut page = Vec::with_capacity(PAGE_HEADER_SIZE + segments + payload.len());
        page.extend_from_slice(PAGE_HEADER_SIGNATURE);
        page.push(0); // version
        page.push(page_type);
        page.extend_from_slice(&granule.to_le_bytes());
        page.extend_from_slice(&self.serial.to_le_bytes());
        page.extend_from_slice(&self.page_index.to_le_bytes());
        page.extend_from_slice(&0u32.to_le_bytes()); // checksum, filled below
        page.push(segments as u8);
        for _ in 0..segments - 1 {
            page.push(255);
        }
        page.push((payload.len() % 255) as u8);
        page.extend_from_slice(payload);

        let checksum = self.page_checksum(&page);
        page[22..26].copy_from_slice(&checksum.to_le_bytes());

        self.page_index += 1;
        page
    }

    fn page_checksum(&self, page: &[u8]) -> u32 {
        let mut checksum: u32 = 0;
        for &b in page {
            checksum =
                (checksum << 8) ^ self.crc_table[(((checksum >> 24) as u8) ^ b) as usize];
        }
        checksum
    }
}

fn crc_table() -> [u32; 256] {
    const POLY: u32 = 0x04c1_1db7;

    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut r = (i as u32) << 24;
        for _ in 0..8 {
            if r & 0x8000_0000 != 0 {
                r = (r << 1) ^ POLY;
            } else {
                r <<= 1;
            }
        }
        *entry = r;
    }
    table
}
