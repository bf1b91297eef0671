//! Jitter buffer for inbound RTP
//!
//! Accepts RTP packets arriving in arbitrary order, with gaps, duplicates,
//! and bounded delay, and hands them to a consumer callback in sequence
//! order, grouped into whole media samples. A packet is held back no longer
//! than the configured latency; once its deadline passes it is either
//! released (counting the sequence gap as loss) or, if its sample never
//! completed, dropped.
//!
//! The buffer is driven from two sides: every push releases whatever became
//! ready, and a background task fires when the head packet's deadline is
//! reached without a new push. Both sides serialize on one mutex, and the
//! consumer callback runs while that mutex is held: the callback must not
//! call back into the buffer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

use rvox_rtp_core::{sequence, Depacketizer, RtpPacket, RtpSequenceNumber};

/// Default added latency in milliseconds
pub const DEFAULT_LATENCY_MS: u64 = 60;

/// Jitter buffer configuration
#[derive(Debug, Clone)]
pub struct JitterBufferConfig {
    /// Maximum delay added between a packet's arrival and its release
    pub latency: Duration,
}

impl Default for JitterBufferConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(DEFAULT_LATENCY_MS),
        }
    }
}

/// Statistics for the jitter buffer
#[derive(Debug, Clone, Default)]
pub struct JitterBufferStats {
    /// Total packets pushed
    pub packets_pushed: u64,

    /// Padding packets pushed
    pub padding_pushed: u64,

    /// Packets lost (sequence gaps crossed on release)
    pub packets_lost: u64,

    /// Packets dropped (stale on arrival, or expired while incomplete)
    pub packets_dropped: u64,

    /// Packets released to the consumer
    pub packets_popped: u64,

    /// Samples released to the consumer
    pub samples_popped: u64,
}

impl JitterBufferStats {
    /// Fraction of pushed packets that were dropped, 0 when nothing was
    /// pushed yet
    pub fn packet_loss(&self) -> f64 {
        if self.packets_pushed == 0 {
            return 0.0;
        }

        self.packets_dropped as f64 / self.packets_pushed as f64
    }
}

/// An RTP packet extended with its arrival time
#[derive(Debug, Clone)]
pub struct ExtendedPacket {
    /// When the packet entered the buffer
    pub received_at: Instant,

    /// The RTP packet
    pub packet: RtpPacket,
}

/// Consumer callback receiving one whole sample per invocation
pub type SampleHandler = Box<dyn FnMut(Vec<ExtendedPacket>) + Send>;

/// Optional callback invoked when packet loss is detected
pub type PacketLossHandler = Box<dyn Fn() + Send>;

/// One buffered packet with its sample-boundary flags
struct PacketNode {
    packet: RtpPacket,
    received_at: Instant,
    /// Payload begins a sample
    start: bool,
    /// Payload ends a sample
    end: bool,
    /// Begins a sample that is not sequentially contiguous with the
    /// previously released one
    discont: bool,
}

impl PacketNode {
    fn seq(&self) -> RtpSequenceNumber {
        self.packet.header.sequence_number
    }
}

struct State {
    depacketizer: Box<dyn Depacketizer>,
    latency: Duration,
    on_sample: SampleHandler,
    on_packet_loss: Option<PacketLossHandler>,

    /// Whether any sample has been released yet; the first release
    /// establishes the sequence baseline
    initialized: bool,
    /// Sequence number of the last packet that left the queue
    prev_sn: RtpSequenceNumber,
    /// Packets ordered by wrap-aware sequence number
    nodes: VecDeque<PacketNode>,

    stats: JitterBufferStats,
}

struct Shared {
    state: Mutex<State>,
    /// Wakes the release task whenever the head deadline may have moved
    wake: Notify,
    closed: AtomicBool,
}

/// Reordering jitter buffer for inbound RTP packets
///
/// Construction spawns the deadline-driven release task, so a buffer must be
/// created from within a Tokio runtime. The consumer callback is invoked
/// synchronously from whichever side releases a sample (the pushing thread or
/// the release task), with the buffer lock held.
pub struct JitterBuffer {
    shared: Arc<Shared>,
}

impl JitterBuffer {
    /// Create a new jitter buffer
    pub fn new(
        depacketizer: Box<dyn Depacketizer>,
        config: JitterBufferConfig,
        on_sample: SampleHandler,
    ) -> Self {
        debug!(latency_ms = config.latency.as_millis() as u64, "creating jitter buffer");

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                depacketizer,
                latency: config.latency,
                on_sample,
                on_packet_loss: None,
                initialized: false,
                prev_sn: 0,
                nodes: VecDeque::new(),
                stats: JitterBufferStats::default(),
            }),
            wake: Notify::new(),
            closed: AtomicBool::new(false),
        });

        tokio::spawn(run_release_task(shared.clone()));

        Self { shared }
    }

    /// Install a callback invoked when packet loss is detected. Loss signals
    /// are coalesced: at most one invocation per release pass.
    pub fn set_packet_loss_handler(&self, handler: PacketLossHandler) {
        let mut state = self.shared.state.lock().unwrap();
        state.on_packet_loss = Some(handler);
    }

    /// Insert a packet and release whatever became ready.
    ///
    /// Fire-and-forget: stale and pre-session padding packets are discarded
    /// internally. Pushing into a closed buffer is ignored.
    pub fn push(&self, packet: RtpPacket) {
        if self.shared.closed.load(Ordering::Acquire) {
            trace!(
                seq = packet.header.sequence_number,
                "push into closed jitter buffer ignored"
            );
            return;
        }

        {
            let mut state = self.shared.state.lock().unwrap();
            let now = Instant::now();
            state.push(packet, now);
            if !state.nodes.is_empty() {
                state.pop_ready(now);
            }
        }

        self.shared.wake.notify_one();
    }

    /// Current number of buffered packets
    pub fn size(&self) -> usize {
        self.shared.state.lock().unwrap().nodes.len()
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> JitterBufferStats {
        self.shared.state.lock().unwrap().stats.clone()
    }

    /// Replace the latency bound. A head packet whose new deadline already
    /// passed is released on the next wakeup of the release task.
    pub fn update_latency(&self, latency: Duration) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.latency = latency;
        }
        self.shared.wake.notify_one();
    }

    /// Stop the release task. Idempotent; packets still buffered are
    /// discarded without counting as loss.
    pub fn close(&self) {
        if !self.shared.closed.swap(true, Ordering::AcqRel) {
            debug!("closing jitter buffer");
        }
        self.shared.wake.notify_one();
    }
}

impl Drop for JitterBuffer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Waits for the head packet's deadline and runs a release pass when it
/// fires. Any state change that can move the deadline notifies `wake`, after
/// which the deadline is recomputed.
async fn run_release_task(shared: Arc<Shared>) {
    loop {
        if shared.closed.load(Ordering::Acquire) {
            return;
        }

        let deadline = {
            let state = shared.state.lock().unwrap();
            state
                .nodes
                .front()
                .map(|head| head.received_at + state.latency)
        };

        tokio::select! {
            _ = shared.wake.notified() => {}
            _ = sleep_until_or_forever(deadline) => {
                if shared.closed.load(Ordering::Acquire) {
                    return;
                }
                let mut state = shared.state.lock().unwrap();
                state.pop_ready(Instant::now());
            }
        }
    }
}

async fn sleep_until_or_forever(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// True if `received_at` is at or past the expiry cutoff
fn is_overdue(received_at: Instant, expiry: Option<Instant>) -> bool {
    expiry.map_or(false, |expiry| received_at <= expiry)
}

impl State {
    /// Insert a packet into the ordered queue
    fn push(&mut self, packet: RtpPacket, now: Instant) {
        self.stats.packets_pushed += 1;

        let padding = packet.header.padding;
        if padding {
            self.stats.padding_pushed += 1;
            if !self.initialized {
                return;
            }
        }

        let seq = packet.header.sequence_number;
        if self.initialized && sequence::is_before(seq, self.prev_sn) {
            // packet expired
            trace!(seq, prev_sn = self.prev_sn, "dropping stale packet");
            if !padding {
                self.stats.packets_dropped += 1;
                if let Some(on_loss) = &self.on_packet_loss {
                    on_loss();
                }
            }
            return;
        }

        let start = self.depacketizer.is_partition_head(&packet.payload);
        let end = self
            .depacketizer
            .is_partition_tail(packet.header.marker, &packet.payload);
        let mut node = PacketNode {
            packet,
            received_at: now,
            start,
            end,
            discont: false,
        };

        let discont = !self.initialized || !sequence::within_range(seq, self.prev_sn);

        let (head_seq, tail_seq) = match (self.nodes.front(), self.nodes.back()) {
            (Some(head), Some(tail)) => (head.seq(), tail.seq()),
            _ => {
                node.discont = discont && node.start;
                self.nodes.push_back(node);
                return;
            }
        };

        let before_head = sequence::is_before(seq, head_seq);
        let after_tail = !sequence::is_before(seq, tail_seq);
        let within_head_range = sequence::within_range(seq, head_seq);
        let within_tail_range = sequence::within_range(seq, tail_seq);

        if before_head && within_head_range {
            // prepend
            node.discont = discont && node.start;
            self.nodes.push_front(node);
        } else if after_tail && within_tail_range {
            // append
            self.nodes.push_back(node);
        } else if within_tail_range {
            // insert, searching backward from the tail
            for i in (0..self.nodes.len() - 1).rev() {
                let c_seq = self.nodes[i].seq();
                let discont = !sequence::within_range(seq, c_seq);
                if !sequence::is_before(seq, c_seq) || discont {
                    // insert after c
                    node.discont = discont && node.start;
                    self.nodes.insert(i + 1, node);
                    return;
                }
            }
            // the scan always terminates at the head, which either orders
            // before `seq` or breaks continuity with it
            self.nodes.push_front(node);
        } else if within_head_range {
            // insert, searching forward from the head
            for i in 1..self.nodes.len() {
                let c_seq = self.nodes[i].seq();
                let discont = !sequence::within_range(seq, c_seq);
                if sequence::is_before(seq, c_seq) || discont {
                    // insert before c
                    self.nodes.insert(i, node);
                    return;
                }
            }
            self.nodes.push_back(node);
        } else {
            // far from both ends: starts a new continuity segment
            node.discont = node.start;
            self.nodes.push_back(node);
        }
    }

    /// Release everything that is ready: drop incomplete expired heads, then
    /// emit complete head samples that are contiguous, discontinuous, or
    /// past their deadline. Signals loss at most once per pass.
    fn pop_ready(&mut self, now: Instant) {
        let expiry = now.checked_sub(self.latency);

        let mut loss = self.drop_incomplete_expired(expiry);

        loop {
            let Some(sample_len) = self.complete_sample_len() else {
                break;
            };
            let (head_seq, head_discont, head_received_at) = {
                let Some(head) = self.nodes.front() else { break };
                (head.seq(), head.discont, head.received_at)
            };

            if head_seq == self.prev_sn.wrapping_add(1) || head_discont || !self.initialized {
                // next in sequence
            } else if is_overdue(head_received_at, expiry) {
                // max latency reached, cross the gap
                loss = true;
                self.stats.packets_lost +=
                    u64::from(head_seq.wrapping_sub(self.prev_sn).wrapping_sub(1));
                trace!(
                    seq = head_seq,
                    prev_sn = self.prev_sn,
                    "releasing sample past a sequence gap"
                );
            } else {
                break;
            }

            let sample = self.pop_sample(sample_len);
            if !sample.is_empty() {
                (self.on_sample)(sample);
            }
        }

        if loss {
            if let Some(on_loss) = &self.on_packet_loss {
                on_loss();
            }
        }
    }

    /// Drop head packets whose sample cannot complete anymore
    fn drop_incomplete_expired(&mut self, expiry: Option<Instant>) -> bool {
        let mut dropped = false;

        while self.complete_sample_len().is_none() {
            let Some(head) = self.nodes.front() else { break };
            if !is_overdue(head.received_at, expiry) {
                break;
            }

            if self.initialized && !head.discont {
                self.stats.packets_lost +=
                    u64::from(head.seq().wrapping_sub(self.prev_sn).wrapping_sub(1));
            }
            trace!(seq = head.seq(), "dropping expired incomplete packet");

            self.pop_head();
            dropped = true;
            self.stats.packets_dropped += 1;
        }

        dropped
    }

    /// Length of the complete sample at the head of the queue, if any: a
    /// prefix opening with a start (or discontinuity) flag, closed by an end
    /// flag, with every intermediate step sequentially contiguous.
    fn complete_sample_len(&self) -> Option<usize> {
        let first = self.nodes.front()?;
        if !first.start && !first.discont {
            return None;
        }

        let mut prev_seq = first.seq();
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                if node.discont || node.seq() != prev_seq.wrapping_add(1) {
                    return None;
                }
                prev_seq = node.seq();
            }
            if node.end {
                return Some(i + 1);
            }
        }

        None
    }

    /// Release the head sample. Padding packets are consumed but not
    /// delivered.
    fn pop_sample(&mut self, len: usize) -> Vec<ExtendedPacket> {
        let mut sample = Vec::with_capacity(len);
        for _ in 0..len {
            if let Some(node) = self.pop_head() {
                if !node.packet.header.padding {
                    sample.push(ExtendedPacket {
                        received_at: node.received_at,
                        packet: node.packet,
                    });
                }
                self.stats.packets_popped += 1;
            }
        }

        self.initialized = true;
        self.stats.samples_popped += 1;

        sample
    }

    fn pop_head(&mut self) -> Option<PacketNode> {
        let node = self.nodes.pop_front()?;
        self.prev_sn = node.seq();
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtp_processing::AudioDepacketizer;
    use bytes::Bytes;
    use rvox_rtp_core::{Result as RtpResult, RtpHeader};
    use std::sync::atomic::AtomicUsize;

    type Delivered = Arc<Mutex<Vec<Vec<u16>>>>;

    fn audio_packet(seq: u16) -> RtpPacket {
        RtpPacket::new(
            RtpHeader {
                sequence_number: seq,
                ..Default::default()
            },
            Bytes::from_static(b"audio"),
        )
    }

    fn padding_packet(seq: u16) -> RtpPacket {
        RtpPacket::new(
            RtpHeader {
                sequence_number: seq,
                padding: true,
                ..Default::default()
            },
            Bytes::new(),
        )
    }

    fn recording_buffer(latency: Duration) -> (JitterBuffer, Delivered, Arc<AtomicUsize>) {
        let delivered: Delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = delivered.clone();
        let buffer = JitterBuffer::new(
            Box::new(AudioDepacketizer),
            JitterBufferConfig { latency },
            Box::new(move |sample| {
                let seqs = sample
                    .iter()
                    .map(|p| p.packet.header.sequence_number)
                    .collect();
                sink.lock().unwrap().push(seqs);
            }),
        );

        let loss_signals = Arc::new(AtomicUsize::new(0));
        let counter = loss_signals.clone();
        buffer.set_packet_loss_handler(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        (buffer, delivered, loss_signals)
    }

    fn delivered_seqs(delivered: &Delivered) -> Vec<Vec<u16>> {
        delivered.lock().unwrap().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_order_delivery() {
        let (buffer, delivered, loss_signals) = recording_buffer(Duration::from_millis(100));

        buffer.push(audio_packet(100));
        assert_eq!(delivered_seqs(&delivered), vec![vec![100]]);

        time::sleep(Duration::from_millis(20)).await;
        buffer.push(audio_packet(101));
        time::sleep(Duration::from_millis(20)).await;
        buffer.push(audio_packet(102));

        assert_eq!(
            delivered_seqs(&delivered),
            vec![vec![100], vec![101], vec![102]]
        );

        let stats = buffer.stats();
        assert_eq!(stats.packets_pushed, 3);
        assert_eq!(stats.packets_popped, 3);
        assert_eq!(stats.samples_popped, 3);
        assert_eq!(stats.packets_lost, 0);
        assert_eq!(stats.packets_dropped, 0);
        assert_eq!(loss_signals.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reordering_recovered() {
        let (buffer, delivered, loss_signals) = recording_buffer(Duration::from_millis(100));

        buffer.push(audio_packet(100));
        time::sleep(Duration::from_millis(10)).await;
        buffer.push(audio_packet(102));
        assert_eq!(delivered_seqs(&delivered), vec![vec![100]]);

        time::sleep(Duration::from_millis(10)).await;
        buffer.push(audio_packet(101));

        assert_eq!(
            delivered_seqs(&delivered),
            vec![vec![100], vec![101], vec![102]]
        );
        assert_eq!(buffer.stats().packets_lost, 0);
        assert_eq!(loss_signals.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gap_released_on_deadline() {
        let (buffer, delivered, loss_signals) = recording_buffer(Duration::from_millis(100));

        buffer.push(audio_packet(100));
        time::sleep(Duration::from_millis(10)).await;
        buffer.push(audio_packet(102));
        assert_eq!(delivered_seqs(&delivered), vec![vec![100]]);

        // packet 101 never arrives; the release task crosses the gap once
        // the deadline for 102 passes
        time::sleep(Duration::from_millis(200)).await;

        assert_eq!(delivered_seqs(&delivered), vec![vec![100], vec![102]]);
        assert_eq!(buffer.stats().packets_lost, 1);
        assert_eq!(loss_signals.load(Ordering::SeqCst), 1);
        assert_eq!(buffer.size(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_packet_dropped() {
        let (buffer, delivered, loss_signals) = recording_buffer(Duration::from_millis(100));

        buffer.push(audio_packet(100));
        time::sleep(Duration::from_millis(5)).await;
        buffer.push(audio_packet(99));

        assert_eq!(delivered_seqs(&delivered), vec![vec![100]]);
        let stats = buffer.stats();
        assert_eq!(stats.packets_dropped, 1);
        assert_eq!(loss_signals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_wraparound() {
        let (buffer, delivered, loss_signals) = recording_buffer(Duration::from_millis(100));

        for seq in [65534u16, 65535, 0, 1] {
            buffer.push(audio_packet(seq));
            time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(
            delivered_seqs(&delivered),
            vec![vec![65534], vec![65535], vec![0], vec![1]]
        );
        assert_eq!(buffer.stats().packets_lost, 0);
        assert_eq!(loss_signals.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distant_sequence_starts_new_segment() {
        let (buffer, delivered, loss_signals) = recording_buffer(Duration::from_millis(100));

        buffer.push(audio_packet(100));
        time::sleep(Duration::from_millis(10)).await;
        buffer.push(audio_packet(20000));

        // far ahead of the reorder window: a new segment, not a 19899-packet
        // loss
        assert_eq!(delivered_seqs(&delivered), vec![vec![100], vec![20000]]);
        let stats = buffer.stats();
        assert_eq!(stats.packets_lost, 0);
        assert_eq!(stats.packets_dropped, 0);
        assert_eq!(loss_signals.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_interior_insert() {
        let (buffer, delivered, _) = recording_buffer(Duration::from_millis(100));

        buffer.push(audio_packet(100));
        buffer.push(audio_packet(103));
        buffer.push(audio_packet(105));
        buffer.push(audio_packet(104));
        buffer.push(audio_packet(101));
        buffer.push(audio_packet(102));

        assert_eq!(
            delivered_seqs(&delivered),
            vec![
                vec![100],
                vec![101],
                vec![102],
                vec![103],
                vec![104],
                vec![105]
            ]
        );
        assert_eq!(buffer.stats().packets_lost, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_padding_before_init_discarded() {
        let (buffer, delivered, loss_signals) = recording_buffer(Duration::from_millis(100));

        buffer.push(padding_packet(100));

        assert!(delivered_seqs(&delivered).is_empty());
        assert_eq!(buffer.size(), 0);
        let stats = buffer.stats();
        assert_eq!(stats.packets_pushed, 1);
        assert_eq!(stats.padding_pushed, 1);
        assert_eq!(stats.packets_dropped, 0);
        assert_eq!(loss_signals.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_padding_consumed_not_delivered() {
        let (buffer, delivered, _) = recording_buffer(Duration::from_millis(100));

        buffer.push(audio_packet(100));
        time::sleep(Duration::from_millis(10)).await;
        buffer.push(padding_packet(101));

        // the padding packet is consumed silently
        assert_eq!(delivered_seqs(&delivered), vec![vec![100]]);
        assert_eq!(buffer.size(), 0);
        let stats = buffer.stats();
        assert_eq!(stats.packets_pushed, 2);
        assert_eq!(stats.padding_pushed, 1);
        assert_eq!(stats.packets_popped, 2);
        assert_eq!(stats.samples_popped, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_after_delivery_dropped() {
        let (buffer, delivered, loss_signals) = recording_buffer(Duration::from_millis(100));

        buffer.push(audio_packet(100));
        buffer.push(audio_packet(100));

        assert_eq!(delivered_seqs(&delivered), vec![vec![100]]);
        assert_eq!(buffer.stats().packets_dropped, 1);
        assert_eq!(loss_signals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_latency_releases_early() {
        let (buffer, delivered, _) = recording_buffer(Duration::from_millis(100));

        buffer.push(audio_packet(100));
        time::sleep(Duration::from_millis(5)).await;
        buffer.push(audio_packet(102));
        assert_eq!(delivered_seqs(&delivered), vec![vec![100]]);

        buffer.update_latency(Duration::from_millis(1));
        time::sleep(Duration::from_millis(5)).await;

        assert_eq!(delivered_seqs(&delivered), vec![vec![100], vec![102]]);
        assert_eq!(buffer.stats().packets_lost, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drains_within_latency() {
        let (buffer, delivered, loss_signals) = recording_buffer(Duration::from_millis(100));

        buffer.push(audio_packet(100));
        time::sleep(Duration::from_millis(10)).await;
        buffer.push(audio_packet(103));
        buffer.push(audio_packet(104));

        // no more pushes: the buffer must drain by itself
        time::sleep(Duration::from_millis(150)).await;

        assert_eq!(
            delivered_seqs(&delivered),
            vec![vec![100], vec![103], vec![104]]
        );
        assert_eq!(buffer.size(), 0);
        assert_eq!(buffer.stats().packets_lost, 2);
        assert_eq!(loss_signals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_is_idempotent_and_push_after_close_ignored() {
        let (buffer, delivered, _) = recording_buffer(Duration::from_millis(100));

        buffer.close();
        buffer.close();
        buffer.push(audio_packet(100));

        assert!(delivered_seqs(&delivered).is_empty());
        assert_eq!(buffer.size(), 0);
        assert_eq!(buffer.stats().packets_pushed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conservation_of_counters() {
        let (buffer, _, _) = recording_buffer(Duration::from_millis(100));

        buffer.push(audio_packet(100));
        buffer.push(audio_packet(102));
        buffer.push(audio_packet(99));

        let stats = buffer.stats();
        assert_eq!(
            stats.packets_pushed,
            stats.packets_popped + stats.packets_dropped + buffer.size() as u64
        );
    }

    /// Depacketizer whose payloads spell out the sample boundaries: the
    /// sample starts on a payload beginning with 'H', and ends on the marker
    /// bit.
    struct BoundaryDepacketizer;

    impl Depacketizer for BoundaryDepacketizer {
        fn unmarshal(&self, payload: &[u8]) -> RtpResult<Bytes> {
            Ok(Bytes::copy_from_slice(payload))
        }

        fn is_partition_head(&self, payload: &[u8]) -> bool {
            payload.first() == Some(&b'H')
        }

        fn is_partition_tail(&self, marker: bool, _payload: &[u8]) -> bool {
            marker
        }
    }

    fn boundary_packet(seq: u16, payload: &'static [u8], marker: bool) -> RtpPacket {
        RtpPacket::new(
            RtpHeader {
                sequence_number: seq,
                marker,
                ..Default::default()
            },
            Bytes::from_static(payload),
        )
    }

    fn boundary_buffer(latency: Duration) -> (JitterBuffer, Delivered, Arc<AtomicUsize>) {
        let delivered: Delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = delivered.clone();
        let buffer = JitterBuffer::new(
            Box::new(BoundaryDepacketizer),
            JitterBufferConfig { latency },
            Box::new(move |sample| {
                let seqs = sample
                    .iter()
                    .map(|p| p.packet.header.sequence_number)
                    .collect();
                sink.lock().unwrap().push(seqs);
            }),
        );

        let loss_signals = Arc::new(AtomicUsize::new(0));
        let counter = loss_signals.clone();
        buffer.set_packet_loss_handler(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        (buffer, delivered, loss_signals)
    }

    #[tokio::test(start_paused = true)]
    async fn test_multi_packet_sample_delivered_whole() {
        let (buffer, delivered, _) = boundary_buffer(Duration::from_millis(100));

        buffer.push(boundary_packet(100, b"Ha", false));
        assert!(delivered_seqs(&delivered).is_empty());

        buffer.push(boundary_packet(101, b"xa", true));
        assert_eq!(delivered_seqs(&delivered), vec![vec![100, 101]]);

        let stats = buffer.stats();
        assert_eq!(stats.samples_popped, 1);
        assert_eq!(stats.packets_popped, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_expired_sample_dropped() {
        let (buffer, delivered, loss_signals) = boundary_buffer(Duration::from_millis(100));

        // sample head without its tail
        buffer.push(boundary_packet(100, b"Ha", false));
        time::sleep(Duration::from_millis(150)).await;

        assert!(delivered_seqs(&delivered).is_empty());
        assert_eq!(buffer.size(), 0);
        let stats = buffer.stats();
        assert_eq!(stats.packets_dropped, 1);
        assert_eq!(stats.packets_lost, 0);
        assert_eq!(loss_signals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_packet_loss_ratio() {
        let stats = JitterBufferStats {
            packets_pushed: 10,
            packets_dropped: 2,
            ..Default::default()
        };
        assert!((stats.packet_loss() - 0.2).abs() < f64::EPSILON);
        assert_eq!(JitterBufferStats::default().packet_loss(), 0.0);
    }
}
