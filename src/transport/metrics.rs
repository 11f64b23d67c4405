//! Process-wide transport counters.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::ump::MessageType;

/// Lock-free counters shared by every client and host in the process.
pub(crate) struct Metrics;

static DATAGRAMS_SENT: AtomicU64 = AtomicU64::new(0);
static DATAGRAMS_RECEIVED: AtomicU64 = AtomicU64::new(0);
static UMP_SENT: AtomicU64 = AtomicU64::new(0);
static UMP_RECEIVED: AtomicU64 = AtomicU64::new(0);
static DECODE_ERRORS: AtomicU64 = AtomicU64::new(0);
static OPEN_SESSIONS: AtomicU64 = AtomicU64::new(0);
static PEAK_OPEN_SESSIONS: AtomicU64 = AtomicU64::new(0);

struct FamilyCounters {
    utility: AtomicU64,
    system: AtomicU64,
    midi1: AtomicU64,
    data64: AtomicU64,
    midi2: AtomicU64,
    data128: AtomicU64,
    flex: AtomicU64,
    stream: AtomicU64,
}

static SENT_BY_FAMILY: FamilyCounters = FamilyCounters::new();

impl FamilyCounters {
    const fn new() -> Self {
        Self {
            utility: AtomicU64::new(0),
            system: AtomicU64::new(0),
            midi1: AtomicU64::new(0),
            data64: AtomicU64::new(0),
            midi2: AtomicU64::new(0),
            data128: AtomicU64::new(0),
            flex: AtomicU64::new(0),
            stream: AtomicU64::new(0),
        }
    }

    fn counter(&self, message_type: MessageType) -> &AtomicU64 {
        match message_type {
            MessageType::Utility => &self.utility,
            MessageType::SystemRealTime => &self.system,
            MessageType::Midi1ChannelVoice => &self.midi1,
            MessageType::Data64 => &self.data64,
            MessageType::Midi2ChannelVoice => &self.midi2,
            MessageType::Data128 => &self.data128,
            MessageType::FlexData => &self.flex,
            MessageType::UmpStream => &self.stream,
        }
    }

    fn load(&self) -> [u64; 8] {
        [
            &self.utility,
            &self.system,
            &self.midi1,
            &self.data64,
            &self.midi2,
            &self.data128,
            &self.flex,
            &self.stream,
        ]
        .map(|counter| counter.load(Ordering::Relaxed))
    }
}

impl Metrics {
    #[inline]
    pub(crate) fn record_datagram_sent() {
        DATAGRAMS_SENT.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_datagram_received() {
        DATAGRAMS_RECEIVED.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_ump_sent(message_type: MessageType) {
        UMP_SENT.fetch_add(1, Ordering::Relaxed);
        SENT_BY_FAMILY
            .counter(message_type)
            .fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_ump_received() {
        UMP_RECEIVED.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_decode_error() {
        DECODE_ERRORS.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_session_open() {
        let open = OPEN_SESSIONS.fetch_add(1, Ordering::Relaxed) + 1;
        update_max(&PEAK_OPEN_SESSIONS, open);
    }

    #[inline]
    pub(crate) fn record_session_close() {
        // saturate so an unmatched close cannot wrap the gauge
        let _ = OPEN_SESSIONS.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |open| {
            Some(open.saturating_sub(1))
        });
    }
}

fn update_max(target: &AtomicU64, candidate: u64) {
    let mut current = target.load(Ordering::Relaxed);
    while candidate > current {
        match target.compare_exchange_weak(
            current,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return,
            Err(old) => current = old,
        }
    }
}

/// Point-in-time copy of the transport counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Datagrams written to a socket
    pub datagrams_sent: u64,
    /// Datagrams read from a socket
    pub datagrams_received: u64,
    /// UMP messages sent
    pub ump_sent: u64,
    /// UMP messages received and decoded
    pub ump_received: u64,
    /// Datagrams or UMP payloads that failed to decode
    pub decode_errors: u64,
    /// Sessions currently open
    pub open_sessions: u64,
    /// Highest number of sessions open at once
    pub peak_open_sessions: u64,
    /// UMP messages sent, indexed by family in message type order
    pub ump_sent_by_family: [u64; 8],
}

impl MetricsSnapshot {
    /// Messages sent for one family
    #[must_use]
    pub fn sent_for(&self, message_type: MessageType) -> u64 {
        let index = match message_type {
            MessageType::Utility => 0,
            MessageType::SystemRealTime => 1,
            MessageType::Midi1ChannelVoice => 2,
            MessageType::Data64 => 3,
            MessageType::Midi2ChannelVoice => 4,
            MessageType::Data128 => 5,
            MessageType::FlexData => 6,
            MessageType::UmpStream => 7,
        };
        self.ump_sent_by_family[index]
    }
}

/// Read the current counters.
#[must_use]
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        datagrams_sent: DATAGRAMS_SENT.load(Ordering::Relaxed),
        datagrams_received: DATAGRAMS_RECEIVED.load(Ordering::Relaxed),
        ump_sent: UMP_SENT.load(Ordering::Relaxed),
        ump_received: UMP_RECEIVED.load(Ordering::Relaxed),
        decode_errors: DECODE_ERRORS.load(Ordering::Relaxed),
        open_sessions: OPEN_SESSIONS.load(Ordering::Relaxed),
        peak_open_sessions: PEAK_OPEN_SESSIONS.load(Ordering::Relaxed),
        ump_sent_by_family: SENT_BY_FAMILY.load(),
    }
}
