//! Event structures and publication for the matching engine
//!
//! The engine and its books describe every mutation as an [`EngineEvent`].
//! Events go out through the narrow [`EventSink`] capability, so matching
//! has no I/O of its own. [`EventPublisher`] stamps each event with a
//! per-market sequence number before handing it to the sink; sequence order
//! is mutation order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;
use types::ids::MarketId;
use types::order::Order;
use types::trade::Trade;
use uuid::Uuid;

/// Why an order left the book without being filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// Explicit cancellation request
    CancelledByUser,
    /// Unfilled remainder of a market order
    FillOrKillMarketOrder,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::CancelledByUser => f.write_str("cancelled by user"),
            CancelReason::FillOrKillMarketOrder => f.write_str("fill or kill market order"),
        }
    }
}

/// Lifecycle events emitted by the matching core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EngineEvent {
    /// An order started resting in a book
    Added { order: Order },
    /// A resting order was partially filled
    Updated { order: Order },
    /// A resting order left its book (filled or cancelled)
    Removed { order: Order },
    /// A match, with both participants as they stand after the fill
    Trade { ask: Order, bid: Order, trade: Trade },
    /// An order was cancelled
    Cancelled { order: Order, reason: CancelReason },
}

impl EngineEvent {
    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            EngineEvent::Added { .. } => "added",
            EngineEvent::Updated { .. } => "updated",
            EngineEvent::Removed { .. } => "removed",
            EngineEvent::Trade { .. } => "trade",
            EngineEvent::Cancelled { .. } => "cancelled",
        }
    }
}

/// An event as delivered to consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUID v7)
    pub event_id: Uuid,
    pub market_id: MarketId,
    /// Per-market sequence, starting at 1, gap-free
    pub sequence: u64,
    /// Unix nanoseconds at emission
    pub emitted_at: i64,
    pub event: EngineEvent,
}

/// Receiver of engine events.
///
/// Implementations must return promptly and must not fail: matching does
/// not wait on, or react to, delivery.
pub trait EventSink: Send + Sync {
    fn emit(&self, envelope: EventEnvelope);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _envelope: EventEnvelope) {}
}

/// Keeps every event in memory, for tests and replay tooling
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EventEnvelope>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn envelopes(&self) -> Vec<EventEnvelope> {
        self.lock().clone()
    }

    /// Recorded events without their envelopes
    pub fn events(&self) -> Vec<EngineEvent> {
        self.lock().iter().map(|e| e.event.clone()).collect()
    }

    /// Drain the recorded events
    pub fn take(&self) -> Vec<EngineEvent> {
        self.lock().drain(..).map(|e| e.event).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EventEnvelope>> {
        // A poisoned recorder still holds valid events.
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, envelope: EventEnvelope) {
        self.lock().push(envelope);
    }
}

/// Bounded asynchronous hand-off to a broadcast consumer.
///
/// Never blocks: when the channel is full or closed the event is dropped
/// and counted.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<EventEnvelope>,
    dropped: AtomicU64,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Events lost to a full or closed channel
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, envelope: EventEnvelope) {
        match self.tx.try_send(envelope) {
            Ok(()) => {}
            Err(TrySendError::Full(envelope)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    market_id = %envelope.market_id,
                    sequence = envelope.sequence,
                    action = envelope.event.label(),
                    "Event channel full, dropping event"
                );
            }
            Err(TrySendError::Closed(envelope)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    market_id = %envelope.market_id,
                    sequence = envelope.sequence,
                    "Event channel closed, dropping event"
                );
            }
        }
    }
}

/// Sequences events for one market and forwards them to a sink.
///
/// Cloned into each book of the market; clones share the sequence.
#[derive(Clone)]
pub struct EventPublisher {
    market_id: MarketId,
    sequence: Arc<AtomicU64>,
    sink: Arc<dyn EventSink>,
}

impl EventPublisher {
    pub fn new(market_id: MarketId, sink: Arc<dyn EventSink>) -> Self {
        Self {
            market_id,
            sequence: Arc::new(AtomicU64::new(0)),
            sink,
        }
    }

    pub fn publish(&self, event: EngineEvent) {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.sink.emit(EventEnvelope {
            event_id: Uuid::now_v7(),
            market_id: self.market_id,
            sequence,
            emitted_at: chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            event,
        });
    }

    /// Sequence number of the last published event
    pub fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPublisher")
            .field("market_id", &self.market_id)
            .field("sequence", &self.last_sequence())
            .finish_non_exhaustive()
    }
}
