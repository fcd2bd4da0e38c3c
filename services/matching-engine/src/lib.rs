//! Matching Engine Service
//!
//! Continuous double-auction matching for a single market: two order books
//! (ask and bid) with price-time priority, limit and market orders, and a
//! stream of book events.
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced, resting market orders first
//! - Trades execute at the resting order's price
//! - The resting limit book is never left crossed after a submit
//! - Conservation of volume across every trade

pub mod book;
pub mod engine;
pub mod error;
pub mod events;
pub mod market;
pub mod matching;
pub mod snapshot;

pub use book::{BookOptions, OrderBook, OrderBookManager, PriceLevel};
pub use engine::{Engine, Remainder, SubmitOutcome};
pub use error::{BookError, EngineError};
pub use events::{
    CancelReason, ChannelSink, EngineEvent, EventEnvelope, EventPublisher, EventSink, NullSink,
    RecordingSink,
};
pub use market::{MarketError, MarketHandle};
pub use snapshot::{EngineSnapshot, LimitOrders, MarketOrders, Sides};
