//! Order book infrastructure module
//!
//! Contains price levels, the per-side order book and the ask/bid pair.

pub mod price_level;
pub mod order_book;
pub mod manager;

pub use price_level::PriceLevel;
pub use order_book::{BookOptions, OrderBook};
pub use manager::OrderBookManager;
