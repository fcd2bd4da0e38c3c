//! Read-only projections of book state

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::ids::MarketId;
use types::numeric::Price;
use types::order::{Order, Side};

/// A value per book side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sides<T> {
    pub ask: T,
    pub bid: T,
}

impl<T> Sides<T> {
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Ask => &self.ask,
            Side::Bid => &self.bid,
        }
    }
}

/// Resting limit orders per side, by price, each level oldest first
pub type LimitOrders = Sides<BTreeMap<Price, Vec<Order>>>;

/// Resting market orders per side, oldest first
pub type MarketOrders = Sides<Vec<Order>>;

/// Full state of one market at an instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub market_id: MarketId,
    /// Sequence of the last event published before the snapshot was taken
    pub sequence: u64,
    pub best_ask: Option<Price>,
    pub best_bid: Option<Price>,
    pub limit_orders: LimitOrders,
    pub market_orders: MarketOrders,
}

impl EngineSnapshot {
    pub fn order_count(&self) -> usize {
        let limits: usize = [&self.limit_orders.ask, &self.limit_orders.bid]
            .iter()
            .flat_map(|side| side.values())
            .map(Vec::len)
            .sum();
        limits + self.market_orders.ask.len() + self.market_orders.bid.len()
    }
}
