//! One side of one market
//!
//! Resting limit orders live in price levels keyed by exact decimal price
//! (BTreeMap, so iteration is numeric and deterministic). The ask side
//! reads best-first ascending, the bid side descending. Resting market
//! orders sit in a separate queue keyed by id and always take priority
//! over limit orders.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;
use types::errors::OrderError;
use types::ids::{MarketId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, Side};
use types::trade::Trade;

use super::price_level::PriceLevel;
use crate::error::BookError;
use crate::events::{EngineEvent, EventPublisher};

/// Per-book settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookOptions {
    /// Emit added/updated/removed events
    pub broadcast: bool,
}

impl Default for BookOptions {
    fn default() -> Self {
        Self { broadcast: true }
    }
}

#[derive(Debug, Clone)]
pub struct OrderBook {
    market_id: MarketId,
    side: Side,
    limit_orders: BTreeMap<Price, PriceLevel>,
    /// Ids grow with arrival, so this iterates oldest first
    market_orders: BTreeMap<OrderId, Order>,
    /// Ids of every resting order, limit or market
    ids: HashSet<OrderId>,
    publisher: EventPublisher,
    options: BookOptions,
}

impl OrderBook {
    pub fn new(
        market_id: MarketId,
        side: Side,
        publisher: EventPublisher,
        options: BookOptions,
    ) -> Self {
        debug!(%market_id, %side, broadcast = options.broadcast, "New order book");
        Self {
            market_id,
            side,
            limit_orders: BTreeMap::new(),
            market_orders: BTreeMap::new(),
            ids: HashSet::new(),
            publisher,
            options,
        }
    }

    pub fn market_id(&self) -> MarketId {
        self.market_id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// The order with execution priority: the oldest resting market order,
    /// else the head of the best price level.
    pub fn top(&self) -> Option<&Order> {
        self.market_orders
            .values()
            .next()
            .or_else(|| self.limit_top())
    }

    /// Head of the best price level, ignoring market orders
    pub fn limit_top(&self) -> Option<&Order> {
        self.best_level().and_then(PriceLevel::top)
    }

    /// Best price among resting limit orders
    pub fn best_limit_price(&self) -> Option<Price> {
        self.best_level().map(PriceLevel::price)
    }

    fn best_level(&self) -> Option<&PriceLevel> {
        match self.side {
            Side::Ask => self.limit_orders.values().next(),
            Side::Bid => self.limit_orders.values().next_back(),
        }
    }

    /// Price levels best first
    fn levels(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Ask => Box::new(self.limit_orders.values()),
            Side::Bid => Box::new(self.limit_orders.values().rev()),
        }
    }

    /// Apply `trade` to the current top order.
    ///
    /// The top is looked up again here rather than passed in, so the book
    /// never acts on a stale copy. A filled order is removed, otherwise it
    /// is updated in place. Returns the order as it stands after the fill,
    /// or `None` if the book is empty.
    pub fn fill_top(&mut self, trade: &Trade) -> Result<Option<Order>, OrderError> {
        let market_fill = match self.market_orders.first_entry() {
            Some(mut entry) => {
                entry.get_mut().fill(trade)?;
                let order = entry.get().clone();
                if order.is_filled() {
                    entry.remove();
                    self.ids.remove(&order.id);
                }
                Some(order)
            }
            None => None,
        };
        if let Some(order) = market_fill {
            self.announce_fill(&order);
            return Ok(Some(order));
        }

        let Some(price) = self.best_limit_price() else {
            return Ok(None);
        };
        let Some(level) = self.limit_orders.get_mut(&price) else {
            return Ok(None);
        };
        let Some(top) = level.top_mut() else {
            return Ok(None);
        };

        top.fill(trade)?;
        let order = top.clone();
        if order.is_filled() {
            level.remove(order.id);
            if level.is_empty() {
                self.limit_orders.remove(&price);
            }
            self.ids.remove(&order.id);
        }
        self.announce_fill(&order);
        Ok(Some(order))
    }

    fn announce_fill(&self, order: &Order) {
        let order = order.clone();
        if order.is_filled() {
            self.broadcast(EngineEvent::Removed { order });
        } else {
            self.broadcast(EngineEvent::Updated { order });
        }
    }

    /// Rest an order in this book
    pub fn add(&mut self, order: Order) -> Result<(), BookError> {
        if order.volume <= Quantity::zero() {
            return Err(BookError::InvalidVolume { order_id: order.id });
        }
        if order.market_id != self.market_id {
            return Err(BookError::MarketMismatch {
                order_id: order.id,
                order_market: order.market_id,
                book_market: self.market_id,
            });
        }
        if order.side != self.side {
            return Err(BookError::SideMismatch {
                order_id: order.id,
                order_side: order.side,
                book_side: self.side,
            });
        }
        if self.contains(order.id) {
            return Err(BookError::DuplicateOrder { order_id: order.id });
        }

        match order.kind {
            OrderKind::Limit => {
                let price = order
                    .price
                    .ok_or(BookError::MissingPrice { order_id: order.id })?;
                self.limit_orders
                    .entry(price)
                    .or_insert_with(|| PriceLevel::new(price))
                    .add(order.clone());
            }
            OrderKind::Market => {
                self.market_orders.insert(order.id, order.clone());
            }
        }
        self.ids.insert(order.id);

        debug!(market_id = %self.market_id, side = %self.side, order = %order, "Order added");
        self.broadcast(EngineEvent::Added { order });
        Ok(())
    }

    /// Remove a resting order, looked up by (price, id) for limit orders and
    /// by id for market orders. `None` when it is not in the book.
    pub fn remove(&mut self, order: &Order) -> Option<Order> {
        let removed = match order.kind {
            OrderKind::Limit => self.remove_limit_order(order),
            OrderKind::Market => self.market_orders.remove(&order.id),
        }?;
        self.ids.remove(&removed.id);

        debug!(market_id = %self.market_id, side = %self.side, order = %removed, "Order removed");
        self.broadcast(EngineEvent::Removed {
            order: removed.clone(),
        });
        Some(removed)
    }

    fn remove_limit_order(&mut self, order: &Order) -> Option<Order> {
        let price = order.price?;
        let level = self.limit_orders.get_mut(&price)?;
        let removed = level.remove(order.id)?;
        if level.is_empty() {
            self.limit_orders.remove(&price);
        }
        Some(removed)
    }

    /// Whether an order with this id rests anywhere in the book
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.ids.contains(&order_id)
    }

    /// Look up the resting copy of `order`
    pub fn find(&self, order: &Order) -> Option<&Order> {
        match order.kind {
            OrderKind::Limit => self
                .limit_orders
                .get(&order.price?)
                .and_then(|level| level.find(order.id)),
            OrderKind::Market => self.market_orders.get(&order.id),
        }
    }

    /// Resting limit orders by price, each level oldest first
    pub fn limit_orders(&self) -> BTreeMap<Price, Vec<Order>> {
        self.limit_orders
            .iter()
            .map(|(price, level)| (*price, level.iter().cloned().collect()))
            .collect()
    }

    /// Resting market orders oldest first
    pub fn market_orders(&self) -> Vec<Order> {
        self.market_orders.values().cloned().collect()
    }

    /// Top `depth` price levels, best first, with their total volume
    pub fn depth(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels()
            .take(depth)
            .map(|level| (level.price(), level.total_volume()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.limit_orders.is_empty() && self.market_orders.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.limit_orders.len()
    }

    pub fn order_count(&self) -> usize {
        self.market_orders.len() + self.limit_orders.values().map(PriceLevel::len).sum::<usize>()
    }

    fn broadcast(&self, event: EngineEvent) {
        if self.options.broadcast {
            self.publisher.publish(event);
        }
    }
}
