//! Ask and bid books of one market

use types::ids::{MarketId, OrderId};
use types::order::Side;

use super::order_book::{BookOptions, OrderBook};
use crate::events::EventPublisher;

#[derive(Debug, Clone)]
pub struct OrderBookManager {
    market_id: MarketId,
    ask: OrderBook,
    bid: OrderBook,
}

impl OrderBookManager {
    pub fn new(market_id: MarketId, publisher: EventPublisher, options: BookOptions) -> Self {
        Self {
            market_id,
            ask: OrderBook::new(market_id, Side::Ask, publisher.clone(), options),
            bid: OrderBook::new(market_id, Side::Bid, publisher, options),
        }
    }

    pub fn market_id(&self) -> MarketId {
        self.market_id
    }

    pub fn ask_book(&self) -> &OrderBook {
        &self.ask
    }

    pub fn bid_book(&self) -> &OrderBook {
        &self.bid
    }

    /// The book orders of `side` rest in
    pub fn book(&self, side: Side) -> &OrderBook {
        match side {
            Side::Ask => &self.ask,
            Side::Bid => &self.bid,
        }
    }

    /// Whether the id rests in either book
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.ask.contains(order_id) || self.bid.contains(order_id)
    }

    /// `(own, counter)` books for an order on `side`
    pub fn books_mut(&mut self, side: Side) -> (&mut OrderBook, &mut OrderBook) {
        match side {
            Side::Ask => (&mut self.ask, &mut self.bid),
            Side::Bid => (&mut self.bid, &mut self.ask),
        }
    }
}
