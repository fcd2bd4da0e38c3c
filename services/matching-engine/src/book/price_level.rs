//! Price level implementation with FIFO queue
//!
//! A price level contains all resting limit orders at one price.
//! Orders are kept in arrival order; queue position, not timestamp, is the
//! time priority.

use std::collections::VecDeque;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Order;

/// A price level containing orders at a specific price
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Price,
    /// Queue of orders at this price level (FIFO order)
    orders: VecDeque<Order>,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new(price: Price) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// Earliest-arrival order
    pub fn top(&self) -> Option<&Order> {
        self.orders.front()
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut Order> {
        self.orders.front_mut()
    }

    /// Insert an order at the back of the queue (time priority)
    pub fn add(&mut self, order: Order) {
        self.orders.push_back(order);
    }

    /// Remove an order by id, keeping the relative order of the rest
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|o| o.id == order_id)?;
        self.orders.remove(position)
    }

    pub fn find(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    /// Check if the price level has been drained
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the number of orders at this level
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Sum of remaining volume at this level
    pub fn total_volume(&self) -> Quantity {
        self.orders
            .iter()
            .fold(Quantity::zero(), |acc, o| acc + o.volume)
    }

    /// Orders oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}
