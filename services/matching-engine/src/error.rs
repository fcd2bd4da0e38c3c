//! Error types for the matching engine

use thiserror::Error;
use types::errors::OrderError;
use types::ids::{MarketId, OrderId};
use types::order::Side;

/// Book mutation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    #[error("Order {order_id} has no volume to rest")]
    InvalidVolume { order_id: OrderId },

    #[error("Limit order {order_id} has no price")]
    MissingPrice { order_id: OrderId },

    #[error("Order {order_id} belongs to market {order_market}, book serves market {book_market}")]
    MarketMismatch {
        order_id: OrderId,
        order_market: MarketId,
        book_market: MarketId,
    },

    #[error("Order {order_id} is on the {order_side} side, book holds {book_side}")]
    SideMismatch {
        order_id: OrderId,
        order_side: Side,
        book_side: Side,
    },

    #[error("Order {order_id} is already resting")]
    DuplicateOrder { order_id: OrderId },

    #[error("Order {order_id} is below the minimum tradable volume")]
    DustOrder { order_id: OrderId },
}

/// Top-level engine error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Book error: {0}")]
    Book(#[from] BookError),
}
