//! Error types shared by the matching core
//!
//! Comprehensive error taxonomy using thiserror

use crate::ids::OrderId;
use crate::numeric::Quantity;
use rust_decimal::Decimal;
use thiserror::Error;

/// Order-specific errors
///
/// Validation variants reject an order before it can touch a book.
/// Fill variants reject a mutation that would break the fill invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Invalid side: {0}")]
    InvalidSide(String),

    #[error("Unsupported order kind: {0}")]
    UnsupportedOrderKind(String),

    #[error("Invalid attribute {name}: {value:?}")]
    InvalidAttribute { name: String, value: String },

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid volume: {0}")]
    InvalidVolume(String),

    #[error("Market order {order_id} has no locked funds")]
    MissingLocked { order_id: OrderId },

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Fill volume {requested} exceeds remaining volume {remaining} of order {order_id}")]
    VolumeExceeded {
        order_id: OrderId,
        requested: Quantity,
        remaining: Quantity,
    },

    #[error("Fill funds {requested} exceed locked {locked} of order {order_id}")]
    LockedExceeded {
        order_id: OrderId,
        requested: Decimal,
        locked: Decimal,
    },
}

impl OrderError {
    /// True for the fill-invariant rejections
    pub fn is_fill_rejection(&self) -> bool {
        matches!(
            self,
            OrderError::VolumeExceeded { .. } | OrderError::LockedExceeded { .. }
        )
    }
}

/// Market configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed market options: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Precision {fixed} is out of range (max {max})")]
    PrecisionOutOfRange { fixed: u32, max: u32 },
}
