//! Trade match result
//!
//! A trade is formed and consumed within a single matching step and is
//! never stored. The absence of a trade is `Option::None`; a `Trade` value
//! always describes a real, non-zero execution.

use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub price: Price,
    pub volume: Quantity,
    /// price × volume
    pub funds: Decimal,
}

impl Trade {
    /// Form a trade; `None` for a zero volume
    pub fn new(price: Price, volume: Quantity) -> Option<Self> {
        if volume.is_zero() {
            return None;
        }
        Some(Self {
            price,
            volume,
            funds: price * volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_trade_funds() {
        let trade = Trade::new(Price::from_u64(100), Quantity::from_u64(4)).unwrap();
        assert_eq!(trade.funds, Decimal::from(400));
    }

    #[test]
    fn test_zero_volume_is_no_trade() {
        assert!(Trade::new(Price::from_u64(100), Quantity::zero()).is_none());
    }

    #[test]
    fn test_trade_serialization() {
        let trade = Trade::new(
            Price::from_str("50.5").unwrap(),
            Quantity::from_str("2").unwrap(),
        )
        .unwrap();

        let json = serde_json::to_string(&trade).unwrap();
        let deserialized: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deserialized);
    }
}
