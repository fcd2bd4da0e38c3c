//! Order value type
//!
//! Carries identity, side, kind, price and the remaining tradable state
//! (`volume`, and `locked` for market orders) together with the fill
//! arithmetic applied during matching.

use crate::errors::OrderError;
use crate::fee::MAX_PRECISION;
use crate::ids::{MarketId, OrderId};
use crate::numeric::{Price, Quantity};
use crate::trade::Trade;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Sell
    Ask,
    /// Buy
    Bid,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Ask => Side::Bid,
            Side::Bid => Side::Ask,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Ask => f.write_str("ask"),
            Side::Bid => f.write_str("bid"),
        }
    }
}

impl FromStr for Side {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ask" => Ok(Side::Ask),
            "bid" => Ok(Side::Bid),
            other => Err(OrderError::InvalidSide(other.to_string())),
        }
    }
}

/// Order kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Firm price, fills at that price or better
    Limit,
    /// No price, fills at whatever is available within `locked`
    Market,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Limit => f.write_str("limit"),
            OrderKind::Market => f.write_str("market"),
        }
    }
}

impl FromStr for OrderKind {
    type Err = OrderError;

    /// Accepts both the short names and the `LimitOrder`/`MarketOrder`
    /// spelling used by intake.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "limit" | "LimitOrder" => Ok(OrderKind::Limit),
            "market" | "MarketOrder" => Ok(OrderKind::Market),
            other => Err(OrderError::UnsupportedOrderKind(other.to_string())),
        }
    }
}

/// A single order, incoming or resting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub market_id: MarketId,
    pub side: Side,
    pub kind: OrderKind,
    /// Set for limit orders, unused for market orders
    pub price: Option<Price>,
    /// Remaining tradable quantity
    pub volume: Quantity,
    /// Remaining budget of a market order: quote funds for a bid,
    /// base quantity for an ask
    pub locked: Decimal,
    /// Scale used to round a bid market order's volume limit
    pub base_precision: u32,
    /// Arrival time in Unix seconds. Audit only; queue position decides
    /// time priority.
    pub timestamp: i64,
}

impl Order {
    /// Create a limit order
    pub fn limit(
        id: OrderId,
        market_id: MarketId,
        side: Side,
        price: Price,
        volume: Quantity,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            market_id,
            side,
            kind: OrderKind::Limit,
            price: Some(price),
            volume,
            locked: Decimal::ZERO,
            base_precision: 0,
            timestamp,
        }
    }

    /// Create a market order
    pub fn market(
        id: OrderId,
        market_id: MarketId,
        side: Side,
        volume: Quantity,
        locked: Decimal,
        base_precision: u32,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            market_id,
            side,
            kind: OrderKind::Market,
            price: None,
            volume,
            locked,
            base_precision,
            timestamp,
        }
    }

    /// Build an order from string-keyed attributes as delivered by intake.
    ///
    /// Recognised keys: `id`, `market_id`, `timestamp`, `type` (side),
    /// `order_type`, `price`, `volume`, `locked`, `base_precision`.
    /// Absent numeric attributes read as zero; the result is validated.
    pub fn from_attributes(attrs: &HashMap<String, String>) -> Result<Self, OrderError> {
        let side = Side::from_str(attribute(attrs, "type").unwrap_or_default())?;
        let kind = OrderKind::from_str(attribute(attrs, "order_type").unwrap_or_default())?;

        // Market orders carry no price even when intake sends one.
        let price = match attribute(attrs, "price").filter(|_| kind == OrderKind::Limit) {
            Some(raw) => {
                let value: Decimal = parse_attribute("price", raw)?;
                // Zero or negative prices read as "no price"; validation
                // rejects them for limit orders.
                Price::try_new(value)
            }
            None => None,
        };

        let locked: Decimal = parse_optional(attrs, "locked")?;
        let volume = match attribute(attrs, "volume") {
            Some(raw) => {
                let value: Decimal = parse_attribute("volume", raw)?;
                Quantity::try_new(value)
                    .ok_or_else(|| OrderError::InvalidVolume(raw.to_string()))?
            }
            // an ask market order locks base volume, so it can sell at most that
            None if kind == OrderKind::Market && side == Side::Ask => {
                Quantity::try_new(locked).unwrap_or_else(Quantity::zero)
            }
            None => Quantity::zero(),
        };

        let order = Self {
            id: OrderId::new(parse_optional(attrs, "id")?),
            market_id: MarketId::new(parse_optional(attrs, "market_id")?),
            side,
            kind,
            price,
            volume,
            locked,
            base_precision: parse_optional(attrs, "base_precision")?,
            timestamp: parse_optional(attrs, "timestamp")?,
        };

        order.validate()?;
        Ok(order)
    }

    /// Check the order is fit to enter the matching core
    pub fn validate(&self) -> Result<(), OrderError> {
        match self.kind {
            OrderKind::Limit => {
                if self.price.is_none() {
                    return Err(OrderError::InvalidPrice(format!(
                        "limit order {} has no positive price",
                        self.id
                    )));
                }
                if self.volume.is_zero() {
                    return Err(OrderError::InvalidVolume(format!(
                        "limit order {} has zero volume",
                        self.id
                    )));
                }
            }
            OrderKind::Market => {
                if self.price.is_some() {
                    return Err(OrderError::InvalidPrice(format!(
                        "market order {} must not carry a price",
                        self.id
                    )));
                }
                if self.locked <= Decimal::ZERO {
                    return Err(OrderError::MissingLocked { order_id: self.id });
                }
                if self.volume.is_zero() {
                    return Err(OrderError::InvalidVolume(format!(
                        "market order {} has zero volume",
                        self.id
                    )));
                }
                if self.base_precision > MAX_PRECISION {
                    return Err(OrderError::InvalidAttribute {
                        name: "base_precision".to_string(),
                        value: self.base_precision.to_string(),
                    });
                }
            }
        }

        if !self.id.is_positive() || !self.market_id.is_positive() || self.timestamp <= 0 {
            return Err(OrderError::InvalidIdentity(format!(
                "id={} market_id={} timestamp={}",
                self.id, self.market_id, self.timestamp
            )));
        }

        Ok(())
    }

    /// Boolean form of [`Order::validate`]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn is_limit(&self) -> bool {
        self.kind == OrderKind::Limit
    }

    pub fn is_market(&self) -> bool {
        self.kind == OrderKind::Market
    }

    /// Limit orders are filled when no volume remains; market orders also
    /// when their budget is spent.
    pub fn is_filled(&self) -> bool {
        match self.kind {
            OrderKind::Limit => self.volume.is_zero(),
            OrderKind::Market => self.volume.is_zero() || self.locked <= Decimal::ZERO,
        }
    }

    /// Budget consumed by `trade`. An ask market order locks base volume,
    /// a bid market order locks quote funds.
    fn funds_for(&self, trade: &Trade) -> Decimal {
        match self.side {
            Side::Ask => trade.volume.as_decimal(),
            Side::Bid => trade.funds,
        }
    }

    /// Verify `trade` can be applied without touching the order
    pub fn check_fill(&self, trade: &Trade) -> Result<(), OrderError> {
        if trade.volume > self.volume {
            return Err(OrderError::VolumeExceeded {
                order_id: self.id,
                requested: trade.volume,
                remaining: self.volume,
            });
        }
        if self.is_market() {
            let funds = self.funds_for(trade);
            if funds > self.locked {
                return Err(OrderError::LockedExceeded {
                    order_id: self.id,
                    requested: funds,
                    locked: self.locked,
                });
            }
        }
        Ok(())
    }

    /// Apply a trade to the remaining state.
    ///
    /// A rejected fill leaves the order unchanged.
    pub fn fill(&mut self, trade: &Trade) -> Result<(), OrderError> {
        self.check_fill(trade)?;

        if self.is_market() {
            self.locked -= self.funds_for(trade);
        }
        self.volume = self
            .volume
            .checked_sub(trade.volume)
            .unwrap_or_else(Quantity::zero);
        Ok(())
    }

    /// Largest volume a market order can still take at `trade_price`
    pub fn volume_limit(&self, trade_price: Price) -> Quantity {
        let limit = match self.side {
            Side::Ask => self.locked,
            Side::Bid => self
                .locked
                .checked_div(trade_price.as_decimal())
                .map(|v| v.round_dp_with_strategy(self.base_precision, RoundingStrategy::ToZero))
                .unwrap_or(Decimal::ZERO),
        };
        Quantity::try_new(limit).unwrap_or_else(Quantity::zero)
    }

    /// Whether a resting order priced at `price` satisfies this order's
    /// limit. Market orders accept any price.
    pub fn is_crossed(&self, price: Price) -> bool {
        match (self.kind, self.price) {
            (OrderKind::Market, _) | (OrderKind::Limit, None) => true,
            (OrderKind::Limit, Some(limit)) => match self.side {
                Side::Ask => price >= limit,
                Side::Bid => price <= limit,
            },
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.price) {
            (OrderKind::Limit, Some(price)) => write!(f, "{}/${}/{}", self.id, price, self.volume),
            _ => write!(f, "{}/{}", self.id, self.volume),
        }
    }
}

fn attribute<'a>(attrs: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    attrs
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_attribute<T: FromStr>(name: &str, raw: &str) -> Result<T, OrderError> {
    raw.parse().map_err(|_| OrderError::InvalidAttribute {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

fn parse_optional<T: FromStr + Default>(
    attrs: &HashMap<String, String>,
    name: &str,
) -> Result<T, OrderError> {
    match attribute(attrs, name) {
        Some(raw) => parse_attribute(name, raw),
        None => Ok(T::default()),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_bid_market_never_spends_beyond_locked(
            locked_cents in 1i64..1_000_000,
            price in 1u64..5_000,
            volume in 1u64..10_000,
            base_precision in 0u32..6,
        ) {
            let mut order = Order::market(
                OrderId::new(1),
                MarketId::new(1),
                Side::Bid,
                Quantity::from_u64(volume),
                Decimal::new(locked_cents, 2),
                base_precision,
                1708123456,
            );
            let price = Price::from_u64(price);
            let take = order.volume.min(order.volume_limit(price));

            if let Some(trade) = Trade::new(price, take) {
                prop_assert!(trade.funds <= order.locked);
                order.fill(&trade).unwrap();
                prop_assert!(order.locked >= Decimal::ZERO);
                prop_assert_eq!(order.volume + trade.volume, Quantity::from_u64(volume));
            }
        }

        #[test]
        fn prop_limit_fill_conserves_volume(
            volume_milli in 1i64..1_000_000,
            take_milli in 1i64..1_000_000,
        ) {
            let mut order = Order::limit(
                OrderId::new(1),
                MarketId::new(1),
                Side::Ask,
                Price::from_u64(100),
                Quantity::try_new(Decimal::new(volume_milli, 3)).unwrap(),
                1708123456,
            );
            let before = order.clone();
            let trade = Trade::new(
                Price::from_u64(100),
                Quantity::try_new(Decimal::new(take_milli, 3)).unwrap(),
            )
            .unwrap();

            match order.fill(&trade) {
                Ok(()) => prop_assert_eq!(order.volume + trade.volume, before.volume),
                Err(OrderError::VolumeExceeded { .. }) => {
                    prop_assert!(take_milli > volume_milli);
                    prop_assert_eq!(order, before);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }
    }
}
