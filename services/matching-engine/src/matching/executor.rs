//! Trade formation logic
//!
//! Decides whether an incoming order and the counter book's top can trade,
//! and at what price and volume. Also owns the dust threshold below which
//! an order is not matched at all.

use rust_decimal::Decimal;
use types::fee::Options;
use types::order::{Order, OrderKind};
use types::trade::Trade;

use super::crossing;

/// Trade formation rules for one market
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchExecutor {
    /// Smallest tradable volume, `10^-fixed`
    min_volume: Decimal,
}

impl MatchExecutor {
    pub fn new(options: &Options) -> Self {
        Self {
            min_volume: options.min_volume(),
        }
    }

    pub fn min_volume(&self) -> Decimal {
        self.min_volume
    }

    /// Dust check: remaining volume strictly below the minimum unit
    pub fn is_tiny(&self, order: &Order) -> bool {
        order.volume.as_decimal() < self.min_volume
    }

    /// Form the trade between an incoming `order` and the resting `counter`.
    ///
    /// The resting order's kind decides how the trade forms:
    /// - limit counter: requires a cross; the resting price always wins.
    /// - market counter: priced at the incoming order's limit and capped by
    ///   the counter's volume limit. Two market orders never trade, there
    ///   is no price to trade at.
    ///
    /// An incoming market order is further capped by its own budget.
    pub fn trade_with(&self, order: &Order, counter: &Order) -> Option<Trade> {
        let (price, volume) = match counter.kind {
            OrderKind::Limit => {
                let price = counter.price?;
                if !crossing::incoming_can_match(order, price) {
                    return None;
                }
                (price, order.volume.min(counter.volume))
            }
            OrderKind::Market => {
                let price = match order.kind {
                    OrderKind::Limit => order.price?,
                    OrderKind::Market => return None,
                };
                let volume = order
                    .volume
                    .min(counter.volume)
                    .min(counter.volume_limit(price));
                (price, volume)
            }
        };

        let volume = match order.kind {
            OrderKind::Market => volume.min(order.volume_limit(price)),
            OrderKind::Limit => volume,
        };

        Trade::new(price, volume)
    }
}
