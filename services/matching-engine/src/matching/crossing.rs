//! Crossing detection logic
//!
//! Determines when a bid and ask can match based on price compatibility

use types::numeric::Price;
use types::order::Order;

/// A bid and an ask can trade when the bid is at least the ask
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Whether an incoming order may trade against a resting limit order
/// priced at `resting_price`
pub fn incoming_can_match(incoming: &Order, resting_price: Price) -> bool {
    incoming.is_crossed(resting_price)
}

/// Whether the best resting prices of the two sides overlap
pub fn is_book_crossed(best_ask: Option<Price>, best_bid: Option<Price>) -> bool {
    match (best_ask, best_bid) {
        (Some(ask), Some(bid)) => can_match(bid, ask),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use types::ids::{MarketId, OrderId};
    use types::numeric::Quantity;
    use types::order::Side;

    fn limit(side: Side, price: u64) -> Order {
        Order::limit(
            OrderId::new(1),
            MarketId::new(1),
            side,
            Price::from_u64(price),
            Quantity::from_u64(1),
            1708123456,
        )
    }

    #[test]
    fn test_can_match_exact() {
        let price = Price::from_u64(50000);
        assert!(can_match(price, price), "Equal prices should match");
        assert!(!can_match(Price::from_u64(49000), Price::from_u64(50000)));
    }

    #[test]
    fn test_incoming_ask_crosses_higher_bid() {
        let ask = limit(Side::Ask, 100);
        assert!(incoming_can_match(&ask, Price::from_u64(101)));
        assert!(incoming_can_match(&ask, Price::from_u64(100)));
        assert!(!incoming_can_match(&ask, Price::from_u64(99)));
    }

    #[test]
    fn test_incoming_bid_crosses_lower_ask() {
        let bid = limit(Side::Bid, 100);
        assert!(incoming_can_match(&bid, Price::from_u64(99)));
        assert!(!incoming_can_match(&bid, Price::from_u64(101)));
    }

    #[test]
    fn test_incoming_market_always_crosses() {
        let order = Order::market(
            OrderId::new(1),
            MarketId::new(1),
            Side::Bid,
            Quantity::from_u64(1),
            Decimal::ONE,
            0,
            1708123456,
        );
        assert!(incoming_can_match(&order, Price::from_u64(1_000_000)));
    }

    #[test]
    fn test_book_crossed() {
        assert!(!is_book_crossed(None, Some(Price::from_u64(1))));
        assert!(!is_book_crossed(Some(Price::from_u64(101)), Some(Price::from_u64(100))));
        assert!(is_book_crossed(Some(Price::from_u64(100)), Some(Price::from_u64(100))));
    }
}
