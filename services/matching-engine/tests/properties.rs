use matching_engine::{Engine, EngineEvent, RecordingSink, Remainder};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use types::prelude::*;

const MARKET: MarketId = MarketId::new(1);

#[derive(Debug, Clone)]
enum Intent {
    Limit { side: Side, price: u64, volume: u64 },
    Market { side: Side, volume: u64, locked: u64 },
}

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Ask), Just(Side::Bid)]
}

fn limit_intent() -> impl Strategy<Value = Intent> {
    (side(), 95u64..=105, 1u64..=20)
        .prop_map(|(side, price, volume)| Intent::Limit { side, price, volume })
}

fn any_intent() -> impl Strategy<Value = Intent> {
    prop_oneof![
        4 => limit_intent(),
        1 => (side(), 1u64..=50, 1u64..=3000)
            .prop_map(|(side, volume, locked)| Intent::Market { side, volume, locked }),
    ]
}

fn build(id: u64, intent: &Intent) -> Order {
    match *intent {
        Intent::Limit { side, price, volume } => Order::limit(
            OrderId::new(id),
            MARKET,
            side,
            Price::from_u64(price),
            Quantity::from_u64(volume),
            1708123456,
        ),
        Intent::Market { side, volume, locked } => Order::market(
            OrderId::new(id),
            MARKET,
            side,
            Quantity::from_u64(volume),
            Decimal::from(locked),
            2,
            1708123456,
        ),
    }
}

fn engine() -> (Engine, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    (Engine::new(MARKET, Options::default(), sink.clone()), sink)
}

fn resting_volume(engine: &Engine) -> Decimal {
    let limits = engine.limit_orders();
    [&limits.ask, &limits.bid]
        .iter()
        .flat_map(|side| side.values())
        .flatten()
        .map(|order| order.volume.as_decimal())
        .sum()
}

proptest! {
    #[test]
    fn book_never_left_crossed(intents in prop::collection::vec(any_intent(), 1..60)) {
        let (mut engine, _) = engine();
        for (i, intent) in intents.iter().enumerate() {
            engine.submit(build(i as u64 + 1, intent)).unwrap();
            prop_assert!(!engine.is_crossed());
        }
    }

    #[test]
    fn trades_execute_at_resting_prices(intents in prop::collection::vec(limit_intent(), 1..60)) {
        let (mut engine, _) = engine();
        for (i, intent) in intents.iter().enumerate() {
            let order = build(i as u64 + 1, intent);
            let counter_prices: Vec<Price> =
                engine.limit_orders().get(order.side.opposite()).keys().copied().collect();
            let outcome = engine.submit(order.clone()).unwrap();

            for trade in &outcome.trades {
                prop_assert!(counter_prices.contains(&trade.price));
                prop_assert!(order.is_crossed(trade.price));
            }
            // better prices are consumed first
            let prices: Vec<Price> = outcome.trades.iter().map(|t| t.price).collect();
            let mut sorted = prices.clone();
            match order.side {
                Side::Bid => sorted.sort(),
                Side::Ask => sorted.sort_by(|a, b| b.cmp(a)),
            }
            prop_assert_eq!(prices, sorted);
        }
    }

    #[test]
    fn volume_is_conserved(intents in prop::collection::vec(any_intent(), 1..60)) {
        let (mut engine, _) = engine();
        for (i, intent) in intents.iter().enumerate() {
            let order = build(i as u64 + 1, intent);
            let before = resting_volume(&engine);
            let outcome = engine.submit(order.clone()).unwrap();

            let traded: Decimal = outcome.trades.iter().map(|t| t.volume.as_decimal()).sum();
            prop_assert_eq!(
                traded + outcome.order.volume.as_decimal(),
                order.volume.as_decimal()
            );

            let rested = match outcome.remainder {
                Remainder::Resting => outcome.order.volume.as_decimal(),
                _ => Decimal::ZERO,
            };
            prop_assert_eq!(resting_volume(&engine), before - traded + rested);

            for trade in &outcome.trades {
                prop_assert!(!trade.volume.is_zero());
                prop_assert_eq!(trade.funds, trade.price * trade.volume);
            }
            if order.kind == OrderKind::Market {
                prop_assert_ne!(outcome.remainder, Remainder::Resting);
            }
        }
    }

    #[test]
    fn trade_volume_is_smaller_remaining(intents in prop::collection::vec(limit_intent(), 1..60)) {
        let (mut engine, sink) = engine();
        for (i, intent) in intents.iter().enumerate() {
            sink.take();
            let outcome = engine.submit(build(i as u64 + 1, intent)).unwrap();
            let removed = sink
                .events()
                .iter()
                .filter(|event| matches!(event, EngineEvent::Removed { .. }))
                .count();

            // every maker but possibly the last is consumed whole
            if outcome.remainder == Remainder::Resting {
                prop_assert_eq!(removed, outcome.trades.len());
            } else {
                prop_assert!(removed + 1 >= outcome.trades.len());
            }
        }
    }

    #[test]
    fn makers_fill_in_arrival_order(intents in prop::collection::vec(limit_intent(), 1..80)) {
        let (mut engine, sink) = engine();
        for (i, intent) in intents.iter().enumerate() {
            engine.submit(build(i as u64 + 1, intent)).unwrap();
        }

        let mut last_filled: BTreeMap<(bool, Price), OrderId> = BTreeMap::new();
        for event in sink.events() {
            let order = match event {
                EngineEvent::Updated { order } | EngineEvent::Removed { order } => order,
                _ => continue,
            };
            let key = (order.side == Side::Bid, order.price.unwrap());
            if let Some(previous) = last_filled.insert(key, order.id) {
                prop_assert!(previous <= order.id);
            }
        }
    }

    #[test]
    fn dust_never_trades(thousandths in 1u64..10) {
        let mut options = Options::default();
        options.ask.fixed = Some(2);
        let mut engine = Engine::new(MARKET, options, Arc::new(RecordingSink::new()));
        engine.submit(build(1, &Intent::Limit { side: Side::Ask, price: 100, volume: 5 })).unwrap();

        let mut dust = build(2, &Intent::Limit { side: Side::Bid, price: 100, volume: 1 });
        dust.volume = Quantity::try_new(Decimal::new(thousandths as i64, 3)).unwrap();
        let outcome = engine.submit(dust).unwrap();

        prop_assert!(outcome.trades.is_empty());
        prop_assert_eq!(outcome.remainder, Remainder::Resting);
    }

    #[test]
    fn second_cancel_is_silent(intents in prop::collection::vec(limit_intent(), 1..40)) {
        let (mut engine, sink) = engine();
        let mut resting = Vec::new();
        for (i, intent) in intents.iter().enumerate() {
            let outcome = engine.submit(build(i as u64 + 1, intent)).unwrap();
            if outcome.remainder == Remainder::Resting {
                resting.push(outcome.order);
            }
        }

        for order in &resting {
            // a later order may have filled it since
            engine.cancel(order);
            let events = sink.len();
            prop_assert!(engine.cancel(order).is_none());
            prop_assert_eq!(sink.len(), events);
        }
        prop_assert_eq!(engine.snapshot().order_count(), 0);
    }
}
