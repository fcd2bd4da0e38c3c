//! Matching engine core
//!
//! One `Engine` owns both books of exactly one market and is the only
//! writer to them. `submit` matches an incoming order against the opposite
//! book until no further trade is possible, then rests the remainder
//! (limit) or cancels it (market, fill-or-kill). Every mutation is reported
//! through the market's [`EventPublisher`].

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use types::fee::Options;
use types::ids::MarketId;
use types::numeric::Price;
use types::order::{Order, OrderKind, Side};
use types::trade::Trade;

use crate::book::{BookOptions, OrderBook, OrderBookManager};
use crate::error::{BookError, EngineError};
use crate::events::{CancelReason, EngineEvent, EventPublisher, EventSink};
use crate::matching::{crossing, MatchExecutor};
use crate::snapshot::{EngineSnapshot, LimitOrders, MarketOrders, Sides};

/// Main matching engine
#[derive(Debug)]
pub struct Engine {
    market_id: MarketId,
    books: OrderBookManager,
    options: Options,
    /// Trade formation rules and dust threshold derived from `options`
    executor: MatchExecutor,
    publisher: EventPublisher,
}

/// What became of the unmatched part of a submitted order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remainder {
    /// Nothing left
    Filled,
    /// Limit order now resting in its book
    Resting,
    /// Market order remainder cancelled
    Cancelled,
}

/// Result of submitting an order
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    /// The order after matching
    pub order: Order,
    /// Trades in execution order
    pub trades: Vec<Trade>,
    pub remainder: Remainder,
}

impl Engine {
    pub fn new(market_id: MarketId, options: Options, sink: Arc<dyn EventSink>) -> Self {
        Self::with_book_options(market_id, options, sink, BookOptions::default())
    }

    pub fn with_book_options(
        market_id: MarketId,
        options: Options,
        sink: Arc<dyn EventSink>,
        book_options: BookOptions,
    ) -> Self {
        let publisher = EventPublisher::new(market_id, sink);
        let executor = MatchExecutor::new(&options);
        info!(
            %market_id,
            code = %options.code,
            min_volume = %executor.min_volume(),
            "Matching engine initialized"
        );
        Self {
            market_id,
            books: OrderBookManager::new(market_id, publisher.clone(), book_options),
            options,
            executor,
            publisher,
        }
    }

    pub fn market_id(&self) -> MarketId {
        self.market_id
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn ask_book(&self) -> &OrderBook {
        self.books.ask_book()
    }

    pub fn bid_book(&self) -> &OrderBook {
        self.books.bid_book()
    }

    /// Submit an order to the matching engine
    ///
    /// Invalid orders are rejected before any book is touched.
    pub fn submit(&mut self, order: Order) -> Result<SubmitOutcome, EngineError> {
        order.validate()?;
        self.check_market(&order)?;
        self.check_unique(&order)?;

        let mut order = order;
        let trades = self.match_order(&mut order);
        let remainder = self.add_or_cancel(&order)?;

        Ok(SubmitOutcome {
            order,
            trades,
            remainder,
        })
    }

    /// Match `order` against the counter book until it is filled, turns to
    /// dust, the counter book runs dry or no trade forms.
    ///
    /// Every pass either strictly reduces the order's remaining volume or
    /// leaves the loop.
    fn match_order(&mut self, order: &mut Order) -> Vec<Trade> {
        let (_, counter_book) = self.books.books_mut(order.side);
        let mut trades = Vec::new();

        loop {
            if order.is_filled() || self.executor.is_tiny(order) {
                break;
            }
            let Some(counter) = counter_book.top() else {
                break;
            };
            let Some(trade) = self.executor.trade_with(order, counter) else {
                break;
            };

            if let Err(err) = order.check_fill(&trade) {
                error!(order = %order, error = %err, "Rejected fill of incoming order");
                break;
            }
            let counter = match counter_book.fill_top(&trade) {
                Ok(Some(counter)) => counter,
                Ok(None) => break,
                Err(err) => {
                    error!(order = %order, error = %err, "Rejected fill of resting order");
                    break;
                }
            };

            let before = order.volume;
            if let Err(err) = order.fill(&trade) {
                error!(order = %order, error = %err, "Rejected fill of incoming order");
                break;
            }

            debug!(
                market_id = %self.market_id,
                price = %trade.price,
                volume = %trade.volume,
                funds = %trade.funds,
                taker = %order,
                maker = %counter,
                "Trade executed"
            );
            publish_trade(&self.publisher, order, counter, trade);
            trades.push(trade);

            if order.volume >= before {
                break;
            }
        }

        trades
    }

    /// Rest a limit remainder, cancel a market remainder
    fn add_or_cancel(&mut self, order: &Order) -> Result<Remainder, EngineError> {
        if order.is_filled() {
            return Ok(Remainder::Filled);
        }
        match order.kind {
            OrderKind::Limit => {
                let (book, _) = self.books.books_mut(order.side);
                book.add(order.clone())?;
                Ok(Remainder::Resting)
            }
            OrderKind::Market => {
                self.publish_cancel(order.clone(), CancelReason::FillOrKillMarketOrder);
                Ok(Remainder::Cancelled)
            }
        }
    }

    /// Cancel a resting order.
    ///
    /// Returns the removed order, or `None` when it is no longer in the
    /// book (already filled or cancelled), which is not an error.
    pub fn cancel(&mut self, order: &Order) -> Option<Order> {
        let (book, _) = self.books.books_mut(order.side);
        match book.remove(order) {
            Some(removed) => {
                self.publish_cancel(removed.clone(), CancelReason::CancelledByUser);
                Some(removed)
            }
            None => {
                warn!(
                    market_id = %self.market_id,
                    order_id = %order.id,
                    "Cannot find order to cancel, skip"
                );
                None
            }
        }
    }

    /// Put an already-resting order back into its book without matching,
    /// e.g. when reloading a market from storage. This is the only way a
    /// market order comes to rest.
    ///
    /// A resting market order always has priority on its side, so one that
    /// can no longer trade a single unit would block every limit order
    /// behind it. Market orders with dust volume, and asks with a dust
    /// budget, are refused.
    pub fn restore(&mut self, order: Order) -> Result<(), EngineError> {
        order.validate()?;
        self.check_market(&order)?;
        self.check_unique(&order)?;
        if order.is_market() && self.is_spent_market(&order) {
            return Err(BookError::DustOrder { order_id: order.id }.into());
        }
        let (book, _) = self.books.books_mut(order.side);
        book.add(order)?;
        Ok(())
    }

    /// Dust check against the market's minimum volume
    pub fn is_tiny(&self, order: &Order) -> bool {
        self.executor.is_tiny(order)
    }

    /// Whether best ask ≤ best bid among resting limit orders
    pub fn is_crossed(&self) -> bool {
        crossing::is_book_crossed(
            self.ask_book().best_limit_price(),
            self.bid_book().best_limit_price(),
        )
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.ask_book().best_limit_price()
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bid_book().best_limit_price()
    }

    pub fn limit_orders(&self) -> LimitOrders {
        Sides {
            ask: self.ask_book().limit_orders(),
            bid: self.bid_book().limit_orders(),
        }
    }

    pub fn market_orders(&self) -> MarketOrders {
        Sides {
            ask: self.ask_book().market_orders(),
            bid: self.bid_book().market_orders(),
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            market_id: self.market_id,
            sequence: self.publisher.last_sequence(),
            best_ask: self.best_ask(),
            best_bid: self.best_bid(),
            limit_orders: self.limit_orders(),
            market_orders: self.market_orders(),
        }
    }

    fn check_market(&self, order: &Order) -> Result<(), BookError> {
        if order.market_id != self.market_id {
            return Err(BookError::MarketMismatch {
                order_id: order.id,
                order_market: order.market_id,
                book_market: self.market_id,
            });
        }
        Ok(())
    }

    /// Ids are unique across both books of the market
    fn check_unique(&self, order: &Order) -> Result<(), BookError> {
        if self.books.contains(order.id) {
            return Err(BookError::DuplicateOrder { order_id: order.id });
        }
        Ok(())
    }

    fn is_spent_market(&self, order: &Order) -> bool {
        let budget_spent = match order.side {
            Side::Ask => order.locked < self.executor.min_volume(),
            Side::Bid => false,
        };
        self.executor.is_tiny(order) || budget_spent
    }

    fn publish_cancel(&self, order: Order, reason: CancelReason) {
        debug!(market_id = %self.market_id, order = %order, %reason, "Order cancelled");
        self.publisher.publish(EngineEvent::Cancelled { order, reason });
    }
}

fn publish_trade(publisher: &EventPublisher, order: &Order, counter: Order, trade: Trade) {
    let (ask, bid) = match order.side {
        Side::Ask => (order.clone(), counter),
        Side::Bid => (counter, order.clone()),
    };
    publisher.publish(EngineEvent::Trade { ask, bid, trade });
}
