//! Single-writer market task
//!
//! A spawned tokio task owns the [`Engine`] and applies commands in arrival
//! order. Callers talk to it through a cloneable [`MarketHandle`]; every
//! command carries a `oneshot` sender for its reply.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use types::ids::MarketId;
use types::order::Order;

use crate::engine::{Engine, SubmitOutcome};
use crate::error::EngineError;
use crate::snapshot::EngineSnapshot;

/// Errors seen by callers of a [`MarketHandle`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("Market {0} is not running")]
    Stopped(MarketId),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug)]
enum Command {
    Submit {
        order: Order,
        reply: oneshot::Sender<Result<SubmitOutcome, EngineError>>,
    },
    Cancel {
        order: Order,
        reply: oneshot::Sender<Option<Order>>,
    },
    Snapshot {
        reply: oneshot::Sender<EngineSnapshot>,
    },
    Shutdown,
}

/// Cloneable front end of a running market
#[derive(Debug, Clone)]
pub struct MarketHandle {
    market_id: MarketId,
    commands: mpsc::Sender<Command>,
}

impl MarketHandle {
    pub fn market_id(&self) -> MarketId {
        self.market_id
    }

    /// Submit an order; waits while the command queue is full
    pub async fn submit(&self, order: Order) -> Result<SubmitOutcome, MarketError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit { order, reply }).await?;
        let outcome = rx.await.map_err(|_| MarketError::Stopped(self.market_id))?;
        Ok(outcome?)
    }

    /// Cancel a resting order. `Ok(None)` when it is no longer resting.
    pub async fn cancel(&self, order: Order) -> Result<Option<Order>, MarketError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Cancel { order, reply }).await?;
        rx.await.map_err(|_| MarketError::Stopped(self.market_id))
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot, MarketError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| MarketError::Stopped(self.market_id))
    }

    /// Ask the task to stop once the commands queued ahead of this one
    /// are done
    pub async fn shutdown(&self) -> Result<(), MarketError> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<(), MarketError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| MarketError::Stopped(self.market_id))
    }
}

/// Start the task owning `engine`.
///
/// The task ends on [`MarketHandle::shutdown`] or when every handle is
/// dropped, and hands the engine back through the join handle.
pub fn spawn(engine: Engine, capacity: usize) -> (MarketHandle, JoinHandle<Engine>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = MarketHandle {
        market_id: engine.market_id(),
        commands: tx,
    };
    let task = tokio::spawn(run(engine, rx));
    (handle, task)
}

async fn run(mut engine: Engine, mut commands: mpsc::Receiver<Command>) -> Engine {
    let market_id = engine.market_id();
    info!(%market_id, "Market task started");

    while let Some(command) = commands.recv().await {
        match command {
            Command::Submit { order, reply } => {
                let order_id = order.id;
                let result = engine.submit(order);
                if let Err(err) = &result {
                    warn!(%market_id, %order_id, error = %err, "Order rejected");
                }
                if reply.send(result).is_err() {
                    debug!(%market_id, %order_id, "Submit caller went away");
                }
            }
            Command::Cancel { order, reply } => {
                let _ = reply.send(engine.cancel(&order));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(engine.snapshot());
            }
            Command::Shutdown => break,
        }
    }

    info!(%market_id, "Market task stopped");
    engine
}
