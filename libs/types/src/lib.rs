//! Types library for the matching core
//!
//! Value types shared between the matching engine and its collaborators
//! (order intake, event consumers, market provisioning).
//!
//! # Modules
//! - `ids`: Identifiers (OrderId, MarketId)
//! - `numeric`: Exact decimal types (Price, Quantity)
//! - `order`: Order value type, validation and fill arithmetic
//! - `trade`: Trade match result
//! - `fee`: Market options and fee schedule
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;
pub mod fee;
pub mod errors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::trade::*;
    pub use crate::fee::*;
    pub use crate::errors::*;
}
