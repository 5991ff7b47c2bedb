//! Domain types for the realized-gain ledger.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Domain primitives: OrderId, Timestamp, Asset, Side
//! - The normalized Transaction consumed by the engines
//! - The RealizedGain record they emit

pub mod decimal;
pub mod primitives;
pub mod realized;
pub mod transaction;

pub use decimal::Decimal;
pub use primitives::{Asset, OrderId, Side, Timestamp};
pub use realized::RealizedGain;
pub use transaction::Transaction;
