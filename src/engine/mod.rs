//! Pure cost-basis engines.
//!
//! Each engine is a reducer: it takes its state by value together with one
//! transaction and hands back the next state plus what the transaction did.
//! Nothing here performs I/O or logging, and no input is ever rejected;
//! anomalies come back as a [`Fallback`] on the [`Applied`] outcome.

use crate::domain::{Decimal, OrderId, RealizedGain, Transaction};
use serde::{Deserialize, Serialize};

pub mod fifo;
pub mod moving_average;

pub use fifo::{FifoBook, Lot};
pub use moving_average::AverageCost;

/// Cost-basis accounting method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    Fifo,
    MovingAverage,
}

impl Method {
    pub fn label(&self) -> &'static str {
        match self {
            Method::Fifo => "FIFO",
            Method::MovingAverage => "Moving Average",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A defined fallback taken instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fallback {
    /// Buy with zero quantity; unit cost treated as zero.
    ZeroQuantityBuy,
    /// Buy left the running balance at or below zero; average reset to zero.
    NonPositiveBalance,
    /// Sale larger than all open lots; the remainder was costed at zero.
    UnmatchedSale { unmatched: Decimal },
    /// Sale larger than the running balance; balance floored at zero.
    BalanceFloored { shortfall: Decimal },
    /// Transaction kind was neither buy nor sell; skipped.
    UnrecognizedKind,
    /// An amount left the decimal range; the transaction was skipped and
    /// the engine state left as it was.
    Overflow,
}

impl Fallback {
    pub fn label(&self) -> &'static str {
        match self {
            Fallback::ZeroQuantityBuy => "zero-quantity buy",
            Fallback::NonPositiveBalance => "non-positive balance",
            Fallback::UnmatchedSale { .. } => "unmatched sale",
            Fallback::BalanceFloored { .. } => "balance floored",
            Fallback::UnrecognizedKind => "unrecognized kind",
            Fallback::Overflow => "amount overflow",
        }
    }
}

/// What a single `apply` did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Applied {
    /// Present for every sale, absent for buys and skipped rows.
    pub record: Option<RealizedGain>,
    pub fallback: Option<Fallback>,
}

impl Applied {
    pub fn acquired() -> Self {
        Self::default()
    }

    pub fn realized(record: RealizedGain) -> Self {
        Self {
            record: Some(record),
            fallback: None,
        }
    }

    pub fn ignored() -> Self {
        Self {
            record: None,
            fallback: Some(Fallback::UnrecognizedKind),
        }
    }

    pub fn overflowed() -> Self {
        Self {
            record: None,
            fallback: Some(Fallback::Overflow),
        }
    }

    pub fn with_fallback(mut self, fallback: Option<Fallback>) -> Self {
        self.fallback = fallback;
        self
    }
}

/// A cost-basis method expressed as a pure reducer over transactions.
pub trait CostBasisEngine: Default + Sized {
    const METHOD: Method;

    /// Apply one transaction, returning the next state and its outcome.
    fn apply(self, tx: &Transaction) -> (Self, Applied);
}

/// A fallback attributed to the transaction that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackEvent {
    pub order_id: OrderId,
    #[serde(flatten)]
    pub fallback: Fallback,
}

/// Result of folding a whole transaction sequence through one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRun<E> {
    /// Engine state after the last transaction.
    pub state: E,
    /// One record per sale, in input order.
    pub records: Vec<RealizedGain>,
    pub fallbacks: Vec<FallbackEvent>,
}

impl<E> EngineRun<E> {
    /// Sum of `realized_gain` across all records; zero when nothing was sold.
    ///
    /// `None` if the total overflows.
    pub fn total_realized(&self) -> Option<Decimal> {
        Decimal::checked_sum(self.records.iter().map(|r| r.realized_gain))
    }
}

/// Run `transactions` through a fresh engine, strictly in the given order.
pub fn run_engine<E: CostBasisEngine>(transactions: &[Transaction]) -> EngineRun<E> {
    let mut state = E::default();
    let mut records = Vec::new();
    let mut fallbacks = Vec::new();

    for tx in transactions {
        let (next, applied) = state.apply(tx);
        state = next;

        if let Some(fallback) = applied.fallback {
            fallbacks.push(FallbackEvent {
                order_id: tx.order_id.clone(),
                fallback,
            });
        }
        if let Some(record) = applied.record {
            records.push(record);
        }
    }

    EngineRun {
        state,
        records,
        fallbacks,
    }
}
