use serde::{Deserialize, Serialize};

use crate::domain::{Decimal, RealizedGain, Side, Transaction};

use super::{Applied, CostBasisEngine, Fallback, Method};

/// Moving-average engine state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AverageCost {
    /// Quantity currently held; never negative.
    pub balance: Decimal,
    /// Weighted-average unit cost of the held quantity.
    pub avg_unit_cost: Decimal,
}

impl AverageCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total cost carried by the current balance, `None` on overflow.
    pub fn total_cost(&self) -> Option<Decimal> {
        self.balance.checked_mul(self.avg_unit_cost)
    }

    /// Fold the buy's gross value into the running average.
    fn buy(self, tx: &Transaction) -> (Self, Applied) {
        let Some((new_balance, new_total_cost)) = self.after_buy(tx) else {
            return (self, Applied::overflowed());
        };

        let avg_unit_cost = if new_balance.is_positive() {
            match new_total_cost.checked_div(new_balance) {
                Some(avg) => avg,
                None => return (self, Applied::overflowed()),
            }
        } else {
            Decimal::zero()
        };

        let fallback = if tx.quantity.is_zero() {
            Some(Fallback::ZeroQuantityBuy)
        } else if !new_balance.is_positive() {
            Some(Fallback::NonPositiveBalance)
        } else {
            None
        };

        let next = AverageCost {
            balance: new_balance,
            avg_unit_cost,
        };
        (next, Applied::acquired().with_fallback(fallback))
    }

    fn after_buy(&self, tx: &Transaction) -> Option<(Decimal, Decimal)> {
        let total_cost = self.total_cost()?;
        Some((
            self.balance.checked_add(tx.quantity)?,
            total_cost.checked_add(tx.gross_value)?,
        ))
    }

    /// Cost the sale at the current average. The average itself is unchanged.
    fn sell(self, tx: &Transaction) -> (Self, Applied) {
        let record = self
            .avg_unit_cost
            .checked_mul(tx.quantity)
            .and_then(|cost_basis| RealizedGain::from_sale(tx, cost_basis, self.avg_unit_cost));
        let (Some(record), Some(remaining)) = (record, self.balance.checked_sub(tx.quantity))
        else {
            return (self, Applied::overflowed());
        };

        let (balance, fallback) = if remaining.is_negative() {
            (
                Decimal::zero(),
                Some(Fallback::BalanceFloored {
                    shortfall: remaining.abs(),
                }),
            )
        } else {
            (remaining, None)
        };

        let next = AverageCost {
            balance,
            avg_unit_cost: self.avg_unit_cost,
        };
        (next, Applied::realized(record).with_fallback(fallback))
    }
}

impl CostBasisEngine for AverageCost {
    const METHOD: Method = Method::MovingAverage;

    fn apply(self, tx: &Transaction) -> (Self, Applied) {
        match tx.kind {
            Side::Buy => self.buy(tx),
            Side::Sell => self.sell(tx),
            Side::Unrecognized => (self, Applied::ignored()),
        }
    }
}
