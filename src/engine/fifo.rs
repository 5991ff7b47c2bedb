use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::domain::{Decimal, RealizedGain, Side, Transaction};

use super::{Applied, CostBasisEngine, Fallback, Method};

/// An open tranche of bought quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub remaining_quantity: Decimal,
    pub unit_cost: Decimal,
}

/// FIFO engine state: open lots, oldest at the front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FifoBook {
    lots: VecDeque<Lot>,
}

impl FifoBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open lots, oldest first.
    pub fn lots(&self) -> &VecDeque<Lot> {
        &self.lots
    }

    /// Total quantity still held across all open lots.
    pub fn held_quantity(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.remaining_quantity).sum()
    }

    /// Append a lot at the buy's effective unit cost.
    ///
    /// A zero-quantity buy opens nothing: its unit cost is defined as zero
    /// and a zero lot can never be consumed.
    fn buy(mut self, tx: &Transaction) -> (Self, Applied) {
        if tx.quantity.is_zero() {
            return (
                self,
                Applied::acquired().with_fallback(Some(Fallback::ZeroQuantityBuy)),
            );
        }

        let Some(unit_cost) = tx.gross_value.checked_div(tx.quantity) else {
            return (self, Applied::overflowed());
        };
        self.lots.push_back(Lot {
            remaining_quantity: tx.quantity,
            unit_cost,
        });
        (self, Applied::acquired())
    }

    /// Consume lots oldest-first, splitting the last one touched.
    ///
    /// The whole sale is costed before any lot is touched, so an overflow
    /// leaves the book unchanged.
    fn sell(mut self, tx: &Transaction) -> (Self, Applied) {
        let Some(plan) = self.plan_sale(tx.quantity) else {
            return (self, Applied::overflowed());
        };
        let unit_cost = plan.cost_basis.checked_div_or_zero(tx.quantity);
        let Some(record) = RealizedGain::from_sale(tx, plan.cost_basis, unit_cost) else {
            return (self, Applied::overflowed());
        };

        self.lots.drain(..plan.exhausted);
        if let Some(front) = self.lots.front_mut() {
            front.remaining_quantity -= plan.split_used;
        }

        // Quantity sold beyond every open lot carries no cost.
        let fallback = plan
            .unmatched
            .is_positive()
            .then_some(Fallback::UnmatchedSale {
                unmatched: plan.unmatched,
            });
        (self, Applied::realized(record).with_fallback(fallback))
    }

    fn plan_sale(&self, quantity: Decimal) -> Option<SalePlan> {
        let mut plan = SalePlan {
            cost_basis: Decimal::zero(),
            exhausted: 0,
            split_used: Decimal::zero(),
            unmatched: quantity,
        };

        for lot in &self.lots {
            if !plan.unmatched.is_positive() {
                break;
            }
            let used = lot.remaining_quantity.min(plan.unmatched);
            plan.cost_basis = plan
                .cost_basis
                .checked_add(lot.unit_cost.checked_mul(used)?)?;
            plan.unmatched = plan.unmatched.checked_sub(used)?;

            if used == lot.remaining_quantity {
                plan.exhausted += 1;
            } else {
                plan.split_used = used;
            }
        }
        Some(plan)
    }
}

/// Lots a sale would consume: `exhausted` whole lots from the front, then
/// `split_used` taken from the next one.
struct SalePlan {
    cost_basis: Decimal,
    exhausted: usize,
    split_used: Decimal,
    unmatched: Decimal,
}

impl CostBasisEngine for FifoBook {
    const METHOD: Method = Method::Fifo;

    fn apply(self, tx: &Transaction) -> (Self, Applied) {
        match tx.kind {
            Side::Buy => self.buy(tx),
            Side::Sell => self.sell(tx),
            Side::Unrecognized => (self, Applied::ignored()),
        }
    }
}
