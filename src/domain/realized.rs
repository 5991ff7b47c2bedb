//! Realized gain record emitted for each sale.

use crate::domain::{Asset, Decimal, OrderId, Timestamp, Transaction};
use serde::{Deserialize, Serialize};

/// Outcome of one sale under one cost-basis method.
///
/// Never mutated after creation. `proceeds = sale_unit_price * sold_quantity`
/// and `realized_gain = proceeds - cost_basis` hold by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedGain {
    pub order_id: OrderId,
    pub timestamp: Timestamp,
    pub asset: Asset,
    pub sold_quantity: Decimal,
    pub sale_unit_price: Decimal,
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    /// Cost basis per sold unit. For moving-average this is the running
    /// average at the time of sale.
    pub unit_cost: Decimal,
    pub realized_gain: Decimal,
}

impl RealizedGain {
    /// Build a record for `sale`, deriving proceeds and gain.
    ///
    /// `None` if either derived amount overflows.
    pub fn from_sale(
        sale: &Transaction,
        cost_basis: Decimal,
        unit_cost: Decimal,
    ) -> Option<Self> {
        let proceeds = sale.proceeds()?;
        let realized_gain = proceeds.checked_sub(cost_basis)?;
        Some(RealizedGain {
            order_id: sale.order_id.clone(),
            timestamp: sale.timestamp.clone(),
            asset: sale.asset.clone(),
            sold_quantity: sale.quantity,
            sale_unit_price: sale.unit_price,
            proceeds,
            cost_basis,
            unit_cost,
            realized_gain,
        })
    }

    pub fn is_loss(&self) -> bool {
        self.realized_gain.is_negative()
    }
}
