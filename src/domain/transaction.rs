//! Normalized ledger transaction.

use crate::domain::{Asset, Decimal, OrderId, Side, Timestamp};
use serde::{Deserialize, Serialize};

/// A single normalized ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub order_id: OrderId,
    /// Opaque ordering key; not interpreted.
    pub timestamp: Timestamp,
    pub asset: Asset,
    pub kind: Side,
    /// Units bought or sold. Expected positive, not validated.
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Independently supplied total; the authoritative cost of a buy.
    pub gross_value: Decimal,
}

impl Transaction {
    pub fn new(
        order_id: OrderId,
        timestamp: Timestamp,
        asset: Asset,
        kind: Side,
        quantity: Decimal,
        unit_price: Decimal,
        gross_value: Decimal,
    ) -> Self {
        Transaction {
            order_id,
            timestamp,
            asset,
            kind,
            quantity,
            unit_price,
            gross_value,
        }
    }

    /// Buy with `gross_value = quantity * unit_price`.
    ///
    /// Panics if the product overflows; the loader derives gross values with
    /// checked arithmetic instead.
    pub fn buy(asset: &str, quantity: Decimal, unit_price: Decimal) -> Self {
        Self::priced(Side::Buy, asset, quantity, unit_price)
    }

    /// Sell with `gross_value = quantity * unit_price`.
    pub fn sell(asset: &str, quantity: Decimal, unit_price: Decimal) -> Self {
        Self::priced(Side::Sell, asset, quantity, unit_price)
    }

    fn priced(kind: Side, asset: &str, quantity: Decimal, unit_price: Decimal) -> Self {
        Transaction {
            order_id: OrderId::default(),
            timestamp: Timestamp::default(),
            asset: Asset::new(asset),
            kind,
            quantity,
            unit_price,
            gross_value: quantity * unit_price,
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = OrderId::new(order_id);
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Timestamp::new(timestamp);
        self
    }

    /// Override the supplied gross value (e.g. when it includes fees).
    pub fn with_gross_value(mut self, gross_value: Decimal) -> Self {
        self.gross_value = gross_value;
        self
    }

    /// Proceeds of this row if it were a sale: `unit_price * quantity`.
    ///
    /// `None` if the product overflows.
    pub fn proceeds(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_buy_derives_gross_value() {
        let tx = Transaction::buy("BTC", d("2"), d("150.5"));
        assert_eq!(tx.kind, Side::Buy);
        assert_eq!(tx.gross_value, d("301"));
        assert_eq!(tx.asset.as_str(), "BTC");
    }

    #[test]
    fn test_builders_override_fields() {
        let tx = Transaction::sell("ETH", d("1"), d("10"))
            .with_order_id("42")
            .with_timestamp("2024-03-01 10:00:00")
            .with_gross_value(d("9.5"));

        assert_eq!(tx.order_id.as_str(), "42");
        assert_eq!(tx.timestamp.as_str(), "2024-03-01 10:00:00");
        assert_eq!(tx.gross_value, d("9.5"));
        assert_eq!(tx.proceeds(), Some(d("10")));
    }

    #[test]
    fn test_proceeds_overflow_is_none() {
        let tx = Transaction {
            unit_price: d("1e20"),
            ..Transaction::sell("BTC", d("1e20"), Decimal::zero())
        };
        assert_eq!(tx.proceeds(), None);
    }
}
