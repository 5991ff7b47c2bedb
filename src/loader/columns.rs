//! Mapping of raw ledger headers onto canonical transaction fields.

use super::LoadError;

const ORDER_ID: &[&str] = &["orderid", "order", "orderno", "ordernumber", "id", "txid", "tradeid"];
const TIMESTAMP: &[&str] = &["timestamp", "date", "time", "datetime", "dateutc"];
const ASSET: &[&str] = &["asset", "symbol", "pair", "market", "ticker", "coin", "instrument"];
const KIND: &[&str] = &["kind", "side", "action", "transactiontype", "type"];
const QUANTITY: &[&str] = &["quantity", "qty", "executed", "filled", "size", "shares", "units", "amount"];
const UNIT_PRICE: &[&str] = &["unitprice", "price", "avgprice", "averageprice", "pricepershare"];
const GROSS_VALUE: &[&str] = &["grossvalue", "total", "value", "gross", "notional", "totalvalue"];

/// Column positions of the canonical fields within one ledger file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub order_id: Option<usize>,
    pub timestamp: Option<usize>,
    pub asset: Option<usize>,
    pub kind: usize,
    pub quantity: usize,
    pub unit_price: usize,
    /// When absent, gross value is derived as quantity * unit price.
    pub gross_value: Option<usize>,
}

impl ColumnMap {
    /// Resolve canonical fields from a header row.
    ///
    /// Aliases are tried in priority order, so `Price` wins over `Avg Price`
    /// when both are present.
    pub fn resolve<'a, I>(headers: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let normalized: Vec<String> = headers.into_iter().map(normalize_header).collect();
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h.as_str() == *alias))
        };
        let require = |aliases: &[&str], field: &'static str| {
            find(aliases).ok_or(LoadError::MissingColumn(field))
        };

        Ok(ColumnMap {
            order_id: find(ORDER_ID),
            timestamp: find(TIMESTAMP),
            asset: find(ASSET),
            kind: require(KIND, "kind")?,
            quantity: require(QUANTITY, "quantity")?,
            unit_price: require(UNIT_PRICE, "unit_price")?,
            gross_value: find(GROSS_VALUE),
        })
    }
}

/// Lowercase, drop parenthesised suffixes and anything non-alphanumeric.
///
/// `"Date(UTC)"` -> `"date"`, `"Order No."` -> `"orderno"`, `"unit_price"` -> `"unitprice"`.
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for c in raw.trim_start_matches('\u{feff}').chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            c if depth == 0 && c.is_alphanumeric() => out.extend(c.to_lowercase()),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Date(UTC)"), "date");
        assert_eq!(normalize_header(" Order No. "), "orderno");
        assert_eq!(normalize_header("unit_price"), "unitprice");
        assert_eq!(normalize_header("Gross Value [USD]"), "grossvalue");
        assert_eq!(normalize_header("\u{feff}Order ID"), "orderid");
    }

    #[test]
    fn test_resolve_canonical_headers() {
        let map = ColumnMap::resolve([
            "order_id",
            "timestamp",
            "asset",
            "kind",
            "quantity",
            "unit_price",
            "gross_value",
        ])
        .unwrap();

        assert_eq!(
            map,
            ColumnMap {
                order_id: Some(0),
                timestamp: Some(1),
                asset: Some(2),
                kind: 3,
                quantity: 4,
                unit_price: 5,
                gross_value: Some(6),
            }
        );
    }

    #[test]
    fn test_resolve_exchange_export_headers() {
        let map = ColumnMap::resolve([
            "Date(UTC)", "Order No.", "Pair", "Type", "Avg Price", "Price", "Executed", "Total",
        ])
        .unwrap();

        assert_eq!(map.timestamp, Some(0));
        assert_eq!(map.order_id, Some(1));
        assert_eq!(map.asset, Some(2));
        assert_eq!(map.kind, 3);
        assert_eq!(map.unit_price, 5);
        assert_eq!(map.quantity, 6);
        assert_eq!(map.gross_value, Some(7));
    }

    #[test]
    fn test_side_wins_over_order_type() {
        let map = ColumnMap::resolve([
            "Date(UTC)", "Pair", "Type", "Side", "Price", "Amount", "Executed", "Total",
        ])
        .unwrap();

        assert_eq!(map.kind, 3);
        assert_eq!(map.quantity, 6);
    }

    #[test]
    fn test_type_and_amount_still_accepted_alone() {
        let map = ColumnMap::resolve(["Type", "Amount", "Price"]).unwrap();
        assert_eq!(map.kind, 0);
        assert_eq!(map.quantity, 1);
    }

    #[test]
    fn test_missing_required_column() {
        let err = ColumnMap::resolve(["Date", "Pair", "Side", "Price"]).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("quantity")));
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let map = ColumnMap::resolve(["side", "qty", "price"]).unwrap();
        assert_eq!(map.order_id, None);
        assert_eq!(map.timestamp, None);
        assert_eq!(map.asset, None);
        assert_eq!(map.gross_value, None);
    }
}
