//! Parsing of CSV ledger exports into normalized transactions.

use crate::domain::{Asset, Decimal, OrderId, Side, Timestamp, Transaction};

use super::columns::ColumnMap;
use super::LoadError;

/// Parse ledger text, dropping `skiprows` metadata lines before the header.
///
/// Either every row parses or the whole ledger is rejected.
pub fn parse_ledger(text: &str, skiprows: usize) -> Result<Vec<Transaction>, LoadError> {
    let text = text.trim_start_matches('\u{feff}');
    let body = skip_lines(text, skiprows).ok_or_else(|| LoadError::InsufficientRows {
        skiprows,
        found: text.lines().count(),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LoadError::Csv(e.to_string()))?
        .clone();
    let columns = ColumnMap::resolve(headers.iter())?;

    let mut transactions = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| LoadError::Csv(e.to_string()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = skiprows as u64 + record.position().map_or(0, |p| p.line());
        transactions.push(parse_row(&record, &columns, line)?);
    }

    Ok(transactions)
}

fn parse_row(
    record: &csv::StringRecord,
    columns: &ColumnMap,
    line: u64,
) -> Result<Transaction, LoadError> {
    let text = |idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .unwrap_or_default()
            .to_string()
    };

    let kind = Side::parse(record.get(columns.kind).unwrap_or_default());

    // Rows the engines skip must not abort the file over cosmetic fields.
    let number = |idx: usize, column: &'static str| -> Result<Decimal, LoadError> {
        let raw = record.get(idx).unwrap_or_default();
        match parse_amount(raw) {
            Some(value) => Ok(value),
            None if kind == Side::Unrecognized => Ok(Decimal::zero()),
            None => Err(LoadError::InvalidNumber {
                line,
                column,
                value: raw.to_string(),
            }),
        }
    };

    let quantity = number(columns.quantity, "quantity")?;
    let unit_price = number(columns.unit_price, "unit_price")?;
    let gross_value = match columns.gross_value {
        Some(idx) => number(idx, "gross_value")?,
        None => match quantity.checked_mul(unit_price) {
            Some(gross) => gross,
            None if kind == Side::Unrecognized => Decimal::zero(),
            None => {
                return Err(LoadError::Overflow {
                    line,
                    column: "gross_value",
                })
            }
        },
    };

    if kind == Side::Unrecognized {
        tracing::debug!(
            line,
            kind = record.get(columns.kind).unwrap_or_default(),
            "Unrecognized transaction kind"
        );
    }

    Ok(Transaction::new(
        OrderId::new(text(columns.order_id)),
        Timestamp::new(text(columns.timestamp)),
        Asset::new(text(columns.asset)),
        kind,
        quantity,
        unit_price,
        gross_value,
    ))
}

/// Remainder of `text` after `n` lines, or `None` if no header would remain.
fn skip_lines(text: &str, n: usize) -> Option<&str> {
    let mut rest = text;
    for _ in 0..n {
        let idx = rest.find('\n')?;
        rest = &rest[idx + 1..];
    }
    if rest.trim().is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Parse a ledger amount such as `"1,234.50"`, `"$99"`, `"(12.5)"` or `"1e-3"`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let (negative, inner) = match trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '€' | '£' | ' ' | '_'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let value = Decimal::from_str_canonical(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_parse_amount_variants() {
        assert_eq!(parse_amount("1,234.50"), Some(d("1234.5")));
        assert_eq!(parse_amount(" $40,000.00 "), Some(d("40000")));
        assert_eq!(parse_amount("-$1,200"), Some(d("-1200")));
        assert_eq!(parse_amount("(12.5)"), Some(d("-12.5")));
        assert_eq!(parse_amount("1e-3"), Some(d("0.001")));
        assert_eq!(parse_amount("€7"), Some(d("7")));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("12 BTC"), None);
        assert_eq!(parse_amount("$"), None);
    }

    #[test]
    fn test_skip_lines() {
        assert_eq!(skip_lines("a\nb\nc\n", 1), Some("b\nc\n"));
        assert_eq!(skip_lines("a\nb\n", 2), None);
        assert_eq!(skip_lines("a", 1), None);
        assert_eq!(skip_lines("header\n", 0), Some("header\n"));
    }

    #[test]
    fn test_parse_ledger_basic() {
        let text = "\
order_id,timestamp,asset,kind,quantity,unit_price,gross_value
1,2024-01-01,BTC,BUY,10,10,100
2,2024-01-02,BTC,buy,5,12,60
3,2024-01-03,BTC,Sell,12,20,240
";
        let txs = parse_ledger(text, 0).unwrap();
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].kind, Side::Buy);
        assert_eq!(txs[0].gross_value, d("100"));
        assert_eq!(txs[2].kind, Side::Sell);
        assert_eq!(txs[2].order_id.as_str(), "3");
        assert_eq!(txs[2].timestamp.as_str(), "2024-01-03");
        assert_eq!(txs[2].asset.as_str(), "BTC");
    }

    #[test]
    fn test_parse_ledger_skips_metadata_and_blank_rows() {
        let text = "\
Account: 12345
Exported: 2024-06-30

Date(UTC),Pair,Side,Price,Executed,Amount Total
2024-01-01 09:00:00,ETHUSDT,BUY,\"1,000.00\",2,
2024-01-02 09:00:00,ETHUSDT,SELL,\"1,100.00\",1,
,,,,,
";
        let txs = parse_ledger(text, 3).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].unit_price, d("1000"));
        assert_eq!(txs[0].gross_value, d("2000"));
        assert_eq!(txs[1].quantity, d("1"));
    }

    #[test]
    fn test_parse_ledger_insufficient_rows() {
        let err = parse_ledger("meta\nmore meta\n", 5).unwrap_err();
        match err {
            LoadError::InsufficientRows { skiprows, found } => {
                assert_eq!(skiprows, 5);
                assert_eq!(found, 2);
            }
            other => panic!("Expected InsufficientRows, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ledger_invalid_number_reports_line() {
        let text = "\
meta
side,qty,price
buy,1,10
sell,abc,12
";
        let err = parse_ledger(text, 1).unwrap_err();
        match err {
            LoadError::InvalidNumber {
                line,
                column,
                value,
            } => {
                assert_eq!(line, 4);
                assert_eq!(column, "quantity");
                assert_eq!(value, "abc");
            }
            other => panic!("Expected InvalidNumber, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_rows_tolerate_blank_numbers() {
        let text = "\
type,quantity,price
Deposit,,
buy,1,5
";
        let txs = parse_ledger(text, 0).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].kind, Side::Unrecognized);
        assert_eq!(txs[0].quantity, Decimal::zero());
        assert_eq!(txs[1].gross_value, d("5"));
    }

    #[test]
    fn test_order_type_column_does_not_hide_side() {
        let text = "\
Date(UTC),Pair,Type,Side,Price,Executed,Total
2024-01-01,BTCUSDT,LIMIT,BUY,100,2,200
2024-01-02,BTCUSDT,MARKET,SELL,120,1,120
";
        let txs = parse_ledger(text, 0).unwrap();
        let kinds: Vec<_> = txs.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Side::Buy, Side::Sell]);
        assert_eq!(txs[0].quantity, d("2"));
    }

    #[test]
    fn test_overflowing_derived_gross_rejects_ledger() {
        let text = "\
kind,quantity,unit_price
buy,1,10
buy,100000000000000,1000000000000000
";
        match parse_ledger(text, 0).unwrap_err() {
            LoadError::Overflow { line, column } => {
                assert_eq!(line, 3);
                assert_eq!(column, "gross_value");
            }
            other => panic!("Expected Overflow, got {:?}", other),
        }
    }
}
