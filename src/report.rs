//! Rendering of run summaries for the terminal or as JSON.

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Table};

use crate::domain::Decimal;
use crate::orchestration::{FileOutcome, FileReport, MethodReport, MethodTotal, RunSummary};

/// Amount rounded for display, always showing `dp` decimal places.
pub fn format_amount(value: Decimal, dp: u32) -> String {
    format!("{:.*}", dp as usize, value.round_for_display(dp).inner())
}

fn num(value: Decimal, dp: u32) -> Cell {
    Cell::new(format_amount(value, dp)).set_alignment(CellAlignment::Right)
}

fn count(value: usize) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header.to_vec());
    table
}

/// Human-readable report: one summary table per file, optional per-sale
/// tables, failures, and grand totals.
pub fn render_table(summary: &RunSummary, dp: u32, details: bool) -> String {
    let mut out = String::new();

    for outcome in &summary.files {
        match outcome {
            FileOutcome::Processed(report) => {
                out.push_str(&render_file(report, dp, details));
            }
            FileOutcome::Failed { path, error } => {
                out.push_str(&format!("{}\n  FAILED: {}\n\n", path.display(), error));
            }
        }
    }

    out.push_str(&format!(
        "Grand total ({} files, {} failed, partition: {})\n",
        summary.files.len(),
        summary.failed_files(),
        summary.partition
    ));
    let mut table = new_table(&[
        "Method",
        "Sales",
        "Proceeds",
        "Cost Basis",
        "Realized Gain",
        "Fallbacks",
    ]);
    for total in &summary.grand_totals {
        table.add_row(total_row(None, total, dp));
    }
    out.push_str(&table.to_string());
    out.push('\n');
    out
}

fn total_row(asset: Option<&str>, total: &MethodTotal, dp: u32) -> Vec<Cell> {
    let mut row = Vec::with_capacity(7);
    if let Some(asset) = asset {
        row.push(Cell::new(asset));
    }
    row.extend([
        Cell::new(total.method.label()),
        count(total.sales),
        num(total.proceeds, dp),
        num(total.cost_basis, dp),
        num(total.realized_gain, dp),
        count(total.fallbacks),
    ]);
    row
}

fn render_file(report: &FileReport, dp: u32, details: bool) -> String {
    let mut out = format!("{}\n", report.path.display());

    let mut table = new_table(&[
        "Asset",
        "Method",
        "Sales",
        "Proceeds",
        "Cost Basis",
        "Realized Gain",
        "Fallbacks",
    ]);
    for group in &report.groups {
        let asset = group.asset.as_ref().map_or("(all)", |a| a.as_str());
        for method in &group.methods {
            table.add_row(total_row(Some(asset), &method.total, dp));
        }
    }
    out.push_str(&table.to_string());
    out.push('\n');

    if details {
        for group in &report.groups {
            for method in &group.methods {
                if !method.records.is_empty() {
                    out.push_str(&render_records(method, dp));
                }
            }
        }
    }

    out.push('\n');
    out
}

fn render_records(report: &MethodReport, dp: u32) -> String {
    let mut table = new_table(&[
        "Order ID",
        "Timestamp",
        "Asset",
        "Quantity",
        "Price",
        "Proceeds",
        "Cost Basis",
        "Unit Cost",
        "Realized Gain",
    ]);
    for record in &report.records {
        table.add_row(vec![
            Cell::new(record.order_id.as_str()),
            Cell::new(record.timestamp.as_str()),
            Cell::new(record.asset.as_str()),
            Cell::new(record.sold_quantity.to_canonical_string())
                .set_alignment(CellAlignment::Right),
            num(record.sale_unit_price, dp),
            num(record.proceeds, dp),
            num(record.cost_basis, dp),
            num(record.unit_cost, dp),
            num(record.realized_gain, dp),
        ]);
    }
    let losses = report.records.iter().filter(|r| r.is_loss()).count();
    format!(
        "{} sales ({}, {} at a loss)\n{}\n",
        report.method.label(),
        report.records.len(),
        losses,
        table
    )
}

/// Pretty-printed JSON of the full summary, including every record.
pub fn render_json(summary: &RunSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}
