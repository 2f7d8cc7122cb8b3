use anyhow::{Context, Result};
use std::path::Path;

use crate::engine;
use crate::models::Transaction;

pub(crate) const TRANSACTIONS_SHEET: &str = "Transactions.csv";
pub(crate) const SUMMARY_SHEET: &str = "Summary.csv";
pub(crate) const BREAKDOWN_SHEET: &str = "Category Breakdown.csv";

/// `finance-data-YYYY-MM`
pub(crate) fn default_dir_name(month_key: &str) -> String {
    format!("finance-data-{month_key}")
}

/// Write the transaction list, totals and per-category spend as three
/// CSV sheets inside `dir`, creating it if needed.
pub(crate) fn write_spreadsheet(dir: &Path, transactions: &[Transaction]) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

    write_transactions(&dir.join(TRANSACTIONS_SHEET), transactions)?;
    write_summary(&dir.join(SUMMARY_SHEET), transactions)?;
    write_breakdown(&dir.join(BREAKDOWN_SHEET), transactions)?;

    tracing::info!(dir = %dir.display(), rows = transactions.len(), "wrote spreadsheet export");
    Ok(())
}

fn sheet_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create sheet: {}", path.display()))
}

fn write_transactions(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let mut wtr = sheet_writer(path)?;
    wtr.write_record(["Date", "Type", "Category", "Amount", "Notes"])?;
    for t in transactions {
        let amount = t.amount.to_string();
        wtr.write_record([
            t.date.as_str(),
            t.kind.label(),
            t.category.as_str(),
            amount.as_str(),
            t.notes.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_summary(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let totals = engine::compute_totals(transactions);
    let mut wtr = sheet_writer(path)?;
    wtr.write_record(["Summary", "Amount"])?;
    for (label, value) in [
        ("Total Income", totals.total_income),
        ("Total Expenses", totals.total_expenses),
        ("Net Balance", totals.net_balance),
    ] {
        wtr.write_record([label, value.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_breakdown(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let mut wtr = sheet_writer(path)?;
    wtr.write_record(["Category", "Total Spent"])?;
    for (category, total) in engine::expense_breakdown(transactions) {
        wtr.write_record([category.as_str(), total.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "spreadsheet_tests.rs"]
mod tests;
