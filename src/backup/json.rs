use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{Budget, Transaction, MAX_AMOUNT};
use crate::store::{timestamp_now, RecordStore};

/// Full backup of the record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExportPayload {
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) budgets: Vec<Budget>,
    /// Absent in hand-written import files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) export_date: Option<String>,
}

pub(crate) fn export_data(store: &dyn RecordStore) -> Result<ExportPayload> {
    let transactions = store.list().context("Failed to load transactions")?;
    let budgets = store.list_budgets().context("Failed to load budgets")?;
    Ok(ExportPayload {
        transactions,
        budgets,
        export_date: Some(timestamp_now()),
    })
}

/// Replace everything in the store with the payload's records.
pub(crate) fn import_data(store: &dyn RecordStore, payload: &ExportPayload) -> Result<()> {
    store
        .replace_all(&payload.transactions, &payload.budgets)
        .context("Failed to import records")?;
    tracing::info!(
        transactions = payload.transactions.len(),
        budgets = payload.budgets.len(),
        backend = store.name(),
        "imported backup"
    );
    Ok(())
}

pub(crate) fn write_payload(path: &Path, payload: &ExportPayload) -> Result<()> {
    let json = serde_json::to_string_pretty(payload).context("Failed to encode export")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;
    Ok(())
}

pub(crate) fn read_payload(path: &Path) -> Result<ExportPayload> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    let payload: ExportPayload =
        serde_json::from_str(&raw).context("Import file is not a valid backup")?;
    check_amounts(&payload)?;
    Ok(payload)
}

/// Backups go through the same amount bounds as typed input.
fn check_amounts(payload: &ExportPayload) -> Result<()> {
    let in_range = |amount: Decimal| !amount.is_sign_negative() && amount <= MAX_AMOUNT;
    if let Some(t) = payload.transactions.iter().find(|t| !in_range(t.amount)) {
        bail!("Transaction {} has an out-of-range amount: {}", t.id, t.amount);
    }
    if let Some(b) = payload.budgets.iter().find(|b| !in_range(b.limit)) {
        bail!("Budget {} has an out-of-range limit: {}", b.id, b.limit);
    }
    Ok(())
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
