//! Validation of user-entered values before they reach a store.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::models::MAX_AMOUNT;

/// Parse a non-negative amount no larger than [`MAX_AMOUNT`]. Accepts an
/// optional leading currency sign and thousands separators (`₹1,250.50`).
pub(crate) fn parse_amount(input: &str) -> Result<Decimal> {
    let cleaned: String = input
        .trim()
        .trim_start_matches('₹')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        bail!("Amount is required");
    }
    let amount = Decimal::from_str(&cleaned)
        .with_context(|| format!("Invalid amount: {}", input.trim()))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        bail!("Amount must not be negative: {}", input.trim());
    }
    if amount > MAX_AMOUNT {
        bail!("Amount is too large: {}", input.trim());
    }
    Ok(amount.normalize())
}

/// Check a calendar date and return it zero-padded as `YYYY-MM-DD`, so
/// `2024-3-5` is stored as `2024-03-05` and lands in its month.
pub(crate) fn validate_date(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {trimmed}"))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Check a month and return it zero-padded as `YYYY-MM`.
pub(crate) fn validate_month(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let first = NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
        .with_context(|| format!("Invalid month (expected YYYY-MM): {trimmed}"))?;
    Ok(first.format("%Y-%m").to_string())
}

/// Shift a `YYYY-MM` key by `delta` months.
pub(crate) fn shift_month(month_key: &str, delta: i32) -> Result<String> {
    let month = validate_month(month_key)?;
    let first = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")?;
    let shifted = if delta >= 0 {
        first.checked_add_months(chrono::Months::new(delta.unsigned_abs()))
    } else {
        first.checked_sub_months(chrono::Months::new(delta.unsigned_abs()))
    };
    shifted
        .map(|d| d.format("%Y-%m").to_string())
        .context("Month out of range")
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn today_string() -> String {
    today().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
