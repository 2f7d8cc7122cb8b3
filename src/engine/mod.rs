//! Pure aggregation over in-memory records.
//!
//! Every function takes a snapshot of transactions (and, for budgets, a
//! single budget) and returns a freshly computed value. Nothing here reads
//! storage or keeps state between calls, and results do not depend on the
//! order of the input slice.
//!
//! Arithmetic saturates at `Decimal::MAX` instead of panicking, so records
//! that bypassed input validation (a hosted table edited by hand, say) can
//! skew a total but never take the program down.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Budget, Transaction, TransactionType};

/// Length of a `YYYY-MM` month key.
const MONTH_KEY_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Totals {
    pub(crate) total_income: Decimal,
    pub(crate) total_expenses: Decimal,
    pub(crate) net_balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BudgetProgress {
    pub(crate) spent: Decimal,
    pub(crate) percentage: Decimal,
    pub(crate) remaining: Decimal,
    pub(crate) is_over_budget: bool,
}

fn sum_of(transactions: &[Transaction], kind: TransactionType) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.kind == kind)
        .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount))
}

pub(crate) fn compute_totals(transactions: &[Transaction]) -> Totals {
    let total_income = sum_of(transactions, TransactionType::Income);
    let total_expenses = sum_of(transactions, TransactionType::Expense);
    Totals {
        total_income,
        total_expenses,
        net_balance: total_income.saturating_sub(total_expenses),
    }
}

/// True when the first seven characters of `date` equal `month_key`.
///
/// This is a plain string prefix test: `2024-3-05` does not belong to
/// `2024-03`, and a date shorter than seven characters belongs to no month.
pub(crate) fn in_month(date: &str, month_key: &str) -> bool {
    date.get(..MONTH_KEY_LEN)
        .is_some_and(|prefix| prefix == month_key)
}

pub(crate) fn filter_by_month<'a>(
    transactions: &'a [Transaction],
    month_key: &str,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|t| in_month(&t.date, month_key))
        .collect()
}

/// Owned variant of [`filter_by_month`] for callers that feed the result
/// back into other slice-based aggregations.
pub(crate) fn month_transactions(transactions: &[Transaction], month_key: &str) -> Vec<Transaction> {
    filter_by_month(transactions, month_key)
        .into_iter()
        .cloned()
        .collect()
}

pub(crate) fn compute_budget_progress(
    budget: &Budget,
    transactions: &[Transaction],
) -> BudgetProgress {
    let spent = transactions
        .iter()
        .filter(|t| {
            t.is_expense() && t.category == budget.category && in_month(&t.date, &budget.month)
        })
        .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount));

    let percentage = if budget.limit > Decimal::ZERO {
        spent
            .checked_div(budget.limit)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::MAX)
    } else {
        Decimal::ZERO
    };

    BudgetProgress {
        spent,
        percentage,
        remaining: budget.limit.saturating_sub(spent),
        is_over_budget: spent > budget.limit,
    }
}

/// Expense totals per category for one month.
pub(crate) fn monthly_spending(
    transactions: &[Transaction],
    month_key: &str,
) -> BTreeMap<String, Decimal> {
    let mut acc: BTreeMap<String, Decimal> = BTreeMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.is_expense() && in_month(&t.date, month_key))
    {
        let total = acc.entry(t.category.clone()).or_default();
        *total = total.saturating_add(t.amount);
    }
    acc
}

/// Expense totals per category, largest first. Ties are ordered by name so
/// the result is independent of input order.
pub(crate) fn expense_breakdown(transactions: &[Transaction]) -> Vec<(String, Decimal)> {
    let mut acc: BTreeMap<&str, Decimal> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.is_expense()) {
        let total = acc.entry(t.category.as_str()).or_default();
        *total = total.saturating_add(t.amount);
    }
    let mut rows: Vec<(String, Decimal)> = acc
        .into_iter()
        .map(|(name, total)| (name.to_string(), total))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

/// `YYYY-MM` key for the given day.
pub(crate) fn current_month(today: NaiveDate) -> String {
    today.format("%Y-%m").to_string()
}

/// The `n` most recent transactions of a newest-first list.
pub(crate) fn recent(transactions: &[Transaction], n: usize) -> &[Transaction] {
    &transactions[..n.min(transactions.len())]
}

/// Sort newest-first by creation timestamp. The sort is stable, so records
/// sharing a timestamp keep their relative order.
pub(crate) fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
