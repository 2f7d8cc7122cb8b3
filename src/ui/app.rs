use chrono::NaiveDate;
use std::path::PathBuf;

use crate::engine::{self, BudgetProgress, Totals};
use crate::models::{Budget, Transaction};
use crate::store::RecordStore;
use crate::ui::util::clamp_cursor;

/// Number of rows in the dashboard's recent-activity panel.
pub(crate) const RECENT_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Transactions,
    Budgets,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Dashboard, Self::Transactions, Self::Budgets]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Transactions => write!(f, "Transactions"),
            Self::Budgets => write!(f, "Budgets"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Search,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Search => write!(f, "SEARCH"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingAction {
    DeleteTransaction { id: String, label: String },
    Import { path: PathBuf },
}

#[derive(Debug, Clone)]
pub(crate) struct BudgetRow {
    pub(crate) budget: Budget,
    pub(crate) progress: BudgetProgress,
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) search_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    pub(crate) current_month: String,
    pub(crate) today: NaiveDate,
    pub(crate) backend: &'static str,

    // Snapshot of the store, newest-first
    pub(crate) records: Vec<Transaction>,
    pub(crate) all_budgets: Vec<Budget>,

    // Dashboard
    pub(crate) month_totals: Totals,
    pub(crate) balance: Totals,
    pub(crate) breakdown: Vec<(String, rust_decimal::Decimal)>,
    pub(crate) recent: Vec<Transaction>,

    // Transactions
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) transaction_index: usize,
    pub(crate) transaction_scroll: usize,

    // Budgets
    pub(crate) budget_rows: Vec<BudgetRow>,
    pub(crate) budget_index: usize,
    pub(crate) budget_scroll: usize,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(backend: &'static str, today: NaiveDate) -> Self {
        Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            search_input: String::new(),
            status_message: String::new(),
            show_help: false,
            current_month: engine::current_month(today),
            today,
            backend,

            records: Vec::new(),
            all_budgets: Vec::new(),

            month_totals: Totals::default(),
            balance: Totals::default(),
            breakdown: Vec::new(),
            recent: Vec::new(),

            transactions: Vec::new(),
            transaction_index: 0,
            transaction_scroll: 0,

            budget_rows: Vec::new(),
            budget_index: 0,
            budget_scroll: 0,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    /// Reload both record sets from the store. A failed load empties the
    /// affected view and reports the error in the status line.
    pub(crate) fn refresh(&mut self, store: &dyn RecordStore) {
        match store.list() {
            Ok(records) => self.records = records,
            Err(e) => {
                self.records.clear();
                self.set_status(format!("Failed to load transactions: {e}"));
            }
        }
        match store.list_budgets() {
            Ok(budgets) => self.all_budgets = budgets,
            Err(e) => {
                self.all_budgets.clear();
                self.set_status(format!("Failed to load budgets: {e}"));
            }
        }
        self.recompute();
    }

    /// Rebuild every derived view from the current snapshot.
    pub(crate) fn recompute(&mut self) {
        let month = engine::month_transactions(&self.records, &self.current_month);

        self.month_totals = engine::compute_totals(&month);
        self.balance = engine::compute_totals(&self.records);
        self.breakdown = engine::expense_breakdown(&month);
        self.recent = engine::recent(&self.records, RECENT_COUNT).to_vec();

        let query = self.search_input.trim().to_lowercase();
        self.transactions = month
            .into_iter()
            .filter(|t| query.is_empty() || matches_search(t, &query))
            .collect();
        clamp_cursor(
            &mut self.transaction_index,
            &mut self.transaction_scroll,
            self.transactions.len(),
        );

        self.budget_rows = self
            .all_budgets
            .iter()
            .filter(|b| b.month == self.current_month)
            .map(|b| BudgetRow {
                budget: b.clone(),
                progress: engine::compute_budget_progress(b, &self.records),
            })
            .collect();
        self.budget_rows
            .sort_by(|a, b| a.budget.category.cmp(&b.budget.category));
        clamp_cursor(
            &mut self.budget_index,
            &mut self.budget_scroll,
            self.budget_rows.len(),
        );
    }

    pub(crate) fn set_month(&mut self, month_key: String) {
        self.current_month = month_key;
        self.transaction_index = 0;
        self.transaction_scroll = 0;
        self.budget_index = 0;
        self.budget_scroll = 0;
        self.recompute();
    }

    pub(crate) fn selected_transaction(&self) -> Option<&Transaction> {
        self.transactions.get(self.transaction_index)
    }

    pub(crate) fn over_budget_count(&self) -> usize {
        self.budget_rows
            .iter()
            .filter(|r| r.progress.is_over_budget)
            .count()
    }

    pub(crate) fn page(&self) -> usize {
        self.visible_rows.max(1)
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}

/// Case-insensitive match of an already lowercased query against the
/// fields shown in the transactions table.
fn matches_search(txn: &Transaction, query: &str) -> bool {
    txn.category.to_lowercase().contains(query)
        || txn
            .notes
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(query))
        || txn.kind.as_str().contains(query)
        || txn.date.contains(query)
        || txn.amount.to_string().contains(query)
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
