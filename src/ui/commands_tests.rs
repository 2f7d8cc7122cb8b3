#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::*;
use crate::store::LocalStore;

fn may_15() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
}

fn setup() -> (App, LocalStore) {
    let store = LocalStore::open_in_memory().unwrap();
    let mut app = App::new("local", may_15());
    app.refresh(&store);
    (app, store)
}

// ── Parsing ───────────────────────────────────────────────────

#[test]
fn test_parse_add_full() {
    let new = parse_add("expense 250.50 food & dining @2024-05-03 -- team lunch", may_15()).unwrap();
    assert_eq!(new.kind, TransactionType::Expense);
    assert_eq!(new.amount, dec!(250.50));
    assert_eq!(new.category, "Food & Dining");
    assert_eq!(new.date, "2024-05-03");
    assert_eq!(new.notes.as_deref(), Some("team lunch"));
}

#[test]
fn test_parse_add_defaults_to_today() {
    let new = parse_add("income 50000 salary", may_15()).unwrap();
    assert_eq!(new.kind, TransactionType::Income);
    assert_eq!(new.category, "Salary");
    assert_eq!(new.date, "2024-05-15");
    assert_eq!(new.notes, None);
}

#[test]
fn test_parse_add_rejects_bad_input() {
    assert!(parse_add("transfer 10 Other", may_15()).is_err());
    assert!(parse_add("expense", may_15()).is_err());
    assert!(parse_add("expense ten Other", may_15()).is_err());
    assert!(parse_add("expense -10 Other", may_15()).is_err());
    assert!(parse_add("expense 10", may_15()).is_err());
    assert!(parse_add("expense 10 Other @2024-02-30", may_15()).is_err());
}

#[test]
fn test_parse_edit_fields() {
    assert_eq!(
        parse_edit("amount 300", TransactionType::Expense).unwrap().amount,
        Some(dec!(300))
    );
    assert_eq!(
        parse_edit("type income", TransactionType::Expense).unwrap().kind,
        Some(TransactionType::Income)
    );
    assert_eq!(
        parse_edit("category Bills & Utilities", TransactionType::Expense)
            .unwrap()
            .category
            .as_deref(),
        Some("Bills & Utilities")
    );
    assert_eq!(
        parse_edit("notes", TransactionType::Expense).unwrap().notes.as_deref(),
        Some("")
    );
    assert!(parse_edit("date 2024/05/01", TransactionType::Expense).is_err());
    assert!(parse_edit("colour red", TransactionType::Expense).is_err());
    assert!(parse_edit("", TransactionType::Expense).is_err());
}

#[test]
fn test_parse_edit_category_uses_suggested_spelling() {
    let patch = parse_edit("category food & dining", TransactionType::Expense).unwrap();
    assert_eq!(patch.category.as_deref(), Some("Food & Dining"));
    let patch = parse_edit("category  SALARY ", TransactionType::Income).unwrap();
    assert_eq!(patch.category.as_deref(), Some("Salary"));
    let patch = parse_edit("category Pets", TransactionType::Expense).unwrap();
    assert_eq!(patch.category.as_deref(), Some("Pets"));
}

#[test]
fn test_parse_add_pads_unpadded_date() {
    let new = parse_add("expense 50 Food & Dining @2024-3-05", may_15()).unwrap();
    assert_eq!(new.date, "2024-03-05");
}

#[test]
fn test_parse_budget_last_word_is_limit() {
    let (category, limit) = parse_budget("food & dining 5000").unwrap();
    assert_eq!(category, "Food & Dining");
    assert_eq!(limit, dec!(5000));
    assert!(parse_budget("5000").is_err());
    assert!(parse_budget("Travel lots").is_err());
}

#[test]
fn test_levenshtein() {
    assert_eq!(levenshtein("budget", "budget"), 0);
    assert_eq!(levenshtein("budgte", "budget"), 2);
    assert_eq!(levenshtein("", "abc"), 3);
}

// ── Dispatch ──────────────────────────────────────────────────

#[test]
fn test_unknown_command_suggests() {
    let (mut app, store) = setup();
    handle_command("exprot x.json", &mut app, &store);
    assert!(app.status_message.contains("Did you mean :export?"));
}

#[test]
fn test_add_creates_and_refreshes() {
    let (mut app, store) = setup();
    handle_command("add expense 120 Food & Dining @2024-05-03", &mut app, &store);

    assert_eq!(store.list().unwrap().len(), 1);
    assert_eq!(app.transactions.len(), 1);
    assert_eq!(app.month_totals.total_expenses, dec!(120));
    assert!(app.status_message.starts_with("Added expense ₹120.00"));
}

#[test]
fn test_add_validation_error_reaches_status_not_store() {
    let (mut app, store) = setup();
    handle_command("add expense abc Food", &mut app, &store);
    assert!(app.status_message.starts_with("Error:"));
    assert!(store.list().unwrap().is_empty());
    assert!(app.running);
}

#[test]
fn test_budget_then_spend_goes_over() {
    let (mut app, store) = setup();
    handle_command("budget Food & Dining 100", &mut app, &store);
    handle_command("add expense 120 Food & Dining @2024-05-03", &mut app, &store);

    assert_eq!(app.screen, Screen::Budgets);
    assert_eq!(app.budget_rows.len(), 1);
    let progress = app.budget_rows[0].progress;
    assert_eq!(progress.spent, dec!(120));
    assert_eq!(progress.remaining, dec!(-20));
    assert!(progress.is_over_budget);
    assert_eq!(app.over_budget_count(), 1);
}

#[test]
fn test_edit_requires_transactions_screen() {
    let (mut app, store) = setup();
    handle_command("add expense 10 Other", &mut app, &store);
    app.screen = Screen::Dashboard;
    handle_command("edit amount 20", &mut app, &store);
    assert_eq!(store.list().unwrap()[0].amount, dec!(10));
}

#[test]
fn test_edit_selected_transaction() {
    let (mut app, store) = setup();
    handle_command("add expense 10 Other", &mut app, &store);
    app.screen = Screen::Transactions;
    handle_command("edit amount 20", &mut app, &store);
    assert_eq!(store.list().unwrap()[0].amount, dec!(20));
    assert_eq!(app.transactions[0].amount, dec!(20));
}

#[test]
fn test_delete_asks_then_deletes() {
    let (mut app, store) = setup();
    handle_command("add expense 10 Other", &mut app, &store);
    app.screen = Screen::Transactions;
    handle_command("delete", &mut app, &store);

    assert_eq!(app.input_mode, InputMode::Confirm);
    assert_eq!(store.list().unwrap().len(), 1);

    let action = app.pending_action.take().unwrap();
    run_pending(action, &mut app, &store).unwrap();
    assert!(store.list().unwrap().is_empty());
    assert!(app.transactions.is_empty());
}

#[test]
fn test_month_navigation() {
    let (mut app, store) = setup();
    handle_command("prev-month", &mut app, &store);
    assert_eq!(app.current_month, "2024-04");
    handle_command("month 2023-12", &mut app, &store);
    assert_eq!(app.current_month, "2023-12");
    handle_command("next-month", &mut app, &store);
    assert_eq!(app.current_month, "2024-01");
    handle_command("month", &mut app, &store);
    assert_eq!(app.current_month, "2024-05");

    handle_command("month 2024-13", &mut app, &store);
    assert_eq!(app.current_month, "2024-05");
    assert!(app.status_message.starts_with("Error:"));
}

#[test]
fn test_export_then_import_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.json");
    let (mut app, store) = setup();
    handle_command("add income 5000 Salary @2024-05-01", &mut app, &store);
    handle_command("budget Travel 300", &mut app, &store);
    let before = store.list().unwrap();

    handle_command(&format!("export {}", path.display()), &mut app, &store);
    assert!(path.is_file());

    let other = LocalStore::open_in_memory().unwrap();
    let mut other_app = App::new("local", may_15());
    handle_command(&format!("import {}", path.display()), &mut other_app, &other);
    assert_eq!(other_app.input_mode, InputMode::Confirm);

    let action = other_app.pending_action.take().unwrap();
    run_pending(action, &mut other_app, &other).unwrap();
    assert_eq!(other.list().unwrap(), before);
    assert_eq!(other.list_budgets().unwrap().len(), 1);
}

#[test]
fn test_import_missing_file_is_reported() {
    let (mut app, store) = setup();
    handle_command("import /nonexistent/backup.json", &mut app, &store);
    assert!(app.pending_action.is_none());
    assert!(app.status_message.contains("File not found"));
}

#[test]
fn test_sheet_writes_three_files() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("sheets");
    let (mut app, store) = setup();
    handle_command("add expense 10 Other", &mut app, &store);
    handle_command(&format!("sheet {}", target.display()), &mut app, &store);

    assert!(target.join("Transactions.csv").is_file());
    assert!(target.join("Summary.csv").is_file());
    assert!(target.join("Category Breakdown.csv").is_file());
}

#[test]
fn test_search_filters_transactions() {
    let (mut app, store) = setup();
    handle_command("add expense 10 Shopping -- new shoes", &mut app, &store);
    handle_command("add expense 20 Travel", &mut app, &store);
    handle_command("search SHOES", &mut app, &store);

    assert_eq!(app.screen, Screen::Transactions);
    assert_eq!(app.transactions.len(), 1);
    assert_eq!(app.transactions[0].category, "Shopping");

    handle_command("search", &mut app, &store);
    assert_eq!(app.transactions.len(), 2);
}

#[test]
fn test_quit() {
    let (mut app, store) = setup();
    handle_command("q", &mut app, &store);
    assert!(!app.running);
}

#[test]
fn test_help_entries_group_aliases() {
    let entries = help_entries();
    let add = entries.iter().find(|(names, _)| names == "add, a").unwrap();
    assert!(add.1.contains("e.g."));
    assert!(entries.iter().any(|(names, _)| names == "quit, q"));
    assert!(entries.iter().any(|(names, _)| names == "next-month"));
    // Every registered name shows up exactly once
    let listed: usize = entries.iter().map(|(names, _)| names.split(", ").count()).sum();
    assert_eq!(listed, COMMANDS.len());
}

#[test]
fn test_completions() {
    assert_eq!(completions("bud"), vec!["budget", "budgets"]);
    assert_eq!(completions("next"), vec!["next-month"]);
    assert!(completions("").is_empty());
    assert!(completions("budget Food").is_empty());
    assert!(completions("zzz").is_empty());
}
