#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::schema::{BUDGETS_KEY, TRANSACTIONS_KEY};
use super::*;
use crate::models::TransactionType;

fn new_expense(amount: Decimal, category: &str, date: &str) -> NewTransaction {
    NewTransaction::new(amount, TransactionType::Expense, category.into(), date.into())
}

// ── Transactions ──────────────────────────────────────────────

#[test]
fn test_empty_store_lists_nothing() {
    let store = LocalStore::open_in_memory().unwrap();
    assert!(store.list().unwrap().is_empty());
    assert!(store.list_budgets().unwrap().is_empty());
}

#[test]
fn test_create_assigns_id_and_created_at() {
    let store = LocalStore::open_in_memory().unwrap();
    let txn = store
        .create(new_expense(dec!(42.50), "Shopping", "2024-01-15").with_notes("shoes"))
        .unwrap();

    assert!(!txn.id.is_empty());
    assert!(uuid::Uuid::parse_str(&txn.id).is_ok());
    assert!(txn.created_at.ends_with('Z'));
    assert_eq!(txn.amount, dec!(42.50));
    assert_eq!(txn.notes.as_deref(), Some("shoes"));

    let all = store.list().unwrap();
    assert_eq!(all, vec![txn]);
}

#[test]
fn test_ids_are_unique() {
    let store = LocalStore::open_in_memory().unwrap();
    let a = store.create(new_expense(dec!(1), "Other", "2024-01-01")).unwrap();
    let b = store.create(new_expense(dec!(1), "Other", "2024-01-01")).unwrap();
    assert_ne!(a.id, b.id);
}

#[test]
fn test_list_is_newest_first() {
    let store = LocalStore::open_in_memory().unwrap();
    let first = store.create(new_expense(dec!(1), "Other", "2024-01-01")).unwrap();
    let second = store.create(new_expense(dec!(2), "Other", "2023-12-31")).unwrap();
    let third = store.create(new_expense(dec!(3), "Other", "2024-02-01")).unwrap();

    let ids: Vec<String> = store.list().unwrap().into_iter().map(|t| t.id).collect();
    // Creation order, not the transaction date, decides the ordering
    assert_eq!(ids, vec![third.id, second.id, first.id]);
}

#[test]
fn test_list_orders_by_created_at() {
    let store = LocalStore::open_in_memory().unwrap();
    let older = new_expense(dec!(1), "Other", "2024-01-01")
        .into_transaction("old".into(), "2024-01-01T00:00:00.000Z".into());
    let newer = new_expense(dec!(2), "Other", "2024-01-01")
        .into_transaction("new".into(), "2024-06-01T00:00:00.000Z".into());
    // Stored out of order on purpose
    store.replace_all(&[newer.clone(), older.clone()], &[]).unwrap();

    assert_eq!(store.list().unwrap(), vec![newer, older]);
}

#[test]
fn test_update_merges_fields() {
    let store = LocalStore::open_in_memory().unwrap();
    let txn = store.create(new_expense(dec!(10), "Shopping", "2024-01-15")).unwrap();

    let patch = TransactionPatch {
        amount: Some(dec!(12.75)),
        kind: Some(TransactionType::Income),
        category: Some("Gift".into()),
        ..Default::default()
    };
    store.update(&txn.id, &patch).unwrap();

    let updated = store.list().unwrap().remove(0);
    assert_eq!(updated.amount, dec!(12.75));
    assert_eq!(updated.kind, TransactionType::Income);
    assert_eq!(updated.category, "Gift");
    assert_eq!(updated.date, "2024-01-15");
    assert_eq!(updated.id, txn.id);
    assert_eq!(updated.created_at, txn.created_at);
}

#[test]
fn test_update_missing_id_is_not_found() {
    let store = LocalStore::open_in_memory().unwrap();
    store.create(new_expense(dec!(10), "Shopping", "2024-01-15")).unwrap();
    let err = store
        .update("does-not-exist", &TransactionPatch::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(ref id) if id == "does-not-exist"));
}

#[test]
fn test_delete_removes_record() {
    let store = LocalStore::open_in_memory().unwrap();
    let keep = store.create(new_expense(dec!(1), "Other", "2024-01-01")).unwrap();
    let gone = store.create(new_expense(dec!(2), "Other", "2024-01-02")).unwrap();

    store.delete(&gone.id).unwrap();
    assert_eq!(store.list().unwrap(), vec![keep]);
}

#[test]
fn test_delete_missing_id_is_ok() {
    let store = LocalStore::open_in_memory().unwrap();
    store.create(new_expense(dec!(1), "Other", "2024-01-01")).unwrap();
    store.delete("nope").unwrap();
    store.delete("nope").unwrap();
    assert_eq!(store.list().unwrap().len(), 1);
}

// ── Budgets ───────────────────────────────────────────────────

#[test]
fn test_upsert_budget_creates() {
    let store = LocalStore::open_in_memory().unwrap();
    let budget = store.upsert_budget("Food & Dining", dec!(500), "2024-05").unwrap();
    assert_eq!(budget.category, "Food & Dining");
    assert_eq!(budget.limit, dec!(500));
    assert_eq!(budget.month, "2024-05");
    assert_eq!(budget.spent, Decimal::ZERO);
    assert_eq!(store.list_budgets().unwrap(), vec![budget]);
}

#[test]
fn test_upsert_budget_overwrites_same_category_and_month() {
    let store = LocalStore::open_in_memory().unwrap();
    let first = store.upsert_budget("Travel", dec!(300), "2024-05").unwrap();
    let second = store.upsert_budget("Travel", dec!(450), "2024-05").unwrap();

    assert_eq!(first.id, second.id);
    let budgets = store.list_budgets().unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].limit, dec!(450));
}

#[test]
fn test_upsert_budget_different_month_is_separate() {
    let store = LocalStore::open_in_memory().unwrap();
    store.upsert_budget("Travel", dec!(300), "2024-05").unwrap();
    store.upsert_budget("Travel", dec!(300), "2024-06").unwrap();
    store.upsert_budget("Shopping", dec!(300), "2024-05").unwrap();
    assert_eq!(store.list_budgets().unwrap().len(), 3);
}

// ── Corrupt and raw data ──────────────────────────────────────

#[test]
fn test_corrupt_json_reads_as_empty() {
    let store = LocalStore::open_in_memory().unwrap();
    store.set_raw(TRANSACTIONS_KEY, "{not json").unwrap();
    store.set_raw(BUDGETS_KEY, "[{\"id\": 1}]").unwrap();

    assert!(store.list().unwrap().is_empty());
    assert!(store.list_budgets().unwrap().is_empty());
}

#[test]
fn test_create_after_corrupt_data_starts_fresh() {
    let store = LocalStore::open_in_memory().unwrap();
    store.set_raw(TRANSACTIONS_KEY, "garbage").unwrap();
    let txn = store.create(new_expense(dec!(5), "Other", "2024-01-01")).unwrap();
    assert_eq!(store.list().unwrap(), vec![txn]);
}

#[test]
fn test_stored_value_is_json_array() {
    let store = LocalStore::open_in_memory().unwrap();
    store.create(new_expense(dec!(9.99), "Shopping", "2024-01-01")).unwrap();

    let raw = store.get_raw(TRANSACTIONS_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["amount"], serde_json::json!(9.99));
    assert_eq!(items[0]["type"], "expense");
    assert!(items[0]["createdAt"].is_string());
}

#[test]
fn test_extreme_amount_does_not_wipe_existing_records() {
    let store = LocalStore::open_in_memory().unwrap();
    let salary = store
        .create(NewTransaction::new(
            dec!(10),
            TransactionType::Income,
            "Salary".into(),
            "2024-01-01".into(),
        ))
        .unwrap();
    let huge = store
        .create(new_expense(Decimal::MAX, "Other", "2024-01-02"))
        .unwrap();

    let raw = store.get_raw(TRANSACTIONS_KEY).unwrap().unwrap();
    assert!(raw.contains("\"amount\":79228162514264337593543950335"));

    let all = store.list().unwrap();
    assert_eq!(all, vec![huge.clone(), salary.clone()]);
    assert_eq!(all[0].amount, Decimal::MAX);

    store.create(new_expense(dec!(1), "Other", "2024-01-03")).unwrap();
    let all = store.list().unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.contains(&salary));
}

#[test]
fn test_amounts_keep_every_digit() {
    let store = LocalStore::open_in_memory().unwrap();
    store
        .create(new_expense(dec!(12345678901234567.89), "Rent", "2024-01-01"))
        .unwrap();
    store
        .upsert_budget("Rent", dec!(0.0000000001), "2024-01")
        .unwrap();

    assert_eq!(store.list().unwrap()[0].amount, dec!(12345678901234567.89));
    assert_eq!(store.list_budgets().unwrap()[0].limit, dec!(0.0000000001));
}

// ── Replace all ───────────────────────────────────────────────

#[test]
fn test_replace_all_overwrites_everything() {
    let store = LocalStore::open_in_memory().unwrap();
    store.create(new_expense(dec!(1), "Other", "2024-01-01")).unwrap();
    store.upsert_budget("Other", dec!(10), "2024-01").unwrap();

    let imported = new_expense(dec!(77), "Travel", "2023-07-04")
        .into_transaction("imported-1".into(), "2023-07-04T12:00:00.000Z".into());
    let budget = Budget::new("b-9".into(), "Travel".into(), dec!(100), "2023-07".into());
    store
        .replace_all(std::slice::from_ref(&imported), std::slice::from_ref(&budget))
        .unwrap();

    assert_eq!(store.list().unwrap(), vec![imported]);
    assert_eq!(store.list_budgets().unwrap(), vec![budget]);
}

#[test]
fn test_replace_all_with_empty_sets_clears() {
    let store = LocalStore::open_in_memory().unwrap();
    store.create(new_expense(dec!(1), "Other", "2024-01-01")).unwrap();
    store.replace_all(&[], &[]).unwrap();
    assert!(store.list().unwrap().is_empty());
}

// ── On-disk persistence ───────────────────────────────────────

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fintrack.db");

    let created = {
        let store = LocalStore::open(&path).unwrap();
        store.upsert_budget("Shopping", dec!(200), "2024-03").unwrap();
        store.create(new_expense(dec!(15), "Shopping", "2024-03-02")).unwrap()
    };

    let store = LocalStore::open(&path).unwrap();
    assert_eq!(store.list().unwrap(), vec![created]);
    assert_eq!(store.list_budgets().unwrap().len(), 1);
    assert_eq!(store.name(), "local");
}
