#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::category::{normalize, suggested, EXPENSE_CATEGORIES, INCOME_CATEGORIES};
use super::*;

// ── Transaction ───────────────────────────────────────────────

fn make_txn(amount: Decimal, kind: TransactionType) -> Transaction {
    Transaction {
        id: "txn-1".into(),
        amount,
        kind,
        category: "Shopping".into(),
        date: "2024-01-15".into(),
        notes: None,
        created_at: "2024-01-15T10:00:00.000Z".into(),
    }
}

#[test]
fn test_income() {
    let txn = make_txn(dec!(100.00), TransactionType::Income);
    assert!(txn.is_income());
    assert!(!txn.is_expense());
    assert_eq!(txn.signed_amount(), dec!(100.00));
}

#[test]
fn test_expense() {
    let txn = make_txn(dec!(50.00), TransactionType::Expense);
    assert!(!txn.is_income());
    assert!(txn.is_expense());
    assert_eq!(txn.signed_amount(), dec!(-50.00));
}

#[test]
fn test_zero_expense_signed_amount() {
    let txn = make_txn(Decimal::ZERO, TransactionType::Expense);
    assert_eq!(txn.signed_amount(), Decimal::ZERO);
}

// ── TransactionType ───────────────────────────────────────────

#[test]
fn test_transaction_type_parse() {
    assert_eq!(TransactionType::parse("income"), Some(TransactionType::Income));
    assert_eq!(TransactionType::parse("INCOME"), Some(TransactionType::Income));
    assert_eq!(TransactionType::parse(" in "), Some(TransactionType::Income));
    assert_eq!(TransactionType::parse("expense"), Some(TransactionType::Expense));
    assert_eq!(TransactionType::parse("exp"), Some(TransactionType::Expense));
    assert_eq!(TransactionType::parse("transfer"), None);
    assert_eq!(TransactionType::parse(""), None);
}

#[test]
fn test_transaction_type_labels() {
    assert_eq!(TransactionType::Income.as_str(), "income");
    assert_eq!(TransactionType::Expense.label(), "Expense");
    assert_eq!(format!("{}", TransactionType::Expense), "expense");
}

// ── Patch ─────────────────────────────────────────────────────

#[test]
fn test_apply_patch_changes_only_present_fields() {
    let mut txn = make_txn(dec!(10), TransactionType::Expense);
    let patch = TransactionPatch {
        amount: Some(dec!(12.50)),
        category: Some("Travel".into()),
        ..Default::default()
    };
    txn.apply(&patch);

    assert_eq!(txn.amount, dec!(12.50));
    assert_eq!(txn.category, "Travel");
    assert_eq!(txn.kind, TransactionType::Expense);
    assert_eq!(txn.date, "2024-01-15");
    assert_eq!(txn.id, "txn-1");
    assert_eq!(txn.created_at, "2024-01-15T10:00:00.000Z");
}

#[test]
fn test_apply_patch_empty_notes_clears() {
    let mut txn = make_txn(dec!(10), TransactionType::Expense);
    txn.notes = Some("lunch".into());
    txn.apply(&TransactionPatch {
        notes: Some(String::new()),
        ..Default::default()
    });
    assert_eq!(txn.notes, None);
}

#[test]
fn test_patch_is_empty() {
    assert!(TransactionPatch::default().is_empty());
    let patch = TransactionPatch {
        date: Some("2024-02-01".into()),
        ..Default::default()
    };
    assert!(!patch.is_empty());
}

#[test]
fn test_patch_serializes_only_present_fields() {
    let patch = TransactionPatch {
        amount: Some(dec!(7.25)),
        kind: Some(TransactionType::Income),
        ..Default::default()
    };
    let json = serde_json::to_value(&patch).unwrap();
    assert_eq!(json, serde_json::json!({ "amount": 7.25, "type": "income" }));
}

// ── Serialization ─────────────────────────────────────────────

#[test]
fn test_transaction_json_shape() {
    let mut txn = make_txn(dec!(42.99), TransactionType::Expense);
    txn.notes = Some("gift".into());
    let json = serde_json::to_value(&txn).unwrap();
    assert_eq!(json["amount"], serde_json::json!(42.99));
    assert_eq!(json["type"], "expense");
    assert_eq!(json["createdAt"], "2024-01-15T10:00:00.000Z");
    assert_eq!(json["notes"], "gift");
}

#[test]
fn test_transaction_without_notes_omits_key() {
    let txn = make_txn(dec!(1), TransactionType::Income);
    let json = serde_json::to_value(&txn).unwrap();
    assert!(json.get("notes").is_none());
}

#[test]
fn test_transaction_amount_accepts_string() {
    let raw = r#"{"id":"a","amount":"19.90","type":"income","category":"Gift",
                 "date":"2024-03-01","createdAt":"2024-03-01T00:00:00.000Z"}"#;
    let txn: Transaction = serde_json::from_str(raw).unwrap();
    assert_eq!(txn.amount, dec!(19.90));
    assert_eq!(txn.notes, None);
}

#[test]
fn test_budget_spent_defaults_to_zero() {
    let raw = r#"{"id":"b","category":"Food & Dining","limit":250,"month":"2024-05"}"#;
    let budget: Budget = serde_json::from_str(raw).unwrap();
    assert_eq!(budget.limit, dec!(250));
    assert_eq!(budget.spent, Decimal::ZERO);
    assert!(budget.is_for("Food & Dining", "2024-05"));
    assert!(!budget.is_for("Food & Dining", "2024-06"));
}

#[test]
fn test_new_transaction_into_transaction() {
    let new = NewTransaction::new(
        dec!(3000),
        TransactionType::Income,
        "Salary".into(),
        "2024-01-31".into(),
    )
    .with_notes("january");
    let txn = new.into_transaction("id-9".into(), "2024-01-31T09:00:00.000Z".into());
    assert_eq!(txn.id, "id-9");
    assert_eq!(txn.notes.as_deref(), Some("january"));
    assert!(txn.is_income());
}

// ── Categories ────────────────────────────────────────────────

#[test]
fn test_suggested_categories() {
    assert_eq!(suggested(TransactionType::Expense), EXPENSE_CATEGORIES);
    assert_eq!(suggested(TransactionType::Income), INCOME_CATEGORIES);
    assert!(EXPENSE_CATEGORIES.contains(&"Food & Dining"));
    assert!(INCOME_CATEGORIES.contains(&"Salary"));
}

#[test]
fn test_normalize_category() {
    assert_eq!(normalize(TransactionType::Expense, "shopping"), "Shopping");
    assert_eq!(normalize(TransactionType::Expense, " food & dining "), "Food & Dining");
    assert_eq!(normalize(TransactionType::Income, "salary"), "Salary");
    // Free-form labels pass through untouched
    assert_eq!(normalize(TransactionType::Expense, "Pets"), "Pets");
}
