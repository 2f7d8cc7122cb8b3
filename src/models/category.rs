use super::TransactionType;

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food & Dining",
    "Shopping",
    "Entertainment",
    "Bills & Utilities",
    "Transportation",
    "Healthcare",
    "Education",
    "Travel",
    "Insurance",
    "Other",
];

pub const INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Freelance",
    "Investment",
    "Gift",
    "Bonus",
    "Other",
];

/// Recommended categories for a transaction type. Categories are free-form
/// labels; this list is a suggestion, not a constraint.
pub fn suggested(kind: TransactionType) -> &'static [&'static str] {
    match kind {
        TransactionType::Income => INCOME_CATEGORIES,
        TransactionType::Expense => EXPENSE_CATEGORIES,
    }
}

/// Resolve user input against the recommended list (case-insensitive).
/// Unknown labels are kept as typed.
pub fn normalize(kind: TransactionType, input: &str) -> String {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();
    suggested(kind)
        .iter()
        .find(|c| c.to_lowercase() == lower)
        .map(|c| (*c).to_string())
        .unwrap_or_else(|| trimmed.to_string())
}
