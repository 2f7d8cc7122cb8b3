use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub category: String,
    #[serde(with = "super::amount")]
    pub limit: Decimal,
    /// Stored for payload compatibility only. Spend is always recomputed
    /// from transactions, see `engine::compute_budget_progress`.
    #[serde(default, with = "super::amount")]
    pub spent: Decimal,
    /// Format: "YYYY-MM"
    pub month: String,
}

impl Budget {
    pub fn new(id: String, category: String, limit: Decimal, month: String) -> Self {
        Self {
            id,
            category,
            limit,
            spent: Decimal::ZERO,
            month,
        }
    }

    /// True when this budget is the one keyed by `(category, month)`.
    pub fn is_for(&self, category: &str, month: &str) -> bool {
        self.category == category && self.month == month
    }
}
