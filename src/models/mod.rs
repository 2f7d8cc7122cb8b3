pub(crate) mod amount;
mod budget;
pub(crate) mod category;
mod transaction;

pub use budget::Budget;
pub use transaction::{NewTransaction, Transaction, TransactionPatch, TransactionType, MAX_AMOUNT};

#[cfg(test)]
mod tests;
