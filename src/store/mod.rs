//! Record persistence.
//!
//! Both backends implement [`RecordStore`]; the rest of the program only
//! ever sees a `Box<dyn RecordStore>` picked once at startup.

mod auth;
mod local;
mod remote;
mod schema;

pub(crate) use auth::{AuthClient, Session, SignUp};
pub(crate) use local::LocalStore;
pub(crate) use remote::RemoteStore;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{Budget, NewTransaction, Transaction, TransactionPatch};

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("malformed record data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no transaction with id {0}")]
    NotFound(String),
    #[error("not signed in or session expired (run `fintrack login`)")]
    Unauthorized,
    #[error("operation not permitted")]
    Forbidden,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("conflicting record: {0}")]
    Conflict(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0} is not supported by the {1} backend")]
    Unsupported(&'static str, &'static str),
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid store configuration: {0}")]
    Config(String),
}

/// Durable CRUD over transactions and budgets.
///
/// `list` returns records newest-first by creation time. `update` fails with
/// [`StoreError::NotFound`] for an unknown id; `delete` of an unknown id is
/// not an error. Budgets are keyed by `(category, month)`: `upsert_budget`
/// overwrites the limit of an existing pair instead of adding a duplicate.
pub(crate) trait RecordStore {
    /// Short backend name for status lines and logs.
    fn name(&self) -> &'static str;

    fn list(&self) -> Result<Vec<Transaction>, StoreError>;

    fn create(&self, new: NewTransaction) -> Result<Transaction, StoreError>;

    fn update(&self, id: &str, patch: &TransactionPatch) -> Result<(), StoreError>;

    fn delete(&self, id: &str) -> Result<(), StoreError>;

    fn list_budgets(&self) -> Result<Vec<Budget>, StoreError>;

    fn upsert_budget(
        &self,
        category: &str,
        limit: Decimal,
        month: &str,
    ) -> Result<Budget, StoreError>;

    /// Replace every stored record with the given sets (backup restore).
    fn replace_all(
        &self,
        transactions: &[Transaction],
        budgets: &[Budget],
    ) -> Result<(), StoreError>;
}

/// Log a failed store call before handing the error back to the caller.
pub(crate) fn logged<T>(
    backend: &'static str,
    op: &'static str,
    result: Result<T, StoreError>,
) -> Result<T, StoreError> {
    if let Err(ref e) = result {
        match e {
            StoreError::NotFound(_) => tracing::warn!(backend, op, error = %e, "record not found"),
            _ => tracing::error!(backend, op, error = %e, "store operation failed"),
        }
    }
    result
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g.
/// `2024-05-03T09:41:07.125Z`.
pub(crate) fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod local_tests;



#[cfg(test)]
mod stub_server;
