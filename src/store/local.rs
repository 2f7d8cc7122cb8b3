use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use super::schema::{self, BUDGETS_KEY, TRANSACTIONS_KEY};
use super::{logged, timestamp_now, RecordStore, StoreError};
use crate::engine;
use crate::models::{Budget, NewTransaction, Transaction, TransactionPatch};

const BACKEND: &str = "local";

/// Device-local storage: a SQLite file holding one JSON document per key.
pub(crate) struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    pub(crate) fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self { conn };
        store.migrate()?;
        tracing::debug!(path = %path.display(), "opened local store");
        Ok(store)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    // ── Raw key access ────────────────────────────────────────

    pub(crate) fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub(crate) fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, timestamp_now()],
        )?;
        Ok(())
    }

    /// Read a JSON array stored under `key`. A missing key or a value that
    /// does not parse both read as an empty list.
    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::warn!(key, error = %e, "stored data is corrupt, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    fn write_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items)?;
        self.set_raw(key, &raw)
    }

    // ── Operations ────────────────────────────────────────────

    fn list_inner(&self) -> Result<Vec<Transaction>, StoreError> {
        let mut txns: Vec<Transaction> = self.read_list(TRANSACTIONS_KEY)?;
        // Stored in insertion order; reversing first keeps same-timestamp
        // records newest-first after the stable sort.
        txns.reverse();
        engine::sort_newest_first(&mut txns);
        Ok(txns)
    }

    fn create_inner(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let mut txns: Vec<Transaction> = self.read_list(TRANSACTIONS_KEY)?;
        let txn = new.into_transaction(uuid::Uuid::new_v4().to_string(), timestamp_now());
        txns.push(txn.clone());
        self.write_list(TRANSACTIONS_KEY, &txns)?;
        Ok(txn)
    }

    fn update_inner(&self, id: &str, patch: &TransactionPatch) -> Result<(), StoreError> {
        let mut txns: Vec<Transaction> = self.read_list(TRANSACTIONS_KEY)?;
        let txn = txns
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        txn.apply(patch);
        self.write_list(TRANSACTIONS_KEY, &txns)
    }

    fn delete_inner(&self, id: &str) -> Result<(), StoreError> {
        let mut txns: Vec<Transaction> = self.read_list(TRANSACTIONS_KEY)?;
        let before = txns.len();
        txns.retain(|t| t.id != id);
        if txns.len() != before {
            self.write_list(TRANSACTIONS_KEY, &txns)?;
        }
        Ok(())
    }

    fn upsert_budget_inner(
        &self,
        category: &str,
        limit: Decimal,
        month: &str,
    ) -> Result<Budget, StoreError> {
        let mut budgets: Vec<Budget> = self.read_list(BUDGETS_KEY)?;
        let budget = match budgets.iter_mut().find(|b| b.is_for(category, month)) {
            Some(existing) => {
                existing.limit = limit;
                existing.clone()
            }
            None => {
                let budget = Budget::new(
                    uuid::Uuid::new_v4().to_string(),
                    category.to_string(),
                    limit,
                    month.to_string(),
                );
                budgets.push(budget.clone());
                budget
            }
        };
        self.write_list(BUDGETS_KEY, &budgets)?;
        Ok(budget)
    }

    fn replace_all_inner(
        &self,
        transactions: &[Transaction],
        budgets: &[Budget],
    ) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        self.write_list(TRANSACTIONS_KEY, transactions)?;
        self.write_list(BUDGETS_KEY, budgets)?;
        tx.commit()?;
        Ok(())
    }
}

impl RecordStore for LocalStore {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn list(&self) -> Result<Vec<Transaction>, StoreError> {
        logged(BACKEND, "list", self.list_inner())
    }

    fn create(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        logged(BACKEND, "create", self.create_inner(new))
    }

    fn update(&self, id: &str, patch: &TransactionPatch) -> Result<(), StoreError> {
        logged(BACKEND, "update", self.update_inner(id, patch))
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        logged(BACKEND, "delete", self.delete_inner(id))
    }

    fn list_budgets(&self) -> Result<Vec<Budget>, StoreError> {
        logged(BACKEND, "list_budgets", self.read_list(BUDGETS_KEY))
    }

    fn upsert_budget(
        &self,
        category: &str,
        limit: Decimal,
        month: &str,
    ) -> Result<Budget, StoreError> {
        logged(
            BACKEND,
            "upsert_budget",
            self.upsert_budget_inner(category, limit, month),
        )
    }

    fn replace_all(
        &self,
        transactions: &[Transaction],
        budgets: &[Budget],
    ) -> Result<(), StoreError> {
        logged(
            BACKEND,
            "replace_all",
            self.replace_all_inner(transactions, budgets),
        )
    }
}
