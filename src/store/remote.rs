use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::auth::{AuthClient, Session};
use super::{logged, RecordStore, StoreError};
use crate::config::RemoteSettings;
use crate::models::{Budget, NewTransaction, Transaction, TransactionPatch, TransactionType};

const BACKEND: &str = "remote";

/// Hosted table store reached over the PostgREST protocol.
///
/// Every request carries the project API key and the user's access token;
/// every write carries the configured `user_id`, which row-level security
/// on the server uses to scope reads to the signed-in user.
///
/// A store opened from a saved [`Session`] renews its access token once when
/// the server answers 401 and retries the request.
#[derive(Debug)]
pub(crate) struct RemoteStore {
    base_url: Url,
    api_key: String,
    access_token: Mutex<String>,
    user_id: String,
    http: Client,
    renewal: Option<Renewal>,
}

#[derive(Debug)]
struct Renewal {
    auth: AuthClient,
    session: Mutex<Session>,
    path: PathBuf,
}

/// Error body of both the table API (`message`) and the auth API
/// (`msg` or `error_description`).
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(alias = "msg", alias = "error_description")]
    message: String,
}

/// Project root URL from settings, with a trailing slash so joins append.
pub(super) fn project_url(settings: &RemoteSettings) -> Result<Url, StoreError> {
    if settings.url.trim().is_empty() {
        return Err(StoreError::Config("remote.url is not set".into()));
    }
    let mut base = settings.url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|e| StoreError::Config(format!("invalid remote.url: {e}")))
}

pub(super) fn http_client(settings: &RemoteSettings) -> Result<Client, StoreError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?)
}

/// Turn a non-2xx response into the matching error.
pub(super) fn check(res: Response) -> Result<Response, StoreError> {
    if res.status().is_success() {
        return Ok(res);
    }

    let status = res.status();
    let body = res
        .json::<ErrorResponse>()
        .map(|err| err.message)
        .unwrap_or_else(|_| "unknown error".to_string());

    let err = match status.as_u16() {
        400 | 422 => StoreError::Rejected(body),
        401 => StoreError::Unauthorized,
        403 => StoreError::Forbidden,
        404 => StoreError::NotFound(body),
        409 => StoreError::Conflict(body),
        _ => StoreError::Server(format!("{status}: {body}")),
    };
    Err(err)
}

/// Row ids may be UUID strings or integer keys depending on the table.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct TransactionRow {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(with = "crate::models::amount")]
    amount: Decimal,
    #[serde(rename = "type")]
    kind: TransactionType,
    category: String,
    date: String,
    #[serde(default)]
    notes: Option<String>,
    created_at: String,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            amount: row.amount,
            kind: row.kind,
            category: row.category,
            date: row.date,
            notes: row.notes.filter(|n| !n.is_empty()),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct TransactionInsert<'a> {
    #[serde(with = "crate::models::amount")]
    amount: Decimal,
    #[serde(rename = "type")]
    kind: TransactionType,
    category: &'a str,
    date: &'a str,
    notes: Option<&'a str>,
    user_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct BudgetRow {
    #[serde(deserialize_with = "id_string")]
    id: String,
    category: String,
    #[serde(with = "crate::models::amount")]
    limit_amount: Decimal,
    month: String,
}

impl From<BudgetRow> for Budget {
    fn from(row: BudgetRow) -> Self {
        Budget::new(row.id, row.category, row.limit_amount, row.month)
    }
}

#[derive(Debug, Serialize)]
struct BudgetUpsert<'a> {
    category: &'a str,
    #[serde(with = "crate::models::amount")]
    limit_amount: Decimal,
    month: &'a str,
    user_id: &'a str,
}

impl RemoteStore {
    pub(crate) fn new(settings: &RemoteSettings) -> Result<Self, StoreError> {
        let base_url = project_url(settings)?
            .join("rest/v1/")
            .map_err(|e| StoreError::Config(format!("invalid remote.url: {e}")))?;
        if settings.user_id.trim().is_empty() {
            return Err(StoreError::Config("remote.user_id is not set".into()));
        }

        Ok(Self {
            base_url,
            api_key: settings.api_key.clone(),
            access_token: Mutex::new(settings.access_token.clone()),
            user_id: settings.user_id.clone(),
            http: http_client(settings)?,
            renewal: None,
        })
    }

    /// Open the store as the user of a saved session. The session's user id
    /// replaces any configured one, and a token close to expiry is renewed
    /// up front.
    pub(crate) fn signed_in(
        settings: &RemoteSettings,
        session: Session,
        session_path: PathBuf,
        now: i64,
    ) -> Result<Self, StoreError> {
        let settings = RemoteSettings {
            access_token: session.access_token.clone(),
            user_id: session.user_id.clone(),
            ..settings.clone()
        };
        let expiring = session.expires_soon(now);
        let mut store = Self::new(&settings)?;
        store.renewal = Some(Renewal {
            auth: AuthClient::new(&settings)?,
            session: Mutex::new(session),
            path: session_path,
        });
        if expiring {
            if let Err(e) = store.renew(now) {
                tracing::warn!(error = %e, "could not renew expiring session");
            }
        }
        Ok(store)
    }

    fn endpoint(&self, table: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(table)
            .map_err(|e| StoreError::Config(format!("invalid remote.url: {e}")))
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header("apikey", &self.api_key);
        let token = self
            .access_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if token.is_empty() {
            req
        } else {
            req.bearer_auth(token)
        }
    }

    /// Exchange the refresh token for a new session and persist it. Returns
    /// false when the store has no session to renew.
    fn renew(&self, now: i64) -> Result<bool, StoreError> {
        let Some(renewal) = &self.renewal else {
            return Ok(false);
        };
        let mut session = renewal
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let fresh = renewal.auth.refresh(&session.refresh_token, now)?;
        fresh.save(&renewal.path)?;
        *self
            .access_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = fresh.access_token.clone();
        *session = fresh;
        tracing::info!(backend = BACKEND, "renewed session");
        Ok(true)
    }

    /// Run `op`, renewing the session and retrying once on 401.
    fn with_renewal<T>(
        &self,
        op: impl Fn() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        match op() {
            Err(StoreError::Unauthorized) => match self.renew(chrono::Utc::now().timestamp()) {
                Ok(true) => op(),
                Ok(false) => Err(StoreError::Unauthorized),
                Err(e) => {
                    tracing::warn!(backend = BACKEND, error = %e, "session renewal failed");
                    Err(StoreError::Unauthorized)
                }
            },
            result => result,
        }
    }

    fn list_inner(&self) -> Result<Vec<Transaction>, StoreError> {
        let res = self
            .authorized(self.http.get(self.endpoint("transactions")?))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()?;
        let rows: Vec<TransactionRow> = check(res)?.json()?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    fn create_inner(&self, new: &NewTransaction) -> Result<Transaction, StoreError> {
        let payload = TransactionInsert {
            amount: new.amount,
            kind: new.kind,
            category: &new.category,
            date: &new.date,
            notes: new.notes.as_deref(),
            user_id: &self.user_id,
        };
        let res = self
            .authorized(self.http.post(self.endpoint("transactions")?))
            .header("Prefer", "return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(&payload)
            .send()?;
        let row: TransactionRow = check(res)?.json()?;
        Ok(row.into())
    }

    fn update_inner(&self, id: &str, patch: &TransactionPatch) -> Result<(), StoreError> {
        let res = self
            .authorized(self.http.patch(self.endpoint("transactions")?))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()?;
        let rows: Vec<TransactionRow> = check(res)?.json()?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete_inner(&self, id: &str) -> Result<(), StoreError> {
        let res = self
            .authorized(self.http.delete(self.endpoint("transactions")?))
            .query(&[("id", format!("eq.{id}"))])
            .send()?;
        check(res)?;
        Ok(())
    }

    fn list_budgets_inner(&self) -> Result<Vec<Budget>, StoreError> {
        let res = self
            .authorized(self.http.get(self.endpoint("budgets")?))
            .query(&[("select", "*")])
            .send()?;
        let rows: Vec<BudgetRow> = check(res)?.json()?;
        Ok(rows.into_iter().map(Budget::from).collect())
    }

    fn upsert_budget_inner(
        &self,
        category: &str,
        limit: Decimal,
        month: &str,
    ) -> Result<Budget, StoreError> {
        let payload = BudgetUpsert {
            category,
            limit_amount: limit,
            month,
            user_id: &self.user_id,
        };
        let res = self
            .authorized(self.http.post(self.endpoint("budgets")?))
            .query(&[("on_conflict", "user_id,category,month")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(&payload)
            .send()?;
        let row: BudgetRow = check(res)?.json()?;
        Ok(row.into())
    }
}

impl RecordStore for RemoteStore {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn list(&self) -> Result<Vec<Transaction>, StoreError> {
        logged(BACKEND, "list", self.with_renewal(|| self.list_inner()))
    }

    fn create(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        logged(BACKEND, "create", self.with_renewal(|| self.create_inner(&new)))
    }

    fn update(&self, id: &str, patch: &TransactionPatch) -> Result<(), StoreError> {
        logged(BACKEND, "update", self.with_renewal(|| self.update_inner(id, patch)))
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        logged(BACKEND, "delete", self.with_renewal(|| self.delete_inner(id)))
    }

    fn list_budgets(&self) -> Result<Vec<Budget>, StoreError> {
        logged(
            BACKEND,
            "list_budgets",
            self.with_renewal(|| self.list_budgets_inner()),
        )
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
            self.with_renewal(|| self.upsert_budget_inner(category, limit, month)),
        )
    }

    fn replace_all(
        &self,
        _transactions: &[Transaction],
        _budgets: &[Budget],
    ) -> Result<(), StoreError> {
        logged(
            BACKEND,
            "replace_all",
            Err(StoreError::Unsupported("replacing all records", BACKEND)),
        )
    }
}
