//! Email/password sign-in against the hosted project's auth API, and the
//! session file that lets later runs reuse (and renew) the sign-in.

use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::remote::{check, http_client, project_url};
use super::StoreError;
use crate::config::RemoteSettings;

/// Seconds before `expires_at` at which a token is treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A signed-in user's tokens as saved between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Session {
    pub(crate) access_token: String,
    pub(crate) refresh_token: String,
    pub(crate) user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) email: Option<String>,
    /// Unix seconds.
    pub(crate) expires_at: i64,
}

impl Session {
    pub(crate) fn expires_soon(&self, now: i64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.expires_at
    }

    /// Read a saved session. A missing file means nobody is signed in.
    pub(crate) fn load(path: &Path) -> Result<Option<Self>, StoreError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn save(&self, path: &Path) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Remove a saved session. Returns whether one existed.
    pub(crate) fn clear(path: &Path) -> Result<bool, StoreError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Outcome of a sign-up. Projects that require email confirmation answer
/// with the new user only, and no session is issued until the address is
/// confirmed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SignUp {
    SignedIn(Session),
    ConfirmationPending { email: Option<String> },
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.user.id,
            email: self.user.email,
            expires_at: self.expires_at.unwrap_or(now + self.expires_in),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Clone)]
pub(crate) struct AuthClient {
    base_url: Url,
    api_key: String,
    http: Client,
}

impl AuthClient {
    pub(crate) fn new(settings: &RemoteSettings) -> Result<Self, StoreError> {
        let base_url = project_url(settings)?
            .join("auth/v1/")
            .map_err(|e| StoreError::Config(format!("invalid remote.url: {e}")))?;
        Ok(Self {
            base_url,
            api_key: settings.api_key.clone(),
            http: http_client(settings)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::Config(format!("invalid remote.url: {e}")))
    }

    fn token_grant<T: Serialize>(
        &self,
        grant_type: &str,
        body: &T,
        now: i64,
    ) -> Result<Session, StoreError> {
        let res = self
            .http
            .post(self.endpoint("token")?)
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.api_key)
            .json(body)
            .send()?;
        let token: TokenResponse = check(res)?.json()?;
        Ok(token.into_session(now))
    }

    pub(crate) fn sign_in(
        &self,
        email: &str,
        password: &str,
        now: i64,
    ) -> Result<Session, StoreError> {
        let session = self.token_grant("password", &Credentials { email, password }, now)?;
        tracing::info!(user_id = %session.user_id, "signed in");
        Ok(session)
    }

    pub(crate) fn sign_up(
        &self,
        email: &str,
        password: &str,
        now: i64,
    ) -> Result<SignUp, StoreError> {
        let res = self
            .http
            .post(self.endpoint("signup")?)
            .header("apikey", &self.api_key)
            .json(&Credentials { email, password })
            .send()?;
        let outcome = match check(res)?.json::<SignUpResponse>()? {
            SignUpResponse::Session(token) => SignUp::SignedIn(token.into_session(now)),
            SignUpResponse::User(user) => SignUp::ConfirmationPending { email: user.email },
        };
        tracing::info!(confirmed = matches!(outcome, SignUp::SignedIn(_)), "signed up");
        Ok(outcome)
    }

    pub(crate) fn refresh(&self, refresh_token: &str, now: i64) -> Result<Session, StoreError> {
        self.token_grant("refresh_token", &RefreshRequest { refresh_token }, now)
    }

    /// Revoke the session server-side.
    pub(crate) fn sign_out(&self, access_token: &str) -> Result<(), StoreError> {
        let res = self
            .http
            .post(self.endpoint("logout")?)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()?;
        check(res)?;
        Ok(())
    }
}
