//! Login-flow state: pending authorization requests, browser sessions, and
//! the authorized clients (tokens) obtained for each principal.
//!
//! Everything is process-local and lost on restart.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// How long a started login may take before its `state` is no longer accepted.
pub const PENDING_AUTHORIZATION_TTL_SECS: i64 = 600;

/// Lifetime of a browser session after login.
pub const SESSION_TTL_SECS: i64 = 1800;

fn random_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Tokens and identity negotiated for a principal at one registration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTokens {
    pub access_token: String,
    pub id_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Identity claims (id token, or userinfo when no id token was issued).
    pub claims: Map<String, Value>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no authorized client for principal {principal} at registration {registration}")]
    NoAuthorizedClient {
        registration: String,
        principal: String,
    },
}

/// Authorized clients keyed by (registration id, principal name).
#[derive(Debug, Default)]
pub struct AuthorizedClientStore {
    inner: RwLock<HashMap<(String, String), SessionTokens>>,
}

impl AuthorizedClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn save(&self, registration_id: &str, principal_name: &str, tokens: SessionTokens) {
        self.inner
            .write()
            .await
            .insert((registration_id.to_string(), principal_name.to_string()), tokens);
    }

    /// Tokens for the principal's login at `registration_id`.
    pub async fn resolve_session(
        &self,
        registration_id: &str,
        principal_name: &str,
    ) -> Result<SessionTokens, SessionError> {
        self.inner
            .read()
            .await
            .get(&(registration_id.to_string(), principal_name.to_string()))
            .cloned()
            .ok_or_else(|| SessionError::NoAuthorizedClient {
                registration: registration_id.to_string(),
                principal: principal_name.to_string(),
            })
    }

    pub async fn remove(&self, registration_id: &str, principal_name: &str) -> Option<SessionTokens> {
        self.inner
            .write()
            .await
            .remove(&(registration_id.to_string(), principal_name.to_string()))
    }
}

/// A login the browser started but has not finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    pub registration_id: String,
    pub state: String,
    pub nonce: String,
    pub created_at: DateTime<Utc>,
}

impl PendingAuthorization {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= Duration::seconds(PENDING_AUTHORIZATION_TTL_SECS)
    }
}

/// An authenticated browser session.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSession {
    pub id: String,
    pub registration_id: String,
    pub principal_name: String,
    pub claims: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl LoginSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= Duration::seconds(SESSION_TTL_SECS)
    }
}

/// Browser-facing session registry; ids are handed out as cookie values.
///
/// Expired entries are swept out whenever a new one is inserted, so abandoned
/// logins and sessions never accumulate past one TTL.
#[derive(Debug, Default)]
pub struct SessionStore {
    pending: RwLock<HashMap<String, PendingAuthorization>>,
    sessions: RwLock<HashMap<String, LoginSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a started login; returns the binding id for the browser cookie.
    pub async fn begin_authorization(&self, pending: PendingAuthorization) -> String {
        let binding = random_id();
        let now = pending.created_at;
        let mut map = self.pending.write().await;
        map.retain(|_, p| !p.is_expired(now));
        map.insert(binding.clone(), pending);
        binding
    }

    /// Consume the pending login bound to `binding` if `state` matches.
    ///
    /// The entry is removed whether or not the state matches, so a state value
    /// can be presented at most once.
    pub async fn complete_authorization(
        &self,
        binding: &str,
        state: &str,
        now: DateTime<Utc>,
    ) -> Option<PendingAuthorization> {
        let pending = self.pending.write().await.remove(binding)?;
        (!pending.is_expired(now) && pending.state == state).then_some(pending)
    }

    pub async fn create_session(
        &self,
        registration_id: &str,
        principal_name: &str,
        claims: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> LoginSession {
        let session = LoginSession {
            id: random_id(),
            registration_id: registration_id.to_string(),
            principal_name: principal_name.to_string(),
            claims,
            created_at: now,
        };
        let mut map = self.sessions.write().await;
        map.retain(|_, s| !s.is_expired(now));
        map.insert(session.id.clone(), session.clone());
        session
    }

    /// Live session for `id`; expired sessions are dropped on lookup.
    pub async fn session(&self, id: &str, now: DateTime<Utc>) -> Option<LoginSession> {
        let found = self.sessions.read().await.get(id).cloned()?;
        if found.is_expired(now) {
            self.sessions.write().await.remove(id);
            return None;
        }
        Some(found)
    }

    pub async fn end_session(&self, id: &str) -> Option<LoginSession> {
        self.sessions.write().await.remove(id)
    }
}
