//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! Signing keys are pulled from the provider's `jwks_uri` and cached; an
//! unknown `kid` forces one re-fetch so key rotation at the provider is picked
//! up without a restart. Forced re-fetches are spaced at least
//! [`MIN_REFRESH_INTERVAL`] apart.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::AuthError;

/// Default lifetime of a fetched key set.
pub const DEFAULT_JWKS_TTL: Duration = Duration::from_secs(300);

/// Minimum age of the cached key set before an unknown `kid` may trigger a re-fetch.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// A JSON Web Key as defined in RFC 7517 (RSA subset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type (e.g., "RSA").
    pub kty: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Public key use ("sig" or "enc").
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// RSA modulus (base64url).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA exponent (base64url).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl Jwk {
    /// Build a verification key from the RSA components.
    pub fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        if self.kty != "RSA" {
            return Err(AuthError::InvalidKey(format!("unsupported key type {}", self.kty)));
        }
        let n = self
            .n
            .as_deref()
            .ok_or_else(|| AuthError::InvalidKey("missing modulus (n)".to_string()))?;
        let e = self
            .e
            .as_deref()
            .ok_or_else(|| AuthError::InvalidKey("missing exponent (e)".to_string()))?;

        DecodingKey::from_rsa_components(n, e).map_err(AuthError::from)
    }

    fn is_signing_key(&self) -> bool {
        self.key_use.as_deref().map_or(true, |u| u == "sig")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    #[must_use]
    pub fn find_key(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .iter()
            .find(|k| k.is_signing_key() && k.kid.as_deref() == Some(kid))
    }

    /// The only signing key, when the token carries no `kid`.
    #[must_use]
    pub fn sole_signing_key(&self) -> Option<&Jwk> {
        let mut signing = self.keys.iter().filter(|k| k.is_signing_key());
        match (signing.next(), signing.next()) {
            (Some(key), None) => Some(key),
            _ => None,
        }
    }
}

struct CachedJwks {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// JWKS client with caching.
#[derive(Clone)]
pub struct JwksClient {
    url: String,
    cache: Arc<RwLock<Option<CachedJwks>>>,
    http: reqwest::Client,
}

impl JwksClient {
    pub fn new(url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            cache: Arc::new(RwLock::new(None)),
            http,
        }
    }

    /// Fetch the key set from the endpoint and refresh the cache.
    pub async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchFailed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchFailed(format!("HTTP {}", response.status())));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchFailed(format!("invalid JSON: {e}")))?;

        tracing::debug!(url = %self.url, keys = jwks.keys.len(), "fetched JWKS");

        *self.cache.write().await = Some(CachedJwks {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });

        Ok(jwks)
    }

    /// Cached key set, fetching when empty or stale.
    pub async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < DEFAULT_JWKS_TTL {
                    return Ok(cached.jwks.clone());
                }
            }
        }

        self.fetch_jwks().await
    }

    /// Resolve the key for `kid`, re-fetching once on a miss unless the cached
    /// set is younger than [`MIN_REFRESH_INTERVAL`].
    ///
    /// With no `kid`, the provider must publish exactly one signing key.
    pub async fn get_key(&self, kid: Option<&str>) -> Result<Jwk, AuthError> {
        let lookup = |jwks: &JwkSet| match kid {
            Some(kid) => jwks.find_key(kid).cloned(),
            None => jwks.sole_signing_key().cloned(),
        };

        let not_found = || AuthError::KeyNotFound(kid.unwrap_or("<none>").to_string());

        if let Some(key) = lookup(&self.get_jwks().await?) {
            return Ok(key);
        }

        let recently_fetched = self
            .cache
            .read()
            .await
            .as_ref()
            .is_some_and(|cached| cached.fetched_at.elapsed() < MIN_REFRESH_INTERVAL);
        if recently_fetched {
            return Err(not_found());
        }

        tracing::debug!(kid = ?kid, "signing key not cached; re-fetching JWKS");
        lookup(&self.fetch_jwks().await?).ok_or_else(not_found)
    }
}

impl std::fmt::Debug for JwksClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksClient")
            .field("url", &self.url)
            .finish()
    }
}
