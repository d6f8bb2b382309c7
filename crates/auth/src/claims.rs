use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Tolerated clock difference (seconds) between this service and the identity provider.
pub const CLOCK_SKEW_SECS: i64 = 60;

/// JWT claims model (transport-agnostic).
///
/// The registered claims the boundary checks are typed; every other claim the
/// provider put in the token (name, email, realm roles, ...) is kept in
/// `extra` so it can be handed back to callers untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / principal identifier.
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Expiration timestamp (seconds since epoch on the wire).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,

    /// Issued-at timestamp.
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub iat: Option<DateTime<Utc>>,

    /// Not-before timestamp.
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub nbf: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JwtClaims {
    /// Minimal claim set; mostly useful for minting tokens in tests and dev.
    pub fn new(sub: impl Into<String>, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: sub.into(),
            iss: None,
            exp: expires_at,
            iat: Some(issued_at),
            nbf: None,
            extra: Map::new(),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// String-valued claim lookup in the non-registered claims.
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(Value::as_str)
    }

    /// The full claim set as a JSON object, registered claims included.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time-based claims against `now`.
///
/// Signature verification happens before this, in the [`crate::JwtValidator`]
/// implementations. `now` is passed in so callers and tests control the clock.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let skew = Duration::seconds(CLOCK_SKEW_SECS);
    if let Some(iat) = claims.iat {
        if claims.exp <= iat {
            return Err(TokenValidationError::InvalidTimeWindow);
        }
        if now + skew < iat {
            return Err(TokenValidationError::NotYetValid);
        }
    }
    if let Some(nbf) = claims.nbf {
        if now + skew < nbf {
            return Err(TokenValidationError::NotYetValid);
        }
    }
    if now - skew >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims_at(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims::new("user-1", now, now + Duration::minutes(5))
    }

    #[test]
    fn fresh_token_is_valid() {
        let now = Utc::now();
        assert_eq!(validate_claims(&claims_at(now), now), Ok(()));
    }

    #[test]
    fn expired_token_is_rejected_after_skew() {
        let issued = Utc::now() - Duration::hours(1);
        let claims = claims_at(issued);

        assert_eq!(
            validate_claims(&claims, issued + Duration::minutes(10)),
            Err(TokenValidationError::Expired)
        );
        // Within the tolerated skew the token still passes.
        assert_eq!(validate_claims(&claims, issued + Duration::minutes(5) + Duration::seconds(30)), Ok(()));
    }

    #[test]
    fn future_issued_token_is_not_yet_valid() {
        let now = Utc::now();
        let claims = claims_at(now + Duration::minutes(3));
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn not_before_is_enforced() {
        let now = Utc::now();
        let mut claims = claims_at(now);
        claims.nbf = Some(now + Duration::minutes(2));
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let claims = JwtClaims::new("user-1", now, now - Duration::seconds(1));
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::InvalidTimeWindow));
    }

    #[test]
    fn wire_format_uses_epoch_seconds_and_keeps_extra_claims() {
        let raw = json!({
            "sub": "f3c1",
            "iss": "http://localhost:8080/realms/demo",
            "exp": 1_900_000_000,
            "iat": 1_899_999_700,
            "email": "ana@example.com",
            "realm_access": { "roles": ["user"] }
        });

        let claims: JwtClaims = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(claims.sub, "f3c1");
        assert_eq!(claims.exp.timestamp(), 1_900_000_000);
        assert_eq!(claims.claim_str("email"), Some("ana@example.com"));
        assert_eq!(Value::Object(claims.to_map()), raw);
    }
}
