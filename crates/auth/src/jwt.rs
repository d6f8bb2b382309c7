//! Bearer-token and id-token validation.
//!
//! `JwtValidator` is the seam the HTTP boundary depends on. Production uses
//! [`JwksJwtValidator`] (RS256 keys published by the identity provider); the
//! shared-secret [`Hs256JwtValidator`] exists for local development and tests.
//! Id tokens from the login flow are always checked against the provider's
//! keys, with the audience pinned to the client id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::claims::{validate_claims, JwtClaims};
use crate::error::AuthError;
use crate::jwks::JwksClient;

#[async_trait]
pub trait JwtValidator: Send + Sync {
    /// Verify signature and claims of `token` as of `now`.
    async fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError>;
}

fn decode_with(
    token: &str,
    key: &DecodingKey,
    alg: Algorithm,
    issuer: Option<&str>,
    audience: Option<&str>,
    now: DateTime<Utc>,
) -> Result<JwtClaims, AuthError> {
    let mut validation = Validation::new(alg);
    // Time checks run in `validate_claims` against the caller's clock.
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.leeway = 0;
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
    }
    match audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    let data = jsonwebtoken::decode::<JwtClaims>(token, key, &validation)?;
    validate_claims(&data.claims, now)?;
    Ok(data.claims)
}

/// HMAC-SHA256 validator with a shared secret.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    issuer: Option<String>,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            issuer: None,
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}

#[async_trait]
impl JwtValidator for Hs256JwtValidator {
    async fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError> {
        decode_with(token, &self.key, Algorithm::HS256, self.issuer.as_deref(), None, now)
    }
}

/// RSA validator backed by the provider's JWKS endpoint.
#[derive(Debug, Clone)]
pub struct JwksJwtValidator {
    jwks: JwksClient,
    issuer: Option<String>,
    audience: Option<String>,
}

impl JwksJwtValidator {
    pub fn new(jwks: JwksClient) -> Self {
        Self {
            jwks,
            issuer: None,
            audience: None,
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require `aud` to contain `audience` (the client id, for id tokens).
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

#[async_trait]
impl JwtValidator for JwksJwtValidator {
    async fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError> {
        let header = jsonwebtoken::decode_header(token)?;

        // Only asymmetric algorithms: an HS* header would let a caller sign
        // with the public key as the HMAC secret.
        if !matches!(header.alg, Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512) {
            return Err(AuthError::InvalidAlgorithm(format!("{:?}", header.alg)));
        }

        let jwk = self.jwks.get_key(header.kid.as_deref()).await?;
        let key = jwk.decoding_key()?;

        decode_with(
            token,
            &key,
            header.alg,
            self.issuer.as_deref(),
            self.audience.as_deref(),
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::TokenValidationError;
    use crate::jwks::{Jwk, JwkSet};
    use axum::{routing::get, Json, Router};
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    const SECRET: &str = "test-secret";
    const TEST_RSA_PEM: &[u8] = include_bytes!("../testdata/test_rsa.pem");
    const TEST_RSA_N: &str = "vbnWD0sl_oUt3qujMVBEgG2OmGqeBYcVZWb2wvw7i-lJW0699tyVOEtFrYG3PHstWHbWdxPEAixJkbwHxdggQ3MsEy64sA_7ZhIPXRYRN-quxLA9LVY_DUYw7Yp0PkSbGH1csK7sqAqkgsgP6CTyIHxj5F2uKvzEYJvcrjSq4Lwp5pAmMDIjHP_9Bwhj610TbfSSsSqrb_b6tzpsw0urJo8zKXJ-GGDIJyDMx6Qu3YVxne4Q0m7Y_5gMnyltxlL4yI1dkXDwOObAeSipN48FQFg-E-uQypWouOqDGcihn-q1CeUVDxtvYkk-ywLteZCT9gA17lYtHIDGvDWjzr6ocQ";

    fn claims(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims::new("user-1", now, now + Duration::minutes(10))
            .with_issuer("http://idp.test/realms/demo")
            .with_claim("email", "ana@example.com")
    }

    fn hs256(claims: &JwtClaims, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn rs256(claims: &JwtClaims, kid: &str) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        jsonwebtoken::encode(&header, claims, &EncodingKey::from_rsa_pem(TEST_RSA_PEM).unwrap()).unwrap()
    }

    async fn serve_jwks() -> String {
        let jwks = JwkSet {
            keys: vec![Jwk {
                kty: "RSA".to_string(),
                kid: Some("test-key".to_string()),
                key_use: Some("sig".to_string()),
                alg: Some("RS256".to_string()),
                n: Some(TEST_RSA_N.to_string()),
                e: Some("AQAB".to_string()),
            }],
        };
        let app = Router::new().route(
            "/certs",
            get(move || {
                let jwks = jwks.clone();
                async move { Json(jwks) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/certs")
    }

    #[tokio::test]
    async fn hs256_accepts_valid_token() {
        let now = Utc::now();
        let token = hs256(&claims(now), SECRET);

        let validated = Hs256JwtValidator::new(SECRET).validate(&token, now).await.unwrap();

        assert_eq!(validated.sub, "user-1");
        assert_eq!(validated.claim_str("email"), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn hs256_rejects_wrong_secret() {
        let now = Utc::now();
        let token = hs256(&claims(now), "other-secret");

        let err = Hs256JwtValidator::new(SECRET).validate(&token, now).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[tokio::test]
    async fn hs256_rejects_expired_token() {
        let issued = Utc::now() - Duration::hours(2);
        let token = hs256(&claims(issued), SECRET);

        let err = Hs256JwtValidator::new(SECRET)
            .validate(&token, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Claims(TokenValidationError::Expired)));
    }

    #[tokio::test]
    async fn issuer_is_checked_when_configured() {
        let now = Utc::now();
        let token = hs256(&claims(now), SECRET);

        let validator = Hs256JwtValidator::new(SECRET).with_issuer("http://elsewhere/realms/x");
        let err = validator.validate(&token, now).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn malformed_token_is_rejected() {
        let err = Hs256JwtValidator::new(SECRET)
            .validate("not-a-jwt", Utc::now())
            .await
            .unwrap_err();
        assert!(err.is_token_error());
    }

    #[tokio::test]
    async fn jwks_validator_accepts_provider_signed_token() {
        let url = serve_jwks().await;
        let validator = JwksJwtValidator::new(JwksClient::new(url, reqwest::Client::new()))
            .with_issuer("http://idp.test/realms/demo");
        let now = Utc::now();

        let validated = validator.validate(&rs256(&claims(now), "test-key"), now).await.unwrap();

        assert_eq!(validated.sub, "user-1");
    }

    #[tokio::test]
    async fn jwks_validator_rejects_unknown_kid() {
        let url = serve_jwks().await;
        let validator = JwksJwtValidator::new(JwksClient::new(url, reqwest::Client::new()));
        let now = Utc::now();

        let err = validator
            .validate(&rs256(&claims(now), "rotated-away"), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::KeyNotFound(kid) if kid == "rotated-away"));
    }

    #[tokio::test]
    async fn audience_is_checked_when_configured() {
        let url = serve_jwks().await;
        let jwks = JwksClient::new(url, reqwest::Client::new());
        let now = Utc::now();
        let token = rs256(&claims(now).with_claim("aud", "employee-api"), "test-key");

        let ours = JwksJwtValidator::new(jwks.clone()).with_audience("employee-api");
        assert_eq!(ours.validate(&token, now).await.unwrap().sub, "user-1");

        let theirs = JwksJwtValidator::new(jwks.clone()).with_audience("other-client");
        assert!(theirs.validate(&token, now).await.unwrap_err().is_token_error());

        let no_aud = rs256(&claims(now), "test-key");
        let err = JwksJwtValidator::new(jwks)
            .with_audience("employee-api")
            .validate(&no_aud, now)
            .await
            .unwrap_err();
        assert!(err.is_token_error());
    }

    #[tokio::test]
    async fn jwks_validator_rejects_symmetric_algorithms() {
        let url = serve_jwks().await;
        let validator = JwksJwtValidator::new(JwksClient::new(url, reqwest::Client::new()));
        let now = Utc::now();

        let err = validator.validate(&hs256(&claims(now), SECRET), now).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidAlgorithm(_)));
    }
}
