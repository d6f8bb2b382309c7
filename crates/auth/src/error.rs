//! Error types for authentication operations.

use thiserror::Error;

use crate::claims::TokenValidationError;

/// Authentication error.
///
/// Every variant is terminal for the request that produced it; nothing in
/// this crate retries on error.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // JWT errors
    /// Token failed the claim time-window checks.
    #[error("token rejected: {0}")]
    Claims(#[from] TokenValidationError),

    #[error("invalid token signature")]
    InvalidSignature,

    /// Token format is malformed or a claim failed verification.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("unsupported algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("missing required claim: {0}")]
    MissingClaim(String),

    // JWKS errors
    #[error("JWKS fetch failed: {0}")]
    JwksFetchFailed(String),

    /// Key with the given kid is not published by the provider.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    // OAuth2 / OIDC client errors
    #[error("provider discovery failed for {issuer}: {message}")]
    DiscoveryFailed { issuer: String, message: String },

    #[error("invalid client configuration: {0}")]
    InvalidConfiguration(String),

    /// The authorization server answered a code exchange with an error.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("userinfo request failed: {0}")]
    UserInfo(String),
}

impl AuthError {
    /// True for failures caused by the presented token itself (as opposed to
    /// the provider being unreachable or misconfigured).
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            AuthError::Claims(_)
                | AuthError::InvalidSignature
                | AuthError::InvalidToken(_)
                | AuthError::InvalidAlgorithm(_)
                | AuthError::MissingClaim(_)
                | AuthError::KeyNotFound(_)
        )
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, AuthError::Claims(TokenValidationError::Expired))
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::Claims(TokenValidationError::Expired),
            ErrorKind::ImmatureSignature => AuthError::Claims(TokenValidationError::NotYetValid),
            ErrorKind::InvalidAlgorithm => AuthError::InvalidAlgorithm("algorithm not allowed".to_string()),
            ErrorKind::MissingRequiredClaim(claim) => AuthError::MissingClaim(claim.clone()),
            ErrorKind::InvalidIssuer => AuthError::InvalidToken("issuer mismatch".to_string()),
            ErrorKind::InvalidAudience => AuthError::InvalidToken("audience mismatch".to_string()),
            ErrorKind::InvalidRsaKey(msg) => AuthError::InvalidKey(msg.clone()),
            ErrorKind::InvalidKeyFormat => AuthError::InvalidKey("invalid key format".to_string()),
            other => AuthError::InvalidToken(format!("{other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(AuthError::InvalidSignature.to_string(), "invalid token signature");
        assert_eq!(
            AuthError::MissingClaim("exp".to_string()).to_string(),
            "missing required claim: exp"
        );
        assert_eq!(
            AuthError::Claims(TokenValidationError::Expired).to_string(),
            "token rejected: token has expired"
        );
    }

    #[test]
    fn token_errors_are_distinguished_from_provider_errors() {
        assert!(AuthError::InvalidSignature.is_token_error());
        assert!(AuthError::KeyNotFound("k".to_string()).is_token_error());
        assert!(!AuthError::JwksFetchFailed("down".to_string()).is_token_error());
        assert!(!AuthError::TokenExchange("bad code".to_string()).is_token_error());
    }

    #[test]
    fn expired_is_detected() {
        assert!(AuthError::Claims(TokenValidationError::Expired).is_expired());
        assert!(!AuthError::InvalidSignature.is_expired());
    }
}
