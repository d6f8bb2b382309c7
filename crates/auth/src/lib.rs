//! `keyroster-auth` — authentication boundary against an external OpenID provider.
//!
//! This crate is intentionally decoupled from the HTTP server: it validates
//! bearer tokens, talks to the provider (discovery, JWKS, token exchange,
//! userinfo) and keeps login-flow state. Routing lives in `keyroster-api`.

pub mod claims;
pub mod client;
pub mod discovery;
pub mod error;
pub mod jwks;
pub mod jwt;
pub mod principal;
pub mod session;

pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use client::{AuthorizationRequest, ClientRegistration, OAuth2Client, TokenResponse};
pub use discovery::ProviderMetadata;
pub use error::AuthError;
pub use jwks::{Jwk, JwkSet, JwksClient};
pub use jwt::{Hs256JwtValidator, JwksJwtValidator, JwtValidator};
pub use principal::{AuthMethod, Principal};
pub use session::{
    AuthorizedClientStore, LoginSession, PendingAuthorization, SessionError, SessionStore,
    SessionTokens,
};
