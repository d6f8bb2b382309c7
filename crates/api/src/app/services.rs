//! Shared per-process services handed to handlers and the security boundary.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use keyroster_auth::{
    AuthorizedClientStore, ClientRegistration, Hs256JwtValidator, JwksClient, JwksJwtValidator,
    JwtValidator, OAuth2Client, ProviderMetadata, SessionStore,
};
use keyroster_employees::{EmployeeStore, InMemoryEmployeeStore};

use crate::config::{AppConfig, ConfigError};

/// Timeout for every call to the identity provider.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

pub struct AppServices {
    pub employees: Arc<dyn EmployeeStore>,
    pub oauth: OAuth2Client,
    /// Bearer tokens on protected routes.
    pub jwt: Arc<dyn JwtValidator>,
    /// Id tokens returned by the login flow; always the provider's keys.
    pub id_tokens: JwksJwtValidator,
    pub sessions: SessionStore,
    pub authorized_clients: AuthorizedClientStore,
}

impl AppServices {
    /// Services around a fresh, empty employee store.
    pub fn new(oauth: OAuth2Client, jwt: Arc<dyn JwtValidator>, id_tokens: JwksJwtValidator) -> Self {
        Self {
            employees: Arc::new(InMemoryEmployeeStore::new()),
            oauth,
            jwt,
            id_tokens,
            sessions: SessionStore::new(),
            authorized_clients: AuthorizedClientStore::new(),
        }
    }

    pub fn registration_id(&self) -> &str {
        &self.oauth.registration().registration_id
    }
}

/// Resolve provider endpoints: discovery when an issuer is configured, with
/// explicit endpoint settings taking precedence.
pub async fn resolve_provider(
    http: &reqwest::Client,
    config: &AppConfig,
) -> anyhow::Result<ProviderMetadata> {
    let overrides = &config.endpoints;

    let discovered = match &config.issuer_uri {
        Some(issuer) if !overrides.is_complete() => Some(
            ProviderMetadata::discover(http, issuer)
                .await
                .context("identity provider discovery failed")?,
        ),
        _ => None,
    };

    let pick = |explicit: &Option<String>, found: Option<&String>, key: &'static str| {
        explicit
            .clone()
            .or_else(|| found.cloned())
            .ok_or(ConfigError::Missing(key))
    };

    Ok(ProviderMetadata {
        issuer: config
            .issuer_uri
            .clone()
            .or_else(|| discovered.as_ref().map(|d| d.issuer.clone()))
            .unwrap_or_default(),
        authorization_endpoint: pick(
            &overrides.authorization_uri,
            discovered.as_ref().map(|d| &d.authorization_endpoint),
            "OAUTH2_AUTHORIZATION_URI",
        )?,
        token_endpoint: pick(
            &overrides.token_uri,
            discovered.as_ref().map(|d| &d.token_endpoint),
            "OAUTH2_TOKEN_URI",
        )?,
        jwks_uri: pick(
            &overrides.jwk_set_uri,
            discovered.as_ref().map(|d| &d.jwks_uri),
            "OAUTH2_JWK_SET_URI",
        )?,
        userinfo_endpoint: overrides
            .user_info_uri
            .clone()
            .or_else(|| discovered.as_ref().and_then(|d| d.userinfo_endpoint.clone())),
    })
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let http = reqwest::Client::builder()
        .timeout(PROVIDER_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let provider = resolve_provider(&http, config).await?;
    let issuer = (!provider.issuer.is_empty()).then(|| provider.issuer.clone());

    let jwks = JwksClient::new(&provider.jwks_uri, http.clone());

    let id_tokens = JwksJwtValidator::new(jwks.clone()).with_audience(config.client_id.clone());
    let id_tokens = match &issuer {
        Some(iss) => id_tokens.with_issuer(iss.clone()),
        None => id_tokens,
    };

    let jwt: Arc<dyn JwtValidator> = match &config.jwt_secret {
        Some(secret) => {
            let validator = Hs256JwtValidator::new(secret);
            Arc::new(match &issuer {
                Some(iss) => validator.with_issuer(iss.clone()),
                None => validator,
            })
        }
        None => {
            let validator = JwksJwtValidator::new(jwks);
            Arc::new(match &issuer {
                Some(iss) => validator.with_issuer(iss.clone()),
                None => validator,
            })
        }
    };

    let registration = ClientRegistration {
        registration_id: config.registration_id.clone(),
        client_id: config.client_id.clone(),
        client_secret: config.client_secret.clone(),
        redirect_uri: config.redirect_uri.clone(),
        scopes: config.scopes.clone(),
        provider,
    };

    tracing::info!(
        registration = %registration.registration_id,
        client_id = %registration.client_id,
        jwks = config.jwt_secret.is_none(),
        "identity provider client configured"
    );

    Ok(AppServices::new(
        OAuth2Client::new(registration, http),
        jwt,
        id_tokens,
    ))
}
