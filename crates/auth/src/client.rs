//! OAuth2 authorization-code client for a single provider registration.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::discovery::ProviderMetadata;
use crate::error::AuthError;

/// Static description of this service as a client of the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRegistration {
    /// Local name of the registration (`keycloak`), used in login-flow paths.
    pub registration_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Where the provider sends the browser back with the authorization code.
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub provider: ProviderMetadata,
}

/// A freshly generated authorization request.
///
/// `state` and `nonce` must be remembered until the callback arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub nonce: String,
}

/// Successful token endpoint response (RFC 6749 §5.1 plus OIDC `id_token`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OAuth2Client {
    registration: ClientRegistration,
    http: reqwest::Client,
}

impl OAuth2Client {
    pub fn new(registration: ClientRegistration, http: reqwest::Client) -> Self {
        Self { registration, http }
    }

    pub fn registration(&self) -> &ClientRegistration {
        &self.registration
    }

    /// Build the provider redirect that starts a browser login.
    pub fn authorization_request(&self) -> Result<AuthorizationRequest, AuthError> {
        let reg = &self.registration;
        let state = Uuid::new_v4().simple().to_string();
        let nonce = Uuid::new_v4().simple().to_string();

        let mut url = Url::parse(&reg.provider.authorization_endpoint).map_err(|e| {
            AuthError::InvalidConfiguration(format!("authorization endpoint: {e}"))
        })?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &reg.client_id)
            .append_pair("scope", &reg.scopes.join(" "))
            .append_pair("state", &state)
            .append_pair("redirect_uri", &reg.redirect_uri)
            .append_pair("nonce", &nonce);

        Ok(AuthorizationRequest {
            url: url.into(),
            state,
            nonce,
        })
    }

    /// Trade an authorization code for tokens (client_secret_basic).
    #[instrument(skip_all, fields(registration = %self.registration.registration_id))]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        let reg = &self.registration;
        let response = self
            .http
            .post(&reg.provider.token_endpoint)
            .basic_auth(&reg.client_id, Some(&reg.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", reg.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<TokenErrorResponse>().await {
                Ok(body) => match body.error_description {
                    Some(desc) => format!("{}: {desc}", body.error),
                    None => body.error,
                },
                Err(_) => format!("HTTP {status}"),
            };
            return Err(AuthError::TokenExchange(message));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::TokenExchange(format!("invalid token response: {e}")))
    }

    /// Claims from the provider's userinfo endpoint.
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<Map<String, Value>, AuthError> {
        let endpoint = self
            .registration
            .provider
            .userinfo_endpoint
            .as_deref()
            .ok_or_else(|| AuthError::UserInfo("provider has no userinfo endpoint".to_string()))?;

        let response = self
            .http
            .get(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::UserInfo(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::UserInfo(format!("HTTP {}", response.status())));
        }

        response
            .json::<Map<String, Value>>()
            .await
            .map_err(|e| AuthError::UserInfo(format!("invalid userinfo response: {e}")))
    }
}
