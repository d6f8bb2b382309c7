//! OpenID provider metadata.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AuthError;

/// Endpoints of the identity provider this service delegates login to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
    pub jwks_uri: String,
}

impl ProviderMetadata {
    pub fn well_known_url(issuer: &str) -> String {
        format!("{}/.well-known/openid-configuration", issuer.trim_end_matches('/'))
    }

    /// Fetch `/.well-known/openid-configuration` for `issuer`.
    ///
    /// The document's `issuer` must match the configured one (trailing slash
    /// ignored); a mismatch means the URL points at a different realm.
    #[instrument(skip_all, fields(issuer = %issuer))]
    pub async fn discover(http: &reqwest::Client, issuer: &str) -> Result<Self, AuthError> {
        let failed = |message: String| AuthError::DiscoveryFailed {
            issuer: issuer.to_string(),
            message,
        };

        let response = http
            .get(Self::well_known_url(issuer))
            .send()
            .await
            .map_err(|e| failed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let metadata: ProviderMetadata = response
            .json()
            .await
            .map_err(|e| failed(format!("invalid metadata document: {e}")))?;

        if metadata.issuer.trim_end_matches('/') != issuer.trim_end_matches('/') {
            return Err(failed(format!("metadata names issuer {}", metadata.issuer)));
        }

        tracing::info!(
            authorization_endpoint = %metadata.authorization_endpoint,
            token_endpoint = %metadata.token_endpoint,
            jwks_uri = %metadata.jwks_uri,
            "discovered identity provider endpoints"
        );

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};
    use serde_json::json;

    async fn serve_metadata(issuer_in_doc: Option<String>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/realms/demo", listener.local_addr().unwrap());
        let issuer = issuer_in_doc.unwrap_or_else(|| base.clone());
        let doc = json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{base}/protocol/openid-connect/auth"),
            "token_endpoint": format!("{base}/protocol/openid-connect/token"),
            "userinfo_endpoint": format!("{base}/protocol/openid-connect/userinfo"),
            "jwks_uri": format!("{base}/protocol/openid-connect/certs"),
            "response_types_supported": ["code"]
        });
        let app = Router::new().route(
            "/realms/demo/.well-known/openid-configuration",
            get(move || {
                let doc = doc.clone();
                async move { Json(doc) }
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        base
    }

    #[test]
    fn well_known_url_ignores_trailing_slash() {
        assert_eq!(
            ProviderMetadata::well_known_url("http://idp/realms/demo/"),
            "http://idp/realms/demo/.well-known/openid-configuration"
        );
    }

    #[tokio::test]
    async fn discovers_keycloak_style_endpoints() {
        let issuer = serve_metadata(None).await;

        let metadata = ProviderMetadata::discover(&reqwest::Client::new(), &issuer)
            .await
            .unwrap();

        assert_eq!(metadata.issuer, issuer);
        assert!(metadata.token_endpoint.ends_with("/protocol/openid-connect/token"));
        assert!(metadata.userinfo_endpoint.is_some());
    }

    #[tokio::test]
    async fn issuer_mismatch_is_rejected() {
        let issuer = serve_metadata(Some("http://other/realms/x".to_string())).await;

        let err = ProviderMetadata::discover(&reqwest::Client::new(), &issuer)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::DiscoveryFailed { .. }));
    }
}
