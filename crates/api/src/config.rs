//! Process configuration, read from environment variables at startup.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";
pub const DEFAULT_REGISTRATION_ID: &str = "keycloak";
pub const DEFAULT_SCOPES: &str = "openid profile email";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Explicit provider endpoints; each one overrides the discovered value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointOverrides {
    pub authorization_uri: Option<String>,
    pub token_uri: Option<String>,
    pub jwk_set_uri: Option<String>,
    pub user_info_uri: Option<String>,
}

impl EndpointOverrides {
    /// True when discovery can be skipped entirely.
    pub fn is_complete(&self) -> bool {
        self.authorization_uri.is_some() && self.token_uri.is_some() && self.jwk_set_uri.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub registration_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub issuer_uri: Option<String>,
    pub endpoints: EndpointOverrides,
    /// Dev-only shared secret; replaces JWKS validation when set.
    pub jwt_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let bind_raw = get("KEYROSTER_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            key: "KEYROSTER_BIND_ADDR",
            message: e.to_string(),
        })?;

        let registration_id =
            get("OAUTH2_REGISTRATION_ID").unwrap_or_else(|| DEFAULT_REGISTRATION_ID.to_string());
        if !registration_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::Invalid {
                key: "OAUTH2_REGISTRATION_ID",
                message: "only letters, digits, '-' and '_' are allowed".to_string(),
            });
        }

        let redirect_uri = get("OAUTH2_REDIRECT_URI").unwrap_or_else(|| {
            format!("http://localhost:{}/login/oauth2/code/{registration_id}", bind_addr.port())
        });

        let scopes = get("OAUTH2_SCOPES")
            .unwrap_or_else(|| DEFAULT_SCOPES.to_string())
            .split([' ', ','])
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let issuer_uri = get("OAUTH2_ISSUER_URI");
        let endpoints = EndpointOverrides {
            authorization_uri: get("OAUTH2_AUTHORIZATION_URI"),
            token_uri: get("OAUTH2_TOKEN_URI"),
            jwk_set_uri: get("OAUTH2_JWK_SET_URI"),
            user_info_uri: get("OAUTH2_USER_INFO_URI"),
        };
        if issuer_uri.is_none() && !endpoints.is_complete() {
            return Err(ConfigError::Missing("OAUTH2_ISSUER_URI"));
        }

        Ok(Self {
            bind_addr,
            client_id: required("OAUTH2_CLIENT_ID")?,
            client_secret: required("OAUTH2_CLIENT_SECRET")?,
            registration_id,
            redirect_uri,
            scopes,
            issuer_uri,
            endpoints,
            jwt_secret: get("JWT_SECRET"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("OAUTH2_ISSUER_URI", "http://localhost:8080/realms/demo"),
        ("OAUTH2_CLIENT_ID", "employee-api"),
        ("OAUTH2_CLIENT_SECRET", "s3cret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(BASE)).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8081".parse().unwrap());
        assert_eq!(config.registration_id, "keycloak");
        assert_eq!(config.redirect_uri, "http://localhost:8081/login/oauth2/code/keycloak");
        assert_eq!(config.scopes, vec!["openid", "profile", "email"]);
        assert_eq!(config.jwt_secret, None);
    }

    #[test]
    fn client_credentials_are_required() {
        let err = AppConfig::from_lookup(lookup(&BASE[..2])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("OAUTH2_CLIENT_SECRET"));
    }

    #[test]
    fn issuer_or_full_endpoint_set_is_required() {
        let err = AppConfig::from_lookup(lookup(&BASE[1..])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("OAUTH2_ISSUER_URI"));

        let mut pairs = BASE[1..].to_vec();
        pairs.extend([
            ("OAUTH2_AUTHORIZATION_URI", "http://idp/auth"),
            ("OAUTH2_TOKEN_URI", "http://idp/token"),
            ("OAUTH2_JWK_SET_URI", "http://idp/certs"),
        ]);
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.endpoints.is_complete());
        assert_eq!(config.issuer_uri, None);
    }

    #[test]
    fn bad_bind_address_is_reported() {
        let mut pairs = BASE.to_vec();
        pairs.push(("KEYROSTER_BIND_ADDR", "localhost"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "KEYROSTER_BIND_ADDR", .. }));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut pairs = BASE.to_vec();
        pairs.push(("JWT_SECRET", "   "));
        pairs.push(("OAUTH2_SCOPES", "openid,email"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.jwt_secret, None);
        assert_eq!(config.scopes, vec!["openid", "email"]);
    }
}
