use serde::Serialize;
use serde_json::{Map, Value};

/// How a request proved its identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// `Authorization: Bearer <jwt>` validated against the provider's keys.
    Bearer,
    /// Browser session established by the authorization-code login flow.
    Session,
}

/// An authenticated caller (human user or service account at the provider).
///
/// The name is the provider's `sub` claim; it is also the key under which the
/// authorized client for a browser login is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    name: String,
    method: AuthMethod,
    claims: Map<String, Value>,
}

impl Principal {
    pub fn new(name: impl Into<String>, method: AuthMethod, claims: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            method,
            claims,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> AuthMethod {
        self.method
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }
}
