use keyroster_auth::{AuthMethod, Principal};
use serde_json::{Map, Value};

/// Principal context for a request (authenticated identity + claims).
///
/// Inserted into request extensions by the security boundary; handlers on
/// protected routes can rely on it being present.
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn name(&self) -> &str {
        self.principal.name()
    }

    pub fn method(&self) -> AuthMethod {
        self.principal.method()
    }

    pub fn claims(&self) -> &Map<String, Value> {
        self.principal.claims()
    }
}
