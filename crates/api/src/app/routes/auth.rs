use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use keyroster_auth::AuthMethod;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/success", get(login_success))
}

/// Landing page of a completed browser login.
///
/// Reports the access token negotiated for the session's principal together
/// with the principal's identity claims.
pub async fn login_success(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
) -> Response {
    let Some(Extension(principal)) = principal.filter(|p| p.method() == AuthMethod::Session) else {
        return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "no login session");
    };

    match services
        .authorized_clients
        .resolve_session(services.registration_id(), principal.name())
        .await
    {
        Ok(tokens) => Json(json!({
            "message": "Login successful",
            "access_token": tokens.access_token,
            "user": principal.claims(),
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(principal = %principal.name(), error = %e, "session has no authorized client");
            errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", e.to_string())
        }
    }
}
