use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

use keyroster_auth::{AuthMethod, Principal};

use crate::app::errors;
use crate::app::routes::common::{found, login_path, SESSION_COOKIE};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Exact paths reachable without credentials.
const PUBLIC_PATHS: &[&str] = &["/", "/swagger-ui.html", "/health", "/logout"];

/// Path prefixes (the prefix itself and everything below it) reachable without credentials.
const PUBLIC_PREFIXES: &[&str] = &[
    "/public",
    "/api/v1/auth",
    "/v3/api-docs",
    "/oauth2/authorization",
    "/login/oauth2/code",
];

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
        || PUBLIC_PREFIXES.iter().any(|prefix| {
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
}

/// Security boundary in front of every route.
///
/// Public paths pass through (with the session principal attached when one
/// exists). Everything else needs a valid bearer token or a live session.
pub async fn security_boundary(
    State(services): State<Arc<AppServices>>,
    jar: CookieJar,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let now = Utc::now();

    if is_public(req.uri().path()) {
        if let Some(principal) = session_principal(&services, &jar).await {
            req.extensions_mut().insert(PrincipalContext::new(principal));
        }
        return next.run(req).await;
    }

    let principal = match extract_bearer(req.headers()) {
        Some(token) => {
            let token = token.to_string();
            match services.jwt.validate(&token, now).await {
                Ok(claims) => Principal::new(claims.sub.clone(), AuthMethod::Bearer, claims.to_map()),
                Err(err) => {
                    if err.is_token_error() {
                        tracing::debug!(error = %err, expired = err.is_expired(), "bearer token rejected");
                    } else {
                        tracing::warn!(error = %err, "bearer token could not be verified");
                    }
                    return errors::invalid_token(&err);
                }
            }
        }
        None => match session_principal(&services, &jar).await {
            Some(principal) => principal,
            None if wants_html(req.headers()) => {
                return found(&login_path(services.registration_id()));
            }
            None => return errors::authentication_required(),
        },
    };

    req.extensions_mut().insert(PrincipalContext::new(principal));
    next.run(req).await
}

async fn session_principal(services: &AppServices, jar: &CookieJar) -> Option<Principal> {
    let id = jar.get(SESSION_COOKIE)?.value().to_string();
    let session = services.sessions.session(&id, Utc::now()).await?;
    Some(Principal::new(
        session.principal_name,
        AuthMethod::Session,
        session.claims,
    ))
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Browser navigation (gets the login redirect) vs. API client (gets a 401).
fn wants_html(headers: &HeaderMap) -> bool {
    let xhr = headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
    let html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"));
    html && !xhr
}
