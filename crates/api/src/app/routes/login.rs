//! Browser login: authorization-code flow against the configured provider.
//!
//! `GET /oauth2/authorization/{registration}` redirects to the provider,
//! `GET /login/oauth2/code/{registration}` receives the code, and `/logout`
//! drops the session again.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use keyroster_auth::{AuthError, JwtValidator, PendingAuthorization, SessionTokens, TokenResponse};

use crate::app::errors;
use crate::app::routes::common::{
    found, http_only_cookie, removal_cookie, AUTHORIZATION_COOKIE, SESSION_COOKIE,
};
use crate::app::services::AppServices;

/// Where a completed login lands.
pub const LOGIN_SUCCESS_PATH: &str = "/api/v1/auth/success";

pub fn router() -> Router {
    Router::new()
        .route("/oauth2/authorization/:registration_id", get(begin_login))
        .route("/login/oauth2/code/:registration_id", get(finish_login))
        .route("/logout", get(logout).post(logout))
}

fn unknown_registration(registration_id: &str) -> Response {
    errors::json_error(
        StatusCode::NOT_FOUND,
        "not_found",
        format!("unknown client registration '{registration_id}'"),
    )
}

pub async fn begin_login(
    Extension(services): Extension<Arc<AppServices>>,
    Path(registration_id): Path<String>,
    jar: CookieJar,
) -> Response {
    if registration_id != services.registration_id() {
        return unknown_registration(&registration_id);
    }

    let request = match services.oauth.authorization_request() {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "cannot build authorization request");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", e.to_string());
        }
    };

    let binding = services
        .sessions
        .begin_authorization(PendingAuthorization {
            registration_id,
            state: request.state,
            nonce: request.nonce,
            created_at: Utc::now(),
        })
        .await;

    let jar = jar.add(http_only_cookie(AUTHORIZATION_COOKIE, binding));
    (jar, found(&request.url)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

pub async fn finish_login(
    Extension(services): Extension<Arc<AppServices>>,
    Path(registration_id): Path<String>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Response {
    if registration_id != services.registration_id() {
        return unknown_registration(&registration_id);
    }

    let binding = jar.get(AUTHORIZATION_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(removal_cookie(AUTHORIZATION_COOKIE));
    let fail = |jar: CookieJar, message: String| {
        tracing::warn!(registration = %registration_id, reason = %message, "login failed");
        (jar, errors::login_failed(message)).into_response()
    };

    if let Some(error) = params.error {
        let message = match params.error_description {
            Some(desc) => format!("{error}: {desc}"),
            None => error,
        };
        return fail(jar, message);
    }

    let now = Utc::now();
    let pending = match (binding, params.state) {
        (Some(binding), Some(state)) => {
            services.sessions.complete_authorization(&binding, &state, now).await
        }
        _ => None,
    };
    let Some(pending) = pending else {
        return fail(jar, "authorization state missing, expired or mismatched".to_string());
    };

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return fail(jar, "authorization code missing".to_string());
    };

    let tokens = match services.oauth.exchange_code(&code).await {
        Ok(t) => t,
        Err(e) => return fail(jar, e.to_string()),
    };

    let (principal_name, claims) = match identify(&services, &tokens, &pending.nonce).await {
        Ok(found) => found,
        Err(e) => return fail(jar, e.to_string()),
    };

    // A fresh session id for every login.
    if let Some(previous) = jar.get(SESSION_COOKIE) {
        services.sessions.end_session(previous.value()).await;
    }

    services
        .authorized_clients
        .save(
            &registration_id,
            &principal_name,
            SessionTokens {
                access_token: tokens.access_token,
                id_token: tokens.id_token,
                expires_at: tokens
                    .expires_in
                    .and_then(Duration::try_seconds)
                    .and_then(|lifetime| now.checked_add_signed(lifetime)),
                claims: claims.clone(),
            },
        )
        .await;

    let session = services
        .sessions
        .create_session(&registration_id, &principal_name, claims, now)
        .await;

    tracing::info!(registration = %registration_id, principal = %principal_name, "login completed");

    let jar = jar.add(http_only_cookie(SESSION_COOKIE, session.id));
    (jar, found(LOGIN_SUCCESS_PATH)).into_response()
}

/// Principal name and identity claims for a token response: the validated
/// id token when the provider issued one, userinfo otherwise.
///
/// The id token must carry the nonce sent with the authorization request.
async fn identify(
    services: &AppServices,
    tokens: &TokenResponse,
    expected_nonce: &str,
) -> Result<(String, Map<String, Value>), AuthError> {
    if let Some(id_token) = &tokens.id_token {
        let claims = services.id_tokens.validate(id_token, Utc::now()).await?;
        match claims.claim_str("nonce") {
            Some(nonce) if nonce == expected_nonce => {}
            Some(_) => return Err(AuthError::InvalidToken("id token nonce mismatch".to_string())),
            None => return Err(AuthError::MissingClaim("nonce".to_string())),
        }
        return Ok((claims.sub.clone(), claims.to_map()));
    }

    let claims = services.oauth.fetch_userinfo(&tokens.access_token).await?;
    let sub = claims
        .get("sub")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AuthError::MissingClaim("sub".to_string()))?;
    Ok((sub, claims))
}

pub async fn logout(Extension(services): Extension<Arc<AppServices>>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(session) = services.sessions.end_session(cookie.value()).await {
            services
                .authorized_clients
                .remove(&session.registration_id, &session.principal_name)
                .await;
            tracing::info!(principal = %session.principal_name, "logged out");
        }
    }

    let jar = jar.remove(removal_cookie(SESSION_COOKIE));
    (jar, found("/")).into_response()
}
