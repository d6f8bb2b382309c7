use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, SameSite};

/// Browser session cookie set after a completed login.
pub const SESSION_COOKIE: &str = "KEYROSTER_SESSION";

/// Binds a browser to the login it started (pending `state`/`nonce`).
pub const AUTHORIZATION_COOKIE: &str = "KEYROSTER_AUTHZ";

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub fn http_only_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie value that makes the browser drop `name`.
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

pub fn login_path(registration_id: &str) -> String {
    format!("/oauth2/authorization/{registration_id}")
}
