use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use keyroster_auth::AuthError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// 401 for a request that carried no usable credentials.
pub fn authentication_required() -> Response {
    let mut res = json_error(StatusCode::UNAUTHORIZED, "unauthorized", "authentication required");
    res.headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    res
}

/// 401 for a bearer token that failed validation.
pub fn invalid_token(err: &AuthError) -> Response {
    let mut res = json_error(StatusCode::UNAUTHORIZED, "invalid_token", err.to_string());
    res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(r#"Bearer error="invalid_token""#),
    );
    res
}

/// 401 for a browser login that could not be completed.
pub fn login_failed(message: impl Into<String>) -> Response {
    json_error(StatusCode::UNAUTHORIZED, "login_failed", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_token_advertises_bearer_error() {
        let res = invalid_token(&AuthError::InvalidSignature);
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            res.headers()[header::WWW_AUTHENTICATE],
            r#"Bearer error="invalid_token""#
        );
    }

    #[test]
    fn authentication_required_is_plain_bearer_challenge() {
        let res = authentication_required();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
