use axum::{routing::get, Router};

pub mod auth;
pub mod common;
pub mod employees;
pub mod login;
pub mod public;
pub mod system;

/// Every route the service exposes; the security boundary decides who gets in.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(public::router())
        .merge(login::router())
        .nest("/api/v1/auth", auth::router())
        .nest("/api/v1/employees", employees::router())
}
