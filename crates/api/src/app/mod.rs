//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: provider client, token validation, stores
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{http::StatusCode, response::Response, Extension, Router};
use tower::ServiceBuilder;

use crate::config::AppConfig;
use crate::middleware;

pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Router over already-built services; every request passes the security boundary.
pub fn router(services: Arc<AppServices>) -> Router {
    routes::router().fallback(not_found).layer(
        ServiceBuilder::new()
            .layer(Extension(services.clone()))
            .layer(axum::middleware::from_fn_with_state(
                services,
                middleware::security_boundary,
            )),
    )
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(router(services))
}

async fn not_found() -> Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "no such resource")
}
