use anyhow::Context;

use keyroster_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    keyroster_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    if config.jwt_secret.is_some() {
        tracing::warn!("JWT_SECRET set; bearer tokens are checked with an insecure shared secret");
    }

    let app = keyroster_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        login = %format!("/oauth2/authorization/{}", config.registration_id),
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
