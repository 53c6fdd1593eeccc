//! `crm-server` binary.

use anyhow::Context;
use crm_auth::{JwtService, PasswordHasher};
use crm_records::Store;
use crm_server::{app, logging, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;
    logging::init(config.log_format)?;
    tracing::debug!(?config, "configuration loaded");

    let jwt = JwtService::new(config.jwt_config()?)?;
    let state = AppState::new(Store::new(), jwt, PasswordHasher::default())
        .with_call_target(config.monthly_call_target);

    if let Some(admin) = &config.admin {
        let created = state
            .bootstrap_admin(admin)
            .await
            .context("failed to create the bootstrap administrator")?;
        if created {
            tracing::info!(email = %admin.email, "bootstrap administrator created");
        }
    }

    let router = app(state, &config.cors_origins);
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;

    tracing::info!(address = %config.bind_address, "crm server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
