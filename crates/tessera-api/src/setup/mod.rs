//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tessera_core::Config;
use tessera_infra::LogFormat;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    tessera_infra::init_telemetry(
        "tessera-api",
        config.environment(),
        LogFormat::from_json_flag(config.json_logs()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let stores = services::setup_stores(&config).await?;
    let storage = storage::setup_storage(&config).await?;

    let state = services::initialize_services(&config, stores, storage)?;

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
