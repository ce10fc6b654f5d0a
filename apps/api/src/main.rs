mod config;
mod db;
mod errors;
mod models;
mod prediction;
mod profile;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use role_model::Predictor;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::prediction::store::PgPredictionStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},role_model={}",
                env!("CARGO_PKG_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting role-predict API v{}", env!("CARGO_PKG_VERSION"));

    // Artifacts must be present and consistent before serving anything
    let predictor = Predictor::load(&config.artifact_dir).with_context(|| {
        format!(
            "failed to load model artifacts from {}",
            config.artifact_dir.display()
        )
    })?;
    info!(
        "Model loaded: run {}, {} roles, feature width {}",
        predictor
            .run_id()
            .map_or_else(|| "unknown".to_string(), |id| id.to_string()),
        predictor.roles().len(),
        predictor.feature_width()
    );

    let db = create_pool(&config.database_url).await?;

    let state = AppState {
        predictions: Arc::new(PgPredictionStore::new(db.clone())),
        db,
        predictor: Arc::new(predictor),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
