use std::sync::Arc;

use role_model::Predictor;
use sqlx::PgPool;

use crate::config::Config;
use crate::prediction::store::PredictionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Loaded once at startup and read-only afterwards.
    pub predictor: Arc<Predictor>,
    /// Prediction log. Default: PgPredictionStore over `db`.
    pub predictions: Arc<dyn PredictionStore>,
    pub config: Config,
}
