pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::prediction::handlers as prediction;
use crate::profile::handlers as profile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/predict", post(prediction::handle_predict))
        .route("/api/v1/history", get(prediction::handle_history))
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile).post(profile::handle_save_profile),
        )
        .with_state(state)
}
