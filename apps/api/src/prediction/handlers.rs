use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use role_model::{RawApplicant, RoleConfidence};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::prediction::{NewPrediction, PredictionRow};
use crate::prediction::store::retention_cutoff;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct PredictRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub applicant: RawApplicant,
}

#[derive(Serialize)]
pub struct PredictResponse {
    pub prediction: String,
    /// Per-role confidence in class-index order.
    pub graph_data: Vec<RoleConfidence>,
}

/// POST /api/v1/predict
///
/// The prediction is only returned once its log entry is persisted.
pub async fn handle_predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, AppError> {
    let record = req.applicant.to_record()?;
    let prediction = state.predictor.predict(&record)?;

    let entry = NewPrediction::from_record(req.user_id, &record, &prediction.role)?;
    state.predictions.record(entry).await?;

    info!(user_id = %req.user_id, role = %prediction.role, "prediction recorded");

    Ok(Json(PredictResponse {
        prediction: prediction.role,
        graph_data: prediction.distribution,
    }))
}

/// GET /api/v1/history
pub async fn handle_history(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PredictionRow>>, AppError> {
    let cutoff = retention_cutoff(Utc::now(), state.config.history_retention_days);
    let purged = state
        .predictions
        .purge_older_than(params.user_id, cutoff)
        .await?;
    if purged > 0 {
        info!(user_id = %params.user_id, purged, "expired predictions removed");
    }

    let history = state.predictions.history(params.user_id).await?;
    Ok(Json(history))
}
