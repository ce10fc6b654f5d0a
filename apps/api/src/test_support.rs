//! Shared fixtures for handler tests: a small trained predictor and an
//! `AppState` whose database pool never connects.

use std::sync::Arc;

use role_model::{train, ApplicantRecord, LabeledRecord, Predictor, TrainConfig};
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::prediction::store::PredictionStore;
use crate::state::AppState;

fn row(degree: &str, cgpa: f64, skills: &str, certs: &str, role: &str) -> LabeledRecord {
    LabeledRecord {
        record: ApplicantRecord::new(degree, "cs", cgpa, 1, "no", "software", skills, certs),
        job_role: role.to_string(),
    }
}

pub fn trained_predictor() -> Predictor {
    let mut rows = Vec::new();
    for i in 0..10 {
        let g = 7.0 + (i % 3) as f64 * 0.5;
        rows.push(row("btech", g, "python, sql", "aws", "Data Analyst"));
        rows.push(row("btech", g, "java, spring", "oracle", "Backend Developer"));
        rows.push(row("bdes", g, "figma, sketch", "", "Ui Designer"));
    }
    let config = TrainConfig {
        n_estimators: 20,
        ..TrainConfig::default()
    };
    let outcome = train(&rows, &config).unwrap();
    Predictor::from_bundle(outcome.artifacts).unwrap()
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/role_predict_test".into(),
        artifact_dir: "artifacts".into(),
        port: 0,
        rust_log: "info".into(),
        history_retention_days: 15,
    }
}

/// Must be called inside a tokio runtime.
pub fn test_state(predictions: Arc<dyn PredictionStore>) -> AppState {
    let config = test_config();
    let db = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();
    AppState {
        db,
        predictor: Arc::new(trained_predictor()),
        predictions,
        config,
    }
}
