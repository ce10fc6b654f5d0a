use chrono::{DateTime, Utc};
use role_model::ApplicantRecord;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

/// Append-only prediction log entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PredictionRow {
    pub id: i64,
    pub user_id: Uuid,
    pub degree: String,
    pub major: String,
    pub cgpa: f64,
    pub employed: String,
    pub experience: i32,
    pub skills: String,
    pub certifications: String,
    pub industry: String,
    pub predicted_role: String,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of the normalized input plus the role it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub user_id: Uuid,
    pub degree: String,
    pub major: String,
    pub cgpa: f64,
    pub employed: String,
    pub experience: i32,
    pub skills: String,
    pub certifications: String,
    pub industry: String,
    pub predicted_role: String,
}

impl NewPrediction {
    /// Values the history columns cannot hold are rejected, never clamped.
    pub fn from_record(
        user_id: Uuid,
        record: &ApplicantRecord,
        predicted_role: &str,
    ) -> Result<Self, AppError> {
        let experience =
            i32::try_from(record.experience).map_err(|_| AppError::MalformedInput {
                field: "experience".to_string(),
                reason: format!("{} does not fit the history log", record.experience),
            })?;
        Ok(Self {
            user_id,
            degree: record.degree.clone(),
            major: record.major.clone(),
            cgpa: record.cgpa,
            employed: record.employed.clone(),
            experience,
            skills: record.skills_text(),
            certifications: record.certifications_text(),
            industry: record.industry_preference.clone(),
            predicted_role: predicted_role.to_string(),
        })
    }
}
