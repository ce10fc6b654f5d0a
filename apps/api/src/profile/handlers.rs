use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::ProfileRow;
use crate::prediction::handlers::UserIdQuery;
use crate::state::AppState;

/// Profile form body. Text fields default to empty; numeric fields may be
/// JSON numbers or numeric strings and stay NULL when absent.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub college_name: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub cgpa: Option<Value>,
    #[serde(default)]
    pub experience: Option<Value>,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub passout_year: Option<Value>,
}

/// Validated numeric columns of a profile upsert.
#[derive(Debug, PartialEq)]
pub struct ProfileNumbers {
    pub cgpa: Option<f64>,
    pub experience: Option<i32>,
    pub passout_year: Option<i32>,
}

impl ProfileRequest {
    pub fn numbers(&self) -> Result<ProfileNumbers, AppError> {
        Ok(ProfileNumbers {
            cgpa: optional_f64("cgpa", self.cgpa.as_ref())?,
            experience: optional_i32("experience", self.experience.as_ref())?,
            passout_year: optional_i32("passout_year", self.passout_year.as_ref())?,
        })
    }
}

fn malformed(field: &str, reason: String) -> AppError {
    AppError::MalformedInput {
        field: field.to_string(),
        reason,
    }
}

fn optional_f64(field: &str, value: Option<&Value>) -> Result<Option<f64>, AppError> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(other) => return Err(malformed(field, format!("expected a number, got {other}"))),
    };
    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        _ => Err(malformed(field, "not a valid non-negative number".into())),
    }
}

fn optional_i32(field: &str, value: Option<&Value>) -> Result<Option<i32>, AppError> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(other) => return Err(malformed(field, format!("expected a number, got {other}"))),
    };
    parsed
        .filter(|v| *v >= 0)
        .and_then(|v| i32::try_from(v).ok())
        .map(Some)
        .ok_or_else(|| malformed(field, "not a valid non-negative whole number".into()))
}

/// GET /api/v1/profile
///
/// Returns `{}` for users who never saved a profile.
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    let profile: Option<ProfileRow> =
        sqlx::query_as("SELECT * FROM profiles WHERE user_id = $1")
            .bind(params.user_id)
            .fetch_optional(&state.db)
            .await?;

    match profile {
        Some(row) => Ok(Json(
            serde_json::to_value(row).map_err(|e| AppError::Internal(e.into()))?,
        )),
        None => Ok(Json(json!({}))),
    }
}

/// POST /api/v1/profile
pub async fn handle_save_profile(
    State(state): State<AppState>,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<ProfileRow>, AppError> {
    let numbers = req.numbers()?;

    let row: ProfileRow = sqlx::query_as(
        r#"
        INSERT INTO profiles
            (user_id, name, email, college_name, degree, major,
             cgpa, experience, skills, passout_year, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
        ON CONFLICT (user_id) DO UPDATE SET
            name = EXCLUDED.name,
            email = EXCLUDED.email,
            college_name = EXCLUDED.college_name,
            degree = EXCLUDED.degree,
            major = EXCLUDED.major,
            cgpa = EXCLUDED.cgpa,
            experience = EXCLUDED.experience,
            skills = EXCLUDED.skills,
            passout_year = EXCLUDED.passout_year,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(req.user_id)
    .bind(req.name.trim())
    .bind(req.email.trim())
    .bind(req.college_name.trim())
    .bind(req.degree.trim())
    .bind(req.major.trim())
    .bind(numbers.cgpa)
    .bind(numbers.experience)
    .bind(req.skills.trim())
    .bind(numbers.passout_year)
    .fetch_one(&state.db)
    .await?;

    info!(user_id = %req.user_id, "profile saved");
    Ok(Json(row))
}
