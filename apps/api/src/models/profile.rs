use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Numeric columns stay NULL when the user never provided them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub college_name: String,
    pub degree: String,
    pub major: String,
    pub cgpa: Option<f64>,
    pub experience: Option<i32>,
    pub skills: String,
    pub passout_year: Option<i32>,
    pub updated_at: DateTime<Utc>,
}
