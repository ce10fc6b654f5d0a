//! Prediction log persistence.
//!
//! `AppState` holds an `Arc<dyn PredictionStore>`; production uses
//! `PgPredictionStore`, handler tests use the in-memory store below.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::prediction::{NewPrediction, PredictionRow};

#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Appends one entry. Never updates existing rows.
    async fn record(&self, prediction: NewPrediction) -> Result<PredictionRow, AppError>;

    /// Deletes the user's entries created strictly before `cutoff`.
    async fn purge_older_than(&self, user_id: Uuid, cutoff: DateTime<Utc>) -> Result<u64, AppError>;

    /// The user's entries, newest first.
    async fn history(&self, user_id: Uuid) -> Result<Vec<PredictionRow>, AppError>;
}

/// Oldest `created_at` still retained when reading at `now`.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    now - Duration::days(retention_days)
}

pub struct PgPredictionStore {
    pool: PgPool,
}

impl PgPredictionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PredictionStore for PgPredictionStore {
    async fn record(&self, p: NewPrediction) -> Result<PredictionRow, AppError> {
        let row = sqlx::query_as::<_, PredictionRow>(
            r#"
            INSERT INTO predictions
                (user_id, degree, major, cgpa, employed, experience,
                 skills, certifications, industry, predicted_role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(p.user_id)
        .bind(&p.degree)
        .bind(&p.major)
        .bind(p.cgpa)
        .bind(&p.employed)
        .bind(p.experience)
        .bind(&p.skills)
        .bind(&p.certifications)
        .bind(&p.industry)
        .bind(&p.predicted_role)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn purge_older_than(
        &self,
        user_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM predictions WHERE user_id = $1 AND created_at < $2")
            .bind(user_id)
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn history(&self, user_id: Uuid) -> Result<Vec<PredictionRow>, AppError> {
        Ok(sqlx::query_as::<_, PredictionRow>(
            "SELECT * FROM predictions WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use super::*;

    /// In-process store for handler tests. `fail_writes` simulates a database outage.
    #[derive(Default)]
    pub struct MemoryPredictionStore {
        rows: Mutex<Vec<PredictionRow>>,
        pub fail_writes: bool,
    }

    impl MemoryPredictionStore {
        pub fn failing() -> Self {
            Self {
                fail_writes: true,
                ..Self::default()
            }
        }

        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        /// Moves an entry's timestamp into the past.
        pub fn backdate(&self, id: i64, created_at: DateTime<Utc>) {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
                row.created_at = created_at;
            }
        }
    }

    #[async_trait]
    impl PredictionStore for MemoryPredictionStore {
        async fn record(&self, p: NewPrediction) -> Result<PredictionRow, AppError> {
            if self.fail_writes {
                return Err(AppError::Database(sqlx::Error::PoolTimedOut));
            }
            let mut rows = self.rows.lock().unwrap();
            let row = PredictionRow {
                id: rows.len() as i64 + 1,
                user_id: p.user_id,
                degree: p.degree,
                major: p.major,
                cgpa: p.cgpa,
                employed: p.employed,
                experience: p.experience,
                skills: p.skills,
                certifications: p.certifications,
                industry: p.industry,
                predicted_role: p.predicted_role,
                created_at: Utc::now(),
            };
            rows.push(row.clone());
            Ok(row)
        }

        async fn purge_older_than(
            &self,
            user_id: Uuid,
            cutoff: DateTime<Utc>,
        ) -> Result<u64, AppError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.user_id != user_id || r.created_at >= cutoff);
            Ok((before - rows.len()) as u64)
        }

        async fn history(&self, user_id: Uuid) -> Result<Vec<PredictionRow>, AppError> {
            let rows = self.rows.lock().unwrap();
            let mut mine: Vec<PredictionRow> =
                rows.iter().filter(|r| r.user_id == user_id).cloned().collect();
            mine.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(mine)
        }
    }
}
