//! Candidate persistence. `AppState` holds an `Arc<dyn CandidateRepository>`;
//! production uses `PgCandidateRepository`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::{CandidatePatch, CandidateRow, NewCandidate};

#[async_trait]
pub trait CandidateRepository: Send + Sync {
    async fn create(&self, new: &NewCandidate) -> Result<CandidateRow, AppError>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<CandidateRow>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<CandidateRow>, AppError>;

    /// Returns `None` when no candidate has this id.
    async fn update(&self, id: Uuid, patch: &CandidatePatch)
        -> Result<Option<CandidateRow>, AppError>;

    /// Returns whether a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

pub struct PgCandidateRepository {
    pool: PgPool,
}

impl PgCandidateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateRepository for PgCandidateRepository {
    async fn create(&self, new: &NewCandidate) -> Result<CandidateRow, AppError> {
        // "current_role" is a reserved word in PostgreSQL and must stay quoted.
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            INSERT INTO candidates
                (id, first_name, last_name, email, phone, linkedin_url, resume_url,
                 skills, rating, status, notes, "current_role", education, location,
                 experience_years)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.linkedin_url)
        .bind(&new.resume_url)
        .bind(&new.skills)
        .bind(new.rating)
        .bind(new.status.as_str())
        .bind(&new.notes)
        .bind(&new.current_role)
        .bind(&new.education)
        .bind(&new.location)
        .bind(new.experience_years)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<CandidateRow>, AppError> {
        Ok(sqlx::query_as::<_, CandidateRow>(
            "SELECT * FROM candidates ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CandidateRow>, AppError> {
        Ok(
            sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &CandidatePatch,
    ) -> Result<Option<CandidateRow>, AppError> {
        Ok(sqlx::query_as::<_, CandidateRow>(
            r#"
            UPDATE candidates SET
                first_name       = COALESCE($2, first_name),
                last_name        = COALESCE($3, last_name),
                email            = COALESCE($4, email),
                phone            = COALESCE($5, phone),
                linkedin_url     = COALESCE($6, linkedin_url),
                resume_url       = COALESCE($7, resume_url),
                skills           = COALESCE($8, skills),
                rating           = COALESCE($9, rating),
                status           = COALESCE($10, status),
                notes            = COALESCE($11, notes),
                "current_role"   = COALESCE($12, "current_role"),
                education        = COALESCE($13, education),
                location         = COALESCE($14, location),
                experience_years = COALESCE($15, experience_years),
                updated_at       = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.email)
        .bind(&patch.phone)
        .bind(&patch.linkedin_url)
        .bind(&patch.resume_url)
        .bind(&patch.skills)
        .bind(patch.rating)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(&patch.notes)
        .bind(&patch.current_role)
        .bind(&patch.education)
        .bind(&patch.location)
        .bind(patch.experience_years)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    /// In-process repository for handler tests.
    #[derive(Default)]
    pub(crate) struct InMemoryCandidateRepository {
        rows: Mutex<Vec<CandidateRow>>,
    }

    #[async_trait]
    impl CandidateRepository for InMemoryCandidateRepository {
        async fn create(&self, new: &NewCandidate) -> Result<CandidateRow, AppError> {
            let now = Utc::now();
            let row = CandidateRow {
                id: Uuid::new_v4(),
                first_name: new.first_name.clone(),
                last_name: new.last_name.clone(),
                email: new.email.clone(),
                phone: new.phone.clone(),
                linkedin_url: new.linkedin_url.clone(),
                resume_url: new.resume_url.clone(),
                skills: new.skills.clone(),
                rating: new.rating,
                status: new.status.as_str().to_string(),
                notes: new.notes.clone(),
                current_role: new.current_role.clone(),
                education: new.education.clone(),
                location: new.location.clone(),
                experience_years: new.experience_years,
                created_at: now,
                updated_at: now,
            };
            self.rows.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn list(&self) -> Result<Vec<CandidateRow>, AppError> {
            let mut rows = self.rows.lock().unwrap().clone();
            rows.reverse();
            Ok(rows)
        }

        async fn get(&self, id: Uuid) -> Result<Option<CandidateRow>, AppError> {
            Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
        }

        async fn update(
            &self,
            id: Uuid,
            patch: &CandidatePatch,
        ) -> Result<Option<CandidateRow>, AppError> {
            let mut rows = self.rows.lock().unwrap();
            Ok(rows.iter_mut().find(|r| r.id == id).map(|row| {
                patch.apply(row);
                row.updated_at = Utc::now();
                row.clone()
            }))
        }

        async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.id != id);
            Ok(rows.len() < before)
        }
    }
}
