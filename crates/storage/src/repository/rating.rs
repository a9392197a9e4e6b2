use sqlx::PgPool;

use crate::dto::rating::RatingRecord;
use crate::error::{Result, StorageError};

/// Result of a rating upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingWrite {
    /// The row was inserted or replaced
    Stored,
    /// A rating from a higher priority source is already stored and was kept
    KeptExisting,
}

pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_competition(&self, competition_id: &str) -> Result<RatingRecord> {
        let record = sqlx::query_as::<_, RatingRecord>(
            r#"
            SELECT competition_id, sport, season, period, period_type, score, explanation,
                   spoiler_free_explanation, source, source_priority, rating_type,
                   generated_at, snapshot
            FROM ratings
            WHERE competition_id = $1
            "#,
        )
        .bind(competition_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(record)
    }

    pub async fn find_by_competitions(&self, competition_ids: &[String]) -> Result<Vec<RatingRecord>> {
        if competition_ids.is_empty() {
            return Ok(Vec::new());
        }

        let records = sqlx::query_as::<_, RatingRecord>(
            r#"
            SELECT competition_id, sport, season, period, period_type, score, explanation,
                   spoiler_free_explanation, source, source_priority, rating_type,
                   generated_at, snapshot
            FROM ratings
            WHERE competition_id = ANY($1)
            "#,
        )
        .bind(competition_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Most recently generated ratings first
    pub async fn list_recent(&self, limit: i64, offset: i64) -> Result<(Vec<RatingRecord>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings")
            .fetch_one(self.pool)
            .await?;

        let records = sqlx::query_as::<_, RatingRecord>(
            r#"
            SELECT competition_id, sport, season, period, period_type, score, explanation,
                   spoiler_free_explanation, source, source_priority, rating_type,
                   generated_at, snapshot
            FROM ratings
            ORDER BY generated_at DESC, competition_id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok((records, total))
    }

    /// Insert or replace the rating of a competition.
    ///
    /// The stored row is only replaced when the incoming source priority is at
    /// least the stored one, so replaying the same write is harmless.
    pub async fn upsert(&self, record: &RatingRecord) -> Result<RatingWrite> {
        let result = sqlx::query(
            r#"
            INSERT INTO ratings (
                competition_id, sport, season, period, period_type, score, explanation,
                spoiler_free_explanation, source, source_priority, rating_type,
                generated_at, snapshot
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (competition_id) DO UPDATE
            SET
                sport = EXCLUDED.sport,
                season = EXCLUDED.season,
                period = EXCLUDED.period,
                period_type = EXCLUDED.period_type,
                score = EXCLUDED.score,
                explanation = EXCLUDED.explanation,
                spoiler_free_explanation = EXCLUDED.spoiler_free_explanation,
                source = EXCLUDED.source,
                source_priority = EXCLUDED.source_priority,
                rating_type = EXCLUDED.rating_type,
                generated_at = EXCLUDED.generated_at,
                snapshot = EXCLUDED.snapshot
            WHERE ratings.source_priority <= EXCLUDED.source_priority
            "#,
        )
        .bind(&record.competition_id)
        .bind(&record.sport)
        .bind(record.season)
        .bind(record.period)
        .bind(record.period_type)
        .bind(record.score)
        .bind(&record.explanation)
        .bind(&record.spoiler_free_explanation)
        .bind(&record.source)
        .bind(record.source_priority)
        .bind(&record.rating_type)
        .bind(record.generated_at)
        .bind(&record.snapshot)
        .execute(self.pool)
        .await
        .map_err(|e| {
            // The rating must reference an existing competition
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.code().as_deref() == Some("23503")
            {
                return StorageError::ConstraintViolation(format!(
                    "Competition {} does not exist",
                    record.competition_id
                ));
            }
            StorageError::from(e)
        })?;

        if result.rows_affected() == 0 {
            Ok(RatingWrite::KeptExisting)
        } else {
            Ok(RatingWrite::Stored)
        }
    }
}
