use std::collections::HashMap;

use sqlx::PgPool;

use crate::dto::competition::{CompetitionRow, ParticipantRow, PeriodRow};
use crate::error::{Result, StorageError};
use crate::models::{Period, Sport};

/// Read access to competitions and their participants
pub struct CompetitionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CompetitionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a competition row by ID
    pub async fn find_by_id(&self, competition_id: &str) -> Result<CompetitionRow> {
        let row = sqlx::query_as::<_, CompetitionRow>(
            r#"
            SELECT competition_id, sport, season, period, period_type, start_time
            FROM competitions
            WHERE competition_id = $1
            "#,
        )
        .bind(competition_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(row)
    }

    /// Competitions of one sport in one period, earliest kickoff first
    pub async fn find_by_period(&self, sport: Sport, period: Period) -> Result<Vec<CompetitionRow>> {
        let rows = sqlx::query_as::<_, CompetitionRow>(
            r#"
            SELECT competition_id, sport, season, period, period_type, start_time
            FROM competitions
            WHERE sport = $1
              AND season = $2
              AND period = $3
              AND period_type = $4
            ORDER BY start_time ASC NULLS LAST, competition_id ASC
            "#,
        )
        .bind(sport.as_str())
        .bind(period.season)
        .bind(period.period)
        .bind(period.period_type.code())
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Participants for a set of competitions, grouped by competition ID
    pub async fn participants_for(
        &self,
        competition_ids: &[String],
    ) -> Result<HashMap<String, Vec<ParticipantRow>>> {
        if competition_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT ct.competition_id, t.team_id, t.display_name, t.abbreviation, t.logo_url,
                   ct.home_away, ct.score, ct.wins, ct.losses, ct.ties
            FROM competition_teams ct
            JOIN teams t ON t.team_id = ct.team_id
            WHERE ct.competition_id = ANY($1)
            ORDER BY ct.competition_id, ct.home_away DESC
            "#,
        )
        .bind(competition_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<String, Vec<ParticipantRow>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.competition_id.clone())
                .or_default()
                .push(row);
        }

        Ok(grouped)
    }

    /// Distinct periods with at least one competition, most recent first
    pub async fn available_periods(&self, sport: Sport) -> Result<Vec<Period>> {
        let rows = sqlx::query_as::<_, PeriodRow>(
            r#"
            SELECT DISTINCT season, period, period_type
            FROM competitions
            WHERE sport = $1
            ORDER BY season DESC, period_type DESC, period DESC
            "#,
        )
        .bind(sport.as_str())
        .fetch_all(self.pool)
        .await?;

        let mut periods = rows
            .into_iter()
            .map(Period::try_from)
            .collect::<Result<Vec<_>>>()?;
        Period::sort_most_recent_first(&mut periods);

        Ok(periods)
    }
}
