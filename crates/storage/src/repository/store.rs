use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{CompetitionRepository, CompetitionStore, RatingRepository, RatingWrite};
use crate::dto::competition::CompetitionRow;
use crate::dto::rating::RatingRecord;
use crate::error::{Result, StorageError};
use crate::models::{Competition, Period, Rating, Sport};

/// PostgreSQL implementation of [`CompetitionStore`]
#[derive(Clone)]
pub struct PgCompetitionStore {
    pool: PgPool,
}

impl PgCompetitionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn assemble(&self, rows: Vec<CompetitionRow>) -> Result<Vec<Competition>> {
        let ids: Vec<String> = rows.iter().map(|r| r.competition_id.clone()).collect();

        let mut participants = CompetitionRepository::new(&self.pool)
            .participants_for(&ids)
            .await?;

        let mut ratings: HashMap<String, Rating> = HashMap::new();
        for record in RatingRepository::new(&self.pool)
            .find_by_competitions(&ids)
            .await?
        {
            let competition_id = record.competition_id.clone();
            ratings.insert(competition_id, Rating::try_from(record)?);
        }

        rows.into_iter()
            .map(|row| {
                let teams = participants
                    .remove(&row.competition_id)
                    .unwrap_or_default();
                let rating = ratings.remove(&row.competition_id);
                row.into_competition(teams, rating)
            })
            .collect()
    }
}

#[async_trait]
impl CompetitionStore for PgCompetitionStore {
    async fn get_competition_by_id(&self, competition_id: &str) -> Result<Competition> {
        let row = CompetitionRepository::new(&self.pool)
            .find_by_id(competition_id)
            .await?;

        self.assemble(vec![row])
            .await?
            .pop()
            .ok_or(StorageError::NotFound)
    }

    async fn find_by_period(&self, sport: Sport, period: Period) -> Result<Vec<Competition>> {
        let rows = CompetitionRepository::new(&self.pool)
            .find_by_period(sport, period)
            .await?;

        self.assemble(rows).await
    }

    async fn get_available_periods(&self, sport: Sport) -> Result<Vec<Period>> {
        CompetitionRepository::new(&self.pool)
            .available_periods(sport)
            .await
    }

    async fn save_rating(&self, competition: &Competition, rating: &Rating) -> Result<RatingWrite> {
        let record = RatingRecord::new(competition, rating);
        RatingRepository::new(&self.pool).upsert(&record).await
    }

    async fn get_rating(&self, competition_id: &str) -> Result<Rating> {
        let record = RatingRepository::new(&self.pool)
            .find_by_competition(competition_id)
            .await?;

        record.to_rating()
    }
}
