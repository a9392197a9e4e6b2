use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{
    Competition, HomeAway, Period, PeriodType, Rating, RatingCategory, RatingScore, RatingSource,
    RatingType, Sport, TeamParticipation,
};

/// Immutable copy of the competition as it looked when it was rated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionSnapshot {
    pub competition_id: String,
    pub sport: Sport,
    pub period: Period,
    pub start_time: Option<DateTime<Utc>>,
    pub participants: Vec<TeamParticipation>,
    pub captured_at: DateTime<Utc>,
}

impl From<&Competition> for CompetitionSnapshot {
    fn from(competition: &Competition) -> Self {
        Self {
            competition_id: competition.competition_id.clone(),
            sport: competition.sport,
            period: competition.period,
            start_time: competition.start_time,
            participants: competition.participants().to_vec(),
            captured_at: Utc::now(),
        }
    }
}

/// Row of the `ratings` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RatingRecord {
    pub competition_id: String,
    pub sport: String,
    pub season: i32,
    pub period: i32,
    pub period_type: i16,
    pub score: i16,
    pub explanation: String,
    pub spoiler_free_explanation: String,
    pub source: String,
    pub source_priority: i16,
    pub rating_type: String,
    pub generated_at: DateTime<Utc>,
    pub snapshot: Json<CompetitionSnapshot>,
}

impl RatingRecord {
    pub fn new(competition: &Competition, rating: &Rating) -> Self {
        Self {
            competition_id: competition.competition_id.clone(),
            sport: competition.sport.as_str().to_string(),
            season: competition.period.season,
            period: competition.period.period,
            period_type: competition.period.period_type.code(),
            score: i16::from(rating.score.value()),
            explanation: rating.explanation.clone(),
            spoiler_free_explanation: rating.spoiler_free_explanation.clone(),
            source: rating.source.as_str().to_string(),
            source_priority: rating.source.priority(),
            rating_type: rating.rating_type.as_str().to_string(),
            generated_at: rating.generated_at,
            snapshot: Json(CompetitionSnapshot::from(competition)),
        }
    }

    pub fn period(&self) -> Result<Period> {
        Ok(Period::new(
            self.season,
            self.period,
            PeriodType::try_from(self.period_type)?,
        ))
    }

    pub fn to_rating(&self) -> Result<Rating> {
        Ok(Rating {
            score: RatingScore::new(i64::from(self.score))?,
            explanation: self.explanation.clone(),
            spoiler_free_explanation: self.spoiler_free_explanation.clone(),
            source: self.source.parse()?,
            rating_type: self.rating_type.parse()?,
            generated_at: self.generated_at,
        })
    }
}

impl TryFrom<RatingRecord> for Rating {
    type Error = StorageError;

    fn try_from(record: RatingRecord) -> Result<Self> {
        record.to_rating()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatingResponse {
    pub score: u8,
    pub category: RatingCategory,
    pub explanation: String,
    pub spoiler_free_explanation: String,
    pub source: RatingSource,
    pub rating_type: RatingType,
    pub generated_at: DateTime<Utc>,
}

impl From<Rating> for RatingResponse {
    fn from(rating: Rating) -> Self {
        Self {
            score: rating.score.value(),
            category: rating.category(),
            explanation: rating.explanation,
            spoiler_free_explanation: rating.spoiler_free_explanation,
            source: rating.source,
            rating_type: rating.rating_type,
            generated_at: rating.generated_at,
        }
    }
}

/// One entry of the recently rated listing, built from the stored snapshot
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatedCompetitionEntry {
    pub competition_id: String,
    pub sport: Sport,
    pub period: Period,
    pub matchup: String,
    pub rating: RatingResponse,
}

impl TryFrom<RatingRecord> for RatedCompetitionEntry {
    type Error = StorageError;

    fn try_from(record: RatingRecord) -> Result<Self> {
        let rating = record.to_rating()?;
        let period = record.period()?;
        let sport = record.sport.parse()?;
        let team = |role: HomeAway| {
            record
                .snapshot
                .participants
                .iter()
                .find(|p| p.role == role)
                .map(|p| p.team.display_name.clone())
                .unwrap_or_default()
        };
        let matchup = format!("{} @ {}", team(HomeAway::Away), team(HomeAway::Home));

        Ok(Self {
            competition_id: record.competition_id.clone(),
            sport,
            period,
            matchup,
            rating: RatingResponse::from(rating),
        })
    }
}

/// Request payload for queueing a rating job
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct EnqueueRatingRequest {
    /// Regenerate even if the competition already has a rating
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnqueueRatingResponse {
    pub job_id: Uuid,
    pub competition_id: String,
    pub kind: String,
}
