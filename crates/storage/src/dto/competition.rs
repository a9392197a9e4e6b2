use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{Result, StorageError};
use crate::models::{
    Competition, HomeAway, Period, PeriodType, Rating, Sport, Team, TeamParticipation, TeamRecord,
};

use super::rating::RatingResponse;

/// Row of the `competitions` table
#[derive(Debug, Clone, FromRow)]
pub struct CompetitionRow {
    pub competition_id: String,
    pub sport: String,
    pub season: i32,
    pub period: i32,
    pub period_type: i16,
    pub start_time: Option<DateTime<Utc>>,
}

/// One side of a competition joined with its team
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantRow {
    pub competition_id: String,
    pub team_id: String,
    pub display_name: String,
    pub abbreviation: Option<String>,
    pub logo_url: Option<String>,
    pub home_away: String,
    pub score: Option<i32>,
    pub wins: Option<i32>,
    pub losses: Option<i32>,
    pub ties: Option<i32>,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct PeriodRow {
    pub season: i32,
    pub period: i32,
    pub period_type: i16,
}

impl TryFrom<PeriodRow> for Period {
    type Error = StorageError;

    fn try_from(row: PeriodRow) -> Result<Self> {
        Ok(Period::new(
            row.season,
            row.period,
            PeriodType::try_from(row.period_type)?,
        ))
    }
}

impl TryFrom<ParticipantRow> for TeamParticipation {
    type Error = StorageError;

    fn try_from(row: ParticipantRow) -> Result<Self> {
        let record = match (row.wins, row.losses) {
            (Some(wins), Some(losses)) => {
                Some(TeamRecord::new(wins, losses, row.ties.unwrap_or(0)))
            }
            _ => None,
        };

        Ok(TeamParticipation {
            team: Team {
                team_id: row.team_id,
                display_name: row.display_name,
                abbreviation: row.abbreviation,
                logo_url: row.logo_url,
            },
            role: row.home_away.parse()?,
            score: row.score,
            record,
        })
    }
}

impl CompetitionRow {
    /// Converts the row and its participants into a validated [`Competition`].
    pub fn into_competition(
        self,
        participants: Vec<ParticipantRow>,
        rating: Option<Rating>,
    ) -> Result<Competition> {
        let sport: Sport = self.sport.parse()?;
        let period = Period::try_from(PeriodRow {
            season: self.season,
            period: self.period,
            period_type: self.period_type,
        })?;
        let participants = participants
            .into_iter()
            .map(TeamParticipation::try_from)
            .collect::<Result<Vec<_>>>()?;

        Competition::new(
            self.competition_id,
            sport,
            period,
            self.start_time,
            participants,
            rating,
        )
    }
}

/// Query parameters for the most-recent competitions listing
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
pub struct RecentCompetitionsQuery {
    /// Sport slug, e.g. `nfl`
    pub sport: String,

    #[validate(range(min = 1, max = 52, message = "max_periods must be between 1 and 52"))]
    pub max_periods: Option<usize>,

    #[validate(range(
        min = 1,
        max = 200,
        message = "max_competitions must be between 1 and 200"
    ))]
    pub max_competitions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipantResponse {
    pub team_id: String,
    pub display_name: String,
    pub abbreviation: Option<String>,
    pub logo_url: Option<String>,
    pub role: HomeAway,
    pub score: Option<i32>,
    pub record: Option<String>,
}

impl From<&TeamParticipation> for ParticipantResponse {
    fn from(participation: &TeamParticipation) -> Self {
        Self {
            team_id: participation.team.team_id.clone(),
            display_name: participation.team.display_name.clone(),
            abbreviation: participation.team.abbreviation.clone(),
            logo_url: participation.team.logo_url.clone(),
            role: participation.role,
            score: participation.score,
            record: participation.record.map(|r| r.to_string()),
        }
    }
}

/// Response containing competition details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompetitionResponse {
    pub competition_id: String,
    pub sport: Sport,
    pub season: i32,
    pub period: i32,
    pub period_type: PeriodType,
    pub start_time: Option<DateTime<Utc>>,
    pub matchup: String,
    pub home: ParticipantResponse,
    pub away: ParticipantResponse,
    pub rating: Option<RatingResponse>,
}

impl From<Competition> for CompetitionResponse {
    fn from(competition: Competition) -> Self {
        Self {
            matchup: competition.matchup(),
            home: ParticipantResponse::from(competition.home()),
            away: ParticipantResponse::from(competition.away()),
            competition_id: competition.competition_id,
            sport: competition.sport,
            season: competition.period.season,
            period: competition.period.period,
            period_type: competition.period.period_type,
            start_time: competition.start_time,
            rating: competition.rating.map(RatingResponse::from),
        }
    }
}

/// Most recent competitions of a sport, newest period first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecentCompetitionsResponse {
    pub competitions: Vec<CompetitionResponse>,
    pub periods_examined: usize,
    /// Periods skipped because they could not be loaded
    pub failed_periods: Vec<Period>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant_row(team_id: &str, role: &str) -> ParticipantRow {
        ParticipantRow {
            competition_id: "401547439".to_string(),
            team_id: team_id.to_string(),
            display_name: format!("Team {}", team_id),
            abbreviation: None,
            logo_url: None,
            home_away: role.to_string(),
            score: Some(17),
            wins: Some(4),
            losses: Some(5),
            ties: None,
        }
    }

    fn competition_row() -> CompetitionRow {
        CompetitionRow {
            competition_id: "401547439".to_string(),
            sport: "nfl".to_string(),
            season: 2023,
            period: 10,
            period_type: 2,
            start_time: None,
        }
    }

    #[test]
    fn test_rows_convert_to_competition() {
        let competition = competition_row()
            .into_competition(
                vec![participant_row("22", "away"), participant_row("1", "home")],
                None,
            )
            .unwrap();

        assert_eq!(competition.sport, Sport::Nfl);
        assert_eq!(competition.period, Period::new(2023, 10, PeriodType::Regular));
        assert_eq!(competition.home().team.team_id, "1");
        assert_eq!(competition.away().record, Some(TeamRecord::new(4, 5, 0)));
    }

    #[test]
    fn test_invalid_rows_are_rejected() {
        let bad_role = competition_row().into_competition(
            vec![participant_row("22", "visitor"), participant_row("1", "home")],
            None,
        );
        assert!(bad_role.is_err());

        let mut row = competition_row();
        row.period_type = 9;
        let bad_period = row.into_competition(
            vec![participant_row("22", "away"), participant_row("1", "home")],
            None,
        );
        assert!(bad_period.is_err());
    }

    #[test]
    fn test_query_limits_are_validated() {
        let query = RecentCompetitionsQuery {
            sport: "nfl".to_string(),
            max_periods: Some(0),
            max_competitions: Some(50),
        };
        assert!(query.validate().is_err());

        let query = RecentCompetitionsQuery {
            sport: "nfl".to_string(),
            max_periods: None,
            max_competitions: None,
        };
        assert!(query.validate().is_ok());
    }
}
