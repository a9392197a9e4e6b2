use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Result, StorageError};
use crate::models::{Period, Rating, Sport, Team, TeamRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HomeAway {
    Home,
    Away,
}

impl HomeAway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Away => "away",
        }
    }
}

impl FromStr for HomeAway {
    type Err = StorageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "home" => Ok(Self::Home),
            "away" => Ok(Self::Away),
            other => Err(StorageError::invalid(format!(
                "unknown home/away role '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for HomeAway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TeamParticipation {
    pub team: Team,
    pub role: HomeAway,
    pub score: Option<i32>,
    pub record: Option<TeamRecord>,
}

/// One match between a home and an away team.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Competition {
    pub competition_id: String,
    pub sport: Sport,
    pub period: Period,
    pub start_time: Option<DateTime<Utc>>,
    participants: Vec<TeamParticipation>,
    pub rating: Option<Rating>,
}

impl Competition {
    /// Builds a competition, checking that exactly one participant plays at
    /// home and exactly one away. Participants are kept home first.
    pub fn new(
        competition_id: impl Into<String>,
        sport: Sport,
        period: Period,
        start_time: Option<DateTime<Utc>>,
        participants: Vec<TeamParticipation>,
        rating: Option<Rating>,
    ) -> Result<Self> {
        let competition_id = competition_id.into();
        if competition_id.trim().is_empty() {
            return Err(StorageError::invalid("competition id cannot be empty"));
        }

        let homes = participants
            .iter()
            .filter(|p| p.role == HomeAway::Home)
            .count();
        let aways = participants
            .iter()
            .filter(|p| p.role == HomeAway::Away)
            .count();

        if participants.len() != 2 || homes != 1 || aways != 1 {
            return Err(StorageError::invalid(format!(
                "competition {} must have one home and one away team (got {} home, {} away)",
                competition_id, homes, aways
            )));
        }

        let mut participants = participants;
        participants.sort_by_key(|p| p.role != HomeAway::Home);

        Ok(Self {
            competition_id,
            sport,
            period,
            start_time,
            participants,
            rating,
        })
    }

    pub fn participants(&self) -> &[TeamParticipation] {
        &self.participants
    }

    pub fn home(&self) -> &TeamParticipation {
        &self.participants[0]
    }

    pub fn away(&self) -> &TeamParticipation {
        &self.participants[1]
    }

    pub fn is_rated(&self) -> bool {
        self.rating.is_some()
    }

    /// Whether `candidate` may be stored as this competition's rating.
    pub fn accepts(&self, candidate: &Rating) -> bool {
        self.rating
            .as_ref()
            .is_none_or(|existing| candidate.supersedes(existing))
    }

    pub fn matchup(&self) -> String {
        format!(
            "{} @ {}",
            self.away().team.display_name,
            self.home().team.display_name
        )
    }

    pub fn with_rating(mut self, rating: Option<Rating>) -> Self {
        self.rating = rating;
        self
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::{PeriodType, RatingScore, RatingSource, RatingType};

    #[test]
    fn test_home_is_first_regardless_of_input_order() {
        let competition = competition("401547439");

        assert_eq!(competition.home().team.display_name, "Arizona Cardinals");
        assert_eq!(competition.away().team.display_name, "Atlanta Falcons");
        assert_eq!(
            competition.matchup(),
            "Atlanta Falcons @ Arizona Cardinals"
        );
    }

    #[test]
    fn test_rejects_two_home_teams() {
        let result = Competition::new(
            "1",
            Sport::Nfl,
            Period::new(2023, 1, PeriodType::Regular),
            None,
            vec![
                participation("1", "A", HomeAway::Home, 0),
                participation("2", "B", HomeAway::Home, 0),
            ],
            None,
        );

        assert!(matches!(result, Err(StorageError::InvalidRecord(_))));
    }

    #[test]
    fn test_rejects_missing_opponent() {
        let result = Competition::new(
            "1",
            Sport::Nfl,
            Period::new(2023, 1, PeriodType::Regular),
            None,
            vec![participation("1", "A", HomeAway::Home, 0)],
            None,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_accepts_respects_source_priority() {
        let editorial = Rating {
            score: RatingScore::new(80).unwrap(),
            explanation: String::new(),
            spoiler_free_explanation: String::new(),
            source: RatingSource::Editorial,
            rating_type: RatingType::Excitement,
            generated_at: Utc::now(),
        };
        let model = Rating {
            source: RatingSource::Ollama,
            ..editorial.clone()
        };

        let unrated = competition("1");
        assert!(!unrated.is_rated());
        assert!(unrated.accepts(&model));

        let rated = competition("1").with_rating(Some(editorial));
        assert!(rated.is_rated());
        assert!(!rated.accepts(&model));
    }
}
