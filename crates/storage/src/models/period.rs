use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Sport {
    Nfl,
    CollegeFootball,
    Nba,
    Mlb,
    Nhl,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nfl => "nfl",
            Self::CollegeFootball => "college-football",
            Self::Nba => "nba",
            Self::Mlb => "mlb",
            Self::Nhl => "nhl",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nfl" => Ok(Self::Nfl),
            "college-football" | "ncaaf" => Ok(Self::CollegeFootball),
            "nba" => Ok(Self::Nba),
            "mlb" => Ok(Self::Mlb),
            "nhl" => Ok(Self::Nhl),
            other => Err(StorageError::invalid(format!("unknown sport '{}'", other))),
        }
    }
}

/// Stage of the season a period belongs to. The numeric codes are the stored
/// representation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Pre = 1,
    Regular = 2,
    Post = 3,
}

impl PeriodType {
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::Regular => "regular",
            Self::Post => "post",
        }
    }
}

impl TryFrom<i16> for PeriodType {
    type Error = StorageError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Pre),
            2 => Ok(Self::Regular),
            3 => Ok(Self::Post),
            other => Err(StorageError::invalid(format!(
                "unknown period type code {}",
                other
            ))),
        }
    }
}

impl FromStr for PeriodType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pre" | "preseason" => Ok(Self::Pre),
            "regular" => Ok(Self::Regular),
            "post" | "postseason" => Ok(Self::Post),
            other => Err(StorageError::invalid(format!(
                "unknown period type '{}'",
                other
            ))),
        }
    }
}

/// A season/week/type triple identifying one batch of competitions.
///
/// Ordering is chronological: season first, then season stage, then the
/// period number. Use [`Period::sort_most_recent_first`] for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Period {
    pub season: i32,
    pub period: i32,
    pub period_type: PeriodType,
}

impl Period {
    pub fn new(season: i32, period: i32, period_type: PeriodType) -> Self {
        Self {
            season,
            period,
            period_type,
        }
    }

    pub fn sort_most_recent_first(periods: &mut [Period]) {
        periods.sort_by(|a, b| b.cmp(a));
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.season
            .cmp(&other.season)
            .then(self.period_type.cmp(&other.period_type))
            .then(self.period.cmp(&other.period))
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} week {}",
            self.season,
            self.period_type.as_str(),
            self.period
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_recent_first_ordering() {
        let mut periods = vec![
            Period::new(2023, 18, PeriodType::Regular),
            Period::new(2024, 1, PeriodType::Post),
            Period::new(2024, 3, PeriodType::Pre),
            Period::new(2024, 17, PeriodType::Regular),
            Period::new(2024, 2, PeriodType::Regular),
        ];

        Period::sort_most_recent_first(&mut periods);

        assert_eq!(
            periods,
            vec![
                Period::new(2024, 1, PeriodType::Post),
                Period::new(2024, 17, PeriodType::Regular),
                Period::new(2024, 2, PeriodType::Regular),
                Period::new(2024, 3, PeriodType::Pre),
                Period::new(2023, 18, PeriodType::Regular),
            ]
        );
    }

    #[test]
    fn test_period_type_codes() {
        for period_type in [PeriodType::Pre, PeriodType::Regular, PeriodType::Post] {
            assert_eq!(PeriodType::try_from(period_type.code()).unwrap(), period_type);
        }
        assert!(PeriodType::try_from(0).is_err());
        assert!(PeriodType::try_from(4).is_err());
    }

    #[test]
    fn test_sport_parsing() {
        assert_eq!("NFL".parse::<Sport>().unwrap(), Sport::Nfl);
        assert_eq!("ncaaf".parse::<Sport>().unwrap(), Sport::CollegeFootball);
        assert_eq!(Sport::CollegeFootball.to_string(), "college-football");
        assert!("cricket".parse::<Sport>().is_err());
    }

    #[test]
    fn test_period_display() {
        let period = Period::new(2024, 5, PeriodType::Regular);
        assert_eq!(period.to_string(), "2024 regular week 5");
    }
}
