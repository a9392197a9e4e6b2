use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::StorageError;

/// Excitement score, always within 0..=100.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct RatingScore(u8);

impl RatingScore {
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Result<Self, StorageError> {
        if (0..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(StorageError::invalid(format!(
                "rating score {} is outside 0..=100",
                value
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn category(&self) -> RatingCategory {
        RatingCategory::from_score(*self)
    }
}

impl TryFrom<i64> for RatingScore {
    type Error = StorageError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingScore> for i64 {
    fn from(score: RatingScore) -> Self {
        i64::from(score.0)
    }
}

impl fmt::Display for RatingScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RatingCategory {
    Boring,
    Okay,
    Good,
    Great,
    Amazing,
    Legendary,
}

impl RatingCategory {
    pub const ALL: [RatingCategory; 6] = [
        Self::Boring,
        Self::Okay,
        Self::Good,
        Self::Great,
        Self::Amazing,
        Self::Legendary,
    ];

    /// Band lookup. The bands are contiguous and cover 0..=100 exactly once.
    pub fn from_score(score: RatingScore) -> Self {
        match score.value() {
            0..=39 => Self::Boring,
            40..=59 => Self::Okay,
            60..=74 => Self::Good,
            75..=84 => Self::Great,
            85..=94 => Self::Amazing,
            _ => Self::Legendary,
        }
    }

    /// Inclusive score range of the band.
    pub fn bounds(&self) -> (u8, u8) {
        match self {
            Self::Boring => (0, 39),
            Self::Okay => (40, 59),
            Self::Good => (60, 74),
            Self::Great => (75, 84),
            Self::Amazing => (85, 94),
            Self::Legendary => (95, 100),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boring => "boring",
            Self::Okay => "okay",
            Self::Good => "good",
            Self::Great => "great",
            Self::Amazing => "amazing",
            Self::Legendary => "legendary",
        }
    }
}

impl fmt::Display for RatingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced a rating. Higher priority sources are never replaced by
/// lower priority ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RatingSource {
    Editorial,
    Ollama,
    OpenAi,
    Anthropic,
}

impl RatingSource {
    pub fn priority(&self) -> i16 {
        match self {
            Self::Editorial => 100,
            Self::Ollama | Self::OpenAi | Self::Anthropic => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Editorial => "editorial",
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

impl FromStr for RatingSource {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "editorial" => Ok(Self::Editorial),
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(StorageError::invalid(format!(
                "unknown rating source '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for RatingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RatingType {
    Excitement,
    Sentiment,
}

impl RatingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excitement => "excitement",
            Self::Sentiment => "sentiment",
        }
    }
}

impl FromStr for RatingType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excitement" => Ok(Self::Excitement),
            "sentiment" => Ok(Self::Sentiment),
            other => Err(StorageError::invalid(format!(
                "unknown rating type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for RatingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Rating {
    pub score: RatingScore,
    pub explanation: String,
    pub spoiler_free_explanation: String,
    pub source: RatingSource,
    pub rating_type: RatingType,
    pub generated_at: DateTime<Utc>,
}

impl Rating {
    pub fn category(&self) -> RatingCategory {
        self.score.category()
    }

    /// Whether this rating may replace `existing`.
    pub fn supersedes(&self, existing: &Rating) -> bool {
        self.source.priority() >= existing.source.priority()
    }
}
