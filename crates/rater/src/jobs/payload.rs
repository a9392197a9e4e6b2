use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{RaterError, Result};

/// Every job kind this service knows how to consume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    SentimentAnalysis,
}

impl JobKind {
    pub const ALL: [JobKind; 1] = [JobKind::SentimentAnalysis];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SentimentAnalysis => "sentiment_analysis",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = RaterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sentiment_analysis" => Ok(Self::SentimentAnalysis),
            other => Err(RaterError::UnknownJobKind(other.to_string())),
        }
    }
}

/// Arguments of a `sentiment_analysis` job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SentimentAnalysisArgs {
    #[validate(custom(function = "validate_competition_id"))]
    pub competition_id: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force: bool,
}

fn validate_competition_id(competition_id: &str) -> std::result::Result<(), ValidationError> {
    if competition_id.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some("competition_id must not be empty".into());
        return Err(error);
    }
    Ok(())
}

/// Decoded job arguments, one variant per [`JobKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPayload {
    SentimentAnalysis(SentimentAnalysisArgs),
}

impl JobPayload {
    pub fn sentiment_analysis(competition_id: impl Into<String>, force: bool) -> Self {
        Self::SentimentAnalysis(SentimentAnalysisArgs {
            competition_id: competition_id.into(),
            force,
        })
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Self::SentimentAnalysis(_) => JobKind::SentimentAnalysis,
        }
    }

    pub fn competition_id(&self) -> &str {
        match self {
            Self::SentimentAnalysis(args) => &args.competition_id,
        }
    }

    /// Resolves the stored kind tag and JSON arguments into a typed payload.
    /// Every failure here is permanent: the same bytes will never decode.
    pub fn decode(kind: &str, args: &serde_json::Value) -> Result<Self> {
        match kind.parse::<JobKind>()? {
            JobKind::SentimentAnalysis => {
                let args: SentimentAnalysisArgs = serde_json::from_value(args.clone())
                    .map_err(|e| RaterError::InvalidPayload(e.to_string()))?;
                args.validate()
                    .map_err(|e| RaterError::InvalidPayload(e.to_string()))?;
                Ok(Self::SentimentAnalysis(args))
            }
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        let value = match self {
            Self::SentimentAnalysis(args) => serde_json::to_value(args)?,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_sentiment_analysis() {
        let payload =
            JobPayload::decode("sentiment_analysis", &json!({"competition_id": "401547439"}))
                .unwrap();

        assert_eq!(payload, JobPayload::sentiment_analysis("401547439", false));
        assert_eq!(payload.kind(), JobKind::SentimentAnalysis);
        assert_eq!(payload.competition_id(), "401547439");
    }

    #[test]
    fn test_force_flag_is_optional() {
        let payload = JobPayload::decode(
            "sentiment_analysis",
            &json!({"competition_id": "1", "force": true}),
        )
        .unwrap();
        assert_eq!(payload, JobPayload::sentiment_analysis("1", true));

        let json = JobPayload::sentiment_analysis("1", false).to_json().unwrap();
        assert_eq!(json, json!({"competition_id": "1"}));
    }

    #[test]
    fn test_rejects_bad_payloads() {
        let cases = [
            json!({"competition_id": ""}),
            json!({"competition_id": "   "}),
            json!({}),
            json!({"competition_id": 401547439}),
            json!("401547439"),
        ];

        for args in cases {
            let err = JobPayload::decode("sentiment_analysis", &args).unwrap_err();
            assert!(matches!(err, RaterError::InvalidPayload(_)), "{}", args);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let err = JobPayload::decode("box_score_sync", &json!({"competition_id": "1"}))
            .unwrap_err();
        assert!(matches!(err, RaterError::UnknownJobKind(_)));
        assert!(!err.is_retryable());
    }
}
