use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use storage::models::{Competition, Rating, RatingScore, RatingSource, RatingType};

use super::{OllamaClient, PromptBuilder, PromptVariant, RatingGenerator};
use crate::error::{RaterError, Result};

/// Shape the model is asked to answer with
#[derive(Debug, Deserialize)]
struct GeneratedRating {
    score: f64,
    explanation: String,
    #[serde(alias = "spoilerFreeExplanation")]
    spoiler_free_explanation: String,
}

/// [`RatingGenerator`] backed by a local Ollama model
pub struct OllamaRatingGenerator {
    client: OllamaClient,
    variant: PromptVariant,
    timeout: Duration,
}

impl OllamaRatingGenerator {
    pub fn new(client: OllamaClient, variant: PromptVariant, timeout: Duration) -> Self {
        Self {
            client,
            variant,
            timeout,
        }
    }

    pub fn variant(&self) -> PromptVariant {
        self.variant
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }
}

#[async_trait]
impl RatingGenerator for OllamaRatingGenerator {
    fn source(&self) -> RatingSource {
        RatingSource::Ollama
    }

    async fn produce_rating(&self, competition: &Competition) -> Result<Rating> {
        let system_prompt = PromptBuilder::system_prompt(self.variant);
        let user_prompt = PromptBuilder::user_prompt(competition);

        let raw = tokio::time::timeout(
            self.timeout,
            self.client.generate_json(&system_prompt, &user_prompt, None),
        )
        .await
        .map_err(|_| RaterError::GenerationTimeout(self.timeout.as_secs()))??;

        parse_rating(&raw, self.source())
    }
}

/// Validates a raw model answer and turns it into a [`Rating`].
pub fn parse_rating(raw: &str, source: RatingSource) -> Result<Rating> {
    let generated: GeneratedRating = serde_json::from_str(raw.trim())
        .map_err(|e| RaterError::InvalidResponse(format!("{} in {:?}", e, truncate(raw))))?;

    if !generated.score.is_finite() {
        return Err(RaterError::InvalidResponse(format!(
            "score {} is not a number",
            generated.score
        )));
    }
    let score = RatingScore::new(generated.score.round() as i64)
        .map_err(|e| RaterError::InvalidResponse(e.to_string()))?;

    let explanation = generated.explanation.trim();
    let spoiler_free_explanation = generated.spoiler_free_explanation.trim();
    if explanation.is_empty() || spoiler_free_explanation.is_empty() {
        return Err(RaterError::InvalidResponse(
            "both explanations are required".to_string(),
        ));
    }

    Ok(Rating {
        score,
        explanation: explanation.to_string(),
        spoiler_free_explanation: spoiler_free_explanation.to_string(),
        source,
        rating_type: RatingType::Excitement,
        generated_at: Utc::now(),
    })
}

fn truncate(raw: &str) -> String {
    raw.chars().take(120).collect()
}
