use std::path::PathBuf;
use std::sync::Arc;

use storage::repository::CompetitionStore;

use crate::error::{RaterError, Result};
use crate::export::{EvaluationExporter, EvaluationRecord};
use crate::generator::{PromptVariant, RatingGenerator};

/// Rates a competition with one prompt variant and writes the result to an
/// export file. Nothing is persisted to the store.
pub struct EvaluateRating {
    store: Arc<dyn CompetitionStore>,
    generator: Arc<dyn RatingGenerator>,
    variant: PromptVariant,
    exporter: EvaluationExporter,
}

impl EvaluateRating {
    pub fn new(
        store: Arc<dyn CompetitionStore>,
        generator: Arc<dyn RatingGenerator>,
        variant: PromptVariant,
        exporter: EvaluationExporter,
    ) -> Self {
        Self {
            store,
            generator,
            variant,
            exporter,
        }
    }

    pub async fn execute(&self, competition_id: &str) -> Result<(EvaluationRecord, PathBuf)> {
        let competition = self
            .store
            .get_competition_by_id(competition_id)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    RaterError::CompetitionNotFound(competition_id.to_string())
                } else {
                    e.into()
                }
            })?;

        let rating = self.generator.produce_rating(&competition).await?;
        let record = EvaluationRecord::new(&competition, self.variant, &rating);
        let path = self.exporter.write(&record).await?;

        Ok((record, path))
    }
}
