use std::sync::Arc;

use storage::models::{Competition, Rating};
use storage::repository::{CompetitionStore, RatingWrite};

use crate::error::{RaterError, Result};
use crate::generator::RatingGenerator;
use crate::observer::{PipelineEvent, PipelineObserver, SkipReason};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRatingInput {
    pub competition_id: String,
    /// Regenerate even when a rating exists. Never replaces a rating from a
    /// higher priority source.
    pub force: bool,
}

impl GenerateRatingInput {
    pub fn new(competition_id: impl Into<String>) -> Self {
        Self {
            competition_id: competition_id.into(),
            force: false,
        }
    }

    pub fn forced(competition_id: impl Into<String>) -> Self {
        Self {
            competition_id: competition_id.into(),
            force: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RatingOutcome {
    Generated(Rating),
    /// The competition already carried a rating that was kept
    AlreadyRated(Rating),
}

impl RatingOutcome {
    pub fn rating(&self) -> &Rating {
        match self {
            Self::Generated(rating) | Self::AlreadyRated(rating) => rating,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}

/// Produces and stores the rating for one competition, at most once.
pub struct GenerateRating {
    store: Arc<dyn CompetitionStore>,
    generator: Arc<dyn RatingGenerator>,
    observer: Arc<dyn PipelineObserver>,
}

impl GenerateRating {
    pub fn new(
        store: Arc<dyn CompetitionStore>,
        generator: Arc<dyn RatingGenerator>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            store,
            generator,
            observer,
        }
    }

    pub async fn execute(&self, input: GenerateRatingInput) -> Result<RatingOutcome> {
        let competition = self.load(&input.competition_id).await?;

        if let Some(existing) = &competition.rating
            && let Some(reason) = self.skip_reason(existing, input.force)
        {
            self.observer.observe(&PipelineEvent::RatingSkipped {
                competition_id: &competition.competition_id,
                existing,
                reason,
            });
            return Ok(RatingOutcome::AlreadyRated(existing.clone()));
        }

        let rating = self.generator.produce_rating(&competition).await?;
        self.observer.observe(&PipelineEvent::RatingGenerated {
            competition_id: &competition.competition_id,
            rating: &rating,
        });

        let write = self.store.save_rating(&competition, &rating).await?;
        self.observer.observe(&PipelineEvent::RatingStored {
            competition_id: &competition.competition_id,
            write,
        });

        match write {
            RatingWrite::Stored => Ok(RatingOutcome::Generated(rating)),
            // Another writer got there first with a higher priority source
            RatingWrite::KeptExisting => {
                let existing = self.store.get_rating(&competition.competition_id).await?;
                Ok(RatingOutcome::AlreadyRated(existing))
            }
        }
    }

    async fn load(&self, competition_id: &str) -> Result<Competition> {
        self.store
            .get_competition_by_id(competition_id)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    RaterError::CompetitionNotFound(competition_id.to_string())
                } else {
                    e.into()
                }
            })
    }

    fn skip_reason(&self, existing: &Rating, force: bool) -> Option<SkipReason> {
        if !force {
            return Some(SkipReason::AlreadyRated);
        }
        if existing.source.priority() > self.generator.source().priority() {
            return Some(SkipReason::HigherPrioritySource);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        competition, rating, InMemoryStore, RecordingObserver, StubGenerator,
    };
    use std::sync::atomic::Ordering;
    use storage::models::{RatingCategory, RatingSource};

    struct Harness {
        store: Arc<InMemoryStore>,
        generator: Arc<StubGenerator>,
        observer: Arc<RecordingObserver>,
        use_case: GenerateRating,
    }

    fn harness(store: InMemoryStore, generator: StubGenerator) -> Harness {
        let store = Arc::new(store);
        let generator = Arc::new(generator);
        let observer = Arc::new(RecordingObserver::default());
        let use_case = GenerateRating::new(store.clone(), generator.clone(), observer.clone());
        Harness {
            store,
            generator,
            observer,
            use_case,
        }
    }

    #[tokio::test]
    async fn test_generates_then_short_circuits() {
        let h = harness(
            InMemoryStore::with_competitions(vec![competition("401547439")]),
            StubGenerator::scoring(92),
        );

        let first = h
            .use_case
            .execute(GenerateRatingInput::new("401547439"))
            .await
            .unwrap();
        assert!(first.is_generated());
        assert_eq!(first.rating().score.value(), 92);
        assert_eq!(first.rating().category(), RatingCategory::Amazing);

        let second = h
            .use_case
            .execute(GenerateRatingInput::new("401547439"))
            .await
            .unwrap();
        assert!(!second.is_generated());
        assert_eq!(second.rating().score.value(), 92);

        assert_eq!(h.generator.call_count(), 1);
        assert_eq!(h.store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(h.store.rating_count(), 1);
        assert_eq!(h.observer.count("rating_skipped"), 1);
    }

    #[tokio::test]
    async fn test_missing_competition_is_permanent() {
        let h = harness(InMemoryStore::default(), StubGenerator::scoring(50));

        let err = h
            .use_case
            .execute(GenerateRatingInput::new("999"))
            .await
            .unwrap_err();

        assert!(matches!(err, RaterError::CompetitionNotFound(ref id) if id == "999"));
        assert!(!err.is_retryable());
        assert_eq!(h.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generator_failure_writes_nothing() {
        let h = harness(
            InMemoryStore::with_competitions(vec![competition("1")]),
            StubGenerator::failing(),
        );

        let err = h
            .use_case
            .execute(GenerateRatingInput::new("1"))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(h.store.writes.load(Ordering::SeqCst), 0);
        assert!(h.store.stored_rating("1").is_none());
    }

    #[tokio::test]
    async fn test_save_failure_is_retryable() {
        let store = InMemoryStore::with_competitions(vec![competition("1")]);
        store.fail_saves();
        let h = harness(store, StubGenerator::scoring(70));

        let err = h
            .use_case
            .execute(GenerateRatingInput::new("1"))
            .await
            .unwrap_err();

        assert!(matches!(err, RaterError::StorageError(_)));
        assert!(err.is_retryable());
        assert_eq!(h.generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_force_regenerates_same_priority_rating() {
        let store = InMemoryStore::with_competitions(vec![competition("1")]);
        store.insert_rating("1", rating(40, RatingSource::Ollama));
        let h = harness(store, StubGenerator::scoring(88));

        let outcome = h
            .use_case
            .execute(GenerateRatingInput::forced("1"))
            .await
            .unwrap();

        assert!(outcome.is_generated());
        assert_eq!(h.store.stored_rating("1").unwrap().score.value(), 88);
    }

    #[tokio::test]
    async fn test_force_keeps_editorial_rating() {
        let store = InMemoryStore::with_competitions(vec![competition("1")]);
        store.insert_rating("1", rating(97, RatingSource::Editorial));
        let h = harness(store, StubGenerator::scoring(20));

        let outcome = h
            .use_case
            .execute(GenerateRatingInput::forced("1"))
            .await
            .unwrap();

        assert_eq!(outcome.rating().source, RatingSource::Editorial);
        assert_eq!(outcome.rating().score.value(), 97);
        assert_eq!(h.generator.call_count(), 0);
    }
}
