//! In-memory doubles for the store, generator, queue and observer.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use storage::models::{
    Competition, HomeAway, Period, PeriodType, Rating, RatingScore, RatingSource, RatingType,
    Sport, Team, TeamParticipation, TeamRecord,
};
use storage::repository::{CompetitionStore, RatingWrite};
use storage::StorageError;
use uuid::Uuid;

use crate::error::{RaterError, Result};
use crate::generator::RatingGenerator;
use crate::jobs::{Job, JobKind, JobPayload, JobQueue};
use crate::observer::{PipelineEvent, PipelineObserver};

fn participation(id: &str, name: &str, role: HomeAway, score: i32) -> TeamParticipation {
    TeamParticipation {
        team: Team {
            team_id: id.to_string(),
            display_name: name.to_string(),
            abbreviation: None,
            logo_url: None,
        },
        role,
        score: Some(score),
        record: Some(TeamRecord::new(10, 7, 0)),
    }
}

pub fn competition_in(id: &str, period: Period) -> Competition {
    Competition::new(
        id,
        Sport::Nfl,
        period,
        None,
        vec![
            participation("1", "Atlanta Falcons", HomeAway::Away, 23),
            participation("22", "Arizona Cardinals", HomeAway::Home, 25),
        ],
        None,
    )
    .unwrap()
}

pub fn competition(id: &str) -> Competition {
    competition_in(id, Period::new(2023, 10, PeriodType::Regular))
}

pub fn rating(score: i64, source: RatingSource) -> Rating {
    Rating {
        score: RatingScore::new(score).unwrap(),
        explanation: format!("Scored {}", score),
        spoiler_free_explanation: "A game worth talking about.".to_string(),
        source,
        rating_type: RatingType::Excitement,
        generated_at: Utc::now(),
    }
}

fn unavailable() -> StorageError {
    StorageError::Database(sqlx::Error::PoolTimedOut)
}

#[derive(Default)]
pub struct InMemoryStore {
    competitions: Mutex<Vec<Competition>>,
    ratings: Mutex<HashMap<String, Rating>>,
    failing_periods: Mutex<HashSet<Period>>,
    fail_saves: AtomicBool,
    pub competition_reads: AtomicUsize,
    pub period_reads: AtomicUsize,
    pub rating_reads: AtomicUsize,
    pub writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn with_competitions(competitions: Vec<Competition>) -> Self {
        let store = Self::default();
        *store.competitions.lock().unwrap() = competitions;
        store
    }

    pub fn insert_rating(&self, competition_id: &str, rating: Rating) {
        self.ratings
            .lock()
            .unwrap()
            .insert(competition_id.to_string(), rating);
    }

    pub fn stored_rating(&self, competition_id: &str) -> Option<Rating> {
        self.ratings.lock().unwrap().get(competition_id).cloned()
    }

    pub fn rating_count(&self) -> usize {
        self.ratings.lock().unwrap().len()
    }

    pub fn fail_period(&self, period: Period) {
        self.failing_periods.lock().unwrap().insert(period);
    }

    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    pub fn total_calls(&self) -> usize {
        self.competition_reads.load(Ordering::SeqCst)
            + self.period_reads.load(Ordering::SeqCst)
            + self.rating_reads.load(Ordering::SeqCst)
            + self.writes.load(Ordering::SeqCst)
    }

    fn attach_rating(&self, competition: &Competition) -> Competition {
        let rating = self.stored_rating(&competition.competition_id);
        competition.clone().with_rating(rating)
    }
}

#[async_trait]
impl CompetitionStore for InMemoryStore {
    async fn get_competition_by_id(&self, competition_id: &str) -> storage::Result<Competition> {
        self.competition_reads.fetch_add(1, Ordering::SeqCst);
        let competitions = self.competitions.lock().unwrap();
        competitions
            .iter()
            .find(|c| c.competition_id == competition_id)
            .map(|c| self.attach_rating(c))
            .ok_or(StorageError::NotFound)
    }

    async fn find_by_period(&self, sport: Sport, period: Period) -> storage::Result<Vec<Competition>> {
        self.period_reads.fetch_add(1, Ordering::SeqCst);
        if self.failing_periods.lock().unwrap().contains(&period) {
            return Err(unavailable());
        }
        let competitions = self.competitions.lock().unwrap();
        Ok(competitions
            .iter()
            .filter(|c| c.sport == sport && c.period == period)
            .map(|c| self.attach_rating(c))
            .collect())
    }

    async fn get_available_periods(&self, sport: Sport) -> storage::Result<Vec<Period>> {
        let competitions = self.competitions.lock().unwrap();
        let mut periods: Vec<Period> = competitions
            .iter()
            .filter(|c| c.sport == sport)
            .map(|c| c.period)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        Period::sort_most_recent_first(&mut periods);
        Ok(periods)
    }

    async fn save_rating(
        &self,
        competition: &Competition,
        rating: &Rating,
    ) -> storage::Result<RatingWrite> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut ratings = self.ratings.lock().unwrap();
        if let Some(existing) = ratings.get(&competition.competition_id)
            && !rating.supersedes(existing)
        {
            return Ok(RatingWrite::KeptExisting);
        }
        ratings.insert(competition.competition_id.clone(), rating.clone());
        Ok(RatingWrite::Stored)
    }

    async fn get_rating(&self, competition_id: &str) -> storage::Result<Rating> {
        self.rating_reads.fetch_add(1, Ordering::SeqCst);
        self.stored_rating(competition_id)
            .ok_or(StorageError::NotFound)
    }
}

pub struct StubGenerator {
    score: Option<i64>,
    source: RatingSource,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl StubGenerator {
    pub fn scoring(score: i64) -> Self {
        Self {
            score: Some(score),
            source: RatingSource::Ollama,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            score: None,
            source: RatingSource::Ollama,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Each call sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RatingGenerator for StubGenerator {
    fn source(&self) -> RatingSource {
        self.source
    }

    async fn produce_rating(&self, _competition: &Competition) -> Result<Rating> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.score {
            Some(score) => Ok(rating(score, self.source)),
            None => Err(RaterError::GenerationError("upstream returned 503".to_string())),
        }
    }
}

#[derive(Default)]
pub struct InMemoryQueue {
    pending: Mutex<VecDeque<Job>>,
    pub enqueued: Mutex<Vec<JobPayload>>,
    pub completed: Mutex<Vec<Uuid>>,
    pub failed: Mutex<Vec<(Uuid, String)>>,
    pub discarded: Mutex<Vec<(Uuid, String)>>,
    unavailable: AtomicBool,
}

impl InMemoryQueue {
    pub fn push_raw(&self, kind: &str, payload: serde_json::Value) -> Uuid {
        self.push_attempt(kind, payload, 1)
    }

    /// Queues a job as if it had already been delivered `attempt - 1` times
    pub fn push_attempt(&self, kind: &str, payload: serde_json::Value, attempt: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.pending.lock().unwrap().push_back(Job {
            id,
            kind: kind.to_string(),
            payload,
            attempt,
            max_attempts: 5,
        });
        id
    }

    pub fn set_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.lock().unwrap().len()
    }
}

#[async_trait]
impl JobQueue for InMemoryQueue {
    async fn enqueue(&self, payload: &JobPayload) -> Result<Uuid> {
        self.enqueued.lock().unwrap().push(payload.clone());
        Ok(self.push_raw(payload.kind().as_str(), payload.to_json()?))
    }

    async fn dequeue(&self, kinds: &[JobKind]) -> Result<Option<Job>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RaterError::QueueError(sqlx::Error::PoolTimedOut));
        }
        let mut pending = self.pending.lock().unwrap();
        let position = pending.iter().position(|job| {
            job.kind
                .parse::<JobKind>()
                .is_ok_and(|kind| kinds.contains(&kind))
        });
        Ok(position.and_then(|index| pending.remove(index)))
    }

    async fn complete(&self, job_id: Uuid) -> Result<()> {
        self.completed.lock().unwrap().push(job_id);
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()> {
        self.failed.lock().unwrap().push((job_id, error.to_string()));
        Ok(())
    }

    async fn discard(&self, job_id: Uuid, error: &str) -> Result<()> {
        self.discarded
            .lock()
            .unwrap()
            .push((job_id, error.to_string()));
        Ok(())
    }
}

/// Records event names, with the competition they concern when there is one
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingObserver {
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|n| *n == name).count()
    }
}

impl PipelineObserver for RecordingObserver {
    fn observe(&self, event: &PipelineEvent<'_>) {
        let competition_id = match event {
            PipelineEvent::JobAcknowledged { competition_id, .. }
            | PipelineEvent::RatingSkipped { competition_id, .. }
            | PipelineEvent::RatingGenerated { competition_id, .. }
            | PipelineEvent::RatingStored { competition_id, .. } => {
                Some(competition_id.to_string())
            }
            PipelineEvent::JobFailed { competition_id, .. } => competition_id.map(str::to_string),
            _ => None,
        };
        self.events
            .lock()
            .unwrap()
            .push((event.name().to_string(), competition_id));
    }
}
