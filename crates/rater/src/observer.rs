//! Pipeline events and the observer that turns them into logs.
//!
//! The use cases and the consumer report what happened through a
//! [`PipelineObserver`] instead of logging directly, so they can be tested
//! without capturing log output.

use storage::models::{Period, Rating, Sport};
use storage::repository::RatingWrite;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{FailureClass, RaterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyRated,
    HigherPrioritySource,
}

#[derive(Debug)]
pub enum PipelineEvent<'a> {
    ConsumerStarted {
        kinds: &'a [&'static str],
    },
    ConsumerStopped,
    QueueUnavailable {
        error: &'a RaterError,
    },
    JobReceived {
        job_id: Uuid,
        kind: &'a str,
        attempt: i32,
        max_attempts: i32,
    },
    JobAcknowledged {
        job_id: Uuid,
        competition_id: &'a str,
    },
    JobFailed {
        job_id: Uuid,
        competition_id: Option<&'a str>,
        class: FailureClass,
        /// The queue will not deliver the job again
        last_attempt: bool,
        error: &'a RaterError,
    },
    RatingSkipped {
        competition_id: &'a str,
        existing: &'a Rating,
        reason: SkipReason,
    },
    RatingGenerated {
        competition_id: &'a str,
        rating: &'a Rating,
    },
    RatingStored {
        competition_id: &'a str,
        write: RatingWrite,
    },
    PeriodFetchFailed {
        sport: Sport,
        period: Period,
        error: &'a RaterError,
    },
}

impl PipelineEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConsumerStarted { .. } => "consumer_started",
            Self::ConsumerStopped => "consumer_stopped",
            Self::QueueUnavailable { .. } => "queue_unavailable",
            Self::JobReceived { .. } => "job_received",
            Self::JobAcknowledged { .. } => "job_acknowledged",
            Self::JobFailed { .. } => "job_failed",
            Self::RatingSkipped { .. } => "rating_skipped",
            Self::RatingGenerated { .. } => "rating_generated",
            Self::RatingStored { .. } => "rating_stored",
            Self::PeriodFetchFailed { .. } => "period_fetch_failed",
        }
    }
}

pub trait PipelineObserver: Send + Sync {
    fn observe(&self, event: &PipelineEvent<'_>);
}

/// Structured `tracing` output for every pipeline event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn observe(&self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::ConsumerStarted { kinds } => {
                info!(kinds = ?kinds, "Rating consumer started");
            }
            PipelineEvent::ConsumerStopped => info!("Rating consumer stopped"),
            PipelineEvent::QueueUnavailable { error } => {
                error!(error = %error, "Failed to fetch next job");
            }
            PipelineEvent::JobReceived {
                job_id,
                kind,
                attempt,
                max_attempts,
            } => {
                info!(%job_id, kind, attempt, max_attempts, "Processing job");
            }
            PipelineEvent::JobAcknowledged {
                job_id,
                competition_id,
            } => {
                info!(%job_id, competition_id, "Job completed");
            }
            PipelineEvent::JobFailed {
                job_id,
                competition_id,
                class,
                last_attempt,
                error,
            } => match class {
                FailureClass::Retryable if *last_attempt => error!(
                    %job_id,
                    competition_id = competition_id.unwrap_or("-"),
                    failure_class = class.as_str(),
                    error = %error,
                    "Job failed on its last attempt, giving up"
                ),
                FailureClass::Permanent => error!(
                    %job_id,
                    competition_id = competition_id.unwrap_or("-"),
                    failure_class = class.as_str(),
                    error = %error,
                    "Job failed permanently"
                ),
                FailureClass::Retryable => warn!(
                    %job_id,
                    competition_id = competition_id.unwrap_or("-"),
                    failure_class = class.as_str(),
                    error = %error,
                    "Job failed, handing back to queue"
                ),
            },
            PipelineEvent::RatingSkipped {
                competition_id,
                existing,
                reason,
            } => {
                debug!(
                    competition_id,
                    score = existing.score.value(),
                    source = %existing.source,
                    reason = ?reason,
                    "Rating already exists, skipping generation"
                );
            }
            PipelineEvent::RatingGenerated {
                competition_id,
                rating,
            } => {
                info!(
                    competition_id,
                    score = rating.score.value(),
                    category = %rating.category(),
                    source = %rating.source,
                    "Rating generated"
                );
            }
            PipelineEvent::RatingStored {
                competition_id,
                write,
            } => match write {
                RatingWrite::Stored => debug!(competition_id, "Rating stored"),
                RatingWrite::KeptExisting => warn!(
                    competition_id,
                    "Stored rating has a higher priority source, new rating discarded"
                ),
            },
            PipelineEvent::PeriodFetchFailed {
                sport,
                period,
                error,
            } => {
                warn!(%sport, %period, error = %error, "Skipping period that failed to load");
            }
        }
    }
}
