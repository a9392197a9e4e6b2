use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{Job, JobKind, JobPayload, JobQueue};
use crate::error::{FailureClass, RaterError, Result};
use crate::observer::{PipelineEvent, PipelineObserver};
use crate::use_cases::{GenerateRating, GenerateRatingInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Wait between polls when the queue is empty
    pub poll_interval: Duration,
    /// Wait after the queue itself returned an error
    pub error_backoff: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            error_backoff: Duration::from_secs(5),
        }
    }
}

/// What the consumer told the queue about a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Acknowledged,
    /// Handed back to the queue's retry policy
    Retry,
    Discarded,
}

/// Pulls `sentiment_analysis` jobs and runs them through [`GenerateRating`].
///
/// One job is processed at a time. Run several consumers, in one process or
/// many, to scale out.
pub struct RatingJobConsumer {
    queue: Arc<dyn JobQueue>,
    use_case: Arc<GenerateRating>,
    observer: Arc<dyn PipelineObserver>,
    config: ConsumerConfig,
}

impl RatingJobConsumer {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        use_case: Arc<GenerateRating>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            queue,
            use_case,
            observer,
            config: ConsumerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ConsumerConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs until `shutdown` is cancelled. Cancellation is checked between
    /// jobs, so a job that has been claimed always runs to completion.
    pub async fn run(&self, shutdown: CancellationToken) {
        let kinds: Vec<&'static str> = JobKind::ALL.iter().map(JobKind::as_str).collect();
        self.observer
            .observe(&PipelineEvent::ConsumerStarted { kinds: &kinds });

        while !shutdown.is_cancelled() {
            let pause = match self.process_next().await {
                Ok(Some(_)) => continue,
                Ok(None) => self.config.poll_interval,
                Err(e) => {
                    self.observer
                        .observe(&PipelineEvent::QueueUnavailable { error: &e });
                    self.config.error_backoff
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        self.observer.observe(&PipelineEvent::ConsumerStopped);
    }

    /// Claims and processes a single job. `Ok(None)` means the queue was
    /// empty; `Err` means the queue itself failed.
    pub async fn process_next(&self) -> Result<Option<JobOutcome>> {
        let Some(job) = self.queue.dequeue(&JobKind::ALL).await? else {
            return Ok(None);
        };

        self.observer.observe(&PipelineEvent::JobReceived {
            job_id: job.id,
            kind: &job.kind,
            attempt: job.attempt,
            max_attempts: job.max_attempts,
        });

        let payload = match JobPayload::decode(&job.kind, &job.payload) {
            Ok(payload) => payload,
            Err(e) => return self.report_failure(&job, None, e).await.map(Some),
        };

        let result = match &payload {
            JobPayload::SentimentAnalysis(args) => {
                self.use_case
                    .execute(GenerateRatingInput {
                        competition_id: args.competition_id.clone(),
                        force: args.force,
                    })
                    .await
            }
        };

        let outcome = match result {
            Ok(_) => {
                self.queue.complete(job.id).await?;
                self.observer.observe(&PipelineEvent::JobAcknowledged {
                    job_id: job.id,
                    competition_id: payload.competition_id(),
                });
                JobOutcome::Acknowledged
            }
            Err(e) => {
                self.report_failure(&job, Some(payload.competition_id()), e)
                    .await?
            }
        };

        Ok(Some(outcome))
    }

    async fn report_failure(
        &self,
        job: &Job,
        competition_id: Option<&str>,
        error: RaterError,
    ) -> Result<JobOutcome> {
        let class = error.failure_class();
        let last_attempt = job.attempt >= job.max_attempts;
        self.observer.observe(&PipelineEvent::JobFailed {
            job_id: job.id,
            competition_id,
            class,
            last_attempt,
            error: &error,
        });

        let message = error.to_string();
        match class {
            FailureClass::Permanent => {
                self.queue.discard(job.id, &message).await?;
                Ok(JobOutcome::Discarded)
            }
            // The queue finalizes a job whose attempts are used up
            FailureClass::Retryable => {
                self.queue.fail(job.id, &message).await?;
                if last_attempt {
                    Ok(JobOutcome::Discarded)
                } else {
                    Ok(JobOutcome::Retry)
                }
            }
        }
    }
}
