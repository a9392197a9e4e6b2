use async_trait::async_trait;
use uuid::Uuid;

use super::{JobKind, JobPayload};
use crate::Result;

/// A claimed unit of work. `kind` and `payload` are kept raw until the
/// consumer decodes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    /// 1 on first delivery
    pub attempt: i32,
    pub max_attempts: i32,
}

/// Queue capability the consumer depends on.
///
/// The queue owns delivery: it hands each job to one consumer at a time and
/// decides whether and when a failed job is attempted again.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, payload: &JobPayload) -> Result<Uuid>;

    /// Claims the next due job of one of `kinds`, or `None` if there is none.
    async fn dequeue(&self, kinds: &[JobKind]) -> Result<Option<Job>>;

    async fn complete(&self, job_id: Uuid) -> Result<()>;

    /// Reports a retryable failure. The queue applies its own retry policy.
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()>;

    /// Reports a permanent failure. The job is never delivered again.
    async fn discard(&self, job_id: Uuid, error: &str) -> Result<()>;
}
