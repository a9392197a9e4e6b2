pub mod consumer;
pub mod payload;
pub mod queue;

mod pg_queue;

pub use consumer::{ConsumerConfig, JobOutcome, RatingJobConsumer};
pub use payload::{JobKind, JobPayload, SentimentAnalysisArgs};
pub use pg_queue::{PgJobQueue, DEFAULT_LEASE, DEFAULT_MAX_ATTEMPTS};
pub use queue::{Job, JobQueue};
