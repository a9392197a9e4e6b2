use std::sync::Arc;

use rater::enumerator::EnumeratorLimits;
use rater::jobs::JobQueue;
use rater::observer::{PipelineObserver, TracingObserver};
use storage::{CompetitionStore, Database, PgCompetitionStore};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub store: Arc<dyn CompetitionStore>,
    pub queue: Arc<dyn JobQueue>,
    pub observer: Arc<dyn PipelineObserver>,
    pub limits: EnumeratorLimits,
}

impl AppState {
    pub fn new(db: Database, queue: Arc<dyn JobQueue>) -> Self {
        Self {
            store: Arc::new(PgCompetitionStore::new(db.pool().clone())),
            db,
            queue,
            observer: Arc::new(TracingObserver),
            limits: EnumeratorLimits::default(),
        }
    }
}
