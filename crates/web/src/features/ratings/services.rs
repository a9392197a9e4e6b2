use rater::jobs::{JobKind, JobPayload};
use storage::{
    dto::{
        common::PaginationParams,
        rating::{EnqueueRatingResponse, RatedCompetitionEntry},
    },
    error::Result as StorageResult,
    models::Rating,
    repository::RatingRepository,
};

use crate::error::{WebError, WebResult};
use crate::state::AppState;

pub async fn get_rating(state: &AppState, competition_id: &str) -> StorageResult<Rating> {
    state.store.get_rating(competition_id).await
}

/// Queues a rating job for an existing competition
pub async fn enqueue_rating(
    state: &AppState,
    competition_id: &str,
    force: bool,
) -> WebResult<EnqueueRatingResponse> {
    let competition = state
        .store
        .get_competition_by_id(competition_id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                WebError::NotFound(format!("Competition {}", competition_id))
            } else {
                e.into()
            }
        })?;

    let payload = JobPayload::sentiment_analysis(competition.competition_id.clone(), force);
    let job_id = state.queue.enqueue(&payload).await?;

    tracing::info!(%job_id, competition_id, force, "Rating job queued");

    Ok(EnqueueRatingResponse {
        job_id,
        competition_id: competition.competition_id,
        kind: JobKind::SentimentAnalysis.as_str().to_string(),
    })
}

/// Most recently generated ratings, newest first
pub async fn list_recent_ratings(
    state: &AppState,
    params: &PaginationParams,
) -> StorageResult<(Vec<RatedCompetitionEntry>, i64)> {
    let repo = RatingRepository::new(state.db.pool());
    let (records, total_items) = repo.list_recent(params.limit(), params.offset()).await?;

    let entries = records
        .into_iter()
        .map(RatedCompetitionEntry::try_from)
        .collect::<StorageResult<Vec<_>>>()?;

    Ok((entries, total_items))
}
