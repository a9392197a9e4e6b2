use rater::enumerator::{EnumeratorLimits, PeriodEnumerator, RecentCompetitions};
use storage::{
    dto::competition::RecentCompetitionsQuery,
    error::Result as StorageResult,
    models::{Competition, Sport},
};

use crate::error::{WebError, WebResult};
use crate::state::AppState;

/// Most recent competitions of a sport, bounded by the query or the defaults
pub async fn recent_competitions(
    state: &AppState,
    query: &RecentCompetitionsQuery,
) -> WebResult<RecentCompetitions> {
    let sport: Sport = query
        .sport
        .parse()
        .map_err(|_| WebError::BadRequest(format!("Unknown sport '{}'", query.sport)))?;

    let limits = EnumeratorLimits {
        max_periods: query.max_periods.unwrap_or(state.limits.max_periods),
        max_competitions: query
            .max_competitions
            .unwrap_or(state.limits.max_competitions),
    };

    let enumerator =
        PeriodEnumerator::new(state.store.clone(), state.observer.clone()).with_limits(limits);
    Ok(enumerator.recent_competitions(sport).await?)
}

/// Get competition by id, with its rating when it has one
pub async fn get_competition(state: &AppState, competition_id: &str) -> StorageResult<Competition> {
    state.store.get_competition_by_id(competition_id).await
}
