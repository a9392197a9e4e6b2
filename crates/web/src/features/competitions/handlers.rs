use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use storage::dto::competition::{
    CompetitionResponse, RecentCompetitionsQuery, RecentCompetitionsResponse,
};
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/competitions/recent",
    params(RecentCompetitionsQuery),
    responses(
        (status = 200, description = "Most recent competitions, newest period first", body = RecentCompetitionsResponse),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "competitions"
)]
pub async fn list_recent_competitions(
    State(state): State<AppState>,
    Query(query): Query<RecentCompetitionsQuery>,
) -> Result<Response, WebError> {
    query.validate()?;

    let recent = services::recent_competitions(&state, &query).await?;

    let response = RecentCompetitionsResponse {
        competitions: recent
            .competitions
            .into_iter()
            .map(CompetitionResponse::from)
            .collect(),
        periods_examined: recent.periods_examined,
        failed_periods: recent.failed_periods,
    };

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/competitions/{competition_id}",
    params(
        ("competition_id" = String, Path, description = "Competition id")
    ),
    responses(
        (status = 200, description = "Competition found", body = CompetitionResponse),
        (status = 404, description = "Competition not found")
    ),
    tag = "competitions"
)]
pub async fn get_competition(
    State(state): State<AppState>,
    Path(competition_id): Path<String>,
) -> Result<Response, WebError> {
    let competition = services::get_competition(&state, &competition_id).await?;

    Ok(Json(CompetitionResponse::from(competition)).into_response())
}
