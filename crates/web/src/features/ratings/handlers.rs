use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::{
    common::{PaginatedResponse, PaginationParams},
    rating::{EnqueueRatingRequest, EnqueueRatingResponse, RatedCompetitionEntry, RatingResponse},
};

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/competitions/{competition_id}/rating",
    params(
        ("competition_id" = String, Path, description = "Competition id")
    ),
    responses(
        (status = 200, description = "Rating found", body = RatingResponse),
        (status = 404, description = "Competition has not been rated")
    ),
    tag = "ratings"
)]
pub async fn get_rating(
    State(state): State<AppState>,
    Path(competition_id): Path<String>,
) -> Result<Response, WebError> {
    let rating = services::get_rating(&state, &competition_id).await?;

    Ok(Json(RatingResponse::from(rating)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/competitions/{competition_id}/rating",
    params(
        ("competition_id" = String, Path, description = "Competition id")
    ),
    request_body = EnqueueRatingRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 202, description = "Rating job queued", body = EnqueueRatingResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Competition not found")
    ),
    tag = "ratings"
)]
pub async fn enqueue_rating(
    State(state): State<AppState>,
    Path(competition_id): Path<String>,
    body: Option<Json<EnqueueRatingRequest>>,
) -> Result<Response, WebError> {
    let force = body.map(|Json(request)| request.force).unwrap_or(false);

    let response = services::enqueue_rating(&state, &competition_id, force).await?;

    Ok((StatusCode::ACCEPTED, Json(response)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/ratings",
    params(PaginationParams),
    responses(
        (status = 200, description = "Recently rated competitions", body = PaginatedResponse<RatedCompetitionEntry>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "ratings"
)]
pub async fn list_recent_ratings(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, WebError> {
    params.validate().map_err(WebError::BadRequest)?;

    let (entries, total_items) = services::list_recent_ratings(&state, &params).await?;

    Ok(Json(PaginatedResponse::new(entries, &params, total_items)).into_response())
}
