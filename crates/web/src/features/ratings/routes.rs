use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{enqueue_rating, get_rating, list_recent_ratings};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

/// Rating routes nested under `/api/competitions`
pub fn competition_routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/:competition_id/rating", post(enqueue_rating))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:competition_id/rating", get(get_rating))
        .merge(protected)
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_recent_ratings))
}
