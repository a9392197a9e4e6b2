use axum::{Router, routing::get};

use super::handlers::{get_competition, list_recent_competitions};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recent", get(list_recent_competitions))
        .route("/:competition_id", get(get_competition))
}
