use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use rater::jobs::PgJobQueue;
use storage::Database;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod state;

use config::Config;
use features::{competitions, ratings};
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        competitions::handlers::list_recent_competitions,
        competitions::handlers::get_competition,
        ratings::handlers::get_rating,
        ratings::handlers::enqueue_rating,
        ratings::handlers::list_recent_ratings,
    ),
    components(
        schemas(
            storage::dto::competition::CompetitionResponse,
            storage::dto::competition::ParticipantResponse,
            storage::dto::competition::RecentCompetitionsResponse,
            storage::dto::rating::RatingResponse,
            storage::dto::rating::RatedCompetitionEntry,
            storage::dto::rating::EnqueueRatingRequest,
            storage::dto::rating::EnqueueRatingResponse,
            storage::dto::common::PaginationMeta,
            storage::models::Period,
            storage::models::PeriodType,
            storage::models::Sport,
            storage::models::HomeAway,
            storage::models::RatingCategory,
            storage::models::RatingSource,
            storage::models::RatingType,
        )
    ),
    tags(
        (name = "competitions", description = "Public competition endpoints"),
        (name = "ratings", description = "Competition excitement ratings"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

fn app(state: AppState, api_keys: ApiKeys) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest(
            "/api/competitions",
            competitions::routes::routes().merge(ratings::routes::competition_routes(api_keys)),
        )
        .nest("/api/ratings", ratings::routes::routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting rating API");

    let config = Config::from_env().context("Failed to load API configuration")?;

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, rating requests will be rejected");
    }

    let queue = Arc::new(PgJobQueue::new(db.pool().clone()));
    let state = AppState::new(db, queue);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    axum::serve(listener, app(state, api_keys))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
