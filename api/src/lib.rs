//! Top-level HTTP surface (§6): wires `AppConfig`, the dispatcher, and
//! every route behind the request-id middleware.

mod app_state;
mod config;
mod error_handler;
mod middleware;
mod routes;
mod telemetry;

pub use app_state::AppState;
pub use config::{AppConfig, ConfigError};
pub use error_handler::{AppError, AppResult};

use std::error::Error;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhooks", post(routes::webhooks::post_webhook))
        .route("/api/v1/async-reviews/{provider}/{repoId}/change-requests/{n}", post(routes::async_reviews::submit))
        .route("/api/v1/async-reviews/{requestId}/status", get(routes::async_reviews::status))
        .route("/api/v1/async-reviews/{requestId}", get(routes::async_reviews::get_by_id))
        .route("/api/v1/reviews/{provider}/repositories", get(routes::reviews::list_repositories))
        .route("/api/v1/reviews/{provider}/{repoId}/change-requests", get(routes::reviews::list_change_requests))
        .route("/api/v1/reviews/{provider}/{repoId}/change-requests/{n}/stream", get(routes::reviews::stream))
        .route("/api/v1/reviews/{provider}/{repoId}/change-requests/{n}/stream-and-publish", get(routes::reviews::stream_and_publish))
        .route("/api/v1/reviews/{provider}/{repoId}/change-requests/{n}/review", post(routes::reviews::submit_review))
        .route("/api/v1/reviews/issues/{issueId}", get(routes::reviews::get_issue))
        .route("/healthz", get(routes::healthz::get))
        .layer(axum::middleware::from_fn(middleware::request_id))
        .with_state(state)
}

/// Loads config, builds the dispatcher, and serves forever on `BIND_ADDR`.
pub async fn start() -> Result<(), Box<dyn Error>> {
    telemetry::init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config);
    let app = router(state);

    info!(%bind_addr, "review gateway listening");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
