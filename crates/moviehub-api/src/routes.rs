//! Router setup with all routes and middleware.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use moviehub_core::error::Result;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route(
            "/add-movie",
            get(handlers::add_movie_form).post(handlers::add_movie),
        )
        .route("/api/publish", post(handlers::publish))
        .route("/api/movies", get(handlers::movies))
        .route("/api/mirror/{job_id}", get(handlers::mirror_job))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the router on `127.0.0.1:{port}` until the process stops.
pub async fn start_server(port: u16, state: AppState) -> Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let router = create_router(state);

    tracing::info!("Starting MovieHub server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
