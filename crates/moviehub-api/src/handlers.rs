//! HTTP handler functions for every route.
//!
//! Handlers only translate between HTTP and the publish pipeline; all
//! publish semantics live in [`PublishCoordinator`](moviehub_publish::PublishCoordinator).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use moviehub_core::error::MovieHubError;
use moviehub_core::{MovieIndex, PublishResult, PublishStatus};
use moviehub_publish::MirrorJob;
use moviehub_render::escape_html;

use crate::error::ApiError;
use crate::state::AppState;

const ADD_MOVIE_FORM: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Add a movie</title></head>
<body>
  <form method="POST" action="/add-movie">
    Movie Name: <input name="movie_name">
    <button type="submit">Add Movie</button>
  </form>
</body>
</html>
"#;

// =============================================================================
// Site
// =============================================================================

/// GET / - homepage rendered from the current index.
pub async fn home(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    Ok(Html(state.coordinator.homepage().await?))
}

/// GET /add-movie - the add form.
pub async fn add_movie_form() -> impl IntoResponse {
    Html(ADD_MOVIE_FORM)
}

/// Form body for POST /add-movie.
#[derive(Debug, Deserialize)]
pub struct AddMovieForm {
    pub movie_name: String,
}

/// POST /add-movie - publish from the form and answer in plain HTML.
///
/// A missing catalog match is a 404 page rather than a JSON error, since
/// this route is meant for browsers.
pub async fn add_movie(
    State(state): State<AppState>,
    Form(form): Form<AddMovieForm>,
) -> Result<Response, ApiError> {
    let name = escape_html(form.movie_name.trim());
    match state.coordinator.publish(&form.movie_name).await {
        Ok(result) => {
            let mut body = format!("<p>Movie '{}' added successfully!</p>", name);
            for warning in &result.warnings {
                body.push_str(&format!("\n<p class=\"warning\">{}</p>", escape_html(warning)));
            }
            Ok((publish_status(&result), Html(body)).into_response())
        }
        Err(MovieHubError::NotFound(_)) => Ok((
            StatusCode::NOT_FOUND,
            Html(format!("<p>Movie '{}' not found.</p>", name)),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// JSON API
// =============================================================================

/// Request body for POST /api/publish.
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub title: String,
}

/// POST /api/publish - publish a title and return the full result.
///
/// 201 when the index changed, 200 when the movie was already present with
/// identical fields.
pub async fn publish(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> Result<(StatusCode, Json<PublishResult>), ApiError> {
    let result = state.coordinator.publish(&request.title).await?;
    Ok((publish_status(&result), Json(result)))
}

fn publish_status(result: &PublishResult) -> StatusCode {
    match result.status {
        PublishStatus::Published => StatusCode::CREATED,
        PublishStatus::Unchanged => StatusCode::OK,
    }
}

/// GET /api/movies - the persisted index.
pub async fn movies(State(state): State<AppState>) -> Result<Json<MovieIndex>, ApiError> {
    Ok(Json(state.coordinator.index().await?))
}

/// GET /api/mirror/{job_id} - state of a deferred mirror job.
pub async fn mirror_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<MirrorJob>, ApiError> {
    let mirror = state
        .coordinator
        .mirror()
        .ok_or_else(|| ApiError::NotFound("remote mirroring is disabled".to_string()))?;
    mirror
        .job(job_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no mirror job {}", job_id)))
}

// =============================================================================
// Health
// =============================================================================

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub movies: usize,
}

/// GET /health - liveness plus a count of published movies.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let movies = state.coordinator.index().await?.len();
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        movies,
    }))
}
