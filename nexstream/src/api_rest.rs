//! Endpoints API REST du service musical
//!
//! Ce module définit les handlers HTTP `/health`, `/search` et `/stream`,
//! ainsi que la conversion unique des erreurs en réponses JSON.

use crate::error::Error;
use crate::models::Track;
use crate::proxy::{ProxiedStream, StreamRequest};
use crate::search::search_tracks;
use crate::server_ext::MusicService;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, header::RANGE},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

// ============ Gestion des erreurs ============

/// Wrapper turning any [`Error`] into a `{"error": ...}` response
///
/// Server-side failures are logged with their full detail; the client only
/// gets the terse message.
#[derive(Debug)]
pub struct AppError(pub Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            error!(error = ?self.0, "Request failed: {}", self.0);
        } else {
            warn!(status = %status, "Request rejected: {}", self.0);
        }

        let body = Json(ErrorBody {
            error: self.0.client_message(),
        });
        (status, body).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

// ============ Schémas ============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Paramètres de `/search`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Search term; empty or missing returns `[]`
    pub q: Option<String>,
    /// Number of results (default 25, at most 50)
    pub limit: Option<String>,
}

/// Paramètres de `/stream`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreamQuery {
    /// Media identifier
    pub id: Option<String>,
}

/// Crée le router du service musical
pub fn create_router(state: MusicService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search", get(search))
        .route("/stream", get(stream))
        .with_state(state)
}

// ============================================================================
// Route Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "stream"
)]
pub async fn health(State(state): State<MusicService>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: state.service_name.clone(),
    })
}

#[utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching tracks", body = Vec<Track>),
        (status = 400, description = "Invalid limit", body = ErrorBody),
        (status = 500, description = "Search failed", body = ErrorBody)
    ),
    tag = "stream"
)]
pub async fn search(
    State(state): State<MusicService>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Track>>, AppError> {
    let term = query.q.as_deref().unwrap_or_default().trim();
    if term.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let limit = state.search.effective_limit(query.limit.as_deref())?;
    let tracks = search_tracks(state.extractor.as_ref(), term, limit).await?;
    Ok(Json(tracks))
}

/// Proxies the audio of `id`, forwarding the client `Range` header
#[utoipa::path(
    get,
    path = "/stream",
    params(StreamQuery),
    responses(
        (status = 200, description = "Full audio stream"),
        (status = 206, description = "Partial audio stream"),
        (status = 400, description = "Missing id", body = ErrorBody),
        (status = 404, description = "No playable audio", body = ErrorBody),
        (status = 500, description = "Extraction or upstream failure", body = ErrorBody)
    ),
    tag = "stream"
)]
pub async fn stream(
    State(state): State<MusicService>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<ProxiedStream, AppError> {
    let id = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(Error::MissingParameter("id"))?;

    let request = StreamRequest::new(id).with_range(headers.get(RANGE).cloned());
    Ok(state.proxy.proxy(request).await?)
}

/// Documentation OpenAPI du service musical
#[derive(OpenApi)]
#[openapi(
    paths(health, search, stream),
    components(schemas(Track, ErrorBody, HealthResponse)),
    tags(
        (name = "stream", description = "Recherche et streaming audio")
    ),
    info(
        title = "NexSon Music API",
        version = "0.1.0",
        description = r#"
# Service de recherche et de streaming

- **GET /health** : état du service
- **GET /search** : recherche de pistes (`q`, `limit` ≤ 50)
- **GET /stream** : proxy audio avec support de `Range` (200/206)

Les URLs résolues sont mises en cache une heure.
        "#
    )
)]
pub struct StreamApiDoc;
