use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tldr_core::{cache::DEFAULT_TTL, CacheKey, Mode, SledStore, SummaryCache, SummaryResponse};
use tldr_fetch::{DocumentFetcher, FetchConfig};
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod service;

pub use service::{ServiceError, SummarizeRequest, SummaryEvent, SummaryService};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory of the external (sled) cache tier; memory only when unset.
    pub cache_dir: Option<PathBuf>,
    pub cache_ttl: Duration,
    pub fetch: FetchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { cache_dir: None, cache_ttl: DEFAULT_TTL, fetch: FetchConfig::default() }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SummaryService>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheStatus {
    key: String,
    tier: &'static str,
    created_at: i64,
}

type ApiError = (StatusCode, Json<ErrorBody>);

/// Wire the cache tiers and the PDF fetcher into a service.
pub fn build_service(config: &ServerConfig) -> Result<SummaryService> {
    let cache = match &config.cache_dir {
        Some(dir) => {
            let store = SledStore::open(dir)?;
            tracing::info!(dir = %dir.display(), "external cache tier enabled");
            SummaryCache::with_external(Box::new(store), config.cache_ttl)
        }
        None => SummaryCache::in_memory(config.cache_ttl),
    };
    let fetcher = DocumentFetcher::new(config.fetch.clone())?;
    Ok(SummaryService::new(cache, Arc::new(fetcher)))
}

pub fn build_app(service: Arc<SummaryService>) -> Router {
    let app_state = AppState { service };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/summarize", post(summarize_handler))
        .route("/summarize/stream", post(stream_handler))
        .route("/cache/:identity/:mode", get(cache_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn summarize_handler(
    State(state): State<AppState>,
    Json(req): Json<SummarizeRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    state.service.summarize(&req).await.map(Json).map_err(api_error)
}

pub async fn stream_handler(
    State(state): State<AppState>,
    Json(req): Json<SummarizeRequest>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.service.stream(req);
    let events = ReceiverStream::new(rx)
        .map(|ev| Ok(Event::default().event(ev.name()).data(ev.payload().to_string())));
    Sse::new(events)
}

async fn cache_handler(
    State(state): State<AppState>,
    Path((identity, mode)): Path<(String, String)>,
) -> Result<Json<CacheStatus>, ApiError> {
    let mode: Mode = mode.parse().map_err(|e: String| (StatusCode::BAD_REQUEST, Json(ErrorBody { error: e })))?;
    let key = CacheKey::new(&identity, mode);
    match state.service.cache().entry(&key) {
        Some((entry, tier)) => Ok(Json(CacheStatus {
            key: key.as_str().to_string(),
            tier: tier.as_str(),
            created_at: entry.created_at,
        })),
        None => Err((StatusCode::NOT_FOUND, Json(ErrorBody { error: format!("{} not cached", key.as_str()) }))),
    }
}

fn api_error(e: ServiceError) -> ApiError {
    let status = match &e {
        ServiceError::MissingIdentity => StatusCode::BAD_REQUEST,
        ServiceError::Internal(detail) => {
            tracing::error!(detail, "summary failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorBody { error: e.to_string() }))
}
