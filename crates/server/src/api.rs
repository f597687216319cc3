//! HTTP snapshot API
//!
//! - `GET /health` - liveness, cache size and connected subscribers
//! - `GET /greeks` - the full snapshot, same shape as the WebSocket payload
//! - `GET /greeks/:id` - one contract, 404 if it has never been computed

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use storage::GreeksStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::websocket::ConnectionRegistry;

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct ApiState {
    pub service_name: String,
    pub store: Arc<dyn GreeksStore>,
    pub start_time: Instant,
    /// WebSocket connections, when a stream runs alongside this API
    pub subscribers: Option<ConnectionRegistry>,
}

impl ApiState {
    pub fn new(service_name: impl Into<String>, store: Arc<dyn GreeksStore>) -> Self {
        Self {
            service_name: service_name.into(),
            store,
            start_time: Instant::now(),
            subscribers: None,
        }
    }

    pub fn with_subscribers(mut self, registry: ConnectionRegistry) -> Self {
        self.subscribers = Some(registry);
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/greeks", get(snapshot_handler))
        .route("/greeks/:id", get(contract_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Reports `degraded` with 503 when the store cannot be read
pub async fn health_handler(
    State(state): State<ApiState>,
) -> (StatusCode, Json<serde_json::Value>) {
    let (status_code, status, entries) = match state.store.snapshot().await {
        Ok(snapshot) => (StatusCode::OK, "ok", Some(snapshot.len())),
        Err(e) => {
            warn!(error = %e, "Health check could not read the store");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", None)
        }
    };

    let body = json!({
        "status": status,
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
        "store": state.store.backend(),
        "entries": entries,
        "subscribers": state.subscribers.as_ref().map(ConnectionRegistry::len),
    });

    (status_code, Json(body))
}

pub async fn snapshot_handler(State(state): State<ApiState>) -> Response {
    match state.store.snapshot().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => store_unavailable(e),
    }
}

pub async fn contract_handler(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match state.store.snapshot().await {
        Ok(snapshot) => match snapshot.get(&id) {
            Some(greeks) => Json(json!({ "id": id, "greeks": greeks })).into_response(),
            None => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("no greeks cached for {}", id) })),
            )
                .into_response(),
        },
        Err(e) => store_unavailable(e),
    }
}

fn store_unavailable(e: storage::StoreError) -> Response {
    warn!(error = %e, "Snapshot read failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": e.to_string() })),
    )
        .into_response()
}
