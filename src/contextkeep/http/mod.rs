//! HTTP front-end: a thin axum wrapper over the store.
//!
//! Every endpoint returns the same `{success, data|error}` envelope; the
//! store's not-found outcomes map to 404 and missing required fields to 400.

use crate::error::{KeepError, Result};
use crate::store::MemoryStore;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod routes;

use routes::AppState;

/// Uniform response envelope for all API endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/memories",
            get(routes::list_memories).post(routes::create_memory),
        )
        .route(
            "/api/memories/:key",
            get(routes::get_memory)
                .put(routes::update_memory)
                .delete(routes::delete_memory),
        )
        .route("/api/search", get(routes::search_memories))
        .route("/api/stats", get(routes::stats))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the process is stopped.
pub async fn serve(store: Arc<MemoryStore>, host: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState { store });
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(KeepError::Io)?;
    log::info!("HTTP API listening on http://{}", addr);

    axum::serve(listener, app).await.map_err(KeepError::Io)?;
    Ok(())
}
