//! Axum route handlers for the memory API.

use super::ApiResponse;
use crate::model::{ListedMemory, Memory};
use crate::store::{MemoryStore, StoreStats};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;

pub struct AppState {
    pub store: Arc<MemoryStore>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMemoryRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemoryRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// What kind of edit this was, recorded in the appended edit log.
    #[serde(default = "default_action")]
    pub action: String,
}

fn default_action() -> String {
    "Manual Edit".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

fn audit_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S %:z").to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

// GET /api/memories
pub async fn list_memories(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<Vec<ListedMemory>>>) {
    match state.store.list() {
        Ok(memories) => (StatusCode::OK, Json(ApiResponse::ok(memories))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err(format!("Failed to list memories: {}", e))),
        ),
    }
}

// GET /api/memories/:key
pub async fn get_memory(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> (StatusCode, Json<ApiResponse<Memory>>) {
    match state.store.retrieve(&key) {
        Ok(Some(memory)) => (StatusCode::OK, Json(ApiResponse::ok(memory))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err("Memory not found")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err(format!("Failed to retrieve: {}", e))),
        ),
    }
}

// POST /api/memories
pub async fn create_memory(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMemoryRequest>,
) -> (StatusCode, Json<ApiResponse<Memory>>) {
    if req.key.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err("Key is required")),
        );
    }

    // Creation audit line; store treats it as ordinary body text
    let content = format!("{}\n\n---\n**Created:** {}", req.content, audit_stamp());

    match state
        .store
        .store(&req.key, &content, req.tags, non_empty(req.title))
    {
        Ok(memory) => (StatusCode::OK, Json(ApiResponse::ok(memory))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err(format!("Failed to store: {}", e))),
        ),
    }
}

// PUT /api/memories/:key
pub async fn update_memory(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(req): Json<UpdateMemoryRequest>,
) -> (StatusCode, Json<ApiResponse<Memory>>) {
    // Record what changed compared to the current state, best effort
    let existing = state.store.retrieve(&key).unwrap_or(None);
    let mut changes = Vec::new();
    if let Some(ref old) = existing {
        if old.title != req.title {
            changes.push(format!(
                "Title changed from '{}' to '{}'",
                old.title, req.title
            ));
        }
        if old.content != req.content {
            changes.push("Content modified".to_string());
        }
    }

    let log_entry = if changes.is_empty() {
        format!("\n\n---\n**{} | {}**", audit_stamp(), req.action)
    } else {
        format!(
            "\n\n---\n**{} | {}**\n{}",
            audit_stamp(),
            req.action,
            changes.join(" | ")
        )
    };
    let content = format!("{}{}", req.content, log_entry);

    match state
        .store
        .store(&key, &content, req.tags, non_empty(req.title))
    {
        Ok(memory) => (StatusCode::OK, Json(ApiResponse::ok(memory))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err(format!("Failed to update: {}", e))),
        ),
    }
}

// DELETE /api/memories/:key
pub async fn delete_memory(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> (StatusCode, Json<ApiResponse<bool>>) {
    match state.store.delete(&key) {
        Ok(true) => (StatusCode::OK, Json(ApiResponse::ok(true))),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err("Memory not found")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err(format!("Failed to delete: {}", e))),
        ),
    }
}

// GET /api/search?q=
pub async fn search_memories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> (StatusCode, Json<ApiResponse<Vec<ListedMemory>>>) {
    match state.store.search(&params.q) {
        Ok(results) => (StatusCode::OK, Json(ApiResponse::ok(results))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err(format!("Search failed: {}", e))),
        ),
    }
}

// GET /api/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<StoreStats>>) {
    match state.store.stats() {
        Ok(stats) => (StatusCode::OK, Json(ApiResponse::ok(stats))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err(format!("Failed to compute stats: {}", e))),
        ),
    }
}
