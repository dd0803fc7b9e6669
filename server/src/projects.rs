use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::AppState;

pub type ApiResponse = (StatusCode, Json<Value>);

// GET /api/projects
pub async fn list(State(state): State<AppState>) -> ApiResponse {
    match state.storage.list_projects() {
        Ok(ids) => {
            let projects: Vec<Value> = ids
                .iter()
                .map(|id| json!({ "id": id, "file": format!("{id}.json") }))
                .collect();
            (StatusCode::OK, Json(json!({ "ok": true, "projects": projects })))
        }
        Err(e) => {
            tracing::error!("list projects failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": "Failed to list projects" })),
            )
        }
    }
}

// POST /api/projects — idempotent create
pub async fn create(State(state): State<AppState>, body: Option<Json<Value>>) -> ApiResponse {
    let body = body.map(|Json(v)| v).unwrap_or_else(|| json!({}));
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("default-project");

    if !architect_core::valid_project_name(name) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "Invalid project name" })),
        );
    }

    match state.storage.create_or_get(name) {
        Ok(project) => (StatusCode::OK, Json(json!({ "ok": true, "project": project }))),
        Err(e) => {
            tracing::error!("save project failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": "Failed to save project" })),
            )
        }
    }
}

// GET /api/projects/:name
pub async fn load(State(state): State<AppState>, Path(name): Path<String>) -> ApiResponse {
    match state.storage.load_project(&name) {
        Some(project) => (StatusCode::OK, Json(json!({ "ok": true, "project": project }))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "ok": false, "error": "Project not found" })),
        ),
    }
}
