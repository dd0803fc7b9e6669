use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use architect_core::StyleUpdate;

use crate::projects::ApiResponse;
use crate::AppState;

fn body_or_empty(body: Option<Json<Value>>) -> Value {
    body.map(|Json(v)| v).unwrap_or_else(|| json!({}))
}

fn str_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Reject a path-escaping projectName before any model call is made.
fn invalid_project_name(project_name: Option<&str>) -> Option<ApiResponse> {
    match project_name {
        Some(name) if !architect_core::valid_project_name(name) => Some((
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "Invalid project name" })),
        )),
        _ => None,
    }
}

// GET /api/ai/style
pub async fn get_style(State(state): State<AppState>) -> ApiResponse {
    let profile = state.storage.load_profile();
    (StatusCode::OK, Json(json!({ "ok": true, "profile": profile })))
}

// POST /api/ai/style
pub async fn save_style(State(state): State<AppState>, body: Option<Json<Value>>) -> ApiResponse {
    let body = body_or_empty(body);
    let update = StyleUpdate {
        tone: str_field(&body, "tone"),
        detail: str_field(&body, "detail"),
        emojis: str_field(&body, "emojis"),
        formatting: str_field(&body, "formatting"),
    };
    match state.storage.save_profile(&update) {
        Ok(profile) => (StatusCode::OK, Json(json!({ "ok": true, "profile": profile }))),
        Err(e) => {
            tracing::error!("save style failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": "Failed to save style" })),
            )
        }
    }
}

// POST /api/ai/chat
pub async fn chat(State(state): State<AppState>, body: Option<Json<Value>>) -> ApiResponse {
    let body = body_or_empty(body);
    let Some(message) = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "Missing 'message' string" })),
        );
    };
    let mode = body.get("mode").and_then(Value::as_str).unwrap_or("auto");
    let project_name = body.get("projectName").and_then(Value::as_str);
    if let Some(bad) = invalid_project_name(project_name) {
        return bad;
    }

    match architect_ai::compose_and_send(&state.storage, &state.settings, message, mode, project_name)
        .await
    {
        Ok(reply) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "mode": reply.mode, "reply": reply.reply })),
        ),
        Err(e) => {
            tracing::error!("AI chat error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": "AI error", "details": e })),
            )
        }
    }
}

// POST /api/ai/schematic
pub async fn schematic(State(state): State<AppState>, body: Option<Json<Value>>) -> ApiResponse {
    let body = body_or_empty(body);
    let Some(instructions) = body
        .get("instructions")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "Missing 'instructions' string" })),
        );
    };
    let project_name = body.get("projectName").and_then(Value::as_str);
    if let Some(bad) = invalid_project_name(project_name) {
        return bad;
    }

    match architect_ai::compose_schematic(&state.storage, &state.settings, instructions, project_name)
        .await
    {
        Ok(schematic) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "schematic": schematic })),
        ),
        Err(e) => {
            tracing::error!("schematic error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": "Schematic AI error", "details": e })),
            )
        }
    }
}
