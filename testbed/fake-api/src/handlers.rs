use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::fixtures::ApiFixture;

pub struct AppState {
    pub api_key: String,
    pub fixture: RwLock<ApiFixture>,
}

pub type SharedState = Arc<AppState>;

type ApiError = (StatusCode, Json<Value>);

#[derive(Debug, Deserialize)]
pub struct DeviceIdRequest {
    pub device_id: String,
}

fn api_error(status: StatusCode, error_type: &str, message: String) -> ApiError {
    (
        status,
        Json(json!({
            "error": {
                "type": error_type,
                "message": message
            }
        })),
    )
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "fake-api"
    }))
}

/// Rejects requests that do not carry the seeded key as a bearer token.
pub async fn require_api_key(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if presented != Some(state.api_key.as_str()) {
        tracing::debug!("Rejected request to {} with bad credentials", request.uri());
        return api_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Missing or invalid API key".to_string(),
        )
        .into_response();
    }

    next.run(request).await
}

pub async fn list_devices(State(state): State<SharedState>) -> Json<Value> {
    let fixture = state.fixture.read().await;
    Json(json!({ "devices": fixture.devices, "ok": true }))
}

pub async fn get_device(
    State(state): State<SharedState>,
    Json(payload): Json<DeviceIdRequest>,
) -> Result<Json<Value>, ApiError> {
    let fixture = state.fixture.read().await;
    match fixture.get_device(&payload.device_id) {
        Some(device) => Ok(Json(json!({ "device": device, "ok": true }))),
        None => Err(device_not_found(&payload.device_id)),
    }
}

pub async fn lock_door(
    State(state): State<SharedState>,
    Json(payload): Json<DeviceIdRequest>,
) -> Result<Json<Value>, ApiError> {
    set_locked(&state, &payload.device_id, true, "LOCK_DOOR").await
}

pub async fn unlock_door(
    State(state): State<SharedState>,
    Json(payload): Json<DeviceIdRequest>,
) -> Result<Json<Value>, ApiError> {
    set_locked(&state, &payload.device_id, false, "UNLOCK_DOOR").await
}

async fn set_locked(
    state: &AppState,
    device_id: &str,
    locked: bool,
    action_type: &str,
) -> Result<Json<Value>, ApiError> {
    let mut fixture = state.fixture.write().await;
    let device = fixture
        .get_device_mut(device_id)
        .ok_or_else(|| device_not_found(device_id))?;

    if !device.device_type.ends_with("_lock") {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "device_not_lockable",
            format!("Device {} is not a lock", device_id),
        ));
    }

    device.properties.locked = locked;
    Ok(Json(json!({
        "action_attempt": {
            "action_attempt_id": Uuid::new_v4().to_string(),
            "action_type": action_type,
            "status": "success",
            "result": {},
            "error": null
        },
        "ok": true
    })))
}

fn device_not_found(device_id: &str) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        "device_not_found",
        format!("Device {} not found", device_id),
    )
}
