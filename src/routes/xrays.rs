//! X-ray routes — upload key issuance and path attach/detach.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::routes::auth::require_dentist;
use crate::services::xrays::{self, XrayError};
use crate::state::AppState;

fn xray_error(e: XrayError) -> Response {
    match e {
        XrayError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response(),
        XrayError::Database(e) => {
            tracing::error!(error = %e, "xray query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    pub size_bytes: u64,
}

/// `POST /api/patients/{id}/xrays/upload-key` — validate and hand back the
/// storage key the UI should upload to.
pub async fn issue_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UploadRequest>,
) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    if let Err(e) = xrays::validate_upload(&body.file_name, body.size_bytes) {
        return xray_error(e);
    }
    match xrays::object_key(id, &body.file_name) {
        Ok(key) => Json(json!({ "key": key })).into_response(),
        Err(e) => xray_error(e),
    }
}

#[derive(Deserialize)]
pub struct PathBody {
    pub path: String,
}

/// `POST /api/patients/{id}/xrays`
pub async fn attach_to_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PathBody>,
) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match xrays::attach_to_patient(&state.pool, id, &body.path).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => xray_error(e),
    }
}

/// `DELETE /api/patients/{id}/xrays`
pub async fn detach_from_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PathBody>,
) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match xrays::detach_from_patient(&state.pool, id, &body.path).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => xray_error(e),
    }
}

/// `POST /api/visits/{id}/xrays`
pub async fn attach_to_visit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PathBody>,
) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match xrays::attach_to_visit(&state.pool, id, &body.path).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => xray_error(e),
    }
}

/// `DELETE /api/visits/{id}/xrays`
pub async fn detach_from_visit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PathBody>,
) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match xrays::detach_from_visit(&state.pool, id, &body.path).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => xray_error(e),
    }
}
