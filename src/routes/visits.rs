//! Visit routes — per-patient treatment log.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use uuid::Uuid;

use crate::routes::auth::require_dentist;
use crate::services::visits::{self, VisitError, VisitInput};
use crate::state::AppState;

fn visit_error(e: VisitError) -> Response {
    match e {
        VisitError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response(),
        VisitError::NotFound(_) => (StatusCode::NOT_FOUND, "visit not found").into_response(),
        VisitError::Database(e) => {
            tracing::error!(error = %e, "visit query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /api/patients/{id}/visits`
pub async fn list_for_patient(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match visits::list_by_patient(&state.pool, id).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => visit_error(e),
    }
}

/// `POST /api/visits`
pub async fn create(State(state): State<AppState>, Json(input): Json<VisitInput>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match visits::create(&state.pool, &input).await {
        Ok(visit) => (StatusCode::CREATED, Json(visit)).into_response(),
        Err(e) => visit_error(e),
    }
}

/// `GET /api/visits/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match visits::get(&state.pool, id).await {
        Ok(visit) => Json(visit).into_response(),
        Err(e) => visit_error(e),
    }
}

/// `PUT /api/visits/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<VisitInput>,
) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match visits::update(&state.pool, id, &input).await {
        Ok(visit) => Json(visit).into_response(),
        Err(e) => visit_error(e),
    }
}

/// `DELETE /api/visits/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match visits::delete(&state.pool, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => visit_error(e),
    }
}
