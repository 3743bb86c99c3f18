//! Patient routes — records CRUD and the medical history block.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use uuid::Uuid;

use crate::routes::auth::require_dentist;
use crate::services::medical_history::{self, MedicalHistory, MedicalHistoryError};
use crate::services::patients::{self, PatientError, PatientInput};
use crate::state::AppState;

fn patient_error(e: PatientError) -> Response {
    match e {
        PatientError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response(),
        PatientError::NotFound(_) => (StatusCode::NOT_FOUND, "patient not found").into_response(),
        PatientError::Database(e) => {
            tracing::error!(error = %e, "patient query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn history_error(e: MedicalHistoryError) -> Response {
    match e {
        MedicalHistoryError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response(),
        MedicalHistoryError::NotFound(_) => (StatusCode::NOT_FOUND, "no medical history recorded").into_response(),
        MedicalHistoryError::Database(e) => {
            tracing::error!(error = %e, "medical history query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /api/patients`
pub async fn list(State(state): State<AppState>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match patients::list(&state.pool).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => patient_error(e),
    }
}

/// `POST /api/patients`
pub async fn create(State(state): State<AppState>, Json(input): Json<PatientInput>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match patients::create(&state.pool, &input).await {
        Ok(patient) => (StatusCode::CREATED, Json(patient)).into_response(),
        Err(e) => patient_error(e),
    }
}

/// `GET /api/patients/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match patients::get(&state.pool, id).await {
        Ok(patient) => Json(patient).into_response(),
        Err(e) => patient_error(e),
    }
}

/// `PUT /api/patients/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<PatientInput>,
) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match patients::update(&state.pool, id, &input).await {
        Ok(patient) => Json(patient).into_response(),
        Err(e) => patient_error(e),
    }
}

/// `DELETE /api/patients/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match patients::delete(&state.pool, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => patient_error(e),
    }
}

/// `GET /api/patients/{id}/medical-history`
pub async fn get_history(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match medical_history::get(&state.pool, id).await {
        Ok(history) => Json(history).into_response(),
        Err(e) => history_error(e),
    }
}

/// `PUT /api/patients/{id}/medical-history` — replace the whole block.
pub async fn put_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut history): Json<MedicalHistory>,
) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    // The path wins over whatever patient id came in the body.
    history.patient_id = id;
    match medical_history::upsert(&state.pool, &history).await {
        Ok(saved) => Json(saved).into_response(),
        Err(e) => history_error(e),
    }
}
