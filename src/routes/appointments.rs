//! Appointment routes — scheduling, the approval machine, and the
//! best-effort approval notification.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::routes::auth::require_dentist;
use crate::services::appointments::{self, AppointmentError, AppointmentInput, AppointmentStatus};
use crate::services::notifications;
use crate::state::AppState;

fn appointment_error(e: AppointmentError) -> Response {
    match e {
        AppointmentError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response(),
        AppointmentError::NotFound(_) => (StatusCode::NOT_FOUND, "appointment not found").into_response(),
        AppointmentError::InvalidTransition { .. } => (StatusCode::CONFLICT, e.to_string()).into_response(),
        AppointmentError::Database(e) => {
            tracing::error!(error = %e, "appointment query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /api/appointments`
pub async fn list(State(state): State<AppState>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match appointments::list(&state.pool).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => appointment_error(e),
    }
}

/// `POST /api/appointments` — always lands in `pending`.
pub async fn create(State(state): State<AppState>, Json(input): Json<AppointmentInput>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match appointments::create(&state.pool, &input).await {
        Ok(appointment) => (StatusCode::CREATED, Json(appointment)).into_response(),
        Err(e) => appointment_error(e),
    }
}

/// `GET /api/appointments/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match appointments::get(&state.pool, id).await {
        Ok(details) => Json(details).into_response(),
        Err(e) => appointment_error(e),
    }
}

async fn transition(state: &AppState, id: Uuid, to: AppointmentStatus) -> Response {
    if let Err(denied) = require_dentist(state) {
        return denied;
    }
    match appointments::update_status(&state.pool, id, to).await {
        Ok(details) => {
            // Approval fires the dentist's email off the request path;
            // a failed send never fails the approval.
            if to == AppointmentStatus::Approved {
                if let Some(config) = state.resend.clone() {
                    let details = details.clone();
                    tokio::spawn(async move {
                        if let Err(e) = notifications::send_appointment_notification(&config, &details).await {
                            tracing::warn!(error = %e, "appointment notification failed");
                        }
                    });
                }
            }
            Json(details).into_response()
        }
        Err(e) => appointment_error(e),
    }
}

/// `POST /api/appointments/{id}/approve`
pub async fn approve(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    transition(&state, id, AppointmentStatus::Approved).await
}

/// `POST /api/appointments/{id}/cancel`
pub async fn cancel(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    transition(&state, id, AppointmentStatus::Cancelled).await
}

/// `POST /api/appointments/{id}/complete`
pub async fn complete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    transition(&state, id, AppointmentStatus::Completed).await
}

#[derive(Deserialize)]
pub struct RescheduleBody {
    #[serde(with = "time::serde::rfc3339")]
    pub appointment_datetime: OffsetDateTime,
}

/// `POST /api/appointments/{id}/reschedule` — back to `pending` at a new time.
pub async fn reschedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RescheduleBody>,
) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match appointments::reschedule(&state.pool, id, body.appointment_datetime).await {
        Ok(details) => Json(details).into_response(),
        Err(e) => appointment_error(e),
    }
}
