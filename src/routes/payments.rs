//! Payment routes — the tracker list plus per-patient balance summary.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use uuid::Uuid;

use crate::routes::auth::require_dentist;
use crate::services::payments::{self, PaymentError, PaymentInput};
use crate::services::visits;
use crate::state::AppState;

fn payment_error(e: PaymentError) -> Response {
    match e {
        PaymentError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response(),
        PaymentError::NotFound(_) => (StatusCode::NOT_FOUND, "payment not found").into_response(),
        PaymentError::Database(e) => {
            tracing::error!(error = %e, "payment query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /api/payments`
pub async fn list(State(state): State<AppState>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match payments::list(&state.pool).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => payment_error(e),
    }
}

/// `POST /api/payments`
pub async fn create(State(state): State<AppState>, Json(input): Json<PaymentInput>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match payments::create(&state.pool, &input).await {
        Ok(payment) => (StatusCode::CREATED, Json(payment)).into_response(),
        Err(e) => payment_error(e),
    }
}

/// `DELETE /api/payments/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match payments::delete(&state.pool, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => payment_error(e),
    }
}

/// `GET /api/patients/{id}/payments` — history plus totals for the
/// balance card.
pub async fn patient_summary(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    let payment_rows = match payments::list_by_patient(&state.pool, id).await {
        Ok(rows) => rows,
        Err(e) => return payment_error(e),
    };
    let visit_rows = match visits::list_by_patient(&state.pool, id).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "visit query failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let total_paid = payments::completed_total(&payment_rows);
    let balance = payments::patient_balance(&payment_rows, &visit_rows);
    Json(json!({
        "payments": payment_rows,
        "total_paid": total_paid,
        "balance": balance,
    }))
    .into_response()
}
