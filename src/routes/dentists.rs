//! Dentist directory routes — read-only listing for the scheduling form's
//! dentist picker.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::auth::directory;
use crate::routes::auth::require_dentist;
use crate::state::AppState;

/// `GET /api/dentists`
pub async fn list(State(state): State<AppState>) -> Response {
    if let Err(denied) = require_dentist(&state) {
        return denied;
    }
    match directory::list(&state.pool).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "dentist directory query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
#[path = "dentists_test.rs"]
mod tests;
