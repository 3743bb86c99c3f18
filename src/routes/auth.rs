//! Auth routes — operator sign-in/out and the role gate for protected handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthError;
use crate::auth::guard::{LOGIN_REQUIRED_NOTICE, UNAUTHORIZED_NOTICE};
use crate::state::AppState;

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

// =============================================================================
// ROLE GATE
// =============================================================================

/// Gate a handler on the operator being a signed-in dentist.
///
/// Still-loading sessions are a 503 so the office UI retries instead of
/// bouncing the operator to the login screen during startup restore.
///
/// # Errors
///
/// A ready-to-send response: 503 while loading, 401 signed out, 403 wrong role.
pub fn require_dentist(state: &AppState) -> Result<(), Response> {
    let status = state.guard.status();
    if status.loading {
        return Err((StatusCode::SERVICE_UNAVAILABLE, "session still resolving").into_response());
    }
    if !status.is_authenticated {
        return Err((StatusCode::UNAUTHORIZED, LOGIN_REQUIRED_NOTICE).into_response());
    }
    if !status.is_authorized {
        return Err((StatusCode::FORBIDDEN, UNAUTHORIZED_NOTICE).into_response());
    }
    Ok(())
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct LoginBody {
    email: String,
    password: String,
}

/// `POST /api/auth/login` — exchange credentials for the operator session.
/// Responds once role resolution has settled so the caller sees the final
/// `(user, role)` rather than an intermediate loading snapshot.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Response {
    if let Err(e) = state.auth.sign_in(&body.email, &body.password).await {
        let status = match e {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Provider(_) | AuthError::Network(_) => StatusCode::BAD_GATEWAY,
        };
        return (status, e.to_string()).into_response();
    }

    let mut rx = state.auth.subscribe();
    let settled = match rx.wait_for(|snap| !snap.loading).await {
        Ok(snap) => snap.clone(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };
    Json(json!({ "user": settled.user, "role": settled.role })).into_response()
}

/// `POST /api/auth/logout` — clear the operator session. Always succeeds.
pub async fn logout(State(state): State<AppState>) -> StatusCode {
    state.auth.sign_out().await;
    StatusCode::NO_CONTENT
}

/// `GET /api/auth/me` — current snapshot plus guard flags.
pub async fn me(State(state): State<AppState>) -> Response {
    let snap = state.auth.snapshot();
    let status = state.guard.status();
    Json(json!({
        "user": snap.user,
        "role": snap.role,
        "loading": snap.loading,
        "is_authenticated": status.is_authenticated,
        "is_authorized": status.is_authorized,
    }))
    .into_response()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
