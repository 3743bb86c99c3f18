//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the office JSON API under a single Axum router. Every route except
//! `/healthz` and the auth endpoints sits behind the dentist role gate,
//! checked per-handler via [`auth::require_dentist`].

pub mod appointments;
pub mod auth;
pub mod dentists;
pub mod patients;
pub mod payments;
pub mod visits;
pub mod xrays;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the office API router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/patients", get(patients::list).post(patients::create))
        .route(
            "/api/patients/{id}",
            get(patients::get).put(patients::update).delete(patients::delete),
        )
        .route(
            "/api/patients/{id}/medical-history",
            get(patients::get_history).put(patients::put_history),
        )
        .route("/api/patients/{id}/visits", get(visits::list_for_patient))
        .route("/api/patients/{id}/payments", get(payments::patient_summary))
        .route("/api/patients/{id}/xrays/upload-key", post(xrays::issue_key))
        .route(
            "/api/patients/{id}/xrays",
            post(xrays::attach_to_patient).delete(xrays::detach_from_patient),
        )
        .route("/api/dentists", get(dentists::list))
        .route("/api/appointments", get(appointments::list).post(appointments::create))
        .route("/api/appointments/{id}", get(appointments::get))
        .route("/api/appointments/{id}/approve", post(appointments::approve))
        .route("/api/appointments/{id}/cancel", post(appointments::cancel))
        .route("/api/appointments/{id}/complete", post(appointments::complete))
        .route("/api/appointments/{id}/reschedule", post(appointments::reschedule))
        .route("/api/visits", post(visits::create))
        .route("/api/visits/{id}", get(visits::get).put(visits::update).delete(visits::delete))
        .route(
            "/api/visits/{id}/xrays",
            post(xrays::attach_to_visit).delete(xrays::detach_from_visit),
        )
        .route("/api/payments", get(payments::list).post(payments::create))
        .route("/api/payments/{id}", delete(payments::delete))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
