//! Appointment scheduling and the approval status machine.
//!
//! DESIGN
//! ======
//! New appointments start `pending` and wait for the dentist's decision:
//! `pending → approved | cancelled`, `approved → completed | cancelled`.
//! Completed and cancelled are terminal. Rescheduling moves the appointment
//! back to `pending` for re-approval.

use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

/// Services offered by the scheduling form.
pub const SERVICE_TYPES: [&str; 9] = [
    "General Checkup",
    "Cleaning",
    "Filling",
    "Root Canal",
    "Crown",
    "Extraction",
    "Whitening",
    "Orthodontic Consultation",
    "Emergency",
];

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("{0}")]
    Validation(String),
    #[error("appointment not found: {0}")]
    NotFound(Uuid),
    #[error("cannot move appointment from {from} to {to}")]
    InvalidTransition { from: AppointmentStatus, to: AppointmentStatus },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// =============================================================================
// STATUS MACHINE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Whether the dentist may move an appointment from `self` to `to`.
    #[must_use]
    pub fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Approved | Self::Cancelled) | (Self::Approved, Self::Completed | Self::Cancelled)
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, serde::Serialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub appointment_datetime: OffsetDateTime,
    pub service_type: String,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
}

/// Appointment joined with names for the dashboard and notification email.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: String,
    pub dentist_name: String,
    pub dentist_email: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AppointmentInput {
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub appointment_datetime: OffsetDateTime,
    pub service_type: String,
    pub notes: Option<String>,
}

pub fn validate(input: &AppointmentInput) -> Result<(), AppointmentError> {
    if !SERVICE_TYPES.contains(&input.service_type.as_str()) {
        return Err(AppointmentError::Validation(format!(
            "unknown service type: {}",
            input.service_type
        )));
    }
    if let Some(notes) = &input.notes {
        if notes.len() > 1000 {
            return Err(AppointmentError::Validation("notes too long".into()));
        }
    }
    Ok(())
}

// =============================================================================
// QUERIES
// =============================================================================

fn appointment_from_row(row: &sqlx::postgres::PgRow) -> Appointment {
    let status: String = row.get("status");
    Appointment {
        id: row.get("id"),
        patient_id: row.get("patient_id"),
        dentist_id: row.get("dentist_id"),
        appointment_datetime: row.get("appointment_datetime"),
        service_type: row.get("service_type"),
        notes: row.get("notes"),
        status: AppointmentStatus::parse(&status).unwrap_or(AppointmentStatus::Pending),
    }
}

/// Schedule a new appointment in `pending` state.
///
/// # Errors
///
/// Validation error for an unknown service type or oversized notes.
pub async fn create(pool: &PgPool, input: &AppointmentInput) -> Result<Appointment, AppointmentError> {
    validate(input)?;
    let row = sqlx::query(
        r"INSERT INTO appointments (patient_id, dentist_id, appointment_datetime, service_type, notes, status)
          VALUES ($1, $2, $3, $4, $5, 'pending')
          RETURNING id, patient_id, dentist_id, appointment_datetime, service_type, notes, status",
    )
    .bind(input.patient_id)
    .bind(input.dentist_id)
    .bind(input.appointment_datetime)
    .bind(&input.service_type)
    .bind(&input.notes)
    .fetch_one(pool)
    .await?;
    Ok(appointment_from_row(&row))
}

const DETAILS_QUERY: &str = r"SELECT
          a.id, a.patient_id, a.dentist_id, a.appointment_datetime, a.service_type, a.notes, a.status,
          p.first_name || ' ' || p.last_name AS patient_name,
          d.first_name || ' ' || d.last_name AS dentist_name,
          d.email AS dentist_email
      FROM appointments a
      JOIN patients p ON p.id = a.patient_id
      JOIN dentists d ON d.id = a.dentist_id";

fn details_from_row(row: &sqlx::postgres::PgRow) -> AppointmentDetails {
    AppointmentDetails {
        appointment: appointment_from_row(row),
        patient_name: row.get("patient_name"),
        dentist_name: row.get("dentist_name"),
        dentist_email: row.get("dentist_email"),
    }
}

/// List all appointments with names, soonest first.
pub async fn list(pool: &PgPool) -> Result<Vec<AppointmentDetails>, AppointmentError> {
    let rows = sqlx::query(&format!("{DETAILS_QUERY} ORDER BY a.appointment_datetime ASC"))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(details_from_row).collect())
}

/// Fetch one appointment with names.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<AppointmentDetails, AppointmentError> {
    let row = sqlx::query(&format!("{DETAILS_QUERY} WHERE a.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(details_from_row).ok_or(AppointmentError::NotFound(id))
}

/// Move an appointment through the status machine.
///
/// # Errors
///
/// `InvalidTransition` when the move is not allowed from the current status.
pub async fn update_status(pool: &PgPool, id: Uuid, to: AppointmentStatus) -> Result<AppointmentDetails, AppointmentError> {
    let current = get(pool, id).await?;
    let from = current.appointment.status;
    if !from.can_transition(to) {
        return Err(AppointmentError::InvalidTransition { from, to });
    }

    // Guard on the status we read so a concurrent transition loses cleanly.
    let result = sqlx::query("UPDATE appointments SET status = $2, updated_at = now() WHERE id = $1 AND status = $3")
        .bind(id)
        .bind(to.as_str())
        .bind(from.as_str())
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        let raced = get(pool, id).await?;
        return Err(AppointmentError::InvalidTransition { from: raced.appointment.status, to });
    }

    get(pool, id).await
}

/// Move an appointment to a new datetime and back to `pending` for
/// re-approval. Terminal appointments cannot be rescheduled.
pub async fn reschedule(
    pool: &PgPool,
    id: Uuid,
    new_datetime: OffsetDateTime,
) -> Result<AppointmentDetails, AppointmentError> {
    let current = get(pool, id).await?;
    let from = current.appointment.status;
    if from.is_terminal() {
        return Err(AppointmentError::InvalidTransition { from, to: AppointmentStatus::Pending });
    }

    sqlx::query(
        "UPDATE appointments SET appointment_datetime = $2, status = 'pending', updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(new_datetime)
    .execute(pool)
    .await?;

    get(pool, id).await
}

#[cfg(test)]
#[path = "appointments_test.rs"]
mod tests;
