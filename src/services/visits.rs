//! Visit records — per-patient treatment log.

use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use time::Date;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum VisitError {
    #[error("{0}")]
    Validation(String),
    #[error("visit not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Visit {
    pub id: Uuid,
    pub patient_id: Uuid,
    #[serde(with = "crate::services::iso_date")]
    pub visit_date: Date,
    pub diagnosis: String,
    pub treatment: String,
    pub treatment_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub xray_images: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct VisitInput {
    pub patient_id: Uuid,
    #[serde(with = "crate::services::iso_date")]
    pub visit_date: Date,
    pub diagnosis: String,
    pub treatment: String,
    pub treatment_cost: Option<Decimal>,
    pub notes: Option<String>,
}

pub fn validate(input: &VisitInput) -> Result<(), VisitError> {
    if input.diagnosis.trim().is_empty() {
        return Err(VisitError::Validation("diagnosis is required".into()));
    }
    if input.treatment.trim().is_empty() {
        return Err(VisitError::Validation("treatment is required".into()));
    }
    if let Some(cost) = input.treatment_cost {
        if cost < Decimal::ZERO {
            return Err(VisitError::Validation("treatment cost cannot be negative".into()));
        }
    }
    if let Some(notes) = &input.notes {
        if notes.len() > 1000 {
            return Err(VisitError::Validation("notes too long".into()));
        }
    }
    Ok(())
}

// =============================================================================
// CRUD
// =============================================================================

const VISIT_COLUMNS: &str = "id, patient_id, visit_date, diagnosis, treatment, treatment_cost, notes, xray_images";

fn visit_from_row(row: &sqlx::postgres::PgRow) -> Visit {
    Visit {
        id: row.get("id"),
        patient_id: row.get("patient_id"),
        visit_date: row.get("visit_date"),
        diagnosis: row.get("diagnosis"),
        treatment: row.get("treatment"),
        treatment_cost: row.get("treatment_cost"),
        notes: row.get("notes"),
        xray_images: row
            .get::<Option<Vec<String>>, _>("xray_images")
            .unwrap_or_default(),
    }
}

/// Record a visit.
pub async fn create(pool: &PgPool, input: &VisitInput) -> Result<Visit, VisitError> {
    validate(input)?;
    let row = sqlx::query(&format!(
        r"INSERT INTO visits (patient_id, visit_date, diagnosis, treatment, treatment_cost, notes)
          VALUES ($1, $2, $3, $4, $5, $6)
          RETURNING {VISIT_COLUMNS}"
    ))
    .bind(input.patient_id)
    .bind(input.visit_date)
    .bind(input.diagnosis.trim())
    .bind(input.treatment.trim())
    .bind(input.treatment_cost)
    .bind(&input.notes)
    .fetch_one(pool)
    .await?;
    Ok(visit_from_row(&row))
}

/// Visits for one patient, newest first.
pub async fn list_by_patient(pool: &PgPool, patient_id: Uuid) -> Result<Vec<Visit>, VisitError> {
    let rows = sqlx::query(&format!(
        "SELECT {VISIT_COLUMNS} FROM visits WHERE patient_id = $1 ORDER BY visit_date DESC"
    ))
    .bind(patient_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(visit_from_row).collect())
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Visit, VisitError> {
    let row = sqlx::query(&format!("SELECT {VISIT_COLUMNS} FROM visits WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(visit_from_row).ok_or(VisitError::NotFound(id))
}

pub async fn update(pool: &PgPool, id: Uuid, input: &VisitInput) -> Result<Visit, VisitError> {
    validate(input)?;
    let row = sqlx::query(&format!(
        r"UPDATE visits
          SET visit_date = $2, diagnosis = $3, treatment = $4, treatment_cost = $5, notes = $6,
              updated_at = now()
          WHERE id = $1
          RETURNING {VISIT_COLUMNS}"
    ))
    .bind(id)
    .bind(input.visit_date)
    .bind(input.diagnosis.trim())
    .bind(input.treatment.trim())
    .bind(input.treatment_cost)
    .bind(&input.notes)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(visit_from_row).ok_or(VisitError::NotFound(id))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), VisitError> {
    let result = sqlx::query("DELETE FROM visits WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(VisitError::NotFound(id));
    }
    Ok(())
}

#[cfg(test)]
#[path = "visits_test.rs"]
mod tests;
