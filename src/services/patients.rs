//! Patient records — intake, lookup, and maintenance.
//!
//! Field rules mirror the office intake form: names and phone are required,
//! everything else is optional with capped lengths.

use sqlx::{PgPool, Row};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("{0}")]
    Validation(String),
    #[error("patient not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    #[serde(with = "crate::services::iso_date::option")]
    pub date_of_birth: Option<Date>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub occupation: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_policy_number: Option<String>,
    pub xray_images: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Intake form payload, shared by create and update.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct PatientInput {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    #[serde(default, with = "crate::services::iso_date::option")]
    pub date_of_birth: Option<Date>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub occupation: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_policy_number: Option<String>,
}

// =============================================================================
// VALIDATION
// =============================================================================

pub(crate) fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return None;
    }
    let parts = normalized.split('@').collect::<Vec<_>>();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(normalized)
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), PatientError> {
    if value.len() > max {
        return Err(PatientError::Validation(format!("{field} too long")));
    }
    Ok(())
}

fn check_opt_len(field: &str, value: Option<&String>, max: usize) -> Result<(), PatientError> {
    if let Some(value) = value {
        check_len(field, value, max)?;
    }
    Ok(())
}

/// Validate an intake payload. Mirrors the intake form rules.
pub fn validate(input: &PatientInput) -> Result<(), PatientError> {
    if input.first_name.trim().is_empty() {
        return Err(PatientError::Validation("first name is required".into()));
    }
    check_len("first name", &input.first_name, 50)?;
    if input.last_name.trim().is_empty() {
        return Err(PatientError::Validation("last name is required".into()));
    }
    check_len("last name", &input.last_name, 50)?;

    let phone = input.phone.trim();
    if phone.len() < 10 {
        return Err(PatientError::Validation("phone number must be at least 10 digits".into()));
    }
    if phone.len() > 15 {
        return Err(PatientError::Validation("phone number too long".into()));
    }

    if let Some(email) = input.email.as_deref().filter(|e| !e.trim().is_empty()) {
        if normalize_email(email).is_none() {
            return Err(PatientError::Validation("invalid email address".into()));
        }
    }

    if let Some(age) = input.age {
        if !(0..=150).contains(&age) {
            return Err(PatientError::Validation("invalid age".into()));
        }
    }

    check_opt_len("address", input.address.as_ref(), 500)?;
    check_opt_len("occupation", input.occupation.as_ref(), 100)?;
    check_opt_len("emergency contact name", input.emergency_contact_name.as_ref(), 100)?;
    check_opt_len("emergency contact phone", input.emergency_contact_phone.as_ref(), 15)?;
    check_opt_len("insurance provider", input.insurance_provider.as_ref(), 100)?;
    check_opt_len("policy number", input.insurance_policy_number.as_ref(), 50)?;
    Ok(())
}

// =============================================================================
// CRUD
// =============================================================================

const PATIENT_COLUMNS: &str = "id, first_name, last_name, email, phone, address, date_of_birth, age, gender, \
     marital_status, occupation, emergency_contact_name, emergency_contact_phone, \
     insurance_provider, insurance_policy_number, xray_images, created_at";

fn patient_from_row(row: &sqlx::postgres::PgRow) -> Patient {
    Patient {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        address: row.get("address"),
        date_of_birth: row.get("date_of_birth"),
        age: row.get("age"),
        gender: row.get("gender"),
        marital_status: row.get("marital_status"),
        occupation: row.get("occupation"),
        emergency_contact_name: row.get("emergency_contact_name"),
        emergency_contact_phone: row.get("emergency_contact_phone"),
        insurance_provider: row.get("insurance_provider"),
        insurance_policy_number: row.get("insurance_policy_number"),
        xray_images: row
            .get::<Option<Vec<String>>, _>("xray_images")
            .unwrap_or_default(),
        created_at: row.get("created_at"),
    }
}

/// Create a patient from a validated intake payload.
///
/// # Errors
///
/// Returns a validation error for a malformed payload, or a database error.
pub async fn create(pool: &PgPool, input: &PatientInput) -> Result<Patient, PatientError> {
    validate(input)?;
    let email = input.email.as_deref().filter(|e| !e.trim().is_empty()).and_then(normalize_email);
    let row = sqlx::query(&format!(
        r"INSERT INTO patients (first_name, last_name, email, phone, address, date_of_birth, age,
                                gender, marital_status, occupation, emergency_contact_name,
                                emergency_contact_phone, insurance_provider, insurance_policy_number)
          VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
          RETURNING {PATIENT_COLUMNS}"
    ))
    .bind(input.first_name.trim())
    .bind(input.last_name.trim())
    .bind(email)
    .bind(input.phone.trim())
    .bind(&input.address)
    .bind(input.date_of_birth)
    .bind(input.age)
    .bind(&input.gender)
    .bind(&input.marital_status)
    .bind(&input.occupation)
    .bind(&input.emergency_contact_name)
    .bind(&input.emergency_contact_phone)
    .bind(&input.insurance_provider)
    .bind(&input.insurance_policy_number)
    .fetch_one(pool)
    .await?;
    Ok(patient_from_row(&row))
}

/// Fetch one patient.
///
/// # Errors
///
/// `NotFound` if the id does not exist.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<Patient, PatientError> {
    let row = sqlx::query(&format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(patient_from_row).ok_or(PatientError::NotFound(id))
}

/// List all patients ordered by last name, as the office screens do.
pub async fn list(pool: &PgPool) -> Result<Vec<Patient>, PatientError> {
    let rows = sqlx::query(&format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY last_name ASC"))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(patient_from_row).collect())
}

/// Update a patient from a validated intake payload.
pub async fn update(pool: &PgPool, id: Uuid, input: &PatientInput) -> Result<Patient, PatientError> {
    validate(input)?;
    let email = input.email.as_deref().filter(|e| !e.trim().is_empty()).and_then(normalize_email);
    let row = sqlx::query(&format!(
        r"UPDATE patients
          SET first_name = $2, last_name = $3, email = $4, phone = $5, address = $6,
              date_of_birth = $7, age = $8, gender = $9, marital_status = $10, occupation = $11,
              emergency_contact_name = $12, emergency_contact_phone = $13,
              insurance_provider = $14, insurance_policy_number = $15, updated_at = now()
          WHERE id = $1
          RETURNING {PATIENT_COLUMNS}"
    ))
    .bind(id)
    .bind(input.first_name.trim())
    .bind(input.last_name.trim())
    .bind(email)
    .bind(input.phone.trim())
    .bind(&input.address)
    .bind(input.date_of_birth)
    .bind(input.age)
    .bind(&input.gender)
    .bind(&input.marital_status)
    .bind(&input.occupation)
    .bind(&input.emergency_contact_name)
    .bind(&input.emergency_contact_phone)
    .bind(&input.insurance_provider)
    .bind(&input.insurance_policy_number)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(patient_from_row).ok_or(PatientError::NotFound(id))
}

/// Delete a patient and their dependent rows (cascaded by the schema).
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), PatientError> {
    let result = sqlx::query("DELETE FROM patients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PatientError::NotFound(id));
    }
    Ok(())
}

#[cfg(test)]
#[path = "patients_test.rs"]
mod tests;
