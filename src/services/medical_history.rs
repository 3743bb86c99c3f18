//! Medical history — the intake screening block, one row per patient.
//!
//! The form answers arrive as literal `yes`/`no` strings plus capped
//! free-text details; conditions and allergies are stored as JSON arrays.
//! Saving replaces the whole block (upsert by patient).

use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum MedicalHistoryError {
    #[error("{0}")]
    Validation(String),
    #[error("no medical history for patient: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct MedicalHistory {
    /// Route handlers overwrite this from the URL path, so the body may omit it.
    #[serde(default)]
    pub patient_id: Uuid,
    pub medical_conditions: Option<serde_json::Value>,
    pub allergies: Option<serde_json::Value>,
    pub other_allergy: Option<String>,
    pub taking_medication: Option<String>,
    pub medication_details: Option<String>,
    pub in_good_health: Option<String>,
    pub serious_illness: Option<String>,
    pub illness_description: Option<String>,
    pub hospitalized: Option<String>,
    pub hospitalization_details: Option<String>,
    pub in_medical_treatment: Option<String>,
    pub treatment_condition: Option<String>,
    pub physician_name: Option<String>,
    pub physician_specialty: Option<String>,
    pub physician_phone: Option<String>,
    pub physician_address: Option<String>,
    pub blood_type: Option<String>,
    pub blood_pressure: Option<String>,
    pub bleeding_time: Option<String>,
    pub uses_tobacco: Option<String>,
    pub uses_alcohol_drugs: Option<String>,
    pub is_pregnant: Option<String>,
    pub is_nursing: Option<String>,
    pub taking_birth_control: Option<String>,
}

// =============================================================================
// VALIDATION
// =============================================================================

const YES_NO_FIELDS: [&str; 10] = [
    "taking_medication",
    "in_good_health",
    "serious_illness",
    "hospitalized",
    "in_medical_treatment",
    "uses_tobacco",
    "uses_alcohol_drugs",
    "is_pregnant",
    "is_nursing",
    "taking_birth_control",
];

fn yes_no_value<'a>(history: &'a MedicalHistory, field: &str) -> Option<&'a String> {
    match field {
        "taking_medication" => history.taking_medication.as_ref(),
        "in_good_health" => history.in_good_health.as_ref(),
        "serious_illness" => history.serious_illness.as_ref(),
        "hospitalized" => history.hospitalized.as_ref(),
        "in_medical_treatment" => history.in_medical_treatment.as_ref(),
        "uses_tobacco" => history.uses_tobacco.as_ref(),
        "uses_alcohol_drugs" => history.uses_alcohol_drugs.as_ref(),
        "is_pregnant" => history.is_pregnant.as_ref(),
        "is_nursing" => history.is_nursing.as_ref(),
        "taking_birth_control" => history.taking_birth_control.as_ref(),
        _ => None,
    }
}

fn check_opt_len(field: &str, value: Option<&String>, max: usize) -> Result<(), MedicalHistoryError> {
    if let Some(value) = value {
        if value.len() > max {
            return Err(MedicalHistoryError::Validation(format!("{field} too long")));
        }
    }
    Ok(())
}

pub fn validate(history: &MedicalHistory) -> Result<(), MedicalHistoryError> {
    for field in YES_NO_FIELDS {
        if let Some(value) = yes_no_value(history, field) {
            if value != "yes" && value != "no" {
                return Err(MedicalHistoryError::Validation(format!("{field} must be yes or no")));
            }
        }
    }

    for (field, value, max) in [
        ("medication details", history.medication_details.as_ref(), 1000),
        ("illness description", history.illness_description.as_ref(), 1000),
        ("hospitalization details", history.hospitalization_details.as_ref(), 1000),
        ("treatment condition", history.treatment_condition.as_ref(), 1000),
        ("physician name", history.physician_name.as_ref(), 100),
        ("physician specialty", history.physician_specialty.as_ref(), 100),
        ("physician phone", history.physician_phone.as_ref(), 15),
        ("physician address", history.physician_address.as_ref(), 500),
        ("blood type", history.blood_type.as_ref(), 10),
        ("blood pressure", history.blood_pressure.as_ref(), 20),
        ("bleeding time", history.bleeding_time.as_ref(), 20),
        ("other allergies", history.other_allergy.as_ref(), 500),
    ] {
        check_opt_len(field, value, max)?;
    }
    Ok(())
}

// =============================================================================
// PERSISTENCE
// =============================================================================

fn history_from_row(row: &sqlx::postgres::PgRow) -> MedicalHistory {
    MedicalHistory {
        patient_id: row.get("patient_id"),
        medical_conditions: row.get("medical_conditions"),
        allergies: row.get("allergies"),
        other_allergy: row.get("other_allergy"),
        taking_medication: row.get("taking_medication"),
        medication_details: row.get("medication_details"),
        in_good_health: row.get("in_good_health"),
        serious_illness: row.get("serious_illness"),
        illness_description: row.get("illness_description"),
        hospitalized: row.get("hospitalized"),
        hospitalization_details: row.get("hospitalization_details"),
        in_medical_treatment: row.get("in_medical_treatment"),
        treatment_condition: row.get("treatment_condition"),
        physician_name: row.get("physician_name"),
        physician_specialty: row.get("physician_specialty"),
        physician_phone: row.get("physician_phone"),
        physician_address: row.get("physician_address"),
        blood_type: row.get("blood_type"),
        blood_pressure: row.get("blood_pressure"),
        bleeding_time: row.get("bleeding_time"),
        uses_tobacco: row.get("uses_tobacco"),
        uses_alcohol_drugs: row.get("uses_alcohol_drugs"),
        is_pregnant: row.get("is_pregnant"),
        is_nursing: row.get("is_nursing"),
        taking_birth_control: row.get("taking_birth_control"),
    }
}

const HISTORY_COLUMNS: &str = "patient_id, medical_conditions, allergies, other_allergy, taking_medication, \
     medication_details, in_good_health, serious_illness, illness_description, hospitalized, \
     hospitalization_details, in_medical_treatment, treatment_condition, physician_name, \
     physician_specialty, physician_phone, physician_address, blood_type, blood_pressure, \
     bleeding_time, uses_tobacco, uses_alcohol_drugs, is_pregnant, is_nursing, taking_birth_control";

/// Fetch the history block for a patient.
pub async fn get(pool: &PgPool, patient_id: Uuid) -> Result<MedicalHistory, MedicalHistoryError> {
    let row = sqlx::query(&format!(
        "SELECT {HISTORY_COLUMNS} FROM medical_history WHERE patient_id = $1"
    ))
    .bind(patient_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref()
        .map(history_from_row)
        .ok_or(MedicalHistoryError::NotFound(patient_id))
}

/// Save the whole block for a patient, replacing any previous answers.
pub async fn upsert(pool: &PgPool, history: &MedicalHistory) -> Result<MedicalHistory, MedicalHistoryError> {
    validate(history)?;
    let row = sqlx::query(&format!(
        r"INSERT INTO medical_history (
              patient_id, medical_conditions, allergies, other_allergy, taking_medication,
              medication_details, in_good_health, serious_illness, illness_description, hospitalized,
              hospitalization_details, in_medical_treatment, treatment_condition, physician_name,
              physician_specialty, physician_phone, physician_address, blood_type, blood_pressure,
              bleeding_time, uses_tobacco, uses_alcohol_drugs, is_pregnant, is_nursing, taking_birth_control)
          VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
                  $19, $20, $21, $22, $23, $24, $25)
          ON CONFLICT (patient_id) DO UPDATE SET
              medical_conditions = EXCLUDED.medical_conditions,
              allergies = EXCLUDED.allergies,
              other_allergy = EXCLUDED.other_allergy,
              taking_medication = EXCLUDED.taking_medication,
              medication_details = EXCLUDED.medication_details,
              in_good_health = EXCLUDED.in_good_health,
              serious_illness = EXCLUDED.serious_illness,
              illness_description = EXCLUDED.illness_description,
              hospitalized = EXCLUDED.hospitalized,
              hospitalization_details = EXCLUDED.hospitalization_details,
              in_medical_treatment = EXCLUDED.in_medical_treatment,
              treatment_condition = EXCLUDED.treatment_condition,
              physician_name = EXCLUDED.physician_name,
              physician_specialty = EXCLUDED.physician_specialty,
              physician_phone = EXCLUDED.physician_phone,
              physician_address = EXCLUDED.physician_address,
              blood_type = EXCLUDED.blood_type,
              blood_pressure = EXCLUDED.blood_pressure,
              bleeding_time = EXCLUDED.bleeding_time,
              uses_tobacco = EXCLUDED.uses_tobacco,
              uses_alcohol_drugs = EXCLUDED.uses_alcohol_drugs,
              is_pregnant = EXCLUDED.is_pregnant,
              is_nursing = EXCLUDED.is_nursing,
              taking_birth_control = EXCLUDED.taking_birth_control,
              updated_at = now()
          RETURNING {HISTORY_COLUMNS}"
    ))
    .bind(history.patient_id)
    .bind(&history.medical_conditions)
    .bind(&history.allergies)
    .bind(&history.other_allergy)
    .bind(&history.taking_medication)
    .bind(&history.medication_details)
    .bind(&history.in_good_health)
    .bind(&history.serious_illness)
    .bind(&history.illness_description)
    .bind(&history.hospitalized)
    .bind(&history.hospitalization_details)
    .bind(&history.in_medical_treatment)
    .bind(&history.treatment_condition)
    .bind(&history.physician_name)
    .bind(&history.physician_specialty)
    .bind(&history.physician_phone)
    .bind(&history.physician_address)
    .bind(&history.blood_type)
    .bind(&history.blood_pressure)
    .bind(&history.bleeding_time)
    .bind(&history.uses_tobacco)
    .bind(&history.uses_alcohol_drugs)
    .bind(&history.is_pregnant)
    .bind(&history.is_nursing)
    .bind(&history.taking_birth_control)
    .fetch_one(pool)
    .await?;
    Ok(history_from_row(&row))
}

#[cfg(test)]
#[path = "medical_history_test.rs"]
mod tests;
