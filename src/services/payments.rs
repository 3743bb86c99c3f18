//! Payment records and revenue/balance arithmetic.
//!
//! Totals are computed over fetched rows rather than in SQL, matching the
//! office screens: revenue counts only completed payments, and a patient's
//! balance is recorded treatment costs minus completed payments.

use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use time::Date;
use uuid::Uuid;

use crate::services::visits::Visit;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(String),
    #[error("payment not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Refunded,
}

impl PaymentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Refunded => "refunded",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Payment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub amount: Decimal,
    pub payment_method: String,
    #[serde(with = "crate::services::iso_date")]
    pub payment_date: Date,
    pub description: Option<String>,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PaymentInput {
    pub patient_id: Uuid,
    pub amount: Decimal,
    pub payment_method: String,
    #[serde(with = "crate::services::iso_date")]
    pub payment_date: Date,
    pub description: Option<String>,
    /// Defaults to `completed`, as the tracker form does.
    pub status: Option<PaymentStatus>,
}

pub fn validate(input: &PaymentInput) -> Result<(), PaymentError> {
    if input.amount <= Decimal::ZERO {
        return Err(PaymentError::Validation("amount must be positive".into()));
    }
    if input.payment_method.trim().is_empty() {
        return Err(PaymentError::Validation("payment method is required".into()));
    }
    if let Some(description) = &input.description {
        if description.len() > 500 {
            return Err(PaymentError::Validation("description too long".into()));
        }
    }
    Ok(())
}

// =============================================================================
// TOTALS
// =============================================================================

/// Revenue over a set of payments: completed only.
#[must_use]
pub fn completed_total(payments: &[Payment]) -> Decimal {
    payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed)
        .map(|p| p.amount)
        .sum()
}

/// Outstanding balance for a patient: recorded treatment costs minus
/// completed payments. Positive means the patient still owes.
#[must_use]
pub fn patient_balance(payments: &[Payment], visits: &[Visit]) -> Decimal {
    let costs: Decimal = visits.iter().filter_map(|v| v.treatment_cost).sum();
    costs - completed_total(payments)
}

// =============================================================================
// CRUD
// =============================================================================

const PAYMENT_COLUMNS: &str = "id, patient_id, amount, payment_method, payment_date, description, status";

fn payment_from_row(row: &sqlx::postgres::PgRow) -> Payment {
    let status: String = row.get("status");
    Payment {
        id: row.get("id"),
        patient_id: row.get("patient_id"),
        amount: row.get("amount"),
        payment_method: row.get("payment_method"),
        payment_date: row.get("payment_date"),
        description: row.get("description"),
        status: PaymentStatus::parse(&status).unwrap_or(PaymentStatus::Completed),
    }
}

/// Record a payment.
pub async fn create(pool: &PgPool, input: &PaymentInput) -> Result<Payment, PaymentError> {
    validate(input)?;
    let status = input.status.unwrap_or(PaymentStatus::Completed);
    let row = sqlx::query(&format!(
        r"INSERT INTO payments (patient_id, amount, payment_method, payment_date, description, status)
          VALUES ($1, $2, $3, $4, $5, $6)
          RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(input.patient_id)
    .bind(input.amount)
    .bind(input.payment_method.trim())
    .bind(input.payment_date)
    .bind(&input.description)
    .bind(status.as_str())
    .fetch_one(pool)
    .await?;
    Ok(payment_from_row(&row))
}

/// All payments, newest first, as the tracker lists them.
pub async fn list(pool: &PgPool) -> Result<Vec<Payment>, PaymentError> {
    let rows = sqlx::query(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY payment_date DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(payment_from_row).collect())
}

/// Payments for one patient, newest first.
pub async fn list_by_patient(pool: &PgPool, patient_id: Uuid) -> Result<Vec<Payment>, PaymentError> {
    let rows = sqlx::query(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE patient_id = $1 ORDER BY payment_date DESC"
    ))
    .bind(patient_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(payment_from_row).collect())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), PaymentError> {
    let result = sqlx::query("DELETE FROM payments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PaymentError::NotFound(id));
    }
    Ok(())
}

#[cfg(test)]
#[path = "payments_test.rs"]
mod tests;
