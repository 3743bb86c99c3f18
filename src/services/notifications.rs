//! Appointment notification emails to the assigned dentist.
//!
//! Sent after an appointment is approved. Delivery is best-effort: a failed
//! send is logged and never fails the approval that triggered it.

use resend_rs::Resend;
use resend_rs::types::CreateEmailBaseOptions;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::services::appointments::AppointmentDetails;

const NOTIFICATION_TEMPLATE: &str = include_str!("../../templates/appointment_notification.html");

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[weekday repr:long], [month repr:long] [day padding:none], [year]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour repr:12 padding:none]:[minute] [period]");

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("email delivery failed: {0}")]
    EmailDelivery(String),
}

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    pub from: String,
}

impl ResendConfig {
    /// Build from `RESEND_API_KEY` and `RESEND_FROM`. Returns `None` when the
    /// key is unset, which disables notifications.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("RESEND_API_KEY").ok().filter(|v| !v.is_empty())?;
        let from = std::env::var("RESEND_FROM")
            .unwrap_or_else(|_| "ClinicDesk <notifications@resend.dev>".to_string());
        Some(Self { api_key, from })
    }
}

#[must_use]
pub fn render_appointment_template(details: &AppointmentDetails) -> String {
    let datetime = details.appointment.appointment_datetime;
    let date = datetime.format(DATE_FORMAT).unwrap_or_else(|_| datetime.date().to_string());
    let time = datetime.format(TIME_FORMAT).unwrap_or_else(|_| datetime.time().to_string());
    NOTIFICATION_TEMPLATE
        .replace("{{PATIENT_NAME}}", &details.patient_name)
        .replace("{{DENTIST_NAME}}", &details.dentist_name)
        .replace("{{SERVICE}}", &details.appointment.service_type)
        .replace("{{DATE}}", &date)
        .replace("{{TIME}}", &time)
        .replace("{{NOTES}}", details.appointment.notes.as_deref().unwrap_or("None"))
}

/// Send the approval notice to the appointment's dentist.
///
/// # Errors
///
/// `EmailDelivery` when the provider rejects the send. Callers treat this as
/// log-and-continue.
pub async fn send_appointment_notification(
    config: &ResendConfig,
    details: &AppointmentDetails,
) -> Result<(), NotificationError> {
    let resend = Resend::new(&config.api_key);
    let to = [details.dentist_email.as_str()];
    let subject = "New Appointment Scheduled";
    let html = render_appointment_template(details);

    let email = CreateEmailBaseOptions::new(&config.from, to, subject).with_html(&html);
    resend
        .emails
        .send(email)
        .await
        .map_err(|e| NotificationError::EmailDelivery(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
#[path = "notifications_test.rs"]
mod tests;
