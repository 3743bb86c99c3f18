//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic, validation, and persistence concerns
//! so route handlers can stay focused on status mapping and auth gating.

use time::Date;

pub mod appointments;
pub mod medical_history;
pub mod notifications;
pub mod patients;
pub mod payments;
pub mod visits;
pub mod xrays;

// Calendar dates cross the wire as plain `YYYY-MM-DD` strings; datetimes use
// RFC 3339 via `time::serde::rfc3339` at the field level.
time::serde::format_description!(pub(crate) iso_date, Date, "[year]-[month]-[day]");
