//! Dentist directory — the remote table holding role-granting profiles.
//!
//! The directory is a shared resource: other clients may insert or update
//! records concurrently. The unique email constraint in the schema keeps the
//! non-atomic lookup-then-insert sequence benign (a losing insert fails
//! instead of duplicating).

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Row from the `dentists` table. `user_id` is nullable because records may
/// be provisioned before the clinician ever signs in.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DirectoryRecord {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Insert payload for a directory record created during role resolution.
#[derive(Debug, Clone)]
pub struct NewDirectoryRecord {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Remote dentist directory. Implemented over Postgres in production and by
/// in-memory fakes in tests.
#[async_trait]
pub trait DentistDirectory: Send + Sync {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<DirectoryRecord>, DirectoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<DirectoryRecord>, DirectoryError>;

    async fn insert(&self, record: NewDirectoryRecord) -> Result<DirectoryRecord, DirectoryError>;

    /// Attach a user id to a record provisioned before the id was known.
    async fn attach_user_id(&self, record_id: Uuid, user_id: Uuid) -> Result<DirectoryRecord, DirectoryError>;
}

/// All directory records, ordered by name. Backs the scheduling form's
/// dentist picker.
pub async fn list(pool: &PgPool) -> Result<Vec<DirectoryRecord>, DirectoryError> {
    let rows =
        sqlx::query("SELECT id, user_id, email, first_name, last_name FROM dentists ORDER BY last_name, first_name")
            .fetch_all(pool)
            .await?;
    Ok(rows.iter().map(record_from_row).collect())
}

// =============================================================================
// POSTGRES IMPLEMENTATION
// =============================================================================

pub struct PgDentistDirectory {
    pool: PgPool,
}

impl PgDentistDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> DirectoryRecord {
    DirectoryRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
    }
}

#[async_trait]
impl DentistDirectory for PgDentistDirectory {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<DirectoryRecord>, DirectoryError> {
        let row = sqlx::query("SELECT id, user_id, email, first_name, last_name FROM dentists WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(record_from_row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<DirectoryRecord>, DirectoryError> {
        let row = sqlx::query("SELECT id, user_id, email, first_name, last_name FROM dentists WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(record_from_row))
    }

    async fn insert(&self, record: NewDirectoryRecord) -> Result<DirectoryRecord, DirectoryError> {
        let row = sqlx::query(
            r"INSERT INTO dentists (user_id, email, first_name, last_name)
              VALUES ($1, $2, $3, $4)
              RETURNING id, user_id, email, first_name, last_name",
        )
        .bind(record.user_id)
        .bind(&record.email)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(record_from_row(&row))
    }

    async fn attach_user_id(&self, record_id: Uuid, user_id: Uuid) -> Result<DirectoryRecord, DirectoryError> {
        let row = sqlx::query(
            r"UPDATE dentists SET user_id = $2, updated_at = now()
              WHERE id = $1
              RETURNING id, user_id, email, first_name, last_name",
        )
        .bind(record_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(record_from_row(&row))
    }
}
