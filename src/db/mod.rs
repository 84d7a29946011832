//! Storage adapter for employee agreements.
//!
//! Agreements are kept as JSON documents in SQLite. The service only sees the
//! [`AgreementStore`] trait, so another backend can be slotted in.

mod repository;

pub use repository::*;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use crate::errors::AppError;
use crate::models::{AgreementFields, EmployeeAgreement, SortField, SortOrder};

/// Persistence operations the agreement service needs.
///
/// Implementations assign ids and timestamps; each call is a single storage round trip.
#[async_trait]
pub trait AgreementStore: Send + Sync {
    /// Persist a new agreement and return it with its id and timestamps.
    async fn insert(&self, fields: &AgreementFields) -> Result<EmployeeAgreement, AppError>;

    /// Load an agreement by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<EmployeeAgreement>, AppError>;

    /// Replace the content at `id`, refreshing `updatedAt`. `None` if there is no such id.
    async fn replace(
        &self,
        id: &str,
        fields: &AgreementFields,
    ) -> Result<Option<EmployeeAgreement>, AppError>;

    /// Remove an agreement, returning what was removed. `None` if there is no such id.
    async fn delete(&self, id: &str) -> Result<Option<EmployeeAgreement>, AppError>;

    /// One page of agreements in the requested order.
    async fn find_page(
        &self,
        sort_by: SortField,
        order: SortOrder,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<EmployeeAgreement>, AppError>;

    /// Number of stored agreements.
    async fn count(&self) -> Result<i64, AppError>;
}

/// Build the repository for `database_url`.
///
/// The pool connects lazily: a store that is down at startup does not stop the
/// process, its operations fail until it comes back.
pub async fn connect(database_url: &str) -> Result<Repository, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    // Ensure the parent directory exists
    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_lazy_with(options);

    Ok(Repository::new(pool))
}
