//! SQLite-backed agreement repository.
//!
//! Each agreement is one row holding its fields as a JSON document. Nested fields are
//! reached with `json_extract`, which is also how listings are sorted.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tokio::sync::OnceCell;

use super::AgreementStore;
use crate::errors::AppError;
use crate::models::{AgreementFields, EmployeeAgreement, SortField, SortOrder, Timestamp};

const SELECT_COLUMNS: &str = "id, document, created_at, updated_at";

/// Document repository for agreements.
pub struct Repository {
    pool: SqlitePool,
    schema: OnceCell<()>,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            schema: OnceCell::new(),
        }
    }

    /// Create the collection on first use. Retried on every call until it succeeds.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        self.schema
            .get_or_try_init(|| run_migrations(&self.pool))
            .await?;
        Ok(())
    }
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS agreements (
            id TEXT PRIMARY KEY,
            document TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_agreements_created_at ON agreements(created_at);
        CREATE INDEX IF NOT EXISTS idx_agreements_updated_at ON agreements(updated_at);
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Agreement collection ready");
    Ok(())
}

/// SQL expression for a sort field. Only these fixed strings reach the query text.
fn sort_expression(field: SortField) -> &'static str {
    match field {
        SortField::Id => "id",
        SortField::EmployeeName => "json_extract(document, '$.employeeName')",
        SortField::Role => "json_extract(document, '$.role')",
        SortField::StartDate => "json_extract(document, '$.startDate')",
        SortField::EndDate => "json_extract(document, '$.endDate')",
        SortField::Salary => "json_extract(document, '$.salary')",
        SortField::Terms => "json_extract(document, '$.terms')",
        SortField::Department => "json_extract(document, '$.otherDetails.department')",
        SortField::Manager => "json_extract(document, '$.otherDetails.manager')",
        SortField::CreatedAt => "created_at",
        SortField::UpdatedAt => "updated_at",
    }
}

#[async_trait]
impl AgreementStore for Repository {
    async fn insert(&self, fields: &AgreementFields) -> Result<EmployeeAgreement, AppError> {
        self.ensure_schema().await?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Timestamp::now();
        let document = serde_json::to_string(fields)?;

        sqlx::query(
            "INSERT INTO agreements (id, document, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&document)
        .bind(now.to_string())
        .bind(now.to_string())
        .execute(&self.pool)
        .await?;

        Ok(EmployeeAgreement {
            id,
            fields: fields.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<EmployeeAgreement>, AppError> {
        self.ensure_schema().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM agreements WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(agreement_from_row).transpose()
    }

    async fn replace(
        &self,
        id: &str,
        fields: &AgreementFields,
    ) -> Result<Option<EmployeeAgreement>, AppError> {
        self.ensure_schema().await?;

        let document = serde_json::to_string(fields)?;
        let now = Timestamp::now();

        let row = sqlx::query(&format!(
            "UPDATE agreements SET document = ?, updated_at = ? WHERE id = ? RETURNING {}",
            SELECT_COLUMNS
        ))
        .bind(&document)
        .bind(now.to_string())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(agreement_from_row).transpose()
    }

    async fn delete(&self, id: &str) -> Result<Option<EmployeeAgreement>, AppError> {
        self.ensure_schema().await?;

        let row = sqlx::query(&format!(
            "DELETE FROM agreements WHERE id = ? RETURNING {}",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(agreement_from_row).transpose()
    }

    async fn find_page(
        &self,
        sort_by: SortField,
        order: SortOrder,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<EmployeeAgreement>, AppError> {
        self.ensure_schema().await?;

        // rowid breaks ties in insertion order so pages never overlap
        let sql = format!(
            "SELECT {columns} FROM agreements ORDER BY {expr} {dir}, rowid {dir} LIMIT ? OFFSET ?",
            columns = SELECT_COLUMNS,
            expr = sort_expression(sort_by),
            dir = order.as_sql(),
        );

        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(agreement_from_row).collect()
    }

    async fn count(&self) -> Result<i64, AppError> {
        self.ensure_schema().await?;

        let row = sqlx::query("SELECT COUNT(*) AS total FROM agreements")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }
}

fn agreement_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<EmployeeAgreement, AppError> {
    let document: String = row.try_get("document")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(EmployeeAgreement {
        id: row.try_get("id")?,
        fields: serde_json::from_str(&document)?,
        created_at: parse_stored_timestamp(&created_at)?,
        updated_at: parse_stored_timestamp(&updated_at)?,
    })
}

fn parse_stored_timestamp(raw: &str) -> Result<Timestamp, AppError> {
    raw.parse()
        .map_err(|e| AppError::Internal(format!("Corrupt timestamp: {}", e)))
}
