//! Pagination and sorting for the list endpoint, plus the wrapped response bodies.

use serde::{Deserialize, Serialize};

use super::EmployeeAgreement;
use crate::errors::AppError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// Raw list query parameters.
///
/// Kept as strings so that a bad number becomes a validation error with a readable
/// message instead of a framework rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Only the literal `asc` sorts ascending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Record fields a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    EmployeeName,
    Role,
    StartDate,
    EndDate,
    Salary,
    Terms,
    Department,
    Manager,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Map a `sortBy` value onto a known field. Unknown names fall back to `createdAt`.
    pub fn from_param(value: &str) -> Self {
        match value {
            "id" | "_id" => SortField::Id,
            "employeeName" => SortField::EmployeeName,
            "role" => SortField::Role,
            "startDate" => SortField::StartDate,
            "endDate" => SortField::EndDate,
            "salary" => SortField::Salary,
            "terms" => SortField::Terms,
            "otherDetails.department" => SortField::Department,
            "otherDetails.manager" => SortField::Manager,
            "updatedAt" => SortField::UpdatedAt,
            "createdAt" => SortField::CreatedAt,
            other => {
                tracing::debug!("Unknown sort field {:?}, using {}", other, DEFAULT_SORT_FIELD);
                SortField::CreatedAt
            }
        }
    }
}

/// Validated list parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortField,
    pub order: SortOrder,
}

fn parse_positive(name: &str, raw: Option<&str>, default: u32) -> Result<u32, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<u32>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(AppError::Validation(format!(
            "Query parameter '{}' must be a positive integer, got {:?}",
            name, raw
        ))),
    }
}

impl ListParams {
    /// Apply defaults and clamp `limit` to `max_limit`.
    pub fn from_query(query: &ListQuery, max_limit: u32) -> Result<Self, AppError> {
        let page = parse_positive("page", query.page.as_deref(), DEFAULT_PAGE)?;
        let limit = parse_positive("limit", query.limit.as_deref(), DEFAULT_LIMIT)?;

        Ok(Self {
            page,
            limit: limit.min(max_limit),
            sort_by: SortField::from_param(query.sort_by.as_deref().unwrap_or(DEFAULT_SORT_FIELD)),
            order: SortOrder::from_param(query.order.as_deref()),
        })
    }

    /// Number of records to skip before this page starts.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

/// Response body of `GET /emps`.
#[derive(Debug, Clone, Serialize)]
pub struct AgreementPage {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub employees: Vec<EmployeeAgreement>,
}

/// Response body of `DELETE /emps/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub message: String,
    pub deleted_employee: EmployeeAgreement,
}
