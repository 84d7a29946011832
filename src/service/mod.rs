//! Agreement service: the operations behind `/emps`.
//!
//! Holds no record state between requests. Each operation validates its input, makes
//! one storage call and hands back the result.

use std::sync::Arc;

use crate::db::AgreementStore;
use crate::errors::AppError;
use crate::models::{
    AgreementPage, AgreementPayload, DeleteResponse, EmployeeAgreement, ListParams, ListQuery,
};

pub const NOT_FOUND: &str = "Employee not found";
pub const DELETED: &str = "Employee Agreement successfully deleted";

#[derive(Clone)]
pub struct AgreementService {
    store: Arc<dyn AgreementStore>,
    max_page_limit: u32,
}

/// Canonical (lowercase, hyphenated) form of a client-supplied id.
fn parse_id(id: &str) -> Result<String, AppError> {
    uuid::Uuid::parse_str(id)
        .map(|uuid| uuid.hyphenated().to_string())
        .map_err(|_| AppError::Validation(format!("Invalid employee id: {}", id)))
}

fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND.to_string())
}

impl AgreementService {
    pub fn new(store: Arc<dyn AgreementStore>, max_page_limit: u32) -> Self {
        Self {
            store,
            max_page_limit,
        }
    }

    /// One page of agreements plus the overall count.
    pub async fn list(&self, query: &ListQuery) -> Result<AgreementPage, AppError> {
        let params = ListParams::from_query(query, self.max_page_limit)?;

        let load = async {
            let employees = self
                .store
                .find_page(
                    params.sort_by,
                    params.order,
                    params.offset(),
                    i64::from(params.limit),
                )
                .await?;
            let total = self.store.count().await?;
            Ok::<_, AppError>(AgreementPage {
                total,
                page: params.page,
                limit: params.limit,
                employees,
            })
        };

        load.await
            .map_err(|e| e.context("Error retrieving employees"))
    }

    pub async fn get(&self, id: &str) -> Result<EmployeeAgreement, AppError> {
        let id = &parse_id(id)?;

        self.store
            .find_by_id(id)
            .await
            .map_err(|e| e.context("Error retrieving employee"))?
            .ok_or_else(not_found)
    }

    pub async fn create(&self, payload: AgreementPayload) -> Result<EmployeeAgreement, AppError> {
        let fields = payload.require_all()?;
        fields.check_rules().inspect_err(|e| {
            tracing::debug!("Rejected new agreement: {}", e);
        })?;
        fields
            .validate_schema()
            .map_err(|msg| AppError::Validation(format!("Error saving employee: {}", msg)))?;

        let created = self
            .store
            .insert(&fields)
            .await
            .map_err(|e| e.context("Error saving employee"))?;

        tracing::info!(id = %created.id, "Created employee agreement");
        Ok(created)
    }

    /// Merge the supplied fields onto the stored agreement.
    ///
    /// Rules are checked against the request first, then the merged document is
    /// validated as a whole so a single-date patch cannot invert the date range.
    pub async fn update_partial(
        &self,
        id: &str,
        payload: AgreementPayload,
    ) -> Result<EmployeeAgreement, AppError> {
        let id = &parse_id(id)?;
        payload.check_rules().inspect_err(|e| {
            tracing::debug!(id, "Rejected agreement patch: {}", e);
        })?;

        let mut fields = self
            .store
            .find_by_id(id)
            .await
            .map_err(|e| e.context("Error updating employee"))?
            .ok_or_else(not_found)?
            .fields;

        fields.apply(payload);
        fields.check_rules()?;
        fields
            .validate_schema()
            .map_err(|msg| AppError::Validation(format!("Error updating employee: {}", msg)))?;

        let updated = self
            .store
            .replace(id, &fields)
            .await
            .map_err(|e| e.context("Error updating employee"))?
            .ok_or_else(not_found)?;

        tracing::info!(id, "Updated employee agreement");
        Ok(updated)
    }

    /// Replace the whole agreement; every required field must be supplied again.
    pub async fn update_full(
        &self,
        id: &str,
        payload: AgreementPayload,
    ) -> Result<EmployeeAgreement, AppError> {
        let id = &parse_id(id)?;
        let fields = payload.require_all()?;
        fields.check_rules().inspect_err(|e| {
            tracing::debug!(id, "Rejected agreement replacement: {}", e);
        })?;
        fields
            .validate_schema()
            .map_err(|msg| AppError::Validation(format!("Error replacing employee: {}", msg)))?;

        let replaced = self
            .store
            .replace(id, &fields)
            .await
            .map_err(|e| e.context("Error replacing employee"))?
            .ok_or_else(not_found)?;

        tracing::info!(id, "Replaced employee agreement");
        Ok(replaced)
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteResponse, AppError> {
        let id = &parse_id(id)?;

        let deleted = self
            .store
            .delete(id)
            .await
            .map_err(|e| e.context("Error deleting employee"))?
            .ok_or_else(not_found)?;

        tracing::info!(id, "Deleted employee agreement");
        Ok(DeleteResponse {
            message: DELETED.to_string(),
            deleted_employee: deleted,
        })
    }
}
