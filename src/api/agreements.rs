//! Employee agreement API endpoints.

use axum::extract::{Path, State};

use super::{created, success, ApiResult, AppJson, AppQuery};
use crate::models::{AgreementPage, AgreementPayload, DeleteResponse, EmployeeAgreement, ListQuery};
use crate::AppState;

/// GET /emps - List agreements with pagination and sorting.
pub async fn list_agreements(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<AgreementPage> {
    success(state.service.list(&query).await?)
}

/// GET /emps/{id} - Get a single agreement.
pub async fn get_agreement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<EmployeeAgreement> {
    success(state.service.get(&id).await?)
}

/// POST /emps - Create a new agreement.
pub async fn create_agreement(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AgreementPayload>,
) -> ApiResult<EmployeeAgreement> {
    created(state.service.create(payload).await?)
}

/// PATCH /emps/{id} - Update only the supplied fields.
pub async fn patch_agreement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<AgreementPayload>,
) -> ApiResult<EmployeeAgreement> {
    success(state.service.update_partial(&id, payload).await?)
}

/// PUT /emps/{id} - Replace an agreement.
pub async fn replace_agreement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<AgreementPayload>,
) -> ApiResult<EmployeeAgreement> {
    success(state.service.update_full(&id, payload).await?)
}

/// DELETE /emps/{id} - Delete an agreement.
pub async fn delete_agreement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeleteResponse> {
    success(state.service.delete(&id).await?)
}
