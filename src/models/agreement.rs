//! Employee agreement record and the request bodies that create or change it.

use serde::{Deserialize, Serialize, Serializer};

use super::Timestamp;
use crate::errors::AppError;

pub const MISSING_FIELDS: &str = "Missing required fields. Please ensure all fields, including 'otherDetails.department' and 'otherDetails.manager', are provided.";
pub const DATE_ORDER: &str = "Start date must be earlier than end date.";
pub const NEGATIVE_SALARY: &str = "Salary cannot be negative.";

/// Department and reporting line of an agreement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherDetails {
    pub department: String,
    pub manager: String,
}

/// The content of an agreement, everything except storage-assigned metadata.
///
/// This is the document the store persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementFields {
    pub employee_name: String,
    pub role: String,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    #[serde(serialize_with = "serialize_amount")]
    pub salary: f64,
    pub terms: String,
    pub other_details: OtherDetails,
}

/// A persisted employee agreement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeAgreement {
    pub id: String,
    #[serde(flatten)]
    pub fields: AgreementFields,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Nested part of a request body; either sub-field may be left out.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherDetailsPayload {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub manager: Option<String>,
}

/// Request body for POST, PUT and PATCH.
///
/// Every field is optional at the decoding stage so that absence can be told apart
/// from a zero or empty value. `id`, `createdAt` and `updatedAt` are not part of the
/// body and are ignored if a client sends them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementPayload {
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub start_date: Option<Timestamp>,
    #[serde(default)]
    pub end_date: Option<Timestamp>,
    #[serde(default)]
    pub salary: Option<f64>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub other_details: Option<OtherDetailsPayload>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AgreementPayload {
    /// Turn a body that must carry a complete agreement into its fields.
    ///
    /// A zero salary counts as present.
    pub fn require_all(self) -> Result<AgreementFields, AppError> {
        let missing = || AppError::Validation(MISSING_FIELDS.to_string());
        let details = self.other_details.unwrap_or_default();

        Ok(AgreementFields {
            employee_name: present(self.employee_name).ok_or_else(missing)?,
            role: present(self.role).ok_or_else(missing)?,
            start_date: self.start_date.ok_or_else(missing)?,
            end_date: self.end_date.ok_or_else(missing)?,
            salary: self.salary.ok_or_else(missing)?,
            terms: present(self.terms).ok_or_else(missing)?,
            other_details: OtherDetails {
                department: present(details.department).ok_or_else(missing)?,
                manager: present(details.manager).ok_or_else(missing)?,
            },
        })
    }

    /// Business rules over whichever fields the body actually carries.
    pub fn check_rules(&self) -> Result<(), AppError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start >= end {
                return Err(AppError::Validation(DATE_ORDER.to_string()));
            }
        }
        if matches!(self.salary, Some(salary) if salary < 0.0) {
            return Err(AppError::Validation(NEGATIVE_SALARY.to_string()));
        }
        Ok(())
    }
}

impl AgreementFields {
    /// Business rules over a complete agreement.
    pub fn check_rules(&self) -> Result<(), AppError> {
        if self.start_date >= self.end_date {
            return Err(AppError::Validation(DATE_ORDER.to_string()));
        }
        if self.salary < 0.0 {
            return Err(AppError::Validation(NEGATIVE_SALARY.to_string()));
        }
        Ok(())
    }

    /// Structural check run on every document before it is written.
    ///
    /// Returns the first violation found.
    pub fn validate_schema(&self) -> Result<(), String> {
        let required = [
            ("employeeName", &self.employee_name),
            ("role", &self.role),
            ("terms", &self.terms),
            ("otherDetails.department", &self.other_details.department),
            ("otherDetails.manager", &self.other_details.manager),
        ];
        for (path, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{} is required", path));
            }
        }
        if !self.salary.is_finite() {
            return Err("salary must be a finite number".to_string());
        }
        if self.salary < 0.0 {
            return Err(format!(
                "salary ({}) is less than minimum allowed value (0)",
                self.salary
            ));
        }
        Ok(())
    }

    /// Overwrite the fields present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: AgreementPayload) {
        if let Some(employee_name) = patch.employee_name {
            self.employee_name = employee_name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(salary) = patch.salary {
            self.salary = salary;
        }
        if let Some(terms) = patch.terms {
            self.terms = terms;
        }
        if let Some(details) = patch.other_details {
            if let Some(department) = details.department {
                self.other_details.department = department;
            }
            if let Some(manager) = details.manager {
                self.other_details.manager = manager;
            }
        }
    }
}

/// Whole amounts are written as JSON integers, fractional ones as floats.
fn serialize_amount<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
