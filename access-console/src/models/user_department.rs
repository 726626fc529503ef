//! User↔department association records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{AssociationId, Department, DepartmentId, UserId};

/// Association between a user and a department.
///
/// At most one record per user has `is_primary == true`; the backend owns
/// that rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDepartment {
    pub id: AssociationId,
    pub user_id: UserId,
    pub department_id: DepartmentId,
    #[serde(default)]
    pub position: Option<String>,
    pub is_primary: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub department: Option<Department>,
}

/// Embedded user summary on association listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct AssignUserRequest {
    pub user_id: UserId,
    pub department_id: DepartmentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct BatchAssignRequest {
    #[validate(length(min = 1))]
    pub user_ids: Vec<UserId>,
    pub department_id: DepartmentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub position: Option<String>,
}

/// Partial update; fields left `None` are untouched server-side.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UpdateUserDepartmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,
}

/// Outcome of a batch assignment; skips are not failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAssignResult {
    pub assigned_count: u32,
    pub skipped_count: u32,
    #[serde(default)]
    pub assignments: Vec<UserDepartment>,
}
