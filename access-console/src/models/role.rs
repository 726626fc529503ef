//! Role model - named permission bundles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

use super::{PermissionId, RoleId};

/// Role entity.
///
/// `permissions` is the membership set the reconciler diffs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

/// `{role}` envelope used by `GET /roles/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleEnvelope {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 2, max = 50))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UpdateRoleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 50))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Body of `POST`/`DELETE /roles/{id}/permissions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionRequest {
    pub permission_id: PermissionId,
}
