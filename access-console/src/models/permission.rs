//! Permission model - resource/action pairs addressed by name.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::PermissionId;

/// Permission entity.
///
/// `name` is the stable identifier for set operations; `id` is only needed
/// on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub resource: String,
    pub action: String,
    pub is_active: bool,
}

/// `{permission}` envelope used by `GET /permissions/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionEnvelope {
    pub permission: Permission,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreatePermissionRequest {
    #[validate(length(min = 2, max = 50))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub resource: String,
    #[validate(length(min = 1))]
    pub action: String,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UpdatePermissionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 50))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
