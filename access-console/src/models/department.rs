//! Department model - the organizational forest.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{DepartmentId, UserId};

/// Department entity.
///
/// `parent_id == None` marks a root. The tree endpoint nests descendants in
/// `children`; the flat listing leaves it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<DepartmentId>,
    #[serde(default)]
    pub manager_id: Option<UserId>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Department>,
}

impl Department {
    /// Create a childless department.
    pub fn new(id: DepartmentId, name: impl Into<String>, parent_id: Option<DepartmentId>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            parent_id,
            manager_id: None,
            sort_order: 0,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub parent_id: Option<DepartmentId>,
    pub manager_id: Option<UserId>,
    #[validate(range(min = 0))]
    pub sort_order: i32,
}

/// Partial update. `Some(None)` on `parent_id`/`manager_id` clears the link.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UpdateDepartmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<DepartmentId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<Option<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
}
