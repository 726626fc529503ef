//! Identifiers and response envelopes shared by every resource.

use serde::{Deserialize, Serialize};
use validator::Validate;

pub type UserId = i64;
pub type RoleId = i64;
pub type PermissionId = i64;
pub type DepartmentId = i64;
pub type AssociationId = i64;

/// `{data}` envelope with an optional human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `{message}` body returned by deletes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// One page of a resource collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Query string for paginated listings.
#[derive(Debug, Clone, Copy, Serialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 1))]
    pub page: u32,
    #[validate(range(min = 1, max = 100))]
    pub per_page: u32,
}

impl PageQuery {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}
