//! User model - identity with denormalized role and permission views.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

use super::{RoleId, UserId};

/// User as returned by the backend.
///
/// `roles` and `permissions` are read views computed server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl User {
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains(name)
    }
}

/// `{user}` envelope used by `GET /users/{id}` and `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: RoleId,
}
