//! Backend collaborators and the pure access-control logic built on them.

mod api_client;
mod auth_client;
mod department_client;
pub mod org_tree;
mod permission_client;
pub mod reconciler;
mod role_client;
mod user_client;
mod user_department_client;

pub use api_client::ApiClient;
pub use auth_client::AuthClient;
pub use department_client::DepartmentClient;
pub use org_tree::{
    INDENT_PREFIX, SelectOption, TreeError, TreeNode, build_tree, flatten_tree,
    flatten_with_indent, sort_by_order,
};
pub use permission_client::PermissionClient;
pub use reconciler::{
    ApplyOutcome, ApplyReport, GrantAction, OperationFailure, PermissionCatalog, PermissionDelta,
    PermissionGrants, ReconcileError, RoleEditor, apply, reconcile,
};
pub use role_client::RoleClient;
pub use user_client::UserClient;
pub use user_department_client::UserDepartmentClient;
