//! Role↔permission reconciliation.
//!
//! Diffs a role's current permission names against the desired ones and
//! issues one grant or revoke per difference, all at once.

use async_trait::async_trait;
use console_core::error::{ApiError, ApiResult};
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};

use crate::models::{Permission, PermissionId, Role, RoleId};

/// Minimal change set between two permission sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionDelta {
    pub to_add: BTreeSet<String>,
    pub to_remove: BTreeSet<String>,
}

impl PermissionDelta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// `to_add = desired - current`, `to_remove = current - desired`.
pub fn reconcile(current: &BTreeSet<String>, desired: &BTreeSet<String>) -> PermissionDelta {
    PermissionDelta {
        to_add: desired.difference(current).cloned().collect(),
        to_remove: current.difference(desired).cloned().collect(),
    }
}

/// Grant/revoke collaborator.
#[async_trait]
pub trait PermissionGrants: Send + Sync {
    async fn grant(&self, role_id: RoleId, permission_id: PermissionId) -> ApiResult<()>;
    async fn revoke(&self, role_id: RoleId, permission_id: PermissionId) -> ApiResult<()>;
}

/// In-memory permission list used to resolve names to ids. May be stale.
#[derive(Debug, Clone, Default)]
pub struct PermissionCatalog {
    by_name: HashMap<String, PermissionId>,
}

impl PermissionCatalog {
    pub fn new(permissions: impl IntoIterator<Item = Permission>) -> Self {
        permissions.into_iter().collect()
    }

    pub fn resolve(&self, name: &str) -> Option<PermissionId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl FromIterator<Permission> for PermissionCatalog {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self {
            by_name: iter.into_iter().map(|p| (p.name, p.id)).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Nothing was sent. Not the same as a successful change.
    NoChanges,
    Applied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub outcome: ApplyOutcome,
    pub granted: Vec<String>,
    pub revoked: Vec<String>,
    /// Names skipped because the catalog had no id for them.
    pub unresolved: Vec<String>,
}

impl ApplyReport {
    fn no_changes(unresolved: Vec<String>) -> Self {
        Self {
            outcome: ApplyOutcome::NoChanges,
            granted: Vec::new(),
            revoked: Vec::new(),
            unresolved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantAction {
    Grant,
    Revoke,
}

impl std::fmt::Display for GrantAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantAction::Grant => write!(f, "grant"),
            GrantAction::Revoke => write!(f, "revoke"),
        }
    }
}

/// One grant or revoke that the backend refused or never answered.
#[derive(Debug)]
pub struct OperationFailure {
    pub action: GrantAction,
    pub permission: String,
    pub error: ApiError,
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The batch failed as a whole; re-read the role before retrying.
    #[error("{} of {attempted} permission changes failed", .failures.len())]
    Failed {
        attempted: usize,
        failures: Vec<OperationFailure>,
        unresolved: Vec<String>,
    },
}

/// Issue every grant and revoke in `delta` concurrently.
///
/// Succeeds only if every operation succeeds. Names `resolve` cannot map are
/// skipped and reported in `unresolved`.
pub async fn apply<G, R>(
    grants: &G,
    role_id: RoleId,
    delta: &PermissionDelta,
    resolve: R,
) -> Result<ApplyReport, ReconcileError>
where
    G: PermissionGrants + ?Sized,
    R: Fn(&str) -> Option<PermissionId>,
{
    if delta.is_empty() {
        return Ok(ApplyReport::no_changes(Vec::new()));
    }

    let mut unresolved = Vec::new();
    let mut operations = Vec::new();
    let planned = delta
        .to_add
        .iter()
        .map(|name| (GrantAction::Grant, name))
        .chain(delta.to_remove.iter().map(|name| (GrantAction::Revoke, name)));
    for (action, name) in planned {
        match resolve(name) {
            Some(id) => operations.push((action, name.clone(), id)),
            None => unresolved.push(name.clone()),
        }
    }

    if !unresolved.is_empty() {
        tracing::warn!(role_id, unresolved = ?unresolved, "Skipping permissions with no known id");
    }

    if operations.is_empty() {
        return Ok(ApplyReport::no_changes(unresolved));
    }

    let results = join_all(operations.iter().map(|(action, _, id)| async move {
        match action {
            GrantAction::Grant => grants.grant(role_id, *id).await,
            GrantAction::Revoke => grants.revoke(role_id, *id).await,
        }
    }))
    .await;

    let attempted = operations.len();
    let mut granted = Vec::new();
    let mut revoked = Vec::new();
    let mut failures = Vec::new();

    for ((action, permission, _), result) in operations.into_iter().zip(results) {
        match (result, action) {
            (Ok(()), GrantAction::Grant) => granted.push(permission),
            (Ok(()), GrantAction::Revoke) => revoked.push(permission),
            (Err(error), action) => {
                tracing::warn!(role_id, %action, permission = %permission, error = %error, "Permission change failed");
                failures.push(OperationFailure {
                    action,
                    permission,
                    error,
                });
            }
        }
    }

    if !failures.is_empty() {
        return Err(ReconcileError::Failed {
            attempted,
            failures,
            unresolved,
        });
    }

    tracing::info!(
        role_id,
        granted = granted.len(),
        revoked = revoked.len(),
        "Role permissions updated"
    );

    Ok(ApplyReport {
        outcome: ApplyOutcome::Applied,
        granted,
        revoked,
        unresolved,
    })
}

/// Saves a role's permission set through a grants collaborator.
pub struct RoleEditor<G> {
    grants: G,
    catalog: PermissionCatalog,
}

impl<G: PermissionGrants> RoleEditor<G> {
    pub fn new(grants: G, catalog: PermissionCatalog) -> Self {
        Self { grants, catalog }
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Swap in a freshly fetched permission list.
    pub fn replace_catalog(&mut self, catalog: PermissionCatalog) {
        self.catalog = catalog;
    }

    pub async fn save_permissions(
        &self,
        role: &Role,
        desired: &BTreeSet<String>,
    ) -> Result<ApplyReport, ReconcileError> {
        let delta = reconcile(&role.permissions, desired);
        apply(&self.grants, role.id, &delta, |name| self.catalog.resolve(name)).await
    }
}
