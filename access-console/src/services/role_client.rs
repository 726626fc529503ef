use async_trait::async_trait;
use console_core::error::ApiResult;
use validator::Validate;

use super::ApiClient;
use super::reconciler::PermissionGrants;
use crate::models::{
    CreateRoleRequest, MessageResponse, Page, PageQuery, PermissionId, Role, RoleEnvelope, RoleId,
    RolePermissionRequest, UpdateRoleRequest,
};

/// `/roles` endpoints.
#[derive(Clone)]
pub struct RoleClient {
    api: ApiClient,
}

impl RoleClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: PageQuery) -> ApiResult<Page<Role>> {
        query.validate()?;
        self.api.get_with_query("/roles", &query).await
    }

    pub async fn get(&self, id: RoleId) -> ApiResult<Role> {
        let envelope: RoleEnvelope = self.api.get(&format!("/roles/{}", id)).await?;
        Ok(envelope.role)
    }

    pub async fn create(&self, request: &CreateRoleRequest) -> ApiResult<Role> {
        request.validate()?;
        let envelope: RoleEnvelope = self.api.post("/roles", request).await?;
        tracing::info!(role_id = envelope.role.id, "Role created");
        Ok(envelope.role)
    }

    pub async fn update(&self, id: RoleId, request: &UpdateRoleRequest) -> ApiResult<Role> {
        request.validate()?;
        let envelope: RoleEnvelope = self.api.put(&format!("/roles/{}", id), request).await?;
        Ok(envelope.role)
    }

    pub async fn delete(&self, id: RoleId) -> ApiResult<MessageResponse> {
        self.api.delete(&format!("/roles/{}", id)).await
    }

    pub async fn grant_permission(
        &self,
        id: RoleId,
        permission_id: PermissionId,
    ) -> ApiResult<MessageResponse> {
        self.api
            .post(
                &format!("/roles/{}/permissions", id),
                &RolePermissionRequest { permission_id },
            )
            .await
    }

    pub async fn revoke_permission(
        &self,
        id: RoleId,
        permission_id: PermissionId,
    ) -> ApiResult<MessageResponse> {
        self.api
            .delete_with_body(
                &format!("/roles/{}/permissions", id),
                &RolePermissionRequest { permission_id },
            )
            .await
    }
}

#[async_trait]
impl PermissionGrants for RoleClient {
    async fn grant(&self, role_id: RoleId, permission_id: PermissionId) -> ApiResult<()> {
        self.grant_permission(role_id, permission_id).await?;
        Ok(())
    }

    async fn revoke(&self, role_id: RoleId, permission_id: PermissionId) -> ApiResult<()> {
        self.revoke_permission(role_id, permission_id).await?;
        Ok(())
    }
}
