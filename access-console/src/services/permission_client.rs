use console_core::error::ApiResult;
use validator::Validate;

use super::ApiClient;
use crate::models::{
    CreatePermissionRequest, MessageResponse, Page, PageQuery, Permission, PermissionEnvelope,
    PermissionId, UpdatePermissionRequest,
};

/// `/permissions` endpoints.
#[derive(Clone)]
pub struct PermissionClient {
    api: ApiClient,
}

impl PermissionClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: PageQuery) -> ApiResult<Page<Permission>> {
        query.validate()?;
        self.api.get_with_query("/permissions", &query).await
    }

    /// Walk every page of the permission listing.
    pub async fn list_all(&self) -> ApiResult<Vec<Permission>> {
        let mut query = PageQuery::new(1, 100);
        let mut permissions = Vec::new();
        loop {
            let page = self.list(query).await?;
            permissions.extend(page.data);
            if !page.pagination.has_next {
                break;
            }
            query.page += 1;
        }
        Ok(permissions)
    }

    pub async fn get(&self, id: PermissionId) -> ApiResult<Permission> {
        let envelope: PermissionEnvelope = self.api.get(&format!("/permissions/{}", id)).await?;
        Ok(envelope.permission)
    }

    pub async fn create(&self, request: &CreatePermissionRequest) -> ApiResult<Permission> {
        request.validate()?;
        let envelope: PermissionEnvelope = self.api.post("/permissions", request).await?;
        Ok(envelope.permission)
    }

    pub async fn update(
        &self,
        id: PermissionId,
        request: &UpdatePermissionRequest,
    ) -> ApiResult<Permission> {
        request.validate()?;
        let envelope: PermissionEnvelope = self
            .api
            .put(&format!("/permissions/{}", id), request)
            .await?;
        Ok(envelope.permission)
    }

    pub async fn delete(&self, id: PermissionId) -> ApiResult<MessageResponse> {
        self.api.delete(&format!("/permissions/{}", id)).await
    }
}
