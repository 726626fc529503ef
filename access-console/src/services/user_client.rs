use console_core::error::ApiResult;
use validator::Validate;

use super::ApiClient;
use crate::models::{
    AssignRoleRequest, CreateUserRequest, MessageResponse, Page, PageQuery, RoleId,
    UpdateUserRequest, User, UserEnvelope, UserId,
};

/// `/users` endpoints.
#[derive(Clone)]
pub struct UserClient {
    api: ApiClient,
}

impl UserClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: PageQuery) -> ApiResult<Page<User>> {
        query.validate()?;
        self.api.get_with_query("/users", &query).await
    }

    pub async fn get(&self, id: UserId) -> ApiResult<User> {
        let envelope: UserEnvelope = self.api.get(&format!("/users/{}", id)).await?;
        Ok(envelope.user)
    }

    pub async fn create(&self, request: &CreateUserRequest) -> ApiResult<User> {
        request.validate()?;
        let envelope: UserEnvelope = self.api.post("/users", request).await?;
        tracing::info!(user_id = envelope.user.id, "User created");
        Ok(envelope.user)
    }

    pub async fn update(&self, id: UserId, request: &UpdateUserRequest) -> ApiResult<User> {
        request.validate()?;
        let envelope: UserEnvelope = self.api.put(&format!("/users/{}", id), request).await?;
        Ok(envelope.user)
    }

    pub async fn delete(&self, id: UserId) -> ApiResult<MessageResponse> {
        self.api.delete(&format!("/users/{}", id)).await
    }

    pub async fn assign_role(&self, id: UserId, role_id: RoleId) -> ApiResult<MessageResponse> {
        self.api
            .post(&format!("/users/{}/roles", id), &AssignRoleRequest { role_id })
            .await
    }
}
