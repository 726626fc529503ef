use console_core::error::ApiResult;
use validator::Validate;

use super::ApiClient;
use crate::models::{
    AssignUserRequest, AssociationId, BatchAssignRequest, BatchAssignResult, DataResponse,
    DepartmentId, UpdateUserDepartmentRequest, UserDepartment, UserId,
};

/// `/user-departments` endpoints.
///
/// The single-primary rule is the backend's to enforce; requests carry intent
/// only and nothing here touches other associations.
#[derive(Clone)]
pub struct UserDepartmentClient {
    api: ApiClient,
}

impl UserDepartmentClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn assign(&self, request: &AssignUserRequest) -> ApiResult<UserDepartment> {
        request.validate()?;
        let response: DataResponse<UserDepartment> =
            self.api.post("/user-departments/assign", request).await?;
        tracing::info!(
            user_id = request.user_id,
            department_id = request.department_id,
            is_primary = request.is_primary.unwrap_or(false),
            "User assigned to department"
        );
        Ok(response.data)
    }

    /// Partial skips (already assigned) are reported, not raised.
    pub async fn batch_assign(&self, request: &BatchAssignRequest) -> ApiResult<BatchAssignResult> {
        request.validate()?;
        let response: DataResponse<BatchAssignResult> =
            self.api.post("/user-departments/batch-assign", request).await?;
        tracing::info!(
            department_id = request.department_id,
            assigned = response.data.assigned_count,
            skipped = response.data.skipped_count,
            "Batch assignment finished"
        );
        Ok(response.data)
    }

    pub async fn get(&self, id: AssociationId) -> ApiResult<UserDepartment> {
        let response: DataResponse<UserDepartment> =
            self.api.get(&format!("/user-departments/{}", id)).await?;
        Ok(response.data)
    }

    pub async fn update(
        &self,
        id: AssociationId,
        request: &UpdateUserDepartmentRequest,
    ) -> ApiResult<UserDepartment> {
        request.validate()?;
        let response: DataResponse<UserDepartment> = self
            .api
            .put(&format!("/user-departments/{}", id), request)
            .await?;
        Ok(response.data)
    }

    pub async fn remove(&self, id: AssociationId) -> ApiResult<bool> {
        let response: DataResponse<bool> =
            self.api.delete(&format!("/user-departments/{}", id)).await?;
        Ok(response.data)
    }

    pub async fn by_user(&self, user_id: UserId) -> ApiResult<Vec<UserDepartment>> {
        let response: DataResponse<Vec<UserDepartment>> = self
            .api
            .get(&format!("/user-departments/user/{}", user_id))
            .await?;
        Ok(response.data)
    }

    pub async fn by_department(
        &self,
        department_id: DepartmentId,
    ) -> ApiResult<Vec<UserDepartment>> {
        let response: DataResponse<Vec<UserDepartment>> = self
            .api
            .get(&format!("/user-departments/department/{}", department_id))
            .await?;
        Ok(response.data)
    }

    /// `None` when the user has no primary department.
    pub async fn primary_of_user(&self, user_id: UserId) -> ApiResult<Option<UserDepartment>> {
        let response: DataResponse<Option<UserDepartment>> = self
            .api
            .get(&format!("/user-departments/user/{}/primary", user_id))
            .await?;
        Ok(response.data)
    }
}
