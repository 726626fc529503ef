use console_core::error::ApiResult;
use validator::Validate;

use super::ApiClient;
use crate::models::{
    CreateDepartmentRequest, DataResponse, Department, DepartmentId, UpdateDepartmentRequest,
};

/// `/departments` endpoints.
#[derive(Clone)]
pub struct DepartmentClient {
    api: ApiClient,
}

impl DepartmentClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Flat listing, parent-linked.
    pub async fn list(&self) -> ApiResult<Vec<Department>> {
        let response: DataResponse<Vec<Department>> = self.api.get("/departments").await?;
        Ok(response.data)
    }

    /// Roots with descendants nested in `children`, sorted server-side.
    pub async fn tree(&self) -> ApiResult<Vec<Department>> {
        let response: DataResponse<Vec<Department>> = self.api.get("/departments/tree").await?;
        Ok(response.data)
    }

    pub async fn get(&self, id: DepartmentId) -> ApiResult<Department> {
        let response: DataResponse<Department> =
            self.api.get(&format!("/departments/{}", id)).await?;
        Ok(response.data)
    }

    pub async fn create(&self, request: &CreateDepartmentRequest) -> ApiResult<Department> {
        request.validate()?;
        let response: DataResponse<Department> = self.api.post("/departments", request).await?;
        tracing::info!(department_id = response.data.id, "Department created");
        Ok(response.data)
    }

    pub async fn update(
        &self,
        id: DepartmentId,
        request: &UpdateDepartmentRequest,
    ) -> ApiResult<Department> {
        request.validate()?;
        let response: DataResponse<Department> = self
            .api
            .put(&format!("/departments/{}", id), request)
            .await?;
        Ok(response.data)
    }

    pub async fn delete(&self, id: DepartmentId) -> ApiResult<bool> {
        let response: DataResponse<bool> =
            self.api.delete(&format!("/departments/{}", id)).await?;
        Ok(response.data)
    }
}
