use async_trait::async_trait;
use console_core::error::ApiError;

use super::ApiClient;
use crate::models::{LoginRequest, LoginResponse, User, UserEnvelope};
use crate::session::{AuthApi, AuthError, TokenGrant};

/// `/auth/*` endpoints.
#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn login(&self, request: &LoginRequest) -> Result<TokenGrant, AuthError> {
        let response: LoginResponse = self
            .api
            .post_as("/auth/login", &request.to_body(), None)
            .await
            .map_err(rejection_or_api)?;
        TokenGrant::from_response(response)
    }

    async fn refresh(&self, token: &str) -> Result<TokenGrant, AuthError> {
        let response: LoginResponse = self
            .api
            .post_as("/auth/refresh", &serde_json::json!({}), Some(token))
            .await
            .map_err(rejection_or_api)?;
        TokenGrant::from_response(response)
    }

    async fn me(&self, token: &str) -> Result<User, ApiError> {
        let envelope: UserEnvelope = self.api.get_as("/auth/me", token).await?;
        Ok(envelope.user)
    }
}

/// A 401 on login/refresh carries the backend's reason for refusing.
fn rejection_or_api(err: ApiError) -> AuthError {
    match err {
        ApiError::Unauthorized(reason) => AuthError::Rejected { reason },
        other => AuthError::Api(other),
    }
}
