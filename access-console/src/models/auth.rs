//! Login / refresh wire shapes.

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    pub password: Secret<String>,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Secret::new(password.into()),
        }
    }

    /// Body sent to `POST /auth/login`.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "password": self.password.expose_secret(),
        })
    }
}

/// Body of both `POST /auth/login` and `POST /auth/refresh`.
///
/// Either `auth` or `error` is present; anything else is malformed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub auth: Option<AuthPayload>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}
