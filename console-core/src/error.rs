use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Result of a call against the admin REST backend.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Error envelope the backend returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Map a non-success HTTP status and the backend's message onto the taxonomy.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::BAD_REQUEST => ApiError::BadRequest(message),
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::CONFLICT => ApiError::Conflict(message),
            StatusCode::UNPROCESSABLE_ENTITY => ApiError::UnprocessableEntity(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::TooManyRequests(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ApiError::Timeout(message),
            other => ApiError::Server {
                status: other.as_u16(),
                message,
            },
        }
    }

    /// Build an error from a raw response body, keeping the backend's wording.
    pub fn from_response_body(status: StatusCode, body: &str) -> Self {
        Self::from_status(status, extract_message(status, body))
    }

    /// The credentials or token were refused.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_) | ApiError::Forbidden(_))
    }
}

fn extract_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(msg) = parsed.error.or(parsed.message)
    {
        return msg;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}
