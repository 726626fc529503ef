use console_core::error::{ApiError, ApiResult};
use console_core::observability::{TracedClientExt, TracedRequest};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::watch;

use crate::config::ApiSettings;
use crate::session::AuthState;

/// Shared HTTP plumbing for every backend collaborator.
///
/// When bound to a session's [`AuthState`] channel, the current bearer token
/// is read on each call so refreshed tokens are picked up without rebuilding
/// clients.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Option<watch::Receiver<AuthState>>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> ApiResult<Self> {
        Self::with_base_url(&settings.base_url, settings.timeout())
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: None,
        })
    }

    /// Attach the bearer token published by a session manager.
    pub fn authorized_by(mut self, auth: watch::Receiver<AuthState>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Option<String> {
        self.auth
            .as_ref()
            .and_then(|auth| auth.borrow().token.clone())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        let request = self
            .client
            .traced_get(&url)
            .maybe_bearer_auth(self.bearer().as_deref());
        dispatch(request, "GET", &url).await
    }

    pub async fn get_with_query<Q, T>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self
            .client
            .traced_get(&url)
            .query(query)
            .maybe_bearer_auth(self.bearer().as_deref());
        dispatch(request, "GET", &url).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self
            .client
            .traced_post(&url)
            .json(body)
            .maybe_bearer_auth(self.bearer().as_deref());
        dispatch(request, "POST", &url).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self
            .client
            .traced_put(&url)
            .json(body)
            .maybe_bearer_auth(self.bearer().as_deref());
        dispatch(request, "PUT", &url).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        let request = self
            .client
            .traced_delete(&url)
            .maybe_bearer_auth(self.bearer().as_deref());
        dispatch(request, "DELETE", &url).await
    }

    /// DELETE carrying a JSON body, as permission revocation requires.
    pub async fn delete_with_body<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self
            .client
            .traced_delete(&url)
            .json(body)
            .maybe_bearer_auth(self.bearer().as_deref());
        dispatch(request, "DELETE", &url).await
    }

    /// POST with an explicit token instead of the bound session's.
    pub async fn post_as<B, T>(&self, path: &str, body: &B, token: Option<&str>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self
            .client
            .traced_post(&url)
            .json(body)
            .maybe_bearer_auth(token);
        dispatch(request, "POST", &url).await
    }

    /// GET with an explicit token instead of the bound session's.
    pub async fn get_as<T: DeserializeOwned>(&self, path: &str, token: &str) -> ApiResult<T> {
        let url = self.url(path);
        let request = self.client.traced_get(&url).bearer_auth(token);
        dispatch(request, "GET", &url).await
    }
}

async fn dispatch<T: DeserializeOwned>(
    request: TracedRequest,
    method: &str,
    url: &str,
) -> ApiResult<T> {
    let response = request.send().await.map_err(|e| {
        tracing::error!(method, url, error = %e, "HTTP request failed");
        ApiError::from(e)
    })?;

    let status = response.status();
    let body = response.text().await.map_err(ApiError::from)?;

    if !status.is_success() {
        let err = ApiError::from_response_body(status, &body);
        tracing::warn!(method, url, status = status.as_u16(), error = %err, "Backend returned an error");
        return Err(err);
    }

    tracing::debug!(method, url, status = status.as_u16(), "Backend call succeeded");

    // Empty success bodies decode as an empty object
    let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(method, url, error = %e, "Failed to decode backend response");
        ApiError::from(e)
    })
}
