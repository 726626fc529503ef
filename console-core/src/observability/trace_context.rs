//! Trace propagation on calls to the admin backend.
//!
//! Outgoing requests carry W3C `traceparent`/`tracestate` while a span is
//! active and always carry an `x-request-id`.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::{SpanContext, TraceContextExt};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// `00-{trace_id}-{span_id}-{flags}` for a sampled-or-not valid context.
fn format_traceparent(span_context: &SpanContext) -> Option<String> {
    span_context.is_valid().then(|| {
        format!(
            "00-{}-{}-{:02x}",
            span_context.trace_id(),
            span_context.span_id(),
            span_context.trace_flags().to_u8()
        )
    })
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if value.is_empty() {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

/// Copy the active span's context into `headers`. No-op outside a span.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let context = tracing::Span::current().context();
    let span = context.span();
    let span_context = span.span_context();

    if let Some(traceparent) = format_traceparent(span_context) {
        insert(headers, TRACEPARENT_HEADER, &traceparent);
        insert(headers, TRACESTATE_HEADER, &span_context.trace_state().header());
    }
}

/// Trace context plus the correlation id.
pub fn inject_trace_headers(headers: &mut HeaderMap, request_id: &str) {
    inject_trace_context(headers);
    insert(headers, REQUEST_ID_HEADER, request_id);
}

/// A request whose trace headers are attached at send time, so they reflect
/// the span the caller is in when the request actually leaves.
pub struct TracedRequest {
    request: RequestBuilder,
}

impl TracedRequest {
    pub fn new(request: RequestBuilder) -> Self {
        Self { request }
    }

    fn map(self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        Self {
            request: f(self.request),
        }
    }

    pub fn json<T: serde::Serialize + ?Sized>(self, body: &T) -> Self {
        self.map(|r| r.json(body))
    }

    pub fn query<T: serde::Serialize + ?Sized>(self, query: &T) -> Self {
        self.map(|r| r.query(query))
    }

    pub fn bearer_auth<T: std::fmt::Display>(self, token: T) -> Self {
        self.map(|r| r.bearer_auth(token))
    }

    /// Attach a bearer token only when one is held.
    pub fn maybe_bearer_auth(self, token: Option<&str>) -> Self {
        match token {
            Some(token) => self.bearer_auth(token),
            None => self,
        }
    }

    /// Send with a freshly generated request id.
    pub async fn send(self) -> Result<reqwest::Response, reqwest::Error> {
        self.send_with_request_id(&Uuid::new_v4().to_string()).await
    }

    pub async fn send_with_request_id(
        self,
        request_id: &str,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut headers = HeaderMap::new();
        inject_trace_headers(&mut headers, request_id);
        self.request.headers(headers).send().await
    }
}

/// Traced request constructors on `reqwest::Client`.
pub trait TracedClientExt {
    fn traced(&self, method: Method, url: &str) -> TracedRequest;

    fn traced_get(&self, url: &str) -> TracedRequest {
        self.traced(Method::GET, url)
    }

    fn traced_post(&self, url: &str) -> TracedRequest {
        self.traced(Method::POST, url)
    }

    fn traced_put(&self, url: &str) -> TracedRequest {
        self.traced(Method::PUT, url)
    }

    fn traced_delete(&self, url: &str) -> TracedRequest {
        self.traced(Method::DELETE, url)
    }
}

impl TracedClientExt for reqwest::Client {
    fn traced(&self, method: Method, url: &str) -> TracedRequest {
        TracedRequest::new(self.request(method, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_span_no_traceparent() {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_request_id_is_always_set() {
        let mut headers = HeaderMap::new();
        inject_trace_headers(&mut headers, "abc-123");

        assert_eq!(
            headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()),
            Some("abc-123")
        );
        assert!(headers.get(TRACEPARENT_HEADER).is_none());
    }

    #[test]
    fn test_invalid_context_has_no_traceparent() {
        assert_eq!(format_traceparent(&SpanContext::empty_context()), None);
    }
}
