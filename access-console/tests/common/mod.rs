//! Shared setup for access-console integration tests.
//!
//! A wiremock server stands in for the admin backend; time is driven by a
//! manual clock and scheduler so no test waits on real timers.

#![allow(dead_code)]

use access_console::AccessConsole;
use access_console::services::{ApiClient, AuthClient};
use access_console::session::{
    ManualClock, ManualScheduler, MemorySessionStore, PersistedSession, SessionManager,
    SessionOptions,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const T0_MS: i64 = 1_700_000_000_000;

pub struct TestSession {
    pub server: MockServer,
    pub clock: Arc<ManualClock>,
    pub scheduler: Arc<ManualScheduler>,
    pub store: Arc<MemorySessionStore>,
    pub api: ApiClient,
    pub session: SessionManager,
}

impl TestSession {
    pub async fn start() -> Self {
        Self::start_with_store(MemorySessionStore::new()).await
    }

    pub async fn start_with_persisted(token: &str, expires_at_ms: i64) -> Self {
        Self::start_with_store(MemorySessionStore::with_session(PersistedSession {
            token: token.to_string(),
            expires_at_ms,
        }))
        .await
    }

    async fn start_with_store(store: MemorySessionStore) -> Self {
        init_test_tracing();

        let server = MockServer::start().await;
        let clock = Arc::new(ManualClock::at_millis(T0_MS));
        let scheduler = Arc::new(ManualScheduler::new(Arc::clone(&clock)));
        let store = Arc::new(store);
        let api = ApiClient::with_base_url(&server.uri(), Duration::from_secs(5))
            .expect("Failed to build API client");

        let session = SessionManager::new(
            Arc::new(AuthClient::new(api.clone())),
            store.clone(),
            clock.clone(),
            scheduler.clone(),
            SessionOptions::default(),
        );

        Self {
            server,
            clock,
            scheduler,
            store,
            api,
            session,
        }
    }

    /// Resource clients bound to this session.
    pub fn console(&self) -> AccessConsole {
        AccessConsole::with_session(self.api.clone(), self.session.clone())
    }

    pub async fn mock_login(&self, token: &str, expires_in: i64) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(login_body(token, expires_in)))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_refresh(&self, token: &str, expires_in: i64) {
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(login_body(token, expires_in)))
            .mount(&self.server)
            .await;
    }

    pub async fn requests_to(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == request_path)
            .count()
    }

    pub fn now_ms(&self) -> i64 {
        use access_console::session::Clock;
        self.clock.now_millis()
    }
}

pub fn login_body(token: &str, expires_in: i64) -> Value {
    json!({
        "message": "Login successful",
        "auth": {
            "token": token,
            "token_type": "Bearer",
            "expires_in": expires_in
        }
    })
}

pub fn user_body(permissions: &[&str]) -> Value {
    json!({
        "user": {
            "id": 1,
            "username": "admin",
            "email": "admin@example.com",
            "is_active": true,
            "roles": ["admin"],
            "permissions": permissions
        }
    })
}

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}
