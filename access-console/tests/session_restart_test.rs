mod common;

use access_console::AccessConsole;
use access_console::config::{ApiSettings, SessionSettings, Settings, TelemetrySettings};
use access_console::services::{ApiClient, AuthClient};
use access_console::session::{
    FileSessionStore, SessionManager, SessionOptions, SessionStore, SystemClock, TokioScheduler,
};
use common::{init_test_tracing, login_body};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer, store_path: &Path) -> Settings {
    Settings {
        api: ApiSettings {
            base_url: server.uri(),
            timeout_secs: 5,
        },
        session: SessionSettings {
            store_path: store_path.to_path_buf(),
            expiring_soon_secs: 300,
        },
        telemetry: TelemetrySettings::default(),
        credentials: None,
    }
}

fn file_backed_session(server: &MockServer, store_path: &Path) -> SessionManager {
    let api = ApiClient::with_base_url(&server.uri(), Duration::from_secs(5))
        .expect("Failed to build API client");
    SessionManager::new(
        Arc::new(AuthClient::new(api)),
        Arc::new(FileSessionStore::new(store_path)),
        Arc::new(SystemClock),
        Arc::new(TokioScheduler::new()),
        SessionOptions::default(),
    )
}

async fn mock_auth(server: &MockServer, login_lifetime: i64) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body("tok-1", login_lifetime)))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body("tok-2", 3600)))
        .mount(server)
        .await;
}

async fn wait_for_token(session: &SessionManager, expected: &str) -> bool {
    for _ in 0..100 {
        if session.token().as_deref() == Some(expected) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_session_survives_restart() {
    init_test_tracing();
    let server = MockServer::start().await;
    mock_auth(&server, 3600).await;
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("session.json");

    let first = file_backed_session(&server, &store_path);
    assert!(first.login("admin", "x").await);
    let expires_at = first.expires_at().unwrap();
    drop(first);

    let second = file_backed_session(&server, &store_path);
    assert!(second.restore());
    assert_eq!(second.token().as_deref(), Some("tok-1"));
    assert_eq!(
        second.expires_at().unwrap().timestamp_millis(),
        expires_at.timestamp_millis()
    );
    assert!(!second.is_token_expiring_soon());

    second.logout();
    let third = file_backed_session(&server, &store_path);
    assert!(!third.restore());
    assert_eq!(FileSessionStore::new(&store_path).load().unwrap(), None);
}

#[tokio::test]
async fn test_tokio_scheduler_drives_half_life_refresh() {
    init_test_tracing();
    let server = MockServer::start().await;
    // One-second lifetime: the refresh is armed 500 ms out
    mock_auth(&server, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("session.json");

    let session = file_backed_session(&server, &store_path);
    assert!(session.login("admin", "x").await);

    assert!(wait_for_token(&session, "tok-2").await);
    let persisted = FileSessionStore::new(&store_path).load().unwrap().unwrap();
    assert_eq!(persisted.token, "tok-2");
    assert!(session.remaining_time_secs() > 3500);
}

#[tokio::test]
async fn test_built_console_restores_and_authorizes_requests() {
    init_test_tracing();
    let server = MockServer::start().await;
    mock_auth(&server, 3600).await;
    Mock::given(method("GET"))
        .and(path("/departments"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("nested").join("session.json");

    let console = AccessConsole::build(&settings(&server, &store_path)).unwrap();
    assert!(!console.session.restore());
    assert!(console.session.login("admin", "x").await);
    drop(console);

    let restarted = AccessConsole::build(&settings(&server, &store_path)).unwrap();
    assert!(restarted.session.restore());
    assert!(restarted.departments.list().await.unwrap().is_empty());
}
