use console_core::error::ApiError;
use secrecy::Secret;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    /// Optional credentials for non-interactive login from the binary.
    pub credentials: Option<CredentialSettings>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiSettings {
    /// Base URL of the admin REST backend, including the `/api` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport-level bound on every call, refresh included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionSettings {
    /// Where the token and its expiry are persisted between runs.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Window in which a token counts as expiring soon.
    #[serde(default = "default_expiring_soon_secs")]
    pub expiring_soon_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            expiring_soon_secs: default_expiring_soon_secs(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".access-console/session.json")
}

fn default_expiring_soon_secs() -> u64 {
    300
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector endpoint; logs stay local when unset.
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Clone, Debug)]
pub struct CredentialSettings {
    pub username: String,
    pub password: Secret<String>,
}

pub fn get_configuration() -> Result<Settings, ApiError> {
    let base_path = std::env::current_dir()
        .map_err(|e| ApiError::ConfigError(anyhow::anyhow!("No working directory: {}", e)))?;

    // Running from the workspace root or from inside the crate
    let configuration_file = if base_path.ends_with("access-console") {
        base_path.join("configuration").join("base")
    } else {
        base_path
            .join("access-console")
            .join("configuration")
            .join("base")
    };

    match std::env::var(console_core::config::CONFIG_FILE_ENV) {
        Ok(_) => console_core::config::load(),
        Err(_) => console_core::config::load_from(&configuration_file.to_string_lossy()),
    }
}
