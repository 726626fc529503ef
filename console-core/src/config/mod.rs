use crate::error::ApiError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;

/// Environment variable that points at an explicit configuration file.
pub const CONFIG_FILE_ENV: &str = "APP_CONFIG_FILE";

const DEFAULT_CONFIG_FILE: &str = "configuration/base";

/// Load layered settings: optional YAML/TOML file, then `APP_*` environment overrides.
///
/// Nested keys use a double underscore, e.g. `APP_API__BASE_URL`.
pub fn load<T: DeserializeOwned>() -> Result<T, ApiError> {
    dotenvy::dotenv().ok();

    let file = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    load_from(&file)
}

/// Same as [`load`] but with an explicit file name (extension optional).
pub fn load_from<T: DeserializeOwned>(file: &str) -> Result<T, ApiError> {
    let settings = Cfg::builder()
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
