use figment::{
    providers::{Env, Format, Toml},
    value::Uncased,
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variables used by earlier deployments, mapped onto config keys.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("EVENTBRITE_TOKEN", "eventbrite.token"),
    ("GOOGLE_SHEETS_ID", "sheets.spreadsheet_id"),
    ("GOOGLE_SERVICE_ACCOUNT", "sheets.service_account"),
    ("PORT", "server.port"),
];

/// Load configuration from file with environment variable overrides.
///
/// Precedence (lowest first): file, legacy variables (`EVENTBRITE_TOKEN`, ...),
/// `REFERBOARD_` prefixed variables with `__` separating nested keys.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let legacy_names: Vec<&str> = LEGACY_ENV_KEYS.iter().map(|(env, _)| *env).collect();

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::raw().only(&legacy_names).map(|key| {
            LEGACY_ENV_KEYS
                .iter()
                .find(|(env, _)| key == *env)
                .map(|(_, target)| Uncased::from(*target))
                .unwrap_or_else(|| Uncased::from(key.as_str().to_string()))
        }))
        .merge(Env::prefixed("REFERBOARD_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
