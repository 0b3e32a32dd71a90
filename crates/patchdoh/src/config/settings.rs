//! Settings file loading.
//!
//! Configuration is read from the JSON file named by `PATCHDOH_CONFIG_PATH`
//! (defaulting to `config.json` in the working directory). If the file does
//! not exist, built-in defaults are used instead — a missing config file is
//! not an error, since every field has a sensible default.

use crate::models::settings::Settings;
use std::fs;
use std::path::PathBuf;

/// Loads [`Settings`] from the path named by `PATCHDOH_CONFIG_PATH`, falling
/// back to `config.json` and finally to [`Settings::default`].
///
/// # Errors
///
/// Returns an error if the file exists but is not valid JSON or does not
/// match the `Settings` schema.
///
/// # Examples
///
/// ```rust
/// use patchdoh::config::settings::load_settings;
///
/// let settings = load_settings().expect("failed to load settings");
/// assert!(settings.validate().is_ok());
/// ```
pub fn load_settings() -> Result<Settings, String> {
    let path = config_path();
    if !path.exists() {
        return Ok(Settings::default());
    }

    let contents = fs::read_to_string(&path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("failed to parse {}: {e}", path.display()))
}

fn config_path() -> PathBuf {
    std::env::var("PATCHDOH_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"))
}

/// Applies `PATCHDOH_HOST`/`PATCHDOH_PORT` environment overrides on top of a
/// loaded [`Settings`] value, matching the precedence the server binary
/// documents: environment variables win over the config file.
pub fn apply_env_overrides(mut settings: Settings) -> Settings {
    if let Ok(host) = std::env::var("PATCHDOH_HOST") {
        settings.bind_host = host;
    }
    if let Ok(port) = std::env::var("PATCHDOH_PORT") {
        if let Ok(port) = port.parse::<u16>() {
            settings.bind_port = port;
        }
    }
    settings
}
