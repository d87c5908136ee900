//! Configuration loader
//!
//! Builds an [`AppConfig`] from an optional file plus environment overrides.
//!
//! ## Loading Strategy
//! 1. Load `.env` from the working directory, if present
//! 2. Read the file named by `AUTHBRIDGE_CONFIG`, or the first probed file
//! 3. Fall back to built-in defaults when no file exists
//! 4. Apply environment overrides (environment always wins)
//! 5. Validate; missing secrets are fatal
//!
//! ## Environment Variables
//! - `TOKEN_KEY`: secret the refresh-token encryption key is derived from
//! - `JWT_SECRET`: HMAC secret for signed assertions
//! - `AUTHBRIDGE_CONFIG`: explicit config file path
//! - `AUTHBRIDGE_BIND_ADDR`: listen address
//! - `AUTHBRIDGE_DB_PATH`: database file path
//! - `AUTHBRIDGE_DB_POOL_SIZE`: connection pool size
//! - `AUTHBRIDGE_CHALLENGE_TTL`: challenge lifetime in seconds (0 disables)
//! - `AUTHBRIDGE_EPHEMERAL_TTL`: unclaimed ephemeral token lifetime in seconds (0 disables)
//! - `AUTHBRIDGE_ASSERTION_TTL`: assertion lifetime in seconds
//! - `AUTHBRIDGE_RETURN_SCHEME`: default deep-link scheme
//!
//! ## File Locations
//! Probed in order: `./authbridge.toml`, `./config.toml`, `./authbridge.json`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use authbridge_domain::{AppConfig, BridgeError, Result};

const CONFIG_PATH_VAR: &str = "AUTHBRIDGE_CONFIG";
const PROBED_FILES: [&str; 3] = ["authbridge.toml", "config.toml", "authbridge.json"];

/// Load and validate the broker configuration.
///
/// # Errors
/// Returns `BridgeError::Config` if:
/// - `AUTHBRIDGE_CONFIG` names a missing or unparsable file
/// - An override has an invalid value
/// - `TOKEN_KEY` or `JWT_SECRET` is missing
pub fn load() -> Result<AppConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    let explicit = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
    let mut config = match explicit.or_else(probe_config_paths) {
        Some(path) => load_from_file(&path)?,
        None => {
            tracing::info!("no config file found, using defaults");
            AppConfig::default()
        }
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// Format is detected by extension (`.toml` or `.json`). The result is not
/// validated; secrets normally arrive through the environment afterwards.
///
/// # Errors
/// Returns `BridgeError::Config` if the file is missing or malformed.
pub fn load_from_file(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Err(BridgeError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| BridgeError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BridgeError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BridgeError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(BridgeError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the working directory, if any.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    PROBED_FILES.iter().map(|name| cwd.join(name)).find(|path| path.exists())
}

/// Apply overrides from the process environment.
///
/// # Errors
/// Returns `BridgeError::Config` for values that fail to parse.
pub fn apply_env_overrides(config: &mut AppConfig) -> Result<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides read through `lookup`. Empty values are ignored.
///
/// # Errors
/// Returns `BridgeError::Config` for values that fail to parse.
pub fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(value) = get("TOKEN_KEY") {
        config.security.token_key = value;
    }
    if let Some(value) = get("JWT_SECRET") {
        config.security.assertion_secret = value;
    }
    if let Some(value) = get("AUTHBRIDGE_BIND_ADDR") {
        config.server.bind_addr = value;
    }
    if let Some(value) = get("AUTHBRIDGE_DB_PATH") {
        config.database.path = value;
    }
    if let Some(value) = get("AUTHBRIDGE_DB_POOL_SIZE") {
        config.database.pool_size = parse_var("AUTHBRIDGE_DB_POOL_SIZE", &value)?;
    }
    if let Some(value) = get("AUTHBRIDGE_CHALLENGE_TTL") {
        config.flow.challenge_ttl_secs = parse_var("AUTHBRIDGE_CHALLENGE_TTL", &value)?;
    }
    if let Some(value) = get("AUTHBRIDGE_EPHEMERAL_TTL") {
        config.flow.ephemeral_ttl_secs = parse_var("AUTHBRIDGE_EPHEMERAL_TTL", &value)?;
    }
    if let Some(value) = get("AUTHBRIDGE_ASSERTION_TTL") {
        config.flow.assertion_ttl_secs = parse_var("AUTHBRIDGE_ASSERTION_TTL", &value)?;
    }
    if let Some(value) = get("AUTHBRIDGE_RETURN_SCHEME") {
        config.flow.default_return_scheme = value;
    }

    Ok(())
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| BridgeError::Config(format!("Invalid {key} '{value}': {e}")))
}
