//! Config loader — reads `~/.omnichat/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.omnichat/config.json`
//! 3. Environment variables (override JSON)

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be
/// parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    load_config_from_path(&config_path)
}

fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;
    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Supported:
/// - `GEMINI_API_KEY` → `model.api_key` (only when the config is empty)
/// - `GOOGLE_ACCESS_TOKEN` → `google.access_token` (only when empty)
/// - `OMNICHAT_MODEL__MODEL` → `model.model`
/// - `OMNICHAT_MODEL__API_BASE` → `model.api_base`
/// - `OMNICHAT_HISTORY__DB_PATH` → `history.db_path`
/// - `OMNICHAT_ORCHESTRATOR__MAX_ROUNDS` → `orchestrator.max_rounds`
fn apply_env_overrides(mut config: Config) -> Config {
    if config.model.api_key.is_empty() {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.model.api_key = key;
        }
    }
    if config.google.access_token.is_empty() {
        if let Ok(token) = std::env::var("GOOGLE_ACCESS_TOKEN") {
            config.google.access_token = token;
        }
    }
    if let Ok(model) = std::env::var("OMNICHAT_MODEL__MODEL") {
        config.model.model = model;
    }
    if let Ok(base) = std::env::var("OMNICHAT_MODEL__API_BASE") {
        config.model.api_base = Some(base);
    }
    if let Ok(db) = std::env::var("OMNICHAT_HISTORY__DB_PATH") {
        config.history.db_path = Some(db);
    }
    if let Ok(rounds) = std::env::var("OMNICHAT_ORCHESTRATOR__MAX_ROUNDS") {
        match rounds.parse() {
            Ok(n) => config.orchestrator.max_rounds = n,
            Err(_) => warn!("Ignoring non-numeric OMNICHAT_ORCHESTRATOR__MAX_ROUNDS"),
        }
    }
    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
