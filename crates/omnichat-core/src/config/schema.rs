//! Configuration schema.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! `#[serde(rename_all = "camelCase")]` handles the conversion, and every
//! section defaults so a partial (or absent) file still loads.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.omnichat/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub model: ModelConfig,
    pub history: HistoryConfig,
    pub orchestrator: OrchestratorConfig,
    pub google: GoogleConfig,
}

// ─────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────

/// Language-model client settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    /// Model identifier sent to the generate endpoint.
    pub model: String,
    /// API key (falls back to `GEMINI_API_KEY`).
    pub api_key: String,
    /// Override of the API base URL (mainly for testing).
    pub api_base: Option<String>,
    /// HTTP request timeout for model calls, in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".into(),
            api_key: String::new(),
            api_base: None,
            timeout_secs: 120,
        }
    }
}

// ─────────────────────────────────────────────
// History
// ─────────────────────────────────────────────

/// History store settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// SQLite database path; `None` means `~/.omnichat/chat_history.db`.
    pub db_path: Option<String>,
    /// How many recent messages the shell feeds into each turn.
    pub context_window: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            context_window: 10,
        }
    }
}

// ─────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────

/// Orchestration-loop settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorConfig {
    /// Maximum tool-call rounds per user turn.
    pub max_rounds: usize,
    /// Timeout for a single tool invocation, in seconds.
    pub tool_timeout_secs: u64,
    /// Override of the default system instruction.
    pub system_prompt: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            tool_timeout_secs: 60,
            system_prompt: None,
        }
    }
}

// ─────────────────────────────────────────────
// Google adapters
// ─────────────────────────────────────────────

/// Credentials for the Google Workspace adapters.
///
/// Only stored-token access is supported; obtaining or refreshing a token
/// happens outside OmniChat.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleConfig {
    /// OAuth bearer token (falls back to `GOOGLE_ACCESS_TOKEN`).
    pub access_token: String,
    /// File to read the token from when `access_token` is empty.
    pub token_file: Option<String>,
    /// Override of the Calendar API base URL (mainly for testing).
    pub calendar_api_base: Option<String>,
    /// Override of the Gmail API base URL (mainly for testing).
    pub gmail_api_base: Option<String>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.model.model, "gemini-2.0-flash");
        assert_eq!(config.orchestrator.max_rounds, 3);
        assert_eq!(config.orchestrator.tool_timeout_secs, 60);
        assert_eq!(config.history.context_window, 10);
        assert!(config.google.access_token.is_empty());
    }

    #[test]
    fn camel_case_round_trip() {
        let config = Config::default();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json["model"]["apiKey"].is_string());
        assert!(json["orchestrator"]["maxRounds"].is_number());
        assert!(json["history"]["contextWindow"].is_number());

        let back: Config = serde_json::from_value(json).unwrap();
        assert_eq!(back.orchestrator.max_rounds, 3);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"model": {"model": "gemini-2.5-pro"}}"#).unwrap();
        assert_eq!(config.model.model, "gemini-2.5-pro");
        assert_eq!(config.model.timeout_secs, 120);
        assert_eq!(config.orchestrator.max_rounds, 3);
    }
}
