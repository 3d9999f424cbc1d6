//! Core types for OmniChat — the message protocol between shell, store,
//! model, and orchestrator.
//!
//! The model speaks a two-shape JSON protocol: a final reply
//! (`{"type": "reply", "text": ...}`) or a tool invocation
//! (`{"type": "tool_call", "tool": ..., "params": ..., "confirm": ...}`).
//! `ModelAction` is the typed form of that protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Lowercase wire/storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for parsing an unknown role string (e.g. from the database).
#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// A single conversation message.
///
/// Durable messages come out of the history store with `id = Some(..)` and
/// a store-assigned timestamp (non-decreasing per insertion). Ephemeral
/// messages — the synthetic tool-call/result entries the orchestrator
/// appends to its per-turn working copy — carry `id = None` and are never
/// written back to the store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create an ephemeral message stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            id: None,
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Ephemeral user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message::new(Role::User, content)
    }

    /// Ephemeral assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message::new(Role::Assistant, content)
    }

    /// Ephemeral system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message::new(Role::System, content)
    }
}

// ─────────────────────────────────────────────
// Tool descriptors
// ─────────────────────────────────────────────

/// Catalog entry for one invocable tool, joined with its owning adapter.
///
/// Created at registration time and read-only afterwards; the prompt
/// builder sends these to the model and the interpreter validates
/// `tool_call` actions against them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    /// Unique dotted name, `"<adapter>.<operation>"` (e.g. `"gmail.list_emails"`).
    pub full_name: String,
    /// Short human/model-readable description.
    pub description: String,
    /// Example params payload, stored as a JSON string.
    pub example: String,
    /// Whether invoking this tool may mutate external state.
    pub side_effects: bool,
    /// Name of the owning adapter.
    pub adapter: String,
}

impl ToolDescriptor {
    /// The operation part of the dotted name (everything after the last `.`).
    pub fn operation(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map(|(_, op)| op)
            .unwrap_or(&self.full_name)
    }
}

// ─────────────────────────────────────────────
// Model actions
// ─────────────────────────────────────────────

/// The interpreted outcome of one model turn. Transient — produced by the
/// response interpreter, consumed by the orchestration loop, never stored.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelAction {
    /// A final natural-language answer for the user.
    Reply { text: String },
    /// A request to invoke a registered tool.
    ToolCall {
        /// Full dotted tool name, already validated against the registry.
        tool: String,
        /// Raw parameter mapping as supplied by the model.
        params: Map<String, Value>,
        /// Whether the model asked for user confirmation before executing.
        confirm: bool,
    },
}

impl ModelAction {
    /// Convenience constructor for a plain reply.
    pub fn reply(text: impl Into<String>) -> Self {
        ModelAction::Reply { text: text.into() }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_round_trip() {
        for role in [Role::User, Role::Assistant, Role::System] {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert_eq!("Assistant".parse::<Role>().unwrap(), Role::Assistant);
    }

    #[test]
    fn role_parse_unknown() {
        let err = "robot".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "unknown role: robot");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::System).unwrap(), json!("system"));
    }

    #[test]
    fn ephemeral_message_has_no_id() {
        let msg = Message::user("hello");
        assert!(msg.id.is_none());
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn message_serialization_omits_missing_id() {
        let msg = Message::assistant("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn descriptor_operation_name() {
        let desc = ToolDescriptor {
            full_name: "google_calendar.list_events".into(),
            description: "List upcoming events".into(),
            example: r#"{"days": 7}"#.into(),
            side_effects: false,
            adapter: "google_calendar".into(),
        };
        assert_eq!(desc.operation(), "list_events");
    }

    #[test]
    fn descriptor_operation_without_dot() {
        let desc = ToolDescriptor {
            full_name: "echo".into(),
            description: String::new(),
            example: String::new(),
            side_effects: false,
            adapter: "echo".into(),
        };
        assert_eq!(desc.operation(), "echo");
    }

    #[test]
    fn model_action_reply_constructor() {
        assert_eq!(
            ModelAction::reply("done"),
            ModelAction::Reply { text: "done".into() }
        );
    }
}
