//! Prompt builder — assembles the structured request payload for the model.
//!
//! Pure function of (history, tool catalog, system instruction); the only
//! varying field is the construction timestamp.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use omnichat_core::types::{Message, ToolDescriptor};

/// Default system instruction. Tells the model it must answer with exactly
/// one of the two structured shapes the interpreter understands.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful assistant with access to tools. \
Always respond with valid JSON in one of these formats:

For a normal response:
{\"type\": \"reply\", \"text\": \"Your response here\"}

For a tool call:
{
    \"type\": \"tool_call\",
    \"tool\": \"adapter.tool_name\",
    \"params\": {\"param1\": value1, \"param2\": value2},
    \"confirm\": false
}";

// ─────────────────────────────────────────────
// Request payload
// ─────────────────────────────────────────────

/// The structured request sent to the model (serialized to JSON text).
#[derive(Debug, Serialize)]
pub struct PromptRequest {
    pub system: String,
    pub tools: Vec<PromptTool>,
    pub messages: Vec<PromptMessage>,
    pub current_time: String,
}

/// Catalog entry as presented to the model.
#[derive(Debug, Serialize)]
pub struct PromptTool {
    pub name: String,
    pub description: String,
    pub example: Value,
    pub side_effects: bool,
}

/// One history entry as presented to the model.
#[derive(Debug, Serialize)]
pub struct PromptMessage {
    pub role: String,
    pub text: String,
}

impl PromptRequest {
    /// Serialize to the JSON text handed to the model client.
    pub fn render(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ─────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────

/// Build the request payload for one model call.
pub fn build_prompt(
    history: &[Message],
    tools: &[ToolDescriptor],
    system: Option<&str>,
) -> PromptRequest {
    let tools = tools
        .iter()
        .map(|tool| PromptTool {
            name: tool.full_name.clone(),
            description: tool.description.clone(),
            example: parse_example(&tool.example),
            side_effects: tool.side_effects,
        })
        .collect();

    let messages = history
        .iter()
        .map(|msg| PromptMessage {
            role: msg.role.as_str().to_string(),
            text: msg.content.clone(),
        })
        .collect();

    PromptRequest {
        system: system.unwrap_or(DEFAULT_SYSTEM_PROMPT).to_string(),
        tools,
        messages,
        current_time: Utc::now().to_rfc3339(),
    }
}

/// Catalog examples are stored as JSON strings; fall back to the raw text
/// when they don't parse.
fn parse_example(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
