//! Response interpreter — classifies raw model output into a typed action.
//!
//! This boundary always succeeds: every failure mode (unparseable text,
//! missing fields, unknown tool, bad type) collapses into a
//! `ModelAction::Reply` carrying a diagnostic, so the orchestration loop
//! never handles interpreter-level errors.

use serde_json::Value;
use tracing::debug;

use omnichat_core::types::ModelAction;

use crate::registry::ToolRegistry;

/// Interpret one raw model response against the registry.
pub fn interpret(raw: &str, registry: &ToolRegistry) -> ModelAction {
    let data: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "model response was not valid JSON");
            return ModelAction::reply(format!(
                "Invalid JSON response from model: {e}. Please try again."
            ));
        }
    };

    let rtype = data
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_lowercase();

    match rtype.as_str() {
        "reply" => {
            let text = data
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            ModelAction::Reply { text }
        }
        "tool_call" => interpret_tool_call(&data, registry),
        _ => ModelAction::reply(format!(
            "Error: Invalid response type '{rtype}'. Expected 'reply' or 'tool_call'."
        )),
    }
}

fn interpret_tool_call(data: &Value, registry: &ToolRegistry) -> ModelAction {
    let tool = data
        .get("tool")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    if tool.is_empty() {
        return ModelAction::reply("Error: No tool specified in tool call");
    }

    if !registry.has(&tool) {
        return ModelAction::reply(format!(
            "Error: Unknown tool '{}'. Available tools: {}",
            tool,
            registry.tool_names().join(", ")
        ));
    }

    let params = data
        .get("params")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    let confirm = data.get("confirm").and_then(|v| v.as_bool()).unwrap_or(false);

    ModelAction::ToolCall {
        tool,
        params,
        confirm,
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
