//! Orchestration loop — ties the prompt builder, model client, response
//! interpreter, and tool dispatcher together for one user turn.
//!
//! State machine per turn: build prompt → model call → interpret →
//! either return the reply, or dispatch the tool call, inject the call
//! and its result into the working history, and go around again. The
//! loop performs at most `max_rounds` (default 3) dispatch cycles; the
//! next `tool_call` after that gets a forced terminal reply instead of
//! another dispatch.
//!
//! Tool-call/result messages live only in the per-turn working copy —
//! the durable store receives exactly what the shell writes (user input
//! and final reply).

use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use omnichat_core::types::{Message, ModelAction};
use omnichat_providers::ModelClient;

use crate::dispatcher::ToolDispatcher;
use crate::interpreter::interpret;
use crate::prompt::build_prompt;
use crate::registry::ToolRegistry;

/// Maximum tool-call rounds per user turn.
const DEFAULT_MAX_ROUNDS: usize = 3;

// ─────────────────────────────────────────────
// Confirmation policy
// ─────────────────────────────────────────────

/// Policy hook for tool calls the model flags with `confirm: true`.
///
/// The dispatcher never gates on `confirm`; the surrounding application
/// decides. A denial is injected into the working history as a system
/// observation so the model can re-plan or apologize.
pub trait ConfirmPolicy: Send + Sync {
    fn allow(&self, tool: &str, params: &Map<String, Value>) -> bool;
}

/// Default policy: every call proceeds.
pub struct AllowAll;

impl ConfirmPolicy for AllowAll {
    fn allow(&self, _tool: &str, _params: &Map<String, Value>) -> bool {
        true
    }
}

// ─────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────

/// Orchestrates between the language model and the registered tools.
pub struct Orchestrator {
    client: Arc<dyn ModelClient>,
    registry: Arc<ToolRegistry>,
    dispatcher: ToolDispatcher,
    max_rounds: usize,
    system_prompt: Option<String>,
    confirm_policy: Arc<dyn ConfirmPolicy>,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn ModelClient>,
        registry: Arc<ToolRegistry>,
        dispatcher: ToolDispatcher,
    ) -> Self {
        Orchestrator {
            client,
            registry,
            dispatcher,
            max_rounds: DEFAULT_MAX_ROUNDS,
            system_prompt: None,
            confirm_policy: Arc::new(AllowAll),
        }
    }

    /// Override the maximum tool-call rounds per turn.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Override the default system instruction.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Install a confirmation policy.
    pub fn with_confirm_policy(mut self, policy: Arc<dyn ConfirmPolicy>) -> Self {
        self.confirm_policy = policy;
        self
    }

    /// Process one user turn over the supplied context window.
    ///
    /// Never fails: anything unexpected bubbling past the inner recovery
    /// paths is rendered as a single user-facing error string.
    pub async fn process_message(&self, context: &[Message]) -> String {
        if context.is_empty() {
            return "Error: No context provided".to_string();
        }

        match self.run_turn(context).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "turn failed at the outer boundary");
                format!("Error processing request: {e}")
            }
        }
    }

    async fn run_turn(&self, context: &[Message]) -> Result<String> {
        let mut working: Vec<Message> = context.to_vec();
        let mut rounds = 0usize;

        loop {
            let prompt = build_prompt(
                &working,
                self.registry.descriptors(),
                self.system_prompt.as_deref(),
            );
            let raw = self.client.generate(&prompt.render()?).await;

            match interpret(&raw, &self.registry) {
                ModelAction::Reply { text } => {
                    debug!(rounds, "turn complete");
                    return Ok(text);
                }
                ModelAction::ToolCall {
                    tool,
                    params,
                    confirm,
                } => {
                    if rounds >= self.max_rounds {
                        info!(tool = %tool, rounds, "tool-call budget exhausted");
                        return Ok(format!(
                            "Reached the maximum of {} tool-call rounds without a final answer. \
                             Please try rephrasing your request.",
                            self.max_rounds
                        ));
                    }

                    if confirm && !self.confirm_policy.allow(&tool, &params) {
                        info!(tool = %tool, "tool call declined by confirmation policy");
                        let observation = json!({
                            "error": "tool call declined by confirmation policy",
                            "tool": tool,
                        });
                        working.push(Message::system(observation.to_string()));
                        rounds += 1;
                        continue;
                    }

                    let result = self.dispatcher.execute(&tool, params.clone()).await;

                    working.push(Message::assistant(format!(
                        "Called {tool} with params: {}",
                        Value::Object(params)
                    )));
                    working.push(Message::system(render_result(&result)));
                    rounds += 1;
                }
            }
        }
    }
}

/// Render a dispatcher result for injection as a system observation.
fn render_result(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
