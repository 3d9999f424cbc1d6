//! Tool dispatcher — resolves adapters, binds parameters, invokes
//! operations, and normalizes every outcome into a JSON value.
//!
//! Adapters are constructed lazily through a static name → factory map
//! (no runtime class lookup) and cached for the dispatcher's lifetime.
//! Construction happens at most once per adapter name: concurrent first
//! uses coordinate through a per-name `OnceCell`. A failed construction
//! leaves the cell empty, so a later turn may retry (e.g. after the user
//! fixes their credentials).
//!
//! `execute` never fails: runtime errors become structured error objects
//! the loop injects back into the conversation as observations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use omnichat_core::adapter::{AdapterError, OperationSpec, ToolAdapter};

use crate::registry::ToolRegistry;

/// Constructor for a tool adapter. Fallible — missing credentials is the
/// common failure.
pub type AdapterFactory = Arc<dyn Fn() -> anyhow::Result<Arc<dyn ToolAdapter>> + Send + Sync>;

/// Default per-invocation timeout.
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

type AdapterCell = Arc<OnceCell<Arc<dyn ToolAdapter>>>;

// ─────────────────────────────────────────────
// ToolDispatcher
// ─────────────────────────────────────────────

/// Executes validated tool calls against lazily constructed adapters.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    factories: HashMap<String, AdapterFactory>,
    /// Per-adapter construct-once cells; the map lock is only held while
    /// fetching/creating a cell, never across construction.
    cache: Mutex<HashMap<String, AdapterCell>>,
    tool_timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        ToolDispatcher {
            registry,
            factories: HashMap::new(),
            cache: Mutex::new(HashMap::new()),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Override the per-invocation timeout.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Register a constructor for an adapter name (application wiring).
    pub fn with_factory<F>(mut self, adapter: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn ToolAdapter>> + Send + Sync + 'static,
    {
        self.factories.insert(adapter.into(), Arc::new(factory));
        self
    }

    /// Execute a tool call, returning the result value or a structured
    /// error object.
    pub async fn execute(&self, tool_name: &str, params: Map<String, Value>) -> Value {
        // Re-validate registration; the interpreter already guarantees
        // this for calls coming through the loop.
        let Some(descriptor) = self.registry.lookup(tool_name) else {
            warn!(tool = tool_name, "dispatch of unregistered tool");
            return json!({ "error": format!("Unknown tool: {tool_name}") });
        };

        let adapter = match self.adapter(&descriptor.adapter).await {
            Ok(adapter) => adapter,
            Err(e) => {
                warn!(adapter = %descriptor.adapter, error = %e, "could not load adapter");
                return json!({
                    "error": format!("Could not load adapter '{}': {e}", descriptor.adapter),
                    "tool": tool_name,
                    "params": Value::Object(params),
                });
            }
        };

        let operation = descriptor.operation();
        let Some(spec) = adapter.operations().into_iter().find(|op| op.name == operation) else {
            return json!({
                "error": format!(
                    "Adapter '{}' has no operation '{operation}'",
                    descriptor.adapter
                ),
            });
        };

        let bound = match bind_params(&spec, &params) {
            Ok(bound) => bound,
            Err(message) => return json!({ "error": message }),
        };

        info!(tool = tool_name, "executing tool call");

        match tokio::time::timeout(self.tool_timeout, adapter.invoke(operation, bound)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                let kind = e
                    .downcast_ref::<AdapterError>()
                    .map(AdapterError::kind)
                    .unwrap_or("other");
                warn!(tool = tool_name, kind, error = %e, "tool execution failed");
                json!({
                    "error": e.to_string(),
                    "kind": kind,
                    "tool": tool_name,
                    "params": Value::Object(params),
                })
            }
            Err(_) => {
                warn!(tool = tool_name, timeout = ?self.tool_timeout, "tool invocation timed out");
                json!({
                    "error": format!(
                        "Tool invocation timed out after {}s",
                        self.tool_timeout.as_secs()
                    ),
                    "kind": "timeout",
                    "tool": tool_name,
                    "params": Value::Object(params),
                })
            }
        }
    }

    /// Fetch or lazily construct the cached adapter instance.
    async fn adapter(&self, name: &str) -> anyhow::Result<Arc<dyn ToolAdapter>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("no adapter registered under '{name}'"))?
            .clone();

        let cell: AdapterCell = {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            cache
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let adapter = cell
            .get_or_try_init(|| async move { factory() })
            .await?
            .clone();
        Ok(adapter)
    }
}

/// Bind supplied parameters against an operation's declared schema.
fn bind_params(
    spec: &OperationSpec,
    supplied: &Map<String, Value>,
) -> Result<Map<String, Value>, String> {
    let mut bound = Map::new();

    for param in &spec.params {
        if let Some(value) = supplied.get(&param.name) {
            bound.insert(param.name.clone(), value.clone());
        } else if let Some(default) = &param.default {
            bound.insert(param.name.clone(), default.clone());
        } else if param.required {
            return Err(format!("Missing required parameter: {}", param.name));
        }
    }

    if spec.accepts_extra {
        for (key, value) in supplied {
            if !spec.params.iter().any(|p| &p.name == key) {
                bound.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(bound)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
