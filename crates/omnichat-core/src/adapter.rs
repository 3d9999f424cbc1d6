//! The adapter seam — capability providers exposing named operations with
//! declared parameter schemas.
//!
//! An adapter bundles one or more operations (e.g. the calendar adapter
//! exposes `list_events`). Operations are invoked by short name with a
//! parameter mapping that the dispatcher has already bound against the
//! operation's [`OperationSpec`] — explicit schemas, no signature
//! introspection.

use async_trait::async_trait;
use serde_json::{Map, Value};

// ─────────────────────────────────────────────
// Parameter / operation schemas
// ─────────────────────────────────────────────

/// Declared parameter of an operation.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    /// Required parameters with no default produce a binding error when
    /// the model omits them.
    pub required: bool,
    /// Substituted when the model does not supply the parameter.
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A required parameter with no default.
    pub fn required(name: impl Into<String>) -> Self {
        ParamSpec {
            name: name.into(),
            required: true,
            default: None,
        }
    }

    /// An optional parameter with a default value.
    pub fn optional(name: impl Into<String>, default: Value) -> Self {
        ParamSpec {
            name: name.into(),
            required: false,
            default: Some(default),
        }
    }
}

/// Declared schema of one invocable operation.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationSpec {
    /// Short name, unique within the adapter (e.g. `"list_events"`).
    pub name: String,
    pub description: String,
    /// Example params payload shown to the model.
    pub example: Value,
    /// Whether the operation may mutate external state.
    pub side_effects: bool,
    pub params: Vec<ParamSpec>,
    /// When set, parameters not named in `params` are passed through
    /// instead of being discarded.
    pub accepts_extra: bool,
}

impl OperationSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        OperationSpec {
            name: name.into(),
            description: description.into(),
            example: Value::Object(Map::new()),
            side_effects: false,
            params: Vec::new(),
            accepts_extra: false,
        }
    }

    pub fn with_example(mut self, example: Value) -> Self {
        self.example = example;
        self
    }

    pub fn with_side_effects(mut self, side_effects: bool) -> Self {
        self.side_effects = side_effects;
        self
    }

    pub fn with_params(mut self, params: Vec<ParamSpec>) -> Self {
        self.params = params;
        self
    }

    pub fn with_accepts_extra(mut self, accepts_extra: bool) -> Self {
        self.accepts_extra = accepts_extra;
        self
    }
}

/// Static metadata describing an adapter and its operations.
///
/// Used to seed the tool catalog at onboarding time without constructing
/// the adapter itself (construction may require credentials).
#[derive(Clone, Debug)]
pub struct AdapterDescriptor {
    /// Unique adapter name; the prefix of every owned tool's full name.
    pub name: String,
    /// Descriptive implementation identifier stored in the catalog.
    pub kind: String,
    pub description: String,
    pub operations: Vec<OperationSpec>,
}

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// Failure categories surfaced by adapters.
///
/// The dispatcher downcasts to this to fill the `kind` field of the
/// structured error it returns to the model.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("missing credentials: {0}")]
    Credentials(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl AdapterError {
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::Credentials(_) => "credentials",
            AdapterError::Api(_) => "api",
            AdapterError::InvalidArgument(_) => "invalid_argument",
        }
    }
}

// ─────────────────────────────────────────────
// ToolAdapter trait
// ─────────────────────────────────────────────

/// Every capability provider implements this trait.
///
/// The dispatcher constructs adapters lazily (construction is fallible —
/// missing credentials is the common case), binds parameters against the
/// matching [`OperationSpec`], and calls [`ToolAdapter::invoke`] with the
/// bound mapping. `invoke` returns the operation result as a JSON value;
/// errors are caught at the dispatcher boundary and converted to
/// structured error objects, never propagated to the loop.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Unique adapter name (e.g. `"google_calendar"`).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Declared operations with their parameter schemas.
    fn operations(&self) -> Vec<OperationSpec>;

    /// Invoke an operation by short name with bound arguments.
    async fn invoke(&self, operation: &str, args: Map<String, Value>) -> anyhow::Result<Value>;
}

// ─────────────────────────────────────────────
// Argument helpers
// ─────────────────────────────────────────────

/// Extract a required string argument.
pub fn str_arg(args: &Map<String, Value>, key: &str) -> Result<String, AdapterError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| AdapterError::InvalidArgument(format!("expected string for '{key}'")))
}

/// Extract an integer argument, tolerating numeric strings (models
/// frequently send `"7"` where `7` is meant).
pub fn int_arg(args: &Map<String, Value>, key: &str) -> Result<i64, AdapterError> {
    match args.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| AdapterError::InvalidArgument(format!("non-integer value for '{key}'"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| AdapterError::InvalidArgument(format!("non-numeric string for '{key}'"))),
        _ => Err(AdapterError::InvalidArgument(format!(
            "expected integer for '{key}'"
        ))),
    }
}

/// Extract a list-of-strings argument.
pub fn string_list_arg(args: &Map<String, Value>, key: &str) -> Result<Vec<String>, AdapterError> {
    let list = args
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| AdapterError::InvalidArgument(format!("expected array for '{key}'")))?;
    list.iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| AdapterError::InvalidArgument(format!("non-string entry in '{key}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn str_arg_present() {
        let a = args(json!({"email_id": "abc123"}));
        assert_eq!(str_arg(&a, "email_id").unwrap(), "abc123");
    }

    #[test]
    fn str_arg_wrong_type() {
        let a = args(json!({"email_id": 42}));
        assert!(str_arg(&a, "email_id").is_err());
    }

    #[test]
    fn int_arg_from_number() {
        let a = args(json!({"days": 7}));
        assert_eq!(int_arg(&a, "days").unwrap(), 7);
    }

    #[test]
    fn int_arg_from_numeric_string() {
        let a = args(json!({"days": "7"}));
        assert_eq!(int_arg(&a, "days").unwrap(), 7);
    }

    #[test]
    fn int_arg_rejects_garbage() {
        let a = args(json!({"days": "soon"}));
        let err = int_arg(&a, "days").unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn string_list_arg_ok() {
        let a = args(json!({"label_ids": ["INBOX", "UNREAD"]}));
        assert_eq!(
            string_list_arg(&a, "label_ids").unwrap(),
            vec!["INBOX".to_string(), "UNREAD".to_string()]
        );
    }

    #[test]
    fn string_list_arg_rejects_mixed() {
        let a = args(json!({"label_ids": ["INBOX", 3]}));
        assert!(string_list_arg(&a, "label_ids").is_err());
    }

    #[test]
    fn param_spec_constructors() {
        let req = ParamSpec::required("email_id");
        assert!(req.required);
        assert!(req.default.is_none());

        let opt = ParamSpec::optional("days", json!(7));
        assert!(!opt.required);
        assert_eq!(opt.default, Some(json!(7)));
    }

    #[test]
    fn operation_spec_builder() {
        let op = OperationSpec::new("list_events", "List upcoming events")
            .with_example(json!({"days": 7}))
            .with_params(vec![ParamSpec::optional("days", json!(7))]);
        assert_eq!(op.name, "list_events");
        assert!(!op.side_effects);
        assert!(!op.accepts_extra);
        assert_eq!(op.params.len(), 1);
    }

    #[test]
    fn adapter_error_kinds() {
        assert_eq!(AdapterError::Credentials("x".into()).kind(), "credentials");
        assert_eq!(AdapterError::Api("x".into()).kind(), "api");
        assert_eq!(
            AdapterError::InvalidArgument("x".into()).kind(),
            "invalid_argument"
        );
    }
}
