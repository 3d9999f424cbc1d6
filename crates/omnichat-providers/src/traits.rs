//! Model client trait — the language model as a text-in/text-out black box.

use async_trait::async_trait;

/// Trait that all model clients must implement.
///
/// The orchestration loop hands the client a serialized prompt payload and
/// gets raw response text back. **`generate` never fails past this
/// boundary**: on any internal error (network, HTTP status, unparseable
/// body) it returns text describing the error, so the response
/// interpreter's parse-failure path is the one uniform recovery mechanism.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a response for the given prompt text.
    async fn generate(&self, prompt: &str) -> String;

    /// The model identifier this client targets.
    fn model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
