//! OmniChat orchestrator — the message-orchestration loop.
//!
//! This crate contains:
//! - **registry**: read-only tool registry loaded from the catalog
//! - **prompt**: structured request construction for the model
//! - **interpreter**: model output → typed action, always total
//! - **dispatcher**: adapter resolution, parameter binding, invocation
//! - **orchestrator**: the round-bounded loop tying it all together

pub mod dispatcher;
pub mod interpreter;
pub mod orchestrator;
pub mod prompt;
pub mod registry;

pub use dispatcher::{AdapterFactory, ToolDispatcher};
pub use interpreter::interpret;
pub use orchestrator::{AllowAll, ConfirmPolicy, Orchestrator};
pub use prompt::{build_prompt, PromptRequest, DEFAULT_SYSTEM_PROMPT};
pub use registry::ToolRegistry;
