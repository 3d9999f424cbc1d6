//! Durable stores: conversation history and the adapter/tool catalog.
//!
//! Both live in the same SQLite database file (default
//! `~/.omnichat/chat_history.db`) but are exposed as separate handles —
//! the orchestrator only ever needs the catalog, the shell only the
//! history.

pub mod catalog;
pub mod history;

pub use catalog::CatalogStore;
pub use history::HistoryStore;
