//! OmniChat core — shared types, durable stores, and configuration.
//!
//! This crate contains:
//! - **types**: the message/action protocol types
//! - **adapter**: the `ToolAdapter` trait and operation schemas
//! - **store**: SQLite history and tool-catalog stores
//! - **config**: typed configuration + loader

pub mod adapter;
pub mod config;
pub mod store;
pub mod types;
pub mod utils;

pub use adapter::{AdapterDescriptor, AdapterError, OperationSpec, ParamSpec, ToolAdapter};
pub use config::Config;
pub use store::{CatalogStore, HistoryStore};
pub use types::{Message, ModelAction, Role, ToolDescriptor};
