//! Tool registry — the read-only, in-memory view of the tool catalog.
//!
//! Loaded once at startup from the durable catalog; never mutated during a
//! conversation. The interpreter validates `tool_call` actions against it
//! and the prompt builder sends its descriptors to the model.

use std::collections::HashMap;

use anyhow::Result;
use tracing::info;

use omnichat_core::store::CatalogStore;
use omnichat_core::types::ToolDescriptor;

// ─────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────

/// Immutable mapping of full tool name → descriptor.
pub struct ToolRegistry {
    /// Descriptors sorted by full name (deterministic prompt order).
    tools: Vec<ToolDescriptor>,
    /// full_name → index into `tools`.
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Load the registry from the durable catalog.
    pub fn load(catalog: &CatalogStore) -> Result<Self> {
        let descriptors = catalog.list_tools()?;
        info!(tools = descriptors.len(), "loaded tool registry");
        Ok(Self::from_descriptors(descriptors))
    }

    /// Build a registry directly from descriptors (wiring and tests).
    ///
    /// Duplicate full names collapse to one entry, mirroring the catalog's
    /// idempotent registration.
    pub fn from_descriptors(mut descriptors: Vec<ToolDescriptor>) -> Self {
        descriptors.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        descriptors.dedup_by(|a, b| a.full_name == b.full_name);

        let index = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.full_name.clone(), i))
            .collect();

        ToolRegistry {
            tools: descriptors,
            index,
        }
    }

    /// Look up a tool by full name.
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Check whether a tool is registered.
    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All descriptors, sorted by full name.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Sorted full names of all registered tools.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|d| d.full_name.clone()).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
