//! Snapshot of the tools available to the reasoning engine.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// A callable tool as advertised to the reasoning engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Immutable set of tools discovered for one conversation.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Build a registry, keeping the first descriptor for each name.
    pub fn from_descriptors(descriptors: Vec<ToolDescriptor>) -> Self {
        let mut seen = HashSet::new();
        let mut tools = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            if seen.insert(descriptor.name.clone()) {
                tools.push(descriptor);
            } else {
                warn!(tool = %descriptor.name, "Duplicate tool name, keeping the first definition");
            }
        }

        Self { tools }
    }

    /// Declarations in the order the provider listed them.
    pub fn declarations(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|tool| tool.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
