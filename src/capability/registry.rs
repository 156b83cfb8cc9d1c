//! Capability registry: the fixed, ordered set of capabilities for a run.

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::Capability;
use super::schema::ParameterSchema;
use crate::error::DispatchError;

/// Borrowed view of one registered capability, used for prompt building.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityDescriptor<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub parameters: &'a ParameterSchema,
}

impl CapabilityDescriptor<'_> {
    /// Render in the OpenAI function-definition shape.
    pub fn to_tool_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters.to_json_schema(),
        })
    }
}

/// Name-keyed registry that remembers registration order.
///
/// Populate it at startup, then share it as `Arc<CapabilityRegistry>`; once
/// shared it is read-only, so concurrent dispatch cycles need no locking.
#[derive(Default)]
pub struct CapabilityRegistry {
    entries: Vec<Arc<dyn Capability>>,
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list, failing on the first duplicate name.
    pub fn with_capabilities(
        capabilities: impl IntoIterator<Item = Arc<dyn Capability>>,
    ) -> Result<Self, DispatchError> {
        let mut registry = Self::new();
        for capability in capabilities {
            registry.register(capability)?;
        }
        Ok(registry)
    }

    /// Register a capability. A duplicate name leaves the registry unchanged.
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<(), DispatchError> {
        let name = capability.name().to_string();
        if self.index.contains_key(&name) {
            return Err(DispatchError::DuplicateCapability(name));
        }
        tracing::debug!(capability = %name, "registered capability");
        self.index.insert(name, self.entries.len());
        self.entries.push(capability);
        Ok(())
    }

    /// Look up a capability by name.
    pub fn resolve(&self, name: &str) -> Result<&Arc<dyn Capability>, DispatchError> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| DispatchError::UnknownCapability(name.to_string()))
    }

    /// Descriptors in registration order.
    pub fn describe_all(&self) -> impl Iterator<Item = CapabilityDescriptor<'_>> + '_ {
        self.entries.iter().map(|c| CapabilityDescriptor {
            name: c.name(),
            description: c.description(),
            parameters: c.parameters(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|c| c.name())
    }

    /// OpenAI-style function definitions for every capability, in order.
    pub fn to_tool_definitions(&self) -> Vec<serde_json::Value> {
        self.describe_all().map(|d| d.to_tool_definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
