//! Tool Registry - central registration of all tools.
//!
//! This module provides:
//! - Tool descriptors (name, description, parameter schema)
//! - Fail-fast registration: a name can only be registered once
//! - Lookup by name and listing in registration order

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rmcp::model::Tool;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::ToolError;
use super::handlers::CapabilityGroup;
use super::schema::ParameterSchema;

// ============================================================================
// Tool Descriptor
// ============================================================================

/// Static metadata describing a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub schema: ParameterSchema,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: ParameterSchema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }

    /// Create a Tool model for this descriptor (rmcp metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: Arc::new(self.schema.to_json_schema()),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: Some(self.name.clone()),
        }
    }

    /// Full JSON dump, used by the debug endpoint.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "schema": Value::Object(self.schema.to_json_schema()),
        })
    }
}

// ============================================================================
// Tool Registry
// ============================================================================

/// A registered tool together with the group that handles it.
pub(crate) struct RegisteredTool {
    pub(crate) descriptor: ToolDescriptor,
    pub(crate) group: &'static str,
    pub(crate) handler: Arc<dyn CapabilityGroup>,
}

/// Tool registry - the catalog of every tool the server exposes.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
    groups: Vec<Arc<dyn CapabilityGroup>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single tool served by `handler`.
    ///
    /// Fails with [`ToolError::DuplicateToolName`] if the name is taken; the
    /// existing registration is kept.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn CapabilityGroup>,
    ) -> Result<(), ToolError> {
        if self.index.contains_key(&descriptor.name) {
            return Err(ToolError::DuplicateToolName(descriptor.name));
        }

        debug!("Registering tool '{}' ({})", descriptor.name, handler.name());
        self.index.insert(descriptor.name.clone(), self.entries.len());
        self.entries.push(RegisteredTool {
            group: handler.name(),
            descriptor,
            handler,
        });
        Ok(())
    }

    /// Register every tool of a capability group.
    ///
    /// Either all of the group's tools are registered or none are.
    pub fn register_group(&mut self, group: Arc<dyn CapabilityGroup>) -> Result<(), ToolError> {
        let tools = group.tools();

        {
            let mut seen = HashSet::new();
            for tool in &tools {
                if self.index.contains_key(&tool.name) || !seen.insert(tool.name.as_str()) {
                    return Err(ToolError::DuplicateToolName(tool.name.clone()));
                }
            }
        }

        let count = tools.len();
        for descriptor in tools {
            self.register(descriptor, group.clone())?;
        }
        info!("Registered {} tools from group '{}'", count, group.name());
        self.groups.push(group);
        Ok(())
    }

    /// Look up a tool descriptor by name.
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.resolve(name).map(|entry| &entry.descriptor)
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).and_then(|&i| self.entries.get(i))
    }

    /// All descriptors in registration order.
    ///
    /// The iterator borrows the registry; call again to restart.
    pub fn list(&self) -> impl Iterator<Item = &ToolDescriptor> + '_ {
        self.entries.iter().map(|entry| &entry.descriptor)
    }

    /// Get all tool names in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.list().map(|d| d.name.as_str()).collect()
    }

    /// Tool counts per capability group, in registration order.
    pub fn categories(&self) -> Vec<(&'static str, usize)> {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for entry in &self.entries {
            match counts.iter_mut().find(|(group, _)| *group == entry.group) {
                Some((_, count)) => *count += 1,
                None => counts.push((entry.group, 1)),
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Get all tools as rmcp Tool models.
    pub fn to_tools(&self) -> Vec<Tool> {
        self.list().map(ToolDescriptor::to_tool).collect()
    }

    /// Let every registered group release its backends.
    pub async fn shutdown(&self) {
        for group in &self.groups {
            group.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::testing::{EchoGroup, echo_descriptor};

    #[test]
    fn test_lookup_returns_registered_name() {
        let mut registry = ToolRegistry::new();
        registry.register_group(Arc::new(EchoGroup::default())).unwrap();

        for name in ["echo", "greet"] {
            let descriptor = registry.lookup(name).expect("registered");
            assert_eq!(descriptor.name, name);
        }
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn test_duplicate_rejected_first_retained() {
        let mut registry = ToolRegistry::new();
        let group: Arc<dyn CapabilityGroup> = Arc::new(EchoGroup::default());
        registry.register(echo_descriptor(), group.clone()).unwrap();

        let mut other = echo_descriptor();
        other.description = "Second echo".to_string();
        let err = registry.register(other, group).unwrap_err();

        assert!(matches!(err, ToolError::DuplicateToolName(ref name) if name == "echo"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("echo").unwrap().description, echo_descriptor().description);
    }

    #[test]
    fn test_group_registration_is_all_or_nothing() {
        let mut registry = ToolRegistry::new();
        registry
            .register(echo_descriptor(), Arc::new(EchoGroup::default()))
            .unwrap();

        let result = registry.register_group(Arc::new(EchoGroup::default()));
        assert!(matches!(result, Err(ToolError::DuplicateToolName(_))));
        assert!(registry.lookup("greet").is_none());
    }

    #[test]
    fn test_list_preserves_order_and_restarts() {
        let mut registry = ToolRegistry::new();
        registry.register_group(Arc::new(EchoGroup::default())).unwrap();

        let first: Vec<_> = registry.list().map(|d| d.name.clone()).collect();
        let second: Vec<_> = registry.list().map(|d| d.name.clone()).collect();
        assert_eq!(first, vec!["echo", "greet"]);
        assert_eq!(first, second);
        assert_eq!(registry.categories(), vec![("test", 2)]);
    }

    #[test]
    fn test_to_tool_metadata() {
        let tool = echo_descriptor().to_tool();
        assert_eq!(tool.name, "echo");
        assert_eq!(tool.input_schema.get("type"), Some(&json!("object")));
        assert_eq!(tool.input_schema.get("required"), Some(&json!(["msg"])));
    }
}
