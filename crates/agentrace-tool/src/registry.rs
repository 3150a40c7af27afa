//! Closed set of tools, fixed when the registry is built

use crate::Tool;
use agentrace_core::{Error, Result, ToolCatalog, ToolDefinition};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Look a tool up by exact name
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownTool(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Check that the catalog describes exactly the tools implemented here,
    /// with matching parameter names and required lists.
    pub fn validate_catalog(&self, catalog: &ToolCatalog) -> Result<()> {
        let declared: BTreeSet<&str> = catalog.names().into_iter().collect();
        let implemented: BTreeSet<&str> = self.names().into_iter().collect();

        let missing: Vec<&str> = declared.difference(&implemented).copied().collect();
        if !missing.is_empty() {
            return Err(Error::config_error(format!(
                "Catalog declares tools with no implementation: {}",
                missing.join(", ")
            )));
        }

        let undeclared: Vec<&str> = implemented.difference(&declared).copied().collect();
        if !undeclared.is_empty() {
            return Err(Error::config_error(format!(
                "Tools missing from the catalog: {}",
                undeclared.join(", ")
            )));
        }

        for def in catalog.definitions() {
            let tool = self.get(def.name())?;
            let expected = tool.schema();
            let declared = &def.function.parameters;

            let expected_props: BTreeSet<&String> = expected.properties.keys().collect();
            let declared_props: BTreeSet<&String> = declared.properties.keys().collect();
            if expected_props != declared_props {
                return Err(Error::config_error(format!(
                    "Catalog parameters for '{}' do not match the tool: expected {:?}, found {:?}",
                    def.name(),
                    expected_props,
                    declared_props
                )));
            }

            let expected_required: BTreeSet<&String> = expected.required.iter().collect();
            let declared_required: BTreeSet<&String> = declared.required.iter().collect();
            if expected_required != declared_required {
                return Err(Error::config_error(format!(
                    "Catalog required parameters for '{}' do not match the tool",
                    def.name()
                )));
            }
        }

        tracing::debug!(tools = ?self.names(), "Tool catalog matches registry");
        Ok(())
    }
}

/// Builder for ToolRegistry
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn build(self) -> Result<ToolRegistry> {
        let mut tools = BTreeMap::new();
        for tool in self.tools {
            let name = tool.name().to_string();
            if tools.insert(name.clone(), tool).is_some() {
                return Err(Error::config_error(format!(
                    "Tool '{}' registered twice",
                    name
                )));
            }
        }
        Ok(ToolRegistry { tools })
    }
}
