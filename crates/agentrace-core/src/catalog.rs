//! Declarative tool catalog
//!
//! The catalog is a static JSON list handed verbatim to the completion
//! endpoint. It is loaded once when an agent is built and never changes for
//! the lifetime of a run.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parameters: ParameterSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type", default = "default_object")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
    ) -> Self {
        Self {
            kind: default_kind(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

fn default_kind() -> String {
    "function".to_string()
}

fn default_object() -> String {
    "object".to_string()
}

/// Ordered, immutable set of tool definitions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCatalog {
    definitions: Vec<ToolDefinition>,
}

impl ToolCatalog {
    pub fn new(definitions: Vec<ToolDefinition>) -> Self {
        Self { definitions }
    }

    /// Load a catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config_error(format!("Failed to read tool catalog {:?}: {}", path, e))
        })?;
        tracing::debug!(path = ?path, "Loaded tool catalog");
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let definitions: Vec<ToolDefinition> = serde_json::from_str(json)
            .map_err(|e| Error::config_error(format!("Invalid tool catalog: {}", e)))?;

        let mut seen = std::collections::HashSet::new();
        for def in &definitions {
            if !seen.insert(def.name()) {
                return Err(Error::config_error(format!(
                    "Tool '{}' is declared twice in the catalog",
                    def.name()
                )));
            }
        }

        Ok(Self { definitions })
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.definitions.iter().find(|d| d.name() == name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"[
        {
            "type": "function",
            "function": {
                "name": "LookUpSalesData",
                "description": "Look up data from the sales dataset",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "prompt": {"type": "string", "description": "The unchanged user prompt"}
                    },
                    "required": ["prompt"]
                }
            }
        }
    ]"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = ToolCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.names(), vec!["LookUpSalesData"]);

        let def = catalog.get("LookUpSalesData").unwrap();
        assert_eq!(def.kind, "function");
        assert_eq!(def.function.parameters.required, vec!["prompt"]);
        assert!(def.function.parameters.properties.contains_key("prompt"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let doubled = format!(
            "[{}, {}]",
            CATALOG.trim().trim_start_matches('[').trim_end_matches(']'),
            CATALOG.trim().trim_start_matches('[').trim_end_matches(']')
        );
        let err = ToolCatalog::from_json(&doubled).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = ToolCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = ToolCatalog::load("/definitely/not/here.json").unwrap_err();
        assert!(err.is_fatal_config());
    }
}
