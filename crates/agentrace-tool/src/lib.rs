//! Tool system for agentrace
//!
//! This crate provides the tool execution framework, including:
//! - Tool trait and argument parsing
//! - A closed tool registry checked against the declarative catalog
//! - The traced dispatcher used by the router loop
//! - The sales dataset tools

pub mod context;
pub mod dispatcher;
pub mod function_tool;
pub mod registry;
pub mod sales;
pub mod schema;

// Re-exports
pub use context::{DefaultToolContext, ToolContext};
pub use dispatcher::ToolDispatcher;
pub use function_tool::FunctionTool;
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use schema::ToolSchema;

use agentrace_core::{Error, ParameterSchema, Result, ToolDefinition};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Plain-text outcome of one tool execution.
///
/// `success == false` is a recoverable failure: the text explains what went
/// wrong and is still handed back to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub success: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: true,
        }
    }

    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: false,
        }
    }

    /// Coerce a JSON result into plain text. Strings are taken verbatim.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Self::ok(s),
            other => Self::ok(other.to_string()),
        }
    }
}

/// An executable capability the model can request by name
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn schema(&self) -> ParameterSchema;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(self.name(), self.description(), self.schema())
    }

    /// Run the tool. `Err` is fatal to the run; recoverable failures are
    /// reported through [`ToolOutput::failure`].
    async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<ToolOutput>;
}

/// Deserialize tool-call arguments into a tool's typed parameters
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|source| Error::InvalidArguments {
        tool: tool.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct LookupParams {
        prompt: String,
    }

    #[test]
    fn test_parse_args() {
        let params: LookupParams =
            parse_args("LookUpSalesData", json!({"prompt": "sales for store 7"})).unwrap();
        assert_eq!(params.prompt, "sales for store 7");
    }

    #[test]
    fn test_parse_args_failure_is_invalid_arguments() {
        let err = parse_args::<LookupParams>("LookUpSalesData", json!({"query": "x"})).unwrap_err();
        match err {
            Error::InvalidArguments { tool, .. } => assert_eq!(tool, "LookUpSalesData"),
            other => panic!("unexpected error {:?}", other),
        }

        // Unparsable argument text arrives as a bare string
        assert!(parse_args::<LookupParams>("LookUpSalesData", json!("{prompt:")).is_err());
    }

    #[test]
    fn test_output_coercion() {
        assert_eq!(ToolOutput::from_value(json!("text")).content, "text");
        assert_eq!(ToolOutput::from_value(json!({"sum": 8})).content, r#"{"sum":8}"#);
        assert!(!ToolOutput::failure("boom").success);
    }
}
