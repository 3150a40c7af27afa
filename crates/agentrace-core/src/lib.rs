//! Core traits and types for agentrace
//!
//! This crate provides the conversation model, the completion-endpoint
//! abstraction, the tool catalog and the error taxonomy shared by every
//! other crate in the workspace.

pub mod catalog;
pub mod config;
pub mod error;
pub mod message;
pub mod traits;

// Re-exports
pub use catalog::{FunctionDefinition, ParameterSchema, ToolCatalog, ToolDefinition};
pub use config::AgentConfig;
pub use error::{Error, Result};
pub use message::{Message, Role, ToolCallRequest, ToolResult};
pub use traits::{GenerateConfig, LLM, LLMRequest, LLMResponse, ResponseFormat, Usage};
