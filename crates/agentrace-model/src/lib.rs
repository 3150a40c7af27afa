//! Completion endpoint adapters for agentrace

pub mod openai;

pub use openai::{OpenAIBuilder, OpenAIConfig, OpenAIModel};
