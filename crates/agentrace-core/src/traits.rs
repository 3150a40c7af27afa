use crate::{Message, Result, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default cap on output tokens for a completion request
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// LLM trait for language model implementations
#[async_trait]
pub trait LLM: Send + Sync {
    fn name(&self) -> &str;

    /// Run one completion round against the endpoint
    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    #[serde(default)]
    pub config: GenerateConfig,
}

impl LLMRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            config: GenerateConfig::default(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_config(mut self, config: GenerateConfig) -> Self {
        self.config = config;
        self
    }

    /// Content of the last message, used as the input of router spans
    pub fn last_content(&self) -> &str {
        self.messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    /// Structured output constraint (JSON schema response format)
    pub response_format: Option<ResponseFormat>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            temperature: None,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            top_p: None,
            response_format: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat {
    pub name: String,
    pub description: Option<String>,
    pub schema: serde_json::Value,
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    /// Assistant message: either plain text or a list of tool calls
    pub message: Message,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl LLMResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(content),
            finish_reason: Some("stop".to_string()),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_total() {
        assert_eq!(Usage::new(20, 10).total_tokens, 30);
        assert_eq!(Usage::new(u32::MAX, 5).total_tokens, u32::MAX);
    }

    #[test]
    fn test_last_content() {
        let request = LLMRequest::new("m", vec![Message::system("s"), Message::user("q")]);
        assert_eq!(request.last_content(), "q");
        assert_eq!(LLMRequest::new("m", vec![]).last_content(), "");
        assert_eq!(request.config.max_tokens, Some(DEFAULT_MAX_TOKENS));
    }
}
