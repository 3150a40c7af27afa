//! OpenAI chat completions with tool calling and structured outputs

pub mod model;
pub mod types;

pub use model::OpenAIModel;

use agentrace_core::{AgentConfig, Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI configuration
#[derive(Clone, Debug)]
pub struct OpenAIConfig {
    /// Model name sent with every request
    pub model: String,
    /// Base URL for API requests
    pub base_url: String,
}

impl OpenAIConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create configuration with custom base URL (any OpenAI-compatible endpoint)
    pub fn with_base_url(model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: base_url.into(),
        }
    }
}

/// Builder for OpenAIModel
#[derive(Default)]
pub struct OpenAIBuilder {
    api_key: Option<String>,
    config: Option<OpenAIConfig>,
}

impl OpenAIBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_config(mut self, config: OpenAIConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Take key, model and base URL from the `[model]` section
    pub fn from_agent_config(config: &AgentConfig) -> Result<Self> {
        let api_key = config
            .api_key()
            .map_err(|e| Error::config_error(e.to_string()))?;
        let openai = match &config.model.base_url {
            Some(url) => OpenAIConfig::with_base_url(config.model.name.clone(), url.clone()),
            None => OpenAIConfig::new(config.model.name.clone()),
        };
        Ok(Self::new().with_api_key(api_key).with_config(openai))
    }

    pub fn build(self) -> Result<OpenAIModel> {
        let api_key = self
            .api_key
            .ok_or_else(|| Error::config_error("API key is required"))?;
        let config = self
            .config
            .ok_or_else(|| Error::config_error("Configuration is required"))?;

        Ok(OpenAIModel::new(api_key, config))
    }
}
