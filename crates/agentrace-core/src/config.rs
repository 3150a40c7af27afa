//! Configuration management for agentrace
//!
//! Loads configuration with priority:
//! 1. agentrace.toml (or specified config file)
//! 2. Environment variables (fallback)
//! 3. Defaults

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "agentrace.toml";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that can answer questions about the Store Sales Price Elasticity Promotions dataset.";

/// agentrace configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub agent: AgentSection,

    #[serde(default)]
    pub telemetry: TelemetrySection,

    #[serde(default)]
    pub history: HistorySection,

    #[serde(default)]
    pub data: DataSection,
}

/// Completion endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,

    /// API key (can reference env var with ${VAR_NAME})
    pub api_key: Option<String>,

    /// Base URL for OpenAI-compatible endpoints
    pub base_url: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_tool_catalog")]
    pub tool_catalog: PathBuf,
}

/// Trace export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_project_name")]
    pub project_name: String,

    /// Collector base URL; spans go to `<endpoint>/v1/traces`
    pub collector_endpoint: Option<String>,

    /// Comma separated `key=value` pairs
    pub headers: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySection {
    #[serde(default = "default_history_path")]
    pub path: PathBuf,
}

/// Sales dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSection {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_row_limit")]
    pub row_limit: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            max_iterations: default_max_iterations(),
            tool_catalog: default_tool_catalog(),
        }
    }
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            enabled: true,
            project_name: default_project_name(),
            collector_endpoint: None,
            headers: None,
        }
    }
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            path: default_history_path(),
        }
    }
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            table: default_table(),
            row_limit: default_row_limit(),
        }
    }
}

impl AgentConfig {
    /// Load configuration, searching for agentrace.toml in the current
    /// directory and its parents
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::find_config_file()?,
        };

        tracing::debug!("Loading configuration from: {:?}", config_path);

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config: AgentConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        config.resolve_env_vars();
        config.validate()?;

        Ok(config)
    }

    /// Use the config file when one is found, otherwise build from the
    /// environment alone
    pub fn load_or_env(path: Option<&Path>) -> Result<Self> {
        if path.is_some() {
            return Self::load_from(path);
        }
        match Self::find_config_file() {
            Ok(found) => Self::load_from(Some(&found)),
            Err(_) => {
                tracing::debug!("No {} found, using environment", CONFIG_FILE_NAME);
                Self::from_env()
            }
        }
    }

    /// Defaults overlaid with the environment fallbacks
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.resolve_env_vars();
        config.validate()?;
        Ok(config)
    }

    fn find_config_file() -> Result<PathBuf> {
        let mut current = env::current_dir()?;

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        Err(anyhow!(
            "{} not found. Create one with: cp agentrace.toml.example agentrace.toml",
            CONFIG_FILE_NAME
        ))
    }

    fn resolve_env_vars(&mut self) {
        self.model.api_key =
            Self::resolve_or_fallback(self.model.api_key.take(), "OPENAI_API_KEY");
        self.model.base_url = self
            .model
            .base_url
            .take()
            .and_then(|url| Self::resolve_env_var(&url));

        self.telemetry.collector_endpoint = Self::resolve_or_fallback(
            self.telemetry.collector_endpoint.take(),
            "PHOENIX_COLLECTOR_ENDPOINT",
        );
        self.telemetry.headers =
            Self::resolve_or_fallback(self.telemetry.headers.take(), "PHOENIX_CLIENT_HEADERS");

        if let Some(resolved) = Self::resolve_env_var(&self.data.database_url) {
            self.data.database_url = resolved;
        }
    }

    /// A configured value wins; an unset or unresolvable one falls back to
    /// the named environment variable
    fn resolve_or_fallback(value: Option<String>, fallback: &str) -> Option<String> {
        value
            .and_then(|v| Self::resolve_env_var(&v))
            .filter(|v| !v.is_empty())
            .or_else(|| env::var(fallback).ok().filter(|v| !v.is_empty()))
    }

    /// Resolve a single ${VAR_NAME} reference
    fn resolve_env_var(value: &str) -> Option<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let var_name = &value[2..value.len() - 1];
            env::var(var_name).ok()
        } else {
            Some(value.to_string())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.agent.max_iterations == 0 {
            return Err(anyhow!("agent.max_iterations must be at least 1"));
        }
        let table = &self.data.table;
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(anyhow!(
                "data.table must be a plain identifier, got {:?}",
                self.data.table
            ));
        }
        Ok(())
    }

    /// API key with clear error message
    pub fn api_key(&self) -> Result<String> {
        self.model.api_key.clone().ok_or_else(|| {
            anyhow!(
                "API key not found. Configure it in agentrace.toml:\n\
                [model]\n\
                api_key = \"${{OPENAI_API_KEY}}\"\n\
                \n\
                Or set environment variable:\n\
                export OPENAI_API_KEY=\"your-key\""
            )
        })
    }

    /// Create test-friendly defaults (no API key, no collector)
    pub fn test_defaults() -> Self {
        Self {
            model: ModelConfig {
                name: "test-model".to_string(),
                api_key: Some("test-api-key".to_string()),
                base_url: None,
                max_tokens: default_max_tokens(),
            },
            agent: AgentSection::default(),
            telemetry: TelemetrySection {
                enabled: false,
                ..TelemetrySection::default()
            },
            history: HistorySection::default(),
            data: DataSection {
                database_url: "sqlite::memory:".to_string(),
                ..DataSection::default()
            },
        }
    }
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    crate::traits::DEFAULT_MAX_TOKENS
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_max_iterations() -> usize {
    10
}

fn default_tool_catalog() -> PathBuf {
    PathBuf::from("catalog/tools.json")
}

fn default_true() -> bool {
    true
}

fn default_project_name() -> String {
    "agentrace".to_string()
}

fn default_history_path() -> PathBuf {
    PathBuf::from("./history.json")
}

fn default_database_url() -> String {
    "sqlite://data/sales.db".to_string()
}

fn default_table() -> String {
    "sales".to_string()
}

fn default_row_limit() -> usize {
    200
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.model.name, "gpt-4o-mini");
        assert_eq!(config.model.max_tokens, 1000);
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.agent.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.history.path, PathBuf::from("./history.json"));
    }

    #[test]
    fn test_resolve_env_var() {
        unsafe {
            env::set_var("AGENTRACE_TEST_VAR", "test_value");
        }

        let resolved = AgentConfig::resolve_env_var("${AGENTRACE_TEST_VAR}");
        assert_eq!(resolved, Some("test_value".to_string()));

        let not_var = AgentConfig::resolve_env_var("plain_value");
        assert_eq!(not_var, Some("plain_value".to_string()));

        assert_eq!(
            AgentConfig::resolve_env_var("${AGENTRACE_TEST_VAR_UNSET}"),
            None
        );

        unsafe {
            env::remove_var("AGENTRACE_TEST_VAR");
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[model]
name = "gpt-4o"
api_key = "sk-test"
max_tokens = 512

[agent]
max_iterations = 4

[telemetry]
project_name = "sales-agent"
collector_endpoint = "http://localhost:6006"
headers = "api_key=abc"

[data]
table = "store_sales"
"#
        )
        .unwrap();

        let config = AgentConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.model.name, "gpt-4o");
        assert_eq!(config.model.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model.max_tokens, 512);
        assert_eq!(config.agent.max_iterations, 4);
        assert_eq!(config.telemetry.project_name, "sales-agent");
        assert_eq!(
            config.telemetry.collector_endpoint.as_deref(),
            Some("http://localhost:6006")
        );
        assert_eq!(config.data.table, "store_sales");
        assert_eq!(config.agent.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent]\nmax_iterations = 0").unwrap();

        assert!(AgentConfig::load_from(Some(file.path())).is_err());
    }

    #[test]
    fn test_table_must_be_identifier() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[data]\ntable = \"sales; DROP TABLE x\"").unwrap();

        assert!(AgentConfig::load_from(Some(file.path())).is_err());
    }

    #[test]
    fn test_api_key_error_message() {
        let mut config = AgentConfig::test_defaults();
        assert_eq!(config.api_key().unwrap(), "test-api-key");

        config.model.api_key = None;
        let err = config.api_key().unwrap_err().to_string();
        assert!(err.contains("OPENAI_API_KEY"));
    }
}
