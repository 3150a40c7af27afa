use crate::router::Agent;
use agentrace_core::config::DEFAULT_SYSTEM_PROMPT;
use agentrace_core::traits::DEFAULT_MAX_TOKENS;
use agentrace_core::{AgentConfig, Error, LLM, Result, ToolCatalog};
use agentrace_telemetry::SpanTree;
use agentrace_tool::{Tool, ToolDispatcher, ToolRegistry};
use std::sync::Arc;

const DEFAULT_MODEL_NAME: &str = "gpt-4o-mini";
const DEFAULT_MAX_ITERATIONS: usize = 10;

pub struct AgentBuilder {
    model: Option<Arc<dyn LLM>>,
    model_name: String,
    max_tokens: u32,
    system_prompt: String,
    max_iterations: usize,
    tools: Vec<Arc<dyn Tool>>,
    catalog: Option<ToolCatalog>,
    spans: Option<SpanTree>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tools: Vec::new(),
            catalog: None,
            spans: None,
        }
    }

    /// Model name, token cap, system prompt and iteration limit from config
    pub fn config(mut self, config: &AgentConfig) -> Self {
        self.model_name = config.model.name.clone();
        self.max_tokens = config.model.max_tokens;
        self.system_prompt = config.agent.system_prompt.clone();
        self.max_iterations = config.agent.max_iterations;
        self
    }

    pub fn model(mut self, model: Arc<dyn LLM>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Catalog advertised to the model. Defaults to the registered tools'
    /// own definitions.
    pub fn catalog(mut self, catalog: ToolCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn spans(mut self, spans: SpanTree) -> Self {
        self.spans = Some(spans);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let model = self
            .model
            .ok_or_else(|| Error::config_error("Model is required"))?;

        if self.max_iterations == 0 {
            return Err(Error::config_error("max_iterations must be at least 1"));
        }

        let registry = ToolRegistry::builder().tools(self.tools).build()?;
        let catalog = match self.catalog {
            Some(catalog) => {
                registry.validate_catalog(&catalog)?;
                catalog
            }
            None => ToolCatalog::new(registry.definitions()),
        };

        let spans = self.spans.unwrap_or_else(SpanTree::detached);
        let dispatcher = ToolDispatcher::new(Arc::new(registry), spans.clone());

        tracing::debug!(
            model = %self.model_name,
            tools = catalog.len(),
            max_iterations = self.max_iterations,
            "Agent built"
        );

        Ok(Agent {
            model,
            model_name: self.model_name,
            max_tokens: self.max_tokens,
            system_prompt: self.system_prompt,
            max_iterations: self.max_iterations,
            catalog,
            dispatcher,
            spans,
        })
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
