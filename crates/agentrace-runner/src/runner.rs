use agentrace_agent::{Agent, AgentInput, AgentOutcome};
use agentrace_core::{Error, Message, Result};
use agentrace_session::{ConversationHistory, HistoryStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Runner {
    agent: Arc<Agent>,
    history: Arc<dyn HistoryStore>,
}

impl Runner {
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::new()
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub async fn run(&self, prompt: impl Into<String>, config: RunConfig) -> Result<AgentOutcome> {
        self.run_with_cancellation(prompt, config, None).await
    }

    /// Continue the saved conversation with `prompt` and save the new
    /// transcript once the agent answers.
    pub async fn run_with_cancellation(
        &self,
        prompt: impl Into<String>,
        config: RunConfig,
        cancel_token: Option<CancellationToken>,
    ) -> Result<AgentOutcome> {
        let mut conversation = self.load_conversation(&config).await;
        conversation.push(Message::user(prompt));

        let cancel = cancel_token.unwrap_or_default();
        let outcome = self
            .agent
            .run_with_cancellation(AgentInput::Conversation(conversation), &cancel)
            .await?;

        let history = ConversationHistory::new(outcome.messages.clone());
        if let Err(e) = self.history.put(&history).await {
            tracing::error!(run_id = %outcome.run_id, error = %e, "Failed to save conversation history");
        }

        Ok(outcome)
    }

    async fn load_conversation(&self, config: &RunConfig) -> Vec<Message> {
        if config.restart {
            tracing::info!("Starting a fresh conversation");
            return Vec::new();
        }

        match self.history.get().await {
            Ok(Some(history)) if !history.is_empty() => {
                tracing::info!(
                    messages = history.messages.len(),
                    saved_at = %history.timestamp,
                    "Continuing saved conversation"
                );
                history.messages
            }
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not load conversation history, starting fresh");
                Vec::new()
            }
        }
    }
}

pub struct RunnerBuilder {
    agent: Option<Arc<Agent>>,
    history: Option<Arc<dyn HistoryStore>>,
}

impl RunnerBuilder {
    pub fn new() -> Self {
        Self {
            agent: None,
            history: None,
        }
    }

    pub fn agent(mut self, agent: Arc<Agent>) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn history(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    pub fn build(self) -> Result<Runner> {
        let agent = self
            .agent
            .ok_or_else(|| Error::config_error("Agent is required"))?;
        let history = self
            .history
            .ok_or_else(|| Error::config_error("History store is required"))?;

        Ok(Runner { agent, history })
    }
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Ignore any saved conversation
    pub restart: bool,
}
