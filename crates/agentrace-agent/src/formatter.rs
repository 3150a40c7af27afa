//! Normalizes caller input into the message list sent to the model

use agentrace_core::{Error, Message, Result};
use serde_json::Value;

/// What a caller may hand to the agent
#[derive(Debug, Clone, PartialEq)]
pub enum AgentInput {
    /// Free text, becomes a single user message
    Prompt(String),
    /// Pre-built conversation, used in order
    Conversation(Vec<Message>),
}

impl From<&str> for AgentInput {
    fn from(prompt: &str) -> Self {
        AgentInput::Prompt(prompt.to_string())
    }
}

impl From<String> for AgentInput {
    fn from(prompt: String) -> Self {
        AgentInput::Prompt(prompt)
    }
}

impl From<Vec<Message>> for AgentInput {
    fn from(messages: Vec<Message>) -> Self {
        AgentInput::Conversation(messages)
    }
}

/// Accepts a JSON string or a JSON array of messages; any other shape is
/// rejected.
impl TryFrom<Value> for AgentInput {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(prompt) => Ok(AgentInput::Prompt(prompt)),
            Value::Array(_) => serde_json::from_value(value)
                .map(AgentInput::Conversation)
                .map_err(|e| Error::InvalidInput(format!("not a message list: {}", e))),
            other => Err(Error::InvalidInput(format!(
                "expected a prompt string or a message list, got {}",
                json_type(&other)
            ))),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Build the canonical conversation for a run.
///
/// The result always starts with a system message: `system_prompt` is
/// prepended when the input carries none. Existing messages keep their order.
pub fn format_messages(input: AgentInput, system_prompt: &str) -> Result<Vec<Message>> {
    match input {
        AgentInput::Prompt(prompt) => Ok(vec![
            Message::system(system_prompt),
            Message::user(prompt),
        ]),
        AgentInput::Conversation(messages) => {
            if messages.is_empty() {
                return Err(Error::InvalidInput("conversation is empty".to_string()));
            }
            if messages.iter().any(Message::is_system) {
                return Ok(messages);
            }
            let mut formatted = Vec::with_capacity(messages.len() + 1);
            formatted.push(Message::system(system_prompt));
            formatted.extend(messages);
            Ok(formatted)
        }
    }
}
