//! Chat completions client implementing [`LLM`]

use super::{OpenAIConfig, types::*};
use agentrace_core::{
    Error, LLM, LLMRequest, LLMResponse, Message, ResponseFormat, Result, ToolCallRequest, Usage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// OpenAI chat completions model with tool calling support
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    config: OpenAIConfig,
}

impl std::fmt::Debug for OpenAIModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIModel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OpenAIModel {
    pub fn new(api_key: impl Into<String>, config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_request(&self, request: LLMRequest) -> OpenAIRequest {
        let model = if request.model.is_empty() {
            self.config.model.clone()
        } else {
            request.model
        };

        OpenAIRequest {
            model,
            messages: request.messages.iter().map(to_openai_message).collect(),
            tools: request.tools,
            temperature: request.config.temperature,
            max_tokens: request.config.max_tokens,
            top_p: request.config.top_p,
            response_format: request.config.response_format.map(to_openai_format),
        }
    }
}

fn to_openai_message(message: &Message) -> OpenAIMessage {
    let content = if message.has_tool_calls() && message.content.is_empty() {
        None
    } else {
        Some(message.content.clone())
    };

    OpenAIMessage {
        role: message.role.as_str().to_string(),
        content,
        tool_calls: message
            .tool_calls
            .iter()
            .map(|call| OpenAIToolCall {
                id: call.id.clone(),
                kind: "function".to_string(),
                function: OpenAIFunctionCall {
                    name: call.name.clone(),
                    arguments: call.raw_arguments(),
                },
            })
            .collect(),
        tool_call_id: message.tool_call_id.clone(),
    }
}

fn to_openai_format(format: ResponseFormat) -> OpenAIResponseFormat {
    OpenAIResponseFormat {
        kind: "json_schema".to_string(),
        json_schema: OpenAIJsonSchema {
            name: format.name,
            description: format.description,
            schema: format.schema,
            strict: format.strict,
        },
    }
}

/// Arguments that are not valid JSON are kept verbatim so the dispatcher can reject them
fn parse_arguments(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn from_openai_message(message: OpenAIMessage) -> Message {
    let tool_calls: Vec<ToolCallRequest> = message
        .tool_calls
        .into_iter()
        .map(|call| {
            ToolCallRequest::new(
                call.id,
                call.function.name,
                parse_arguments(call.function.arguments),
            )
        })
        .collect();

    Message::assistant_with_tool_calls(message.content.unwrap_or_default(), tool_calls)
}

#[async_trait]
impl LLM for OpenAIModel {
    fn name(&self) -> &str {
        "openai"
    }

    #[tracing::instrument(
        name = "openai.chat_completions",
        skip_all,
        fields(endpoint = %self.endpoint(), status = tracing::field::Empty)
    )]
    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse> {
        let body = self.build_request(request);
        tracing::debug!(
            model = %body.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::transport(format!("Request failed: {}", e)))?;

        tracing::Span::current().record("status", response.status().as_u16());
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::transport(format!(
                "OpenAI API error {}: {}",
                status, error_text
            )));
        }

        let completion: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| Error::transport(format!("Failed to parse response: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::transport("Response contained no choices"))?;

        let mut reply = LLMResponse {
            message: from_openai_message(choice.message),
            finish_reason: choice.finish_reason,
            usage: None,
        };
        if let Some(usage) = completion.usage {
            reply = reply.with_usage(Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            });
        }

        Ok(reply)
    }
}
