//! Scripted completion endpoints for exercising the router loop
//!
//! These models never touch the network. They replay canned responses in
//! order and keep every request they were given for later inspection.

use agentrace_core::{
    Error, LLM, LLMRequest, LLMResponse, Message, Result, ToolCallRequest, Usage,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays a fixed list of responses, one per `generate` call.
///
/// Running past the end of the script is a transport error.
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<LLMResponse>>>,
    requests: Mutex<Vec<LLMRequest>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<LLMResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LLM for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| Err(Error::transport("script exhausted")))
    }
}

/// Never answers; for cancellation tests
pub struct PendingModel;

#[async_trait]
impl LLM for PendingModel {
    fn name(&self) -> &str {
        "pending"
    }

    async fn generate(&self, _request: LLMRequest) -> Result<LLMResponse> {
        std::future::pending().await
    }
}

/// A response asking for the given `(id, tool, arguments)` calls
pub fn tool_calls_response(calls: Vec<(&str, &str, Value)>) -> LLMResponse {
    let calls = calls
        .into_iter()
        .map(|(id, name, args)| ToolCallRequest::new(id, name, args))
        .collect();
    LLMResponse {
        message: Message::assistant_with_tool_calls("", calls),
        finish_reason: Some("tool_calls".to_string()),
        usage: Some(Usage::new(20, 10)),
    }
}

/// A plain final answer
pub fn answer_response(text: &str) -> LLMResponse {
    LLMResponse::text(text).with_usage(Usage::new(30, 5))
}
