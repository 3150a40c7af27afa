//! The router loop: ask the model, run the tools it requests, repeat

use crate::builder::AgentBuilder;
use crate::formatter::{AgentInput, format_messages};
use agentrace_core::{
    Error, GenerateConfig, LLM, LLMRequest, Message, Result, ToolCallRequest, ToolCatalog,
};
use agentrace_telemetry::{RunContext, SpanKind, SpanRole, SpanStatus, SpanTree, attributes};
use agentrace_tool::ToolDispatcher;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub(crate) const RUN_SPAN: &str = "AgentRun";
pub(crate) const ROUTER_SPAN: &str = "RouterCall";
pub(crate) const HANDLE_TOOLS_SPAN: &str = "HandleToolCalls";

/// Where the loop stands between steps
#[derive(Debug, Clone, PartialEq)]
pub enum RouterState {
    AwaitingRouterDecision,
    ToolCallsPending(Vec<ToolCallRequest>),
    Done(String),
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub run_id: String,
    pub answer: String,
    /// Full transcript, system message first
    pub messages: Vec<Message>,
    /// Number of router decisions taken
    pub iterations: usize,
}

pub struct Agent {
    pub(crate) model: Arc<dyn LLM>,
    pub(crate) model_name: String,
    pub(crate) max_tokens: u32,
    pub(crate) system_prompt: String,
    pub(crate) max_iterations: usize,
    pub(crate) catalog: ToolCatalog,
    pub(crate) dispatcher: ToolDispatcher,
    pub(crate) spans: SpanTree,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub async fn run(&self, input: impl Into<AgentInput>) -> Result<AgentOutcome> {
        self.run_with_cancellation(input, &CancellationToken::new())
            .await
    }

    /// Drive one run to completion under an `AgentRun` span.
    ///
    /// Fatal errors close every open span with an error status before they
    /// are returned.
    pub async fn run_with_cancellation(
        &self,
        input: impl Into<AgentInput>,
        cancel: &CancellationToken,
    ) -> Result<AgentOutcome> {
        let mut messages = format_messages(input.into(), &self.system_prompt)?;

        let run = RunContext::new(Uuid::new_v4().to_string());
        let mut run_span = self.spans.start(RUN_SPAN, SpanKind::Agent, None);
        run.record(SpanRole::Run, run_span.context());
        run_span.set_attribute(attributes::AGENT_RUN_ID, run.run_id());
        run_span.set_model(&self.model_name);
        if let Some(last) = messages.last() {
            run_span.set_input(last.content.as_str());
        }

        tracing::info!(
            run_id = %run.run_id(),
            model = %self.model_name,
            messages = messages.len(),
            "Starting agent run"
        );

        let result = self.drive(&run, &mut messages, cancel).await;
        run.clear();

        match result {
            Ok((answer, iterations)) => {
                run_span.succeed(answer.as_str());
                run_span.end();
                tracing::info!(run_id = %run.run_id(), iterations, "Agent run completed");
                Ok(AgentOutcome {
                    run_id: run.run_id().to_string(),
                    answer,
                    messages,
                    iterations,
                })
            }
            Err(e) => {
                tracing::error!(run_id = %run.run_id(), error = %e, "Agent run failed");
                run_span.fail(e.to_string());
                run_span.end();
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        run: &RunContext,
        messages: &mut Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<(String, usize)> {
        let mut state = RouterState::AwaitingRouterDecision;
        let mut iterations = 0;

        loop {
            state = match state {
                RouterState::AwaitingRouterDecision => {
                    if iterations >= self.max_iterations {
                        tracing::warn!(
                            run_id = %run.run_id(),
                            max_iterations = self.max_iterations,
                            "No final answer within the iteration limit"
                        );
                        return Err(Error::MaxIterations(self.max_iterations));
                    }
                    iterations += 1;
                    self.route(run, messages, iterations, cancel).await?
                }
                RouterState::ToolCallsPending(calls) => {
                    self.handle_tool_calls(run, messages, &calls, cancel)
                        .await?;
                    RouterState::AwaitingRouterDecision
                }
                RouterState::Done(answer) => return Ok((answer, iterations)),
            };
        }
    }

    /// One completion request under a `RouterCall` chain span
    async fn route(
        &self,
        run: &RunContext,
        messages: &mut Vec<Message>,
        iteration: usize,
        cancel: &CancellationToken,
    ) -> Result<RouterState> {
        let parent = run.slot(SpanRole::Run);
        let mut span = self.spans.start(ROUTER_SPAN, SpanKind::Chain, parent.as_ref());
        run.record(SpanRole::LastRouter, span.context());

        let request = LLMRequest::new(self.model_name.clone(), messages.clone())
            .with_tools(self.catalog.definitions().to_vec())
            .with_config(GenerateConfig {
                max_tokens: Some(self.max_tokens),
                ..GenerateConfig::default()
            });

        span.set_model(&self.model_name);
        span.set_attribute(attributes::ROUTER_ITERATION, iteration);
        span.set_input(request.last_content());

        tracing::debug!(run_id = %run.run_id(), iteration, "Calling router model");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = span.in_scope(self.model.generate(request)) => result,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(run_id = %run.run_id(), iteration, error = %e, "Router call failed");
                span.fail(e.to_string());
                span.end();
                return Err(e);
            }
        };

        if let Some(usage) = response.usage {
            span.set_token_counts(
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens,
            );
        }

        let reply = response.message;
        messages.push(reply.clone());

        if reply.has_tool_calls() {
            let names: Vec<String> = reply.tool_calls.iter().map(|c| c.name.clone()).collect();
            tracing::debug!(
                run_id = %run.run_id(),
                iteration,
                tools = ?names,
                "Router requested tool calls"
            );
            span.set_output(names);
            span.set_status(SpanStatus::Ok);
            span.end();
            Ok(RouterState::ToolCallsPending(reply.tool_calls))
        } else {
            span.succeed(reply.content.as_str());
            span.end();
            Ok(RouterState::Done(reply.content))
        }
    }

    /// Run the pending calls in order under a `HandleToolCalls` span
    async fn handle_tool_calls(
        &self,
        run: &RunContext,
        messages: &mut Vec<Message>,
        calls: &[ToolCallRequest],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let parent = run.slot(SpanRole::LastRouter);
        let mut span = self
            .spans
            .start(HANDLE_TOOLS_SPAN, SpanKind::Chain, parent.as_ref());
        run.record(SpanRole::HandleTools, span.context());
        span.set_input(calls.iter().map(|c| c.name.clone()).collect::<Vec<_>>());

        match self.dispatcher.dispatch_all(calls, run, cancel).await {
            Ok(results) => {
                span.set_output(results.iter().map(|r| r.content.clone()).collect::<Vec<_>>());
                span.set_status(SpanStatus::Ok);
                span.end();
                messages.extend(results.into_iter().map(Message::from));
                Ok(())
            }
            Err(e) => {
                span.fail(e.to_string());
                span.end();
                Err(e)
            }
        }
    }
}
