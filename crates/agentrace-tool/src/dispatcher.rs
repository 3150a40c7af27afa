//! Traced execution of tool calls

use crate::{DefaultToolContext, ToolContext, ToolRegistry};
use agentrace_core::{Error, Result, ToolCallRequest, ToolResult};
use agentrace_telemetry::{RunContext, SpanKind, SpanRole, SpanStatus, SpanTree, attributes};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Routes tool-call requests to the registry, one tool span per call
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    spans: SpanTree,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, spans: SpanTree) -> Self {
        Self { registry, spans }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute one call under a tool span parented on the run's current
    /// tool-handling span.
    ///
    /// Unknown tools, malformed arguments and cancellation are returned as
    /// errors. A tool that reports a recoverable failure still yields a
    /// [`ToolResult`], with `success == false`.
    pub async fn dispatch(
        &self,
        call: &ToolCallRequest,
        run: &RunContext,
        cancel: &CancellationToken,
    ) -> Result<ToolResult> {
        let parent = run.nearest(&[SpanRole::HandleTools, SpanRole::LastRouter, SpanRole::Run]);
        let mut span = self.spans.start(&call.name, SpanKind::Tool, parent.as_ref());
        run.record(SpanRole::LastTool, span.context());

        span.set_attribute(attributes::TOOL_NAME, call.name.as_str());
        span.set_attribute(attributes::TOOL_CALL_ID, call.id.as_str());
        span.set_input(call.raw_arguments());

        let tool = match self.registry.get(&call.name) {
            Ok(tool) => tool,
            Err(e) => {
                tracing::error!(run_id = %run.run_id(), tool = %call.name, "Unknown tool requested");
                span.fail(e.to_string());
                span.end();
                return Err(e);
            }
        };

        tracing::info!(
            run_id = %run.run_id(),
            tool = %call.name,
            tool_call_id = %call.id,
            "Processing tool call"
        );

        let ctx: Arc<dyn ToolContext> = Arc::new(DefaultToolContext::new(
            call.id.clone(),
            run.clone(),
            self.spans.clone(),
            cancel.clone(),
        ));

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = span.in_scope(tool.execute(ctx, call.arguments.clone())) => result,
        };

        match outcome {
            Ok(output) => {
                span.set_output(output.content.as_str());
                if output.success {
                    span.set_status(SpanStatus::Ok);
                } else {
                    tracing::warn!(tool = %call.name, "Tool reported a failure");
                    span.set_status(SpanStatus::Error(output.content.clone()));
                }
                span.end();
                Ok(ToolResult {
                    tool_call_id: call.id.clone(),
                    content: output.content,
                    success: output.success,
                })
            }
            Err(e) => {
                tracing::error!(tool = %call.name, error = %e, "Tool call failed");
                span.set_output(e.to_string());
                span.fail(e.to_string());
                span.end();
                Err(e)
            }
        }
    }

    /// Execute calls one after another in received order. The first fatal
    /// error stops the sequence.
    pub async fn dispatch_all(
        &self,
        calls: &[ToolCallRequest],
        run: &RunContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolResult>> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.dispatch(call, run, cancel).await?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FunctionTool, Tool, ToolOutput, ToolSchema, parse_args};
    use agentrace_core::ParameterSchema;
    use agentrace_telemetry::testing::TestTelemetry;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::{Value, json};

    #[derive(Deserialize)]
    struct EchoParams {
        text: String,
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "Echo"
        }

        fn description(&self) -> &str {
            "Echo text back"
        }

        fn schema(&self) -> ParameterSchema {
            ToolSchema::new().required_string("text", "Text to echo").build()
        }

        async fn execute(&self, _ctx: Arc<dyn ToolContext>, args: Value) -> Result<ToolOutput> {
            let params: EchoParams = parse_args(self.name(), args)?;
            if params.text.is_empty() {
                return Ok(ToolOutput::failure("Nothing to echo"));
            }
            Ok(ToolOutput::ok(params.text))
        }
    }

    fn dispatcher(telemetry: &TestTelemetry) -> ToolDispatcher {
        let slow = FunctionTool::builder()
            .name("Slow")
            .description("Never finishes")
            .execute(|_ctx, _: Value| async move {
                futures::future::pending::<()>().await;
                Ok(Value::Null)
            })
            .build()
            .unwrap();
        let registry = ToolRegistry::builder()
            .tool(Arc::new(EchoTool))
            .tool(Arc::new(slow))
            .build()
            .unwrap();
        ToolDispatcher::new(Arc::new(registry), telemetry.spans())
    }

    #[tokio::test]
    async fn test_results_follow_call_order() {
        let telemetry = TestTelemetry::new();
        let dispatcher = dispatcher(&telemetry);
        let run = RunContext::new("run");
        let calls = vec![
            ToolCallRequest::new("c1", "Echo", json!({"text": "first"})),
            ToolCallRequest::new("c2", "Echo", json!({"text": "second"})),
            ToolCallRequest::new("c3", "Echo", json!({"text": "third"})),
        ];

        let results = dispatcher
            .dispatch_all(&calls, &run, &CancellationToken::new())
            .await
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.tool_call_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(results[1].content, "second");
        assert_eq!(telemetry.spans_named("Echo").len(), 3);
    }

    #[tokio::test]
    async fn test_tool_span_nests_under_handle_span() {
        let telemetry = TestTelemetry::new();
        let dispatcher = dispatcher(&telemetry);
        let run = RunContext::new("run");

        let mut handle = telemetry
            .spans()
            .start("HandleToolCalls", SpanKind::Chain, None);
        run.record(SpanRole::HandleTools, handle.context());

        let call = ToolCallRequest::new("c1", "Echo", json!({"text": "hi"}));
        dispatcher
            .dispatch(&call, &run, &CancellationToken::new())
            .await
            .unwrap();
        handle.set_status(SpanStatus::Ok);
        handle.end();

        let handle_span = telemetry.find_span("HandleToolCalls").unwrap();
        let tool_span = telemetry.find_span("Echo").unwrap();
        assert_eq!(tool_span.parent_span_id, handle_span.span_context.span_id());
        assert_eq!(TestTelemetry::kind_of(&tool_span).as_deref(), Some("TOOL"));
        assert_eq!(
            TestTelemetry::string_attribute(&tool_span, attributes::INPUT_VALUE).as_deref(),
            Some(r#"{"text":"hi"}"#)
        );
        assert_eq!(
            TestTelemetry::string_attribute(&tool_span, attributes::OUTPUT_VALUE).as_deref(),
            Some("hi")
        );
        assert!(run.slot(SpanRole::LastTool).is_some());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_fatal_and_span_closed() {
        let telemetry = TestTelemetry::new();
        let dispatcher = dispatcher(&telemetry);
        let call = ToolCallRequest::new("c1", "Nope", json!({}));

        let err = dispatcher
            .dispatch(&call, &RunContext::new("run"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnknownTool(_)));
        let span = telemetry.find_span("Nope").unwrap();
        assert!(matches!(span.status, opentelemetry::trace::Status::Error { .. }));
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_fatal() {
        let telemetry = TestTelemetry::new();
        let dispatcher = dispatcher(&telemetry);
        let call = ToolCallRequest::new("c1", "Echo", json!("{text: unquoted"));

        let err = dispatcher
            .dispatch(&call, &RunContext::new("run"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidArguments { .. }));
        assert_eq!(telemetry.finished_spans().len(), 1);
    }

    #[tokio::test]
    async fn test_recoverable_failure_keeps_result() {
        let telemetry = TestTelemetry::new();
        let dispatcher = dispatcher(&telemetry);
        let call = ToolCallRequest::new("c1", "Echo", json!({"text": ""}));

        let result = dispatcher
            .dispatch(&call, &RunContext::new("run"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.content, "Nothing to echo");
        let span = telemetry.find_span("Echo").unwrap();
        assert!(matches!(span.status, opentelemetry::trace::Status::Error { .. }));
    }

    #[tokio::test]
    async fn test_cancellation_closes_tool_span() {
        let telemetry = TestTelemetry::new();
        let dispatcher = dispatcher(&telemetry);
        let cancel = CancellationToken::new();
        let call = ToolCallRequest::new("c1", "Slow", json!({}));

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = dispatcher
            .dispatch(&call, &RunContext::new("run"), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        let span = telemetry.find_span("Slow").unwrap();
        assert!(matches!(span.status, opentelemetry::trace::Status::Error { .. }));
    }
}
