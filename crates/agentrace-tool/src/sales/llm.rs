use crate::ToolContext;
use agentrace_core::{GenerateConfig, LLM, LLMRequest, Message, ResponseFormat, Result};
use agentrace_telemetry::{SpanRole, SpanStatus, attributes};
use std::sync::Arc;

/// Completion endpoint used from inside the sales tools.
///
/// Each call is a single user message and is traced as an LLM span under the
/// tool span that is currently executing.
#[derive(Clone)]
pub struct SalesModel {
    llm: Arc<dyn LLM>,
    model_name: String,
    max_tokens: Option<u32>,
}

impl std::fmt::Debug for SalesModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesModel")
            .field("llm", &self.llm.name())
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl SalesModel {
    pub fn new(llm: Arc<dyn LLM>, model_name: impl Into<String>) -> Self {
        Self {
            llm,
            model_name: model_name.into(),
            max_tokens: GenerateConfig::default().max_tokens,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub(crate) async fn complete(
        &self,
        ctx: &dyn ToolContext,
        prompt: String,
        response_format: Option<ResponseFormat>,
    ) -> Result<String> {
        let parent = ctx
            .run_context()
            .nearest(&[SpanRole::LastTool, SpanRole::Run]);
        let mut span = ctx
            .spans()
            .start_llm_span(self.llm.name(), &self.model_name, parent.as_ref());

        let invocation = serde_json::json!({
            "max_tokens": self.max_tokens,
            "response_format": response_format.as_ref().map(|f| f.name.clone()),
        });
        span.set_attribute(attributes::LLM_INVOCATION_PARAMETERS, invocation.to_string());
        span.set_input(prompt.as_str());

        let request = LLMRequest::new(self.model_name.clone(), vec![Message::user(prompt)])
            .with_config(GenerateConfig {
                max_tokens: self.max_tokens,
                response_format,
                ..GenerateConfig::default()
            });

        match span.in_scope(self.llm.generate(request)).await {
            Ok(response) => {
                if let Some(usage) = response.usage {
                    span.set_token_counts(
                        usage.prompt_tokens,
                        usage.completion_tokens,
                        usage.total_tokens,
                    );
                }
                span.set_output(response.message.content.as_str());
                span.set_status(SpanStatus::Ok);
                span.end();
                Ok(response.message.content)
            }
            Err(e) => {
                tracing::warn!(tool_call_id = %ctx.tool_call_id(), error = %e, "Failed model interaction");
                span.fail(e.to_string());
                span.end();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::DefaultToolContext;
    use agentrace_core::{Error, LLMResponse};
    use agentrace_telemetry::testing::TestTelemetry;
    use agentrace_telemetry::{RunContext, SpanKind};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    /// Replies with queued texts in order, then fails
    pub(crate) struct FixedModel {
        replies: Mutex<VecDeque<Result<String>>>,
        pub(crate) requests: Mutex<Vec<LLMRequest>>,
    }

    impl FixedModel {
        pub(crate) fn new(reply: &str) -> Self {
            Self::queue(vec![Ok(reply.to_string())])
        }

        pub(crate) fn queue(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLM for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, request: LLMRequest) -> Result<LLMResponse> {
            self.requests.lock().unwrap().push(request);
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(LLMResponse::text(text)),
                Some(Err(e)) => Err(e),
                None => Err(Error::transport("no reply queued")),
            }
        }
    }

    pub(crate) fn traced_context(telemetry: &TestTelemetry) -> DefaultToolContext {
        DefaultToolContext::new(
            "call-1",
            RunContext::new("run-1"),
            telemetry.spans(),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_completion_span_nests_under_tool() {
        let telemetry = TestTelemetry::new();
        let ctx = traced_context(&telemetry);
        let mut tool_span = telemetry
            .spans()
            .start("LookUpSalesData", SpanKind::Tool, None);
        ctx.run_context().record(SpanRole::LastTool, tool_span.context());

        let model = SalesModel::new(Arc::new(FixedModel::new("SELECT 1")), "gpt-4o-mini");
        let text = model.complete(&ctx, "prompt".into(), None).await.unwrap();
        tool_span.set_status(SpanStatus::Ok);
        tool_span.end();

        assert_eq!(text, "SELECT 1");
        let llm = telemetry.find_span("ChatCompletion").unwrap();
        let tool = telemetry.find_span("LookUpSalesData").unwrap();
        assert_eq!(llm.parent_span_id, tool.span_context.span_id());
        assert_eq!(TestTelemetry::kind_of(&llm).as_deref(), Some("LLM"));
        assert_eq!(
            TestTelemetry::string_attribute(&llm, attributes::LLM_PROVIDER).as_deref(),
            Some("fixed")
        );
    }

    #[tokio::test]
    async fn test_failed_completion_marks_span_error() {
        let telemetry = TestTelemetry::new();
        let ctx = traced_context(&telemetry);
        let model = SalesModel::new(
            Arc::new(FixedModel::queue(vec![Err(Error::transport("503"))])),
            "gpt-4o-mini",
        );

        assert!(model.complete(&ctx, "prompt".into(), None).await.is_err());
        let llm = telemetry.find_span("ChatCompletion").unwrap();
        assert!(matches!(
            llm.status,
            opentelemetry::trace::Status::Error { .. }
        ));
    }
}
