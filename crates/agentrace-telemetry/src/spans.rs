//! Span creation and annotation for agent runs

use crate::attributes::*;
use crate::kind::SpanKind;
use opentelemetry::trace::{
    FutureExt as _, SpanKind as OtelSpanKind, Status, TraceContextExt, Tracer as _,
    TracerProvider as _, WithContext,
};
use opentelemetry::{Array, Context, KeyValue, StringValue, Value};
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use std::future::Future;

/// The only value types a span attribute may carry
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    StringList(Vec<String>),
    Bool(bool),
    Int(i64),
}

impl AttributeValue {
    /// Map a JSON value onto a supported attribute type.
    ///
    /// Only strings, booleans, integers and arrays made entirely of strings
    /// are accepted. Floats, objects, nulls and mixed arrays return `None`
    /// rather than being coerced to text.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n.as_i64().map(Self::Int),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Self::StringList),
            _ => None,
        }
    }

    fn into_otel(self) -> Value {
        match self {
            AttributeValue::String(s) => Value::String(s.into()),
            AttributeValue::StringList(items) => Value::Array(Array::String(
                items.into_iter().map(StringValue::from).collect(),
            )),
            AttributeValue::Bool(b) => Value::Bool(b),
            AttributeValue::Int(i) => Value::I64(i),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        Self::StringList(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for AttributeValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// Final outcome recorded on a span
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanStatus {
    Unset,
    Ok,
    Error(String),
}

impl SpanStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, SpanStatus::Error(_))
    }
}

/// Creates spans tagged with a [`SpanKind`] under explicit parents
#[derive(Clone)]
pub struct SpanTree {
    tracer: Tracer,
    // Keeps the provider alive for as long as spans can be started
    _provider: TracerProvider,
}

impl std::fmt::Debug for SpanTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanTree").finish_non_exhaustive()
    }
}

impl SpanTree {
    pub fn from_provider(provider: &TracerProvider) -> Self {
        Self {
            tracer: provider.tracer(SYSTEM_NAME),
            _provider: provider.clone(),
        }
    }

    /// A span tree whose spans are recorded but never exported
    pub fn detached() -> Self {
        Self::from_provider(&TracerProvider::builder().build())
    }

    /// Open a span as a child of `parent`, or as a new root when `parent`
    /// is `None`.
    pub fn start(
        &self,
        name: impl Into<String>,
        kind: SpanKind,
        parent: Option<&Context>,
    ) -> SpanHandle {
        let name = name.into();
        let parent_cx = parent.cloned().unwrap_or_else(Context::new);

        let span = self
            .tracer
            .span_builder(name.clone())
            .with_kind(OtelSpanKind::Internal)
            .with_attributes(vec![KeyValue::new(SPAN_KIND, kind.as_attribute())])
            .start_with_context(&self.tracer, &parent_cx);

        let cx = parent_cx.with_span(span);
        tracing::trace!(span = %name, kind = %kind, "Span opened");

        SpanHandle {
            cx,
            name,
            kind,
            status: SpanStatus::Unset,
            ended: false,
        }
    }

    /// Open an LLM-kind `ChatCompletion` span for one model call
    pub fn start_llm_span(
        &self,
        provider: &str,
        model: &str,
        parent: Option<&Context>,
    ) -> SpanHandle {
        let mut span = self.start("ChatCompletion", SpanKind::Llm, parent);
        span.set_attribute(LLM_PROVIDER, provider);
        span.set_attribute(LLM_SYSTEM, provider);
        span.set_model(model);
        span
    }
}

/// Annotate-and-end handle for one open span.
///
/// Dropping a handle that was never ended closes the span, marking it as an
/// error when no status had been recorded.
#[derive(Debug)]
pub struct SpanHandle {
    cx: Context,
    name: String,
    kind: SpanKind,
    status: SpanStatus,
    ended: bool,
}

impl SpanHandle {
    /// Context carrying this span, for use as a parent
    pub fn context(&self) -> &Context {
        &self.cx
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    pub fn status(&self) -> &SpanStatus {
        &self.status
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Poll `fut` with this span as the active OpenTelemetry context.
    /// `tracing` spans opened inside it are exported as children of this
    /// span when the OpenTelemetry subscriber layer is installed.
    pub fn in_scope<F: Future>(&self, fut: F) -> WithContext<F> {
        fut.with_context(self.cx.clone())
    }

    /// Hex span id as exported
    pub fn span_id(&self) -> String {
        format!("{:016x}", self.cx.span().span_context().span_id())
    }

    pub fn set_attribute(&mut self, key: &'static str, value: impl Into<AttributeValue>) {
        if self.ended {
            tracing::warn!(span = %self.name, key, "Ignoring attribute on ended span");
            return;
        }
        self.cx
            .span()
            .set_attribute(KeyValue::new(key, value.into().into_otel()));
    }

    pub fn set_input(&mut self, input: impl Into<AttributeValue>) {
        self.set_attribute(INPUT_VALUE, input);
    }

    pub fn set_output(&mut self, output: impl Into<AttributeValue>) {
        self.set_attribute(OUTPUT_VALUE, output);
    }

    pub fn set_model(&mut self, model: &str) {
        self.set_attribute(LLM_MODEL_NAME, model);
    }

    pub fn set_token_counts(&mut self, prompt: u32, completion: u32, total: u32) {
        self.set_attribute(LLM_TOKEN_COUNT_PROMPT, prompt);
        self.set_attribute(LLM_TOKEN_COUNT_COMPLETION, completion);
        self.set_attribute(LLM_TOKEN_COUNT_TOTAL, total);
    }

    /// Record each JSON field whose value maps onto a supported attribute
    /// type. Unsupported values are logged and skipped.
    pub fn set_json_attributes(&mut self, fields: &serde_json::Map<String, serde_json::Value>) {
        if self.ended {
            tracing::warn!(span = %self.name, "Ignoring attributes on ended span");
            return;
        }
        for (key, value) in fields {
            match AttributeValue::from_json(value) {
                Some(attr) => self
                    .cx
                    .span()
                    .set_attribute(KeyValue::new(key.clone(), attr.into_otel())),
                None => tracing::warn!(
                    span = %self.name,
                    key = %key,
                    "Skipping attribute with unsupported value type"
                ),
            }
        }
    }

    /// Record the span's final status. Error messages are prefixed with the
    /// span id so they can be matched against exported traces.
    pub fn set_status(&mut self, status: SpanStatus) {
        if self.ended {
            tracing::warn!(span = %self.name, "Ignoring status on ended span");
            return;
        }
        let otel_status = match &status {
            SpanStatus::Unset => Status::Unset,
            SpanStatus::Ok => Status::Ok,
            SpanStatus::Error(message) => Status::error(format!(
                "Span ID: '{}'. Status: {}",
                self.span_id(),
                message
            )),
        };
        self.cx.span().set_status(otel_status);
        self.status = status;
    }

    /// Record output and mark the span ok
    pub fn succeed(&mut self, output: impl Into<AttributeValue>) {
        self.set_output(output);
        self.set_status(SpanStatus::Ok);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.set_status(SpanStatus::Error(message.into()));
    }

    /// Close the span. A span is ended exactly once.
    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.cx.span().end();
        tracing::trace!(span = %self.name, "Span closed");
    }
}

impl Drop for SpanHandle {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        if self.status == SpanStatus::Unset {
            self.fail("dropped before completion");
        }
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestTelemetry;
    use serde_json::json;

    #[test]
    fn test_from_json_rejects_unsupported_types() {
        assert_eq!(
            AttributeValue::from_json(&json!("x")),
            Some(AttributeValue::String("x".into()))
        );
        assert_eq!(
            AttributeValue::from_json(&json!(3)),
            Some(AttributeValue::Int(3))
        );
        assert_eq!(
            AttributeValue::from_json(&json!(["a", "b"])),
            Some(AttributeValue::StringList(vec!["a".into(), "b".into()]))
        );
        assert_eq!(AttributeValue::from_json(&json!(1.5)), None);
        assert_eq!(AttributeValue::from_json(&json!({"a": 1})), None);
        assert_eq!(AttributeValue::from_json(&json!(["a", 1])), None);
        assert_eq!(AttributeValue::from_json(&json!(null)), None);
    }

    #[test]
    fn test_child_span_is_parented() {
        let telemetry = TestTelemetry::new();
        let spans = telemetry.spans();

        let mut root = spans.start("AgentRun", SpanKind::Agent, None);
        let mut child = spans.start("RouterCall", SpanKind::Chain, Some(root.context()));
        child.succeed("done");
        child.end();
        root.set_status(SpanStatus::Ok);
        root.end();

        let finished = telemetry.finished_spans();
        assert_eq!(finished.len(), 2);

        let router = telemetry.find_span("RouterCall").unwrap();
        let run = telemetry.find_span("AgentRun").unwrap();
        assert_eq!(router.parent_span_id, run.span_context.span_id());
        assert!(TestTelemetry::is_root(&run));
        assert_eq!(TestTelemetry::kind_of(&router).as_deref(), Some("CHAIN"));
        assert_eq!(TestTelemetry::kind_of(&run).as_deref(), Some("AGENT"));
        assert_eq!(
            TestTelemetry::string_attribute(&router, OUTPUT_VALUE).as_deref(),
            Some("done")
        );
    }

    #[test]
    fn test_attributes_after_end_are_ignored() {
        let telemetry = TestTelemetry::new();
        let mut span = telemetry.spans().start("ChatCompletion", SpanKind::Llm, None);
        span.finish();
        span.set_input("late");
        span.fail("late");

        assert_eq!(span.status(), &SpanStatus::Unset);
        let exported = telemetry.find_span("ChatCompletion").unwrap();
        assert!(TestTelemetry::attribute(&exported, INPUT_VALUE).is_none());
        drop(span);
        assert_eq!(telemetry.finished_spans().len(), 1);
    }

    #[test]
    fn test_dropped_span_closes_with_error() {
        let telemetry = TestTelemetry::new();
        {
            let _span = telemetry.spans().start("HandleToolCalls", SpanKind::Chain, None);
        }

        let span = telemetry.find_span("HandleToolCalls").unwrap();
        match &span.status {
            Status::Error { description } => {
                assert!(description.contains("dropped before completion"));
                assert!(description.starts_with("Span ID: '"));
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_json_attributes_skip_unsupported() {
        let telemetry = TestTelemetry::new();
        let mut span = telemetry.spans().start("Tool", SpanKind::Tool, None);
        let fields = json!({"rows": 3, "ratio": 0.5, "cols": ["store", "sales"]});
        span.set_json_attributes(fields.as_object().unwrap());
        span.set_status(SpanStatus::Ok);
        span.end();

        let exported = telemetry.find_span("Tool").unwrap();
        assert!(TestTelemetry::attribute(&exported, "rows").is_some());
        assert!(TestTelemetry::attribute(&exported, "cols").is_some());
        assert!(TestTelemetry::attribute(&exported, "ratio").is_none());
    }

    #[test]
    fn test_llm_span_tags() {
        let telemetry = TestTelemetry::new();
        let mut span = telemetry
            .spans()
            .start_llm_span("openai", "gpt-4o-mini", None);
        span.set_token_counts(10, 5, 15);
        span.set_status(SpanStatus::Ok);
        span.end();

        let exported = telemetry.find_span("ChatCompletion").unwrap();
        assert_eq!(TestTelemetry::kind_of(&exported).as_deref(), Some("LLM"));
        assert_eq!(
            TestTelemetry::string_attribute(&exported, LLM_MODEL_NAME).as_deref(),
            Some("gpt-4o-mini")
        );
        assert_eq!(
            TestTelemetry::attribute(&exported, LLM_TOKEN_COUNT_TOTAL),
            Some(Value::I64(15))
        );
    }

    #[tokio::test]
    async fn test_tracing_spans_nest_under_scoped_span() {
        use opentelemetry::trace::TracerProvider as _;
        use tracing_subscriber::layer::SubscriberExt;

        let telemetry = TestTelemetry::new();
        let subscriber = tracing_subscriber::registry().with(
            tracing_opentelemetry::layer().with_tracer(telemetry.provider().tracer("bridge")),
        );
        let _guard = tracing::subscriber::set_default(subscriber);

        let tool = telemetry.spans().start("LookUpSalesData", SpanKind::Tool, None);
        tool.in_scope(async {
            tracing::info_span!("sales_store.query").in_scope(|| {});
        })
        .await;
        tool.end();

        let tool = telemetry.find_span("LookUpSalesData").unwrap();
        let query = telemetry.find_span("sales_store.query").unwrap();
        assert_eq!(query.parent_span_id, tool.span_context.span_id());
        assert_eq!(query.span_context.trace_id(), tool.span_context.trace_id());
    }
}
