//! In-memory span capture for tests

use crate::attributes::SPAN_KIND;
use crate::spans::SpanTree;
use opentelemetry::Value;
use opentelemetry::trace::SpanId;
pub use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;

/// Tracer provider wired to an in-memory exporter.
///
/// Spans are exported synchronously when they end, so the finished list is
/// complete as soon as the code under test returns.
pub struct TestTelemetry {
    exporter: InMemorySpanExporter,
    provider: TracerProvider,
    spans: SpanTree,
}

impl Default for TestTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTelemetry {
    pub fn new() -> Self {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let spans = SpanTree::from_provider(&provider);
        Self {
            exporter,
            provider,
            spans,
        }
    }

    pub fn spans(&self) -> SpanTree {
        self.spans.clone()
    }

    pub fn provider(&self) -> &TracerProvider {
        &self.provider
    }

    /// All spans ended so far, in end order
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.exporter.get_finished_spans().unwrap_or_default()
    }

    pub fn find_span(&self, name: &str) -> Option<SpanData> {
        self.finished_spans().into_iter().find(|s| s.name == name)
    }

    pub fn spans_named(&self, name: &str) -> Vec<SpanData> {
        self.finished_spans()
            .into_iter()
            .filter(|s| s.name == name)
            .collect()
    }

    pub fn children_of(&self, parent: &SpanData) -> Vec<SpanData> {
        let parent_id = parent.span_context.span_id();
        self.finished_spans()
            .into_iter()
            .filter(|s| s.parent_span_id == parent_id)
            .collect()
    }

    pub fn reset(&self) {
        self.exporter.reset();
    }

    pub fn is_root(span: &SpanData) -> bool {
        span.parent_span_id == SpanId::INVALID
    }

    pub fn attribute(span: &SpanData, key: &str) -> Option<Value> {
        span.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.clone())
    }

    pub fn string_attribute(span: &SpanData, key: &str) -> Option<String> {
        Self::attribute(span, key).map(|v| v.as_str().into_owned())
    }

    /// Exported `openinference.span.kind` of a span
    pub fn kind_of(span: &SpanData) -> Option<String> {
        Self::string_attribute(span, SPAN_KIND)
    }
}
