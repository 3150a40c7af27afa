//! # agentrace telemetry
//!
//! Span tree management for agent runs using OpenTelemetry.
//!
//! Spans are tagged with the OpenInference span-kind taxonomy so that
//! LLM-observability backends (Phoenix and friends) can rebuild the call tree
//! of a run: agent run, router decisions, tool dispatch and model sub-calls.
//! The "current parent" of a span is never a process global; each run owns a
//! [`RunContext`] holding one slot per structural role.

mod context;
mod kind;
mod spans;
mod tracer;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::{RunContext, SpanRole};
pub use kind::SpanKind;
pub use spans::{AttributeValue, SpanHandle, SpanStatus, SpanTree};
pub use tracer::{
    Telemetry, TelemetryConfig, TelemetryError, init_telemetry, parse_headers, traces_endpoint,
};

// Re-exported so callers can hold span contexts without depending on opentelemetry
pub use opentelemetry::Context;

/// OpenInference span attribute constants.
pub mod attributes {
    pub const SPAN_KIND: &str = "openinference.span.kind";
    pub const INPUT_VALUE: &str = "input.value";
    pub const OUTPUT_VALUE: &str = "output.value";

    // LLM attributes
    pub const LLM_MODEL_NAME: &str = "llm.model_name";
    pub const LLM_PROVIDER: &str = "llm.provider";
    pub const LLM_SYSTEM: &str = "llm.system";
    pub const LLM_INVOCATION_PARAMETERS: &str = "llm.invocation_parameters";
    pub const LLM_TOKEN_COUNT_PROMPT: &str = "llm.token_count.prompt";
    pub const LLM_TOKEN_COUNT_COMPLETION: &str = "llm.token_count.completion";
    pub const LLM_TOKEN_COUNT_TOTAL: &str = "llm.token_count.total";

    // Tool attributes
    pub const TOOL_NAME: &str = "tool.name";
    pub const TOOL_CALL_ID: &str = "tool_call.id";

    // Agent loop attributes
    pub const AGENT_RUN_ID: &str = "agentrace.run_id";
    pub const ROUTER_ITERATION: &str = "agentrace.iteration";

    // Resource attributes
    pub const PROJECT_NAME: &str = "openinference.project.name";

    pub const SYSTEM_NAME: &str = "agentrace";
}
