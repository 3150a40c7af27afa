use agentrace_telemetry::{RunContext, SpanTree};
use tokio_util::sync::CancellationToken;

/// What a tool can see of the run that invoked it
pub trait ToolContext: Send + Sync {
    fn tool_call_id(&self) -> &str;

    fn run_id(&self) -> &str {
        self.run_context().run_id()
    }

    /// Span slots of the invoking run, for parenting sub-call spans
    fn run_context(&self) -> &RunContext;

    fn spans(&self) -> &SpanTree;

    fn cancellation(&self) -> &CancellationToken;
}

/// Default implementation of ToolContext
#[derive(Debug, Clone)]
pub struct DefaultToolContext {
    tool_call_id: String,
    run: RunContext,
    spans: SpanTree,
    cancellation: CancellationToken,
}

impl DefaultToolContext {
    pub fn new(
        tool_call_id: impl Into<String>,
        run: RunContext,
        spans: SpanTree,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            run,
            spans,
            cancellation,
        }
    }

    /// Context outside of any run, for calling a tool directly
    pub fn standalone(tool_call_id: impl Into<String>) -> Self {
        Self::new(
            tool_call_id,
            RunContext::new("standalone"),
            SpanTree::detached(),
            CancellationToken::new(),
        )
    }
}

impl ToolContext for DefaultToolContext {
    fn tool_call_id(&self) -> &str {
        &self.tool_call_id
    }

    fn run_context(&self) -> &RunContext {
        &self.run
    }

    fn spans(&self) -> &SpanTree {
        &self.spans
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}
