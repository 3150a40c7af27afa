//! Per-run parent tracking

use dashmap::DashMap;
use opentelemetry::Context;
use std::sync::Arc;

/// Structural role of a span within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanRole {
    Run,
    LastRouter,
    HandleTools,
    LastTool,
}

/// Per-run handle threading "the current parent span" through call sites
/// that do not share a control-flow scope.
///
/// Each role slot holds the context of the most recently opened span of that
/// role. A `RunContext` belongs to exactly one run; cloning it shares the
/// slots of that run.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: String,
    slots: Arc<DashMap<SpanRole, Context>>,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            slots: Arc::new(DashMap::new()),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Record the context of a span that was just opened in `role`
    pub fn record(&self, role: SpanRole, cx: &Context) {
        self.slots.insert(role, cx.clone());
    }

    pub fn slot(&self, role: SpanRole) -> Option<Context> {
        self.slots.get(&role).map(|entry| entry.value().clone())
    }

    /// First filled slot among `roles`, in the given order
    pub fn nearest(&self, roles: &[SpanRole]) -> Option<Context> {
        roles.iter().find_map(|role| self.slot(*role))
    }

    pub fn clear(&self) {
        self.slots.clear();
    }
}
