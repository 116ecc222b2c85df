//! Per-operation context
//!
//! Every trait method takes a Context first. It names the operation being
//! performed so that work done on its behalf can be traced as one unit.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Span;

/// Context carries request-scoped metadata across async boundaries.
/// Cheap to clone.
#[derive(Clone, Debug)]
pub struct Context {
    inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
    type_name: String,
    operation: String,
    started: Instant,
}

impl Context {
    pub fn new() -> Self {
        Self::for_operation("provider", "unspecified")
    }

    /// Context for `operation` (e.g. "create") on `type_name` (e.g. "polaris_table")
    pub fn for_operation(type_name: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                type_name: type_name.into(),
                operation: operation.into(),
                started: Instant::now(),
            }),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    pub fn operation(&self) -> &str {
        &self.inner.operation
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.started.elapsed()
    }

    /// Span to instrument the operation's future with
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "tf_operation",
            resource = %self.inner.type_name,
            operation = %self.inner.operation,
        )
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
