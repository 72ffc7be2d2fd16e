use std::borrow::Cow;

use opentelemetry::Context;

use crate::span::AgentSpan;
use crate::tracer::AgentTracer;

/// Immutable carrier propagating the active span alongside an operation.
///
/// Contexts are copy-on-write: every method returns a fresh value and the
/// original is never modified, so they can be handed across concurrent
/// operation handlers without locking. Data unrelated to tracing attached
/// via [`with_value`](Self::with_value) is preserved by every propagation
/// call.
#[derive(Clone, Debug, Default)]
pub struct OperationContext {
    inner: Context,
}

impl OperationContext {
    /// A fresh background context with no active span.
    pub fn root() -> Self {
        OperationContext {
            inner: Context::new(),
        }
    }

    /// The span currently active in this context, or `None` when no span
    /// is bound.
    pub fn span(&self) -> Option<AgentSpan> {
        self.inner.get::<AgentSpan>().cloned()
    }

    /// A copy of this context with `span` bound as the active span.
    pub fn with_span(&self, span: &AgentSpan) -> Self {
        OperationContext {
            inner: self.inner.with_value(span.clone()),
        }
    }

    /// Start a span named `name` as a child of the active span.
    ///
    /// With no active span the new span becomes a root, created through
    /// the process-wide default tracer. Returns the span together with a
    /// copy of this context in which it is active.
    pub fn start_span(&self, name: impl Into<Cow<'static, str>>) -> (AgentSpan, OperationContext) {
        let span = match self.span() {
            Some(parent) => parent.tracer().start_with_parent(name, &parent),
            None => AgentTracer::from_global().start_span(name),
        };
        let cx = self.with_span(&span);
        (span, cx)
    }

    /// Attach a value that rides along with the context.
    ///
    /// Values are keyed by type; attaching a second value of the same type
    /// replaces the first.
    pub fn with_value<T: Send + Sync + 'static>(&self, value: T) -> Self {
        OperationContext {
            inner: self.inner.with_value(value),
        }
    }

    /// Look up a value attached via [`with_value`](Self::with_value).
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.inner.get::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_span_is_returned_and_original_context_is_untouched() {
        let base = OperationContext::root();
        assert!(base.span().is_none());

        let span = AgentSpan::disabled();
        let bound = base.with_span(&span);
        assert!(bound.span().is_some());
        assert!(base.span().is_none());
    }

    #[test]
    fn unrelated_values_survive_span_binding() {
        #[derive(Debug, PartialEq)]
        struct RequestId(u64);

        let ctx = OperationContext::root().with_value(RequestId(7));
        let bound = ctx.with_span(&AgentSpan::disabled());
        assert_eq!(bound.get::<RequestId>(), Some(&RequestId(7)));
    }

    #[test]
    fn rebinding_replaces_the_active_span() {
        let first = AgentSpan::disabled();
        let second = AgentSpan::disabled();
        let ctx = OperationContext::root().with_span(&first).with_span(&second);
        assert!(ctx.span().is_some());
    }
}
