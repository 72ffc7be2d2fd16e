use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

use log::debug;

use crate::context::OperationContext;
use crate::span::AgentSpan;

/// Tag recording which subsystem produced a span.
const SUBSYSTEM_TAG: &str = "subsystem";

/// Start a span for one distinguishable unit of work.
///
/// The span is named `name`, tagged `subsystem=<subsystem>` and parented
/// on whatever span is active in `ctx`. The returned context carries the
/// new span, so nested operations started from it become its children.
///
/// The span comes back as a [`ScopedSpan`] guard that finishes it when
/// dropped, covering every exit path of the operation including errors.
pub fn trace(
    ctx: &OperationContext,
    subsystem: &str,
    name: impl Into<Cow<'static, str>>,
) -> (ScopedSpan, OperationContext) {
    let (span, cx) = ctx.start_span(name);
    span.set_tag(SUBSYSTEM_TAG, subsystem.to_owned());
    if span.is_recording() {
        debug!("created {subsystem} span {span:?}");
    }
    (ScopedSpan { span }, cx)
}

/// Scope guard owning a per-operation span.
///
/// Dereferences to [`AgentSpan`] for tagging and finishes the span on
/// drop. Call [`into_span`](Self::into_span) to manage the lifetime
/// manually instead.
pub struct ScopedSpan {
    span: AgentSpan,
}

impl ScopedSpan {
    /// Finish the span now rather than at end of scope.
    pub fn finish(self) {
        self.span.finish();
    }

    /// Release the span from the guard without finishing it.
    pub fn into_span(self) -> AgentSpan {
        let span = self.span.clone();
        std::mem::forget(self);
        span
    }
}

impl Deref for ScopedSpan {
    type Target = AgentSpan;

    fn deref(&self) -> &AgentSpan {
        &self.span
    }
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        self.span.finish();
    }
}

impl fmt::Debug for ScopedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.span.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_tags_and_binds_the_new_span() {
        let ctx = OperationContext::root().with_span(&AgentSpan::disabled());
        let (span, op_ctx) = trace(&ctx, "scheduler", "tick");
        span.set_tag("tick", 1_i64);
        assert!(op_ctx.span().is_some());
        assert!(ctx.span().is_some(), "input context keeps its own span");
    }

    #[test]
    fn into_span_defuses_the_guard() {
        let ctx = OperationContext::root().with_span(&AgentSpan::disabled());
        let (guard, _op_ctx) = trace(&ctx, "rpc", "call");
        let span = guard.into_span();
        span.finish();
    }
}
