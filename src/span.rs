use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use opentelemetry::global::BoxedSpan;
use opentelemetry::trace::{Span as _, SpanContext};
use opentelemetry::{Key, KeyValue, Value};

use crate::tracer::AgentTracer;

/// Handle to a single traced operation.
///
/// Cloning is cheap and clones share the underlying span: the handle
/// returned to a caller and the one bound into an
/// [`OperationContext`](crate::OperationContext) refer to the same span.
///
/// Tag keys are unique and the last write wins. Tags are applied to the
/// underlying span when it finishes; spans are only delivered once ended,
/// so the effect is the same as writing them through immediately.
#[derive(Clone)]
pub struct AgentSpan {
    inner: SpanInner,
    tracer: AgentTracer,
}

#[derive(Clone)]
enum SpanInner {
    Active(Arc<Mutex<RecordingSpan>>),
    Disabled,
}

struct RecordingSpan {
    span: BoxedSpan,
    tags: HashMap<Key, Value>,
    finished: bool,
}

impl RecordingSpan {
    fn end(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        for (key, value) in self.tags.drain() {
            self.span.set_attribute(KeyValue::new(key, value));
        }
        self.span.end();
    }
}

impl Drop for RecordingSpan {
    // Losing the last handle releases the span as if finish() had been
    // called.
    fn drop(&mut self) {
        self.end();
    }
}

impl AgentSpan {
    pub(crate) fn active(span: BoxedSpan, tracer: AgentTracer) -> Self {
        AgentSpan {
            inner: SpanInner::Active(Arc::new(Mutex::new(RecordingSpan {
                span,
                tags: HashMap::new(),
                finished: false,
            }))),
            tracer,
        }
    }

    pub(crate) fn disabled() -> Self {
        AgentSpan {
            inner: SpanInner::Disabled,
            tracer: AgentTracer::disabled(),
        }
    }

    /// Set a tag on the span, returning `&self` so calls chain.
    ///
    /// Values are scalar: strings, numbers or booleans. Writing the same
    /// key again keeps the last value; writes after
    /// [`finish`](Self::finish) are ignored.
    pub fn set_tag(&self, key: impl Into<Key>, value: impl Into<Value>) -> &Self {
        if let SpanInner::Active(rec) = &self.inner {
            let mut rec = rec.lock().unwrap_or_else(PoisonError::into_inner);
            if !rec.finished {
                rec.tags.insert(key.into(), value.into());
            }
        }
        self
    }

    /// Mark the span complete, releasing it for delivery.
    ///
    /// Only the first call ends the underlying span; later calls through
    /// any clone of the handle are no-ops.
    pub fn finish(&self) {
        if let SpanInner::Active(rec) = &self.inner {
            rec.lock().unwrap_or_else(PoisonError::into_inner).end();
        }
    }

    /// The tracer that produced this span, usable to start further spans
    /// without threading a context through.
    pub fn tracer(&self) -> AgentTracer {
        self.tracer.clone()
    }

    /// Whether the span is still collecting tags. Disabled and finished
    /// spans do not record.
    pub fn is_recording(&self) -> bool {
        match &self.inner {
            SpanInner::Active(rec) => !rec.lock().unwrap_or_else(PoisonError::into_inner).finished,
            SpanInner::Disabled => false,
        }
    }

    /// Identity of the underlying span, used to parent children on it.
    pub(crate) fn span_context(&self) -> Option<SpanContext> {
        match &self.inner {
            SpanInner::Active(rec) => Some(
                rec.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .span
                    .span_context()
                    .clone(),
            ),
            SpanInner::Disabled => None,
        }
    }
}

impl fmt::Debug for AgentSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            SpanInner::Active(rec) => {
                let rec = rec.lock().unwrap_or_else(PoisonError::into_inner);
                let cx = rec.span.span_context();
                f.debug_struct("AgentSpan")
                    .field("trace_id", &cx.trace_id())
                    .field("span_id", &cx.span_id())
                    .field("finished", &rec.finished)
                    .finish()
            }
            SpanInner::Disabled => f.write_str("AgentSpan(disabled)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_span_supports_the_full_contract() {
        let span = AgentSpan::disabled();
        span.set_tag("key", "value").set_tag("count", 3_i64);
        assert!(!span.is_recording());
        assert!(span.span_context().is_none());
        span.finish();
        span.finish();
        assert!(!span.tracer().is_enabled());
    }
}
