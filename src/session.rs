use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use log::{debug, info};

use crate::config::TracingConfig;
use crate::context::OperationContext;
use crate::error::Error;
use crate::span::AgentSpan;
use crate::tracer::{self, AgentTracer, FlushHandle};

const SOURCE_TAG: &str = "source";
const SOURCE_VALUE: &str = "agent";
const ROOT_SPAN_TAG: &str = "root-span";

/// A live tracing session owned by the host process.
///
/// [`start`](Self::start) builds and installs the tracer and opens the
/// session's root span; [`stop`](Self::stop) finishes the root span and
/// flushes everything to the collector, exactly once. The session value
/// replaces process-global state: to trace again after stopping, start a
/// new session.
#[derive(Debug)]
pub struct TracingSession {
    tracer: AgentTracer,
    flush: Mutex<Option<FlushHandle>>,
    stopped: AtomicBool,
}

impl TracingSession {
    /// Establish a tracing session and its root span.
    ///
    /// Builds a tracer per `config`, installs it as the process-wide
    /// default, starts the root span named `root_span_name` (tagged
    /// `source=agent` and `root-span=true`) and binds it into the returned
    /// context. The host must retain that context for the life of the
    /// process, so that later operation spans nest under it, and pass it
    /// back to [`stop`](Self::stop) at teardown.
    ///
    /// Fails when the tracer cannot be constructed; no root span exists in
    /// that case. The error is the caller's to act on: tracing failures
    /// must not silently degrade the rest of the boot sequence.
    pub fn start(
        config: TracingConfig,
        root_span_name: impl Into<Cow<'static, str>>,
    ) -> Result<(TracingSession, AgentSpan, OperationContext), Error> {
        let (tracer, flush) = tracer::install(&config)?;
        Ok(Self::with_tracer(tracer, flush, root_span_name))
    }

    pub(crate) fn with_tracer(
        tracer: AgentTracer,
        flush: Option<FlushHandle>,
        root_span_name: impl Into<Cow<'static, str>>,
    ) -> (TracingSession, AgentSpan, OperationContext) {
        let span = tracer.start_span(root_span_name);
        span.set_tag(SOURCE_TAG, SOURCE_VALUE)
            .set_tag(ROOT_SPAN_TAG, "true");
        if span.is_recording() {
            debug!("created root span {span:?}");
        }
        let ctx = OperationContext::root().with_span(&span);
        let session = TracingSession {
            tracer,
            flush: Mutex::new(flush),
            stopped: AtomicBool::new(false),
        };
        (session, span, ctx)
    }

    /// The session's tracer.
    pub fn tracer(&self) -> &AgentTracer {
        &self.tracer
    }

    /// Whether this session records spans.
    pub fn is_enabled(&self) -> bool {
        self.tracer.is_enabled()
    }

    /// End the session, reporting all buffered spans to the collector.
    ///
    /// Finishes the span active in `ctx` (the root span, when given the
    /// context returned by [`start`](Self::start)), then closes the flush
    /// handle. Only the first call has any effect: later calls observe the
    /// stopped flag and return immediately, as do calls with `None`
    /// (teardown during an early boot failure, before any context exists)
    /// and stops of a session that was never enabled. Flush failures are
    /// logged and swallowed; telemetry must not block process exit.
    pub fn stop(&self, ctx: Option<&OperationContext>) {
        let Some(ctx) = ctx else { return };
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(span) = ctx.span() {
            span.finish();
        }
        let handle = self
            .flush
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            info!("stopping tracing, flushing spans to the collector");
            handle.close();
        }
    }
}
