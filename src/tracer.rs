use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use log::{error, info, warn};
use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::trace::{TraceContextExt as _, Tracer as _};
use opentelemetry::Context;
use opentelemetry_sdk::trace::{self as sdktrace, Sampler};

use crate::config::TracingConfig;
use crate::error::Error;
use crate::span::AgentSpan;

/// Name this crate registers under with the tracer provider.
const INSTRUMENTATION_NAME: &str = env!("CARGO_PKG_NAME");

/// Process-facing tracer handle.
///
/// The variant is selected once at construction: active tracers are backed
/// by the installed provider, disabled ones produce spans that record
/// nothing and cost nothing. Callers use the same API either way.
#[derive(Clone)]
pub struct AgentTracer {
    inner: TracerInner,
}

#[derive(Clone)]
enum TracerInner {
    Active(Arc<BoxedTracer>),
    Disabled,
}

impl AgentTracer {
    fn active(tracer: BoxedTracer) -> Self {
        AgentTracer {
            inner: TracerInner::Active(Arc::new(tracer)),
        }
    }

    pub(crate) fn disabled() -> Self {
        AgentTracer {
            inner: TracerInner::Disabled,
        }
    }

    /// Tracer backed by whatever provider is currently installed
    /// process-wide.
    pub(crate) fn from_global() -> Self {
        AgentTracer::active(global::tracer(INSTRUMENTATION_NAME))
    }

    /// Whether spans from this tracer are recorded and delivered.
    pub fn is_enabled(&self) -> bool {
        matches!(self.inner, TracerInner::Active(_))
    }

    /// Start a new root span.
    pub fn start_span(&self, name: impl Into<Cow<'static, str>>) -> AgentSpan {
        self.start_in(name, &Context::new())
    }

    /// Start a span parented on `parent`.
    pub(crate) fn start_with_parent(
        &self,
        name: impl Into<Cow<'static, str>>,
        parent: &AgentSpan,
    ) -> AgentSpan {
        match parent.span_context() {
            Some(parent_cx) => {
                self.start_in(name, &Context::new().with_remote_span_context(parent_cx))
            }
            None => self.start_in(name, &Context::new()),
        }
    }

    fn start_in(&self, name: impl Into<Cow<'static, str>>, cx: &Context) -> AgentSpan {
        match &self.inner {
            TracerInner::Active(tracer) => {
                AgentSpan::active(tracer.start_with_context(name, cx), self.clone())
            }
            TracerInner::Disabled => AgentSpan::disabled(),
        }
    }
}

impl fmt::Debug for AgentTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            TracerInner::Active(_) => f.write_str("AgentTracer(active)"),
            TracerInner::Disabled => f.write_str("AgentTracer(disabled)"),
        }
    }
}

/// Owns the spans buffered for delivery to the collector.
///
/// Closing the handle flushes pending spans and shuts the process-wide
/// provider down. Errors on this path are logged and swallowed: failing
/// telemetry must not keep the process from exiting.
#[derive(Debug)]
pub(crate) struct FlushHandle {
    provider: sdktrace::TracerProvider,
}

impl FlushHandle {
    fn new(provider: sdktrace::TracerProvider) -> Self {
        FlushHandle { provider }
    }

    pub(crate) fn close(self) {
        for result in self.provider.force_flush() {
            if let Err(err) = result {
                warn!("failed to flush spans to the collector: {err}");
            }
        }
        // Release our reference before the global one so the provider can
        // shut its processors down.
        drop(self.provider);
        global::shutdown_tracer_provider();
    }
}

/// Build a tracer for `config` and install it as the process-wide default.
///
/// A disabled configuration yields a disabled tracer: no provider is
/// built, no socket is opened, nothing is installed globally and there is
/// no flush handle. For an enabled configuration the returned handle must
/// be closed at teardown to deliver buffered spans.
pub(crate) fn install(config: &TracingConfig) -> Result<(AgentTracer, Option<FlushHandle>), Error> {
    if !config.is_enabled() {
        return Ok((AgentTracer::disabled(), None));
    }
    if config.service_name().is_empty() {
        return Err(Error::Config("service name must not be empty".into()));
    }

    install_error_bridge();

    let provider = opentelemetry_jaeger::new_agent_pipeline()
        .with_endpoint(config.agent_endpoint().to_string())
        .with_service_name(config.service_name())
        .with_trace_config(sdktrace::config().with_sampler(Sampler::AlwaysOn))
        .build_simple()?;

    info!(
        "tracing enabled for {}, reporting spans to {}",
        config.service_name(),
        config.agent_endpoint()
    );
    Ok(install_provider(provider))
}

/// Install `provider` as the process-wide default and hand back a tracer
/// from it together with its flush handle.
pub(crate) fn install_provider(
    provider: sdktrace::TracerProvider,
) -> (AgentTracer, Option<FlushHandle>) {
    let _previous = global::set_tracer_provider(provider.clone());
    let tracer = AgentTracer::from_global();
    (tracer, Some(FlushHandle::new(provider)))
}

/// Forward error output from the tracing client to the host logger. The
/// informational side of the bridge is the `log` macros used throughout
/// this crate; no formatting or filtering happens here.
fn install_error_bridge() {
    let _ = global::set_error_handler(|err| error!("tracing error: {err}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_builds_a_disabled_tracer() {
        let config = TracingConfig::new("agent");
        let (tracer, flush) = install(&config).unwrap();
        assert!(!tracer.is_enabled());
        assert!(flush.is_none());
    }

    #[test]
    fn empty_service_name_is_rejected() {
        let config = TracingConfig::new("").with_enabled(true);
        let err = install(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn disabled_tracer_produces_disabled_spans() {
        let tracer = AgentTracer::disabled();
        let span = tracer.start_span("noop");
        assert!(!span.is_recording());
        let child = tracer.start_with_parent("child", &span);
        assert!(!child.is_recording());
    }
}
