//! Tracing session lifecycle for long-running agent processes.
//!
//! This crate is the integration layer between an agent process and its
//! tracing backend: it constructs a tracer, opens a single root span for
//! the whole process, threads the active span through operation contexts,
//! starts subsystem-tagged child spans at operation boundaries, and tears
//! the session down exactly once, flushing buffered spans to a local
//! Jaeger agent. Transport, wire format and sampling are the
//! `opentelemetry-jaeger` exporter's business, not ours.
//!
//! The agent may start before name resolution works, so spans are
//! reported to a fixed socket address ([`DEFAULT_AGENT_ENDPOINT`]); no
//! host name is ever resolved on the boot path.
//!
//! ## Quickstart
//!
//! ```no_run
//! use agent_tracing::{trace, TracingConfig, TracingSession};
//!
//! fn main() -> Result<(), agent_tracing::Error> {
//!     let config = TracingConfig::new("agent").with_enabled(true);
//!     let (session, _root, ctx) = TracingSession::start(config, "boot")?;
//!
//!     // At each operation boundary:
//!     let (span, _op_ctx) = trace(&ctx, "scheduler", "tick");
//!     span.set_tag("interval-ms", 500_i64);
//!     drop(span); // the span finishes when the guard leaves scope
//!
//!     // Once, at process shutdown:
//!     session.stop(Some(&ctx));
//!     Ok(())
//! }
//! ```
//!
//! When tracing is disabled every operation stays callable and returns
//! usable values; spans simply record nothing and teardown touches no
//! network.

mod config;
mod context;
mod error;
mod operation;
mod session;
mod span;
mod tracer;

pub use config::{TracingConfig, DEFAULT_AGENT_ENDPOINT};
pub use context::OperationContext;
pub use error::Error;
pub use operation::{trace, ScopedSpan};
pub use session::TracingSession;
pub use span::AgentSpan;
pub use tracer::AgentTracer;
