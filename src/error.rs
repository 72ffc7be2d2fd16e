use opentelemetry::trace::TraceError;
use thiserror::Error;

/// Errors surfaced while establishing a tracing session.
///
/// Construction failures are fatal to setup and returned to the host
/// process, which decides whether to abort boot or continue untraced.
/// Teardown failures never appear here; they are logged and swallowed on
/// the shutdown path.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The tracing configuration is unusable.
    #[error("invalid tracing configuration: {0}")]
    Config(String),

    /// The exporter pipeline could not be established.
    #[error(transparent)]
    Install(#[from] TraceError),
}
