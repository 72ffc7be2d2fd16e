//! Lifecycle tests against the public surface, driven the way a host
//! process would. Exporter-observing assertions live in the crate's unit
//! tests, where a recording exporter can be wired in.

use agent_tracing::{
    trace, OperationContext, TracingConfig, TracingSession, DEFAULT_AGENT_ENDPOINT,
};

#[test]
fn disabled_session_supports_the_full_flow() {
    let config = TracingConfig::new("agent"); // tracing off by default
    let (session, root, ctx) = TracingSession::start(config, "boot").expect("setup");
    assert!(!session.is_enabled());

    root.set_tag("source-version", "1.2.3").set_tag("pid", 42_i64);

    let (span, op_ctx) = trace(&ctx, "scheduler", "tick");
    assert!(op_ctx.span().is_some(), "trace must bind a usable span");
    span.set_tag("tick", 1_i64);
    drop(span);

    session.stop(Some(&ctx));
    session.stop(Some(&ctx));
    session.stop(None);
}

#[test]
fn context_propagation_is_copy_on_write() {
    let (_session, root, _ctx) =
        TracingSession::start(TracingConfig::new("agent"), "boot").expect("setup");

    let base = OperationContext::root();
    assert!(base.span().is_none());

    let bound = base.with_span(&root);
    assert!(bound.span().is_some());
    assert!(base.span().is_none(), "original context must be untouched");

    // Values unrelated to tracing survive every propagation call.
    #[derive(Debug, PartialEq)]
    struct Deadline(u64);
    let with_deadline = bound.with_value(Deadline(99));
    let (_span, traced) = trace(&with_deadline, "rpc", "call");
    assert_eq!(traced.get::<Deadline>(), Some(&Deadline(99)));
}

#[test]
fn empty_service_name_is_a_config_error() {
    let config = TracingConfig::new("").with_enabled(true);
    let err = TracingSession::start(config, "boot").expect_err("must fail");
    assert!(matches!(err, agent_tracing::Error::Config(_)));
}

#[test]
fn enabled_session_reports_to_the_local_agent() {
    // UDP delivery needs no listener on the other end; spans that cannot
    // be delivered are dropped by the exporter and logged.
    let config = TracingConfig::new("agent")
        .with_enabled(true)
        .with_agent_endpoint(DEFAULT_AGENT_ENDPOINT);
    let (session, root, ctx) = TracingSession::start(config, "boot").expect("setup");
    assert!(session.is_enabled());
    assert!(root.is_recording());

    let (span, _op_ctx) = trace(&ctx, "rpc", "handle");
    span.finish();

    session.stop(Some(&ctx));
    assert!(!root.is_recording());
    session.stop(Some(&ctx));
}
