use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default Jaeger agent endpoint, `127.0.0.1:6831`.
///
/// The agent process can run before name resolution is available, so the
/// reporter destination is a fixed socket address and is never looked up
/// by name.
pub const DEFAULT_AGENT_ENDPOINT: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 6831);

/// Static configuration for a tracing session.
///
/// ```
/// use agent_tracing::TracingConfig;
///
/// let config = TracingConfig::new("agent").with_enabled(true);
/// assert!(config.is_enabled());
/// ```
#[derive(Clone, Debug)]
pub struct TracingConfig {
    service_name: String,
    enabled: bool,
    agent_endpoint: SocketAddr,
}

impl TracingConfig {
    /// Configuration for the given service identity. Tracing starts out
    /// disabled; the host process enables it from its own configuration
    /// via [`with_enabled`](Self::with_enabled).
    pub fn new(service_name: impl Into<String>) -> Self {
        TracingConfig {
            service_name: service_name.into(),
            enabled: false,
            agent_endpoint: DEFAULT_AGENT_ENDPOINT,
        }
    }

    /// Turn span recording and delivery on or off.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Report spans to a different agent endpoint.
    ///
    /// Only a socket address is accepted; resolving host names is
    /// forbidden this early in the process lifetime.
    pub fn with_agent_endpoint(mut self, endpoint: SocketAddr) -> Self {
        self.agent_endpoint = endpoint;
        self
    }

    /// The service identity spans are reported under.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Whether spans are recorded and delivered.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The agent endpoint spans are delivered to.
    pub fn agent_endpoint(&self) -> SocketAddr {
        self.agent_endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_is_off_by_default() {
        let config = TracingConfig::new("agent");
        assert!(!config.is_enabled());
        assert_eq!(config.agent_endpoint(), DEFAULT_AGENT_ENDPOINT);
        assert_eq!(config.service_name(), "agent");
    }

    #[test]
    fn builder_overrides_apply() {
        let endpoint = "127.0.0.1:16831".parse().unwrap();
        let config = TracingConfig::new("agent")
            .with_enabled(true)
            .with_agent_endpoint(endpoint);
        assert!(config.is_enabled());
        assert_eq!(config.agent_endpoint(), endpoint);
    }
}
