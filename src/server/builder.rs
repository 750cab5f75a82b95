//! Simplified gateway builder for common use cases
//!
//! Provides a high-level API for building Petrel gateways with minimal
//! boilerplate.

use crate::Result;
use petrel_config::ServerConfig;
use petrel_network::{
    AuthProcessor, Authenticator, Gateway, HeartbeatProcessor, MessageProcessor,
    ProcessorRegistry, ProcessorRegistryBuilder,
};
use std::sync::Arc;
use tracing::info;

/// Simplified gateway builder
///
/// Provides a fluent API for building gateways with sensible defaults.
/// The built-in heartbeat processor is always installed; setting an
/// authenticator installs the built-in authentication processor.
///
/// # Example
///
/// ```rust,no_run,ignore
/// use petrel::Server;
///
/// #[tokio::main]
/// async fn main() -> petrel::Result<()> {
///     Server::bind("127.0.0.1:8520")
///         .authenticator(my_authenticator)
///         .processor(my_processor)
///         .run()
///         .await
/// }
/// ```
pub struct ServerBuilder {
    /// Gateway configuration
    config: ServerConfig,
    /// Accumulated message processors
    registry: ProcessorRegistryBuilder,
    /// Credential validator for the authentication handshake
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl ServerBuilder {
    /// Create a new gateway builder with default configuration
    pub fn new() -> Self {
        // Built-in heartbeat goes first so user processors of the same
        // message type take precedence
        let registry = ProcessorRegistry::builder().register(Arc::new(HeartbeatProcessor::new()));
        Self {
            config: ServerConfig::default(),
            registry,
            authenticator: None,
        }
    }

    /// Bind to a specific address
    ///
    /// # Arguments
    ///
    /// * `addr` - Address to bind to (e.g., "127.0.0.1:8520" or "0.0.0.0:9000")
    pub fn bind(addr: impl Into<String>) -> Self {
        let addr_str = addr.into();
        let (bind_address, port) = parse_addr(&addr_str);

        let mut builder = Self::new();
        builder.config.bind_address = bind_address;
        builder.config.port = port;
        builder
    }

    /// Set custom gateway configuration
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a message processor
    ///
    /// # Example
    ///
    /// ```rust,no_run,ignore
    /// Server::bind("127.0.0.1:8520")
    ///     .processor(Arc::new(ChatProcessor::new()))
    ///     .run()
    ///     .await?;
    /// ```
    pub fn processor(mut self, processor: Arc<dyn MessageProcessor>) -> Self {
        self.registry = self.registry.register(processor);
        self
    }

    /// Set the credential validator for the authentication handshake
    ///
    /// Without an authenticator the gateway has no registered handshake
    /// processor and every connection stays gated.
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Build and run the gateway
    ///
    /// This method consumes the builder, binds the listener and serves
    /// until a fatal accept error occurs.
    pub async fn run(self) -> Result<()> {
        let mut registry = self.registry;
        if let Some(authenticator) = self.authenticator {
            registry = registry.register(Arc::new(AuthProcessor::new(authenticator)));
        }

        info!(addr = %self.config.bind_addr(), "Petrel 网关启动中");

        let gateway = Gateway::bind(self.config, registry.build()).await?;
        gateway.run().await?;
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Type alias for convenience
pub type Server = ServerBuilder;

/// Parse address string into (host, port) tuple
fn parse_addr(addr: &str) -> (String, u16) {
    if let Some((host, port)) = addr.rsplit_once(':') {
        let port = port.parse().unwrap_or(8520);
        (host.to_string(), port)
    } else {
        (addr.to_string(), 8520)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addr() {
        assert_eq!(
            parse_addr("127.0.0.1:9000"),
            ("127.0.0.1".to_string(), 9000)
        );
        assert_eq!(parse_addr("0.0.0.0"), ("0.0.0.0".to_string(), 8520));
        assert_eq!(
            parse_addr("127.0.0.1:bogus"),
            ("127.0.0.1".to_string(), 8520)
        );
    }

    #[test]
    fn test_bind_sets_config() {
        let builder = ServerBuilder::bind("0.0.0.0:9100");
        assert_eq!(builder.config.bind_address, "0.0.0.0");
        assert_eq!(builder.config.port, 9100);
    }
}
