//! High-level client API
//!
//! Provides a simplified client interface for common use cases.

use crate::{Error, Result};
use bytes::Bytes;
use petrel_client::{ClientConfig, ClientEvent, Connector, MessageHandler};
use std::sync::Arc;

/// High-level gateway client
///
/// A thin wrapper around [`petrel_client::Connector`] that connects,
/// completes the authentication handshake and only then returns.
///
/// # Example
///
/// ```rust,no_run,ignore
/// use petrel::Client;
///
/// #[tokio::main]
/// async fn main() -> petrel::Result<()> {
///     let mut client = Client::connect("127.0.0.1:8520", "my-token").await?;
///
///     client.send(100, "hello".into()).await?;
///
///     client.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct Client {
    inner: Connector,
}

impl Client {
    /// Connect and authenticate with default settings
    ///
    /// # Arguments
    ///
    /// * `addr` - Gateway address (e.g., "127.0.0.1:8520")
    /// * `token` - Credential payload for the handshake
    pub async fn connect(addr: impl Into<String>, token: impl Into<Bytes>) -> Result<Self> {
        let config = ClientConfig::new(addr).with_auth_token(token);
        Self::connect_with_config(config, Vec::new()).await
    }

    /// Connect with custom configuration and message handlers
    ///
    /// Handlers must be supplied here because the connector freezes its
    /// registry once started.
    pub async fn connect_with_config(
        config: ClientConfig,
        handlers: Vec<Arc<dyn MessageHandler>>,
    ) -> Result<Self> {
        let mut inner = Connector::new(config);
        for handler in handlers {
            inner.register_handler(handler)?;
        }

        let mut events = inner.subscribe_events();
        inner.start()?;

        // Block until the first handshake settles
        loop {
            match events.recv().await {
                Ok(ClientEvent::Authenticated) => return Ok(Self { inner }),
                Ok(ClientEvent::Error { error }) => return Err(Error::Custom(error)),
                Ok(_) => continue,
                Err(_) => {
                    return Err(Error::Custom("Connector stopped unexpectedly".to_string()))
                }
            }
        }
    }

    /// Send a message
    pub async fn send(&self, msg_type: u16, payload: Bytes) -> Result<()> {
        self.inner.send(msg_type, payload).await.map_err(Error::from)
    }

    /// Subscribe to lifecycle events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ClientEvent> {
        self.inner.subscribe_events()
    }

    /// Check if an authenticated connection is currently active
    pub async fn is_connected(&self) -> bool {
        self.inner.is_connected().await
    }

    /// Stop the client and drop the connection
    pub async fn shutdown(&mut self) {
        self.inner.shutdown().await;
    }

    /// Get the inner connector for advanced use cases
    pub fn inner(&self) -> &Connector {
        &self.inner
    }

    /// Get a mutable reference to the inner connector
    pub fn inner_mut(&mut self) -> &mut Connector {
        &mut self.inner
    }

    /// Consume and return the inner connector
    pub fn into_inner(self) -> Connector {
        self.inner
    }
}
