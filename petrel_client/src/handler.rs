//! Message handler trait and registry

use async_trait::async_trait;
use petrel_network::ProtocolMessage;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Message handler trait
///
/// Handlers run on the connector's read loop; long-running work should be
/// spawned onto its own task so it does not stall incoming traffic.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Message type this handler consumes
    fn msg_type(&self) -> u16;

    /// Handle a message
    async fn handle(&self, message: ProtocolMessage);
}

/// Handler registry
///
/// Frozen once the connector starts; messages without a registered handler
/// are dropped with a debug log.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<u16, Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for its message type, replacing any previous one
    pub fn register(&mut self, handler: Arc<dyn MessageHandler>) {
        let msg_type = handler.msg_type();
        if self.handlers.insert(msg_type, handler).is_some() {
            tracing::warn!(msg_type, "Replacing previously registered handler");
        }
    }

    /// Dispatch a message to its handler, if any
    pub async fn dispatch(&self, message: ProtocolMessage) {
        match self.handlers.get(&message.msg_type) {
            Some(handler) => handler.handle(message).await,
            None => {
                debug!(msg_type = message.msg_type, "No handler registered, dropping message");
            }
        }
    }

    /// Check if a handler exists for a message type
    pub fn has_handler(&self, msg_type: u16) -> bool {
        self.handlers.contains_key(&msg_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingHandler {
        msg_type: u16,
        count: Arc<AtomicU32>,
    }

    #[async_trait]
    impl MessageHandler for CountingHandler {
        fn msg_type(&self) -> u16 {
            self.msg_type
        }

        async fn handle(&self, _message: ProtocolMessage) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_dispatch_to_registered_handler() {
        let count = Arc::new(AtomicU32::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(CountingHandler {
            msg_type: 42,
            count: count.clone(),
        }));

        assert!(registry.has_handler(42));
        registry
            .dispatch(ProtocolMessage::new(42, 1, Bytes::from("x")))
            .await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unregistered_type_is_dropped() {
        let registry = HandlerRegistry::new();
        assert!(!registry.has_handler(1));
        // Must not panic
        registry
            .dispatch(ProtocolMessage::empty(1, 1))
            .await;
    }
}
