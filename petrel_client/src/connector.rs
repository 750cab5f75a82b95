//! Gateway connector with automatic reconnection
//!
//! The connector owns a supervisor task that drives one connection at a
//! time: connect, authenticate, pump messages, and on any transport failure
//! retry with a fixed delay until the attempt budget is exhausted.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::event::ClientEvent;
use crate::handler::{HandlerRegistry, MessageHandler};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use petrel_network::{auth_result, msg_type, MessageCodec, ProtocolMessage};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, timeout, Instant};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

/// Consecutive-failure counter behind the reconnect policy
///
/// A successful handshake resets the counter, so the attempt budget always
/// applies to an unbroken run of failures.
#[derive(Debug)]
struct ReconnectState {
    attempts: u32,
    max: u32,
}

impl ReconnectState {
    fn new(max: u32) -> Self {
        Self { attempts: 0, max }
    }

    /// Record one failed attempt; returns true when the budget is exhausted
    fn record_failure(&mut self) -> bool {
        self.attempts += 1;
        self.attempts > self.max
    }

    fn reset(&mut self) {
        self.attempts = 0;
    }
}

/// Gateway connector
///
/// ```rust,no_run,ignore
/// use petrel_client::{ClientConfig, Connector};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ClientConfig::new("127.0.0.1:8520").with_auth_token("token");
///     let mut connector = Connector::new(config);
///     connector.start()?;
///
///     connector.send(100, "hello".into()).await?;
///     connector.join().await?;
///     Ok(())
/// }
/// ```
pub struct Connector {
    config: ClientConfig,
    handlers: Arc<HandlerRegistry>,
    event_tx: broadcast::Sender<ClientEvent>,
    /// Sender into the active connection's write task; None while disconnected
    outbound: Arc<RwLock<Option<mpsc::Sender<ProtocolMessage>>>>,
    sequence: Arc<AtomicU32>,
    supervisor: Option<JoinHandle<Result<()>>>,
}

impl Connector {
    /// Create a connector (not yet connected)
    pub fn new(config: ClientConfig) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            config,
            handlers: Arc::new(HandlerRegistry::new()),
            event_tx,
            outbound: Arc::new(RwLock::new(None)),
            sequence: Arc::new(AtomicU32::new(0)),
            supervisor: None,
        }
    }

    /// Register a message handler; only allowed before `start`
    pub fn register_handler(&mut self, handler: Arc<dyn MessageHandler>) -> Result<()> {
        match Arc::get_mut(&mut self.handlers) {
            Some(registry) => {
                registry.register(handler);
                Ok(())
            }
            None => Err(ClientError::InvalidConfig(
                "Handlers must be registered before start".to_string(),
            )),
        }
    }

    /// Start the supervisor task
    pub fn start(&mut self) -> Result<()> {
        if self.supervisor.is_some() {
            return Err(ClientError::InvalidConfig(
                "Connector already started".to_string(),
            ));
        }
        self.config.validate()?;

        let handle = tokio::spawn(Self::supervise(
            self.config.clone(),
            self.handlers.clone(),
            self.event_tx.clone(),
            self.outbound.clone(),
            self.sequence.clone(),
        ));
        self.supervisor = Some(handle);
        Ok(())
    }

    /// Send a message on the active connection
    pub async fn send(&self, message_type: u16, payload: Bytes) -> Result<()> {
        let guard = self.outbound.read().await;
        let tx = guard.as_ref().ok_or(ClientError::NotConnected)?;

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        tx.send(ProtocolMessage::new(message_type, seq, payload))
            .await
            .map_err(|e| ClientError::SendFailed(e.to_string()))?;

        let _ = self.event_tx.send(ClientEvent::MessageSent {
            msg_type: message_type,
        });
        Ok(())
    }

    /// Subscribe to lifecycle events
    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.event_tx.subscribe()
    }

    /// Whether an authenticated connection is currently active
    pub async fn is_connected(&self) -> bool {
        self.outbound.read().await.is_some()
    }

    /// Wait for the supervisor to finish
    ///
    /// Returns the fatal error that terminated it, typically
    /// [`ClientError::ReconnectExhausted`] or [`ClientError::AuthRejected`].
    pub async fn join(&mut self) -> Result<()> {
        match self.supervisor.take() {
            Some(handle) => handle
                .await
                .map_err(|e| ClientError::ConnectionFailed(format!("Supervisor failed: {}", e)))?,
            None => Err(ClientError::NotConnected),
        }
    }

    /// Stop the connector and drop the active connection
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.supervisor.take() {
            handle.abort();
        }
        *self.outbound.write().await = None;
    }

    /// Supervisor loop: drive one connection, classify the failure, retry
    /// with a fixed delay or surface a fatal error.
    async fn supervise(
        config: ClientConfig,
        handlers: Arc<HandlerRegistry>,
        event_tx: broadcast::Sender<ClientEvent>,
        outbound: Arc<RwLock<Option<mpsc::Sender<ProtocolMessage>>>>,
        sequence: Arc<AtomicU32>,
    ) -> Result<()> {
        let mut reconnect = ReconnectState::new(config.max_reconnect_times);

        loop {
            let result = Self::drive(
                &config,
                &handlers,
                &event_tx,
                &outbound,
                &sequence,
                &mut reconnect,
            )
            .await;
            *outbound.write().await = None;

            match result {
                Err(err) if !err.is_retryable() => {
                    warn!(error = %err, "Fatal client error, giving up");
                    let _ = event_tx.send(ClientEvent::Error {
                        error: err.to_string(),
                    });
                    return Err(err);
                }
                Err(err) => {
                    info!(error = %err, "Connection lost");
                    let _ = event_tx.send(ClientEvent::Disconnected {
                        reason: err.to_string(),
                    });
                }
                Ok(()) => {
                    let _ = event_tx.send(ClientEvent::Disconnected {
                        reason: "Connection closed".to_string(),
                    });
                }
            }

            if reconnect.record_failure() {
                let err = ClientError::ReconnectExhausted(reconnect.max);
                warn!(max = reconnect.max, "Reconnect budget exhausted");
                let _ = event_tx.send(ClientEvent::Error {
                    error: err.to_string(),
                });
                return Err(err);
            }

            let _ = event_tx.send(ClientEvent::Reconnecting {
                attempt: reconnect.attempts,
            });
            sleep(config.reconnect_delay).await;
        }
    }

    /// Run a single connection from TCP connect to disconnect
    ///
    /// The authentication handshake runs before the connection is published
    /// for sending; `reconnect` is reset only after the server accepts it.
    async fn drive(
        config: &ClientConfig,
        handlers: &HandlerRegistry,
        event_tx: &broadcast::Sender<ClientEvent>,
        outbound: &Arc<RwLock<Option<mpsc::Sender<ProtocolMessage>>>>,
        sequence: &Arc<AtomicU32>,
        reconnect: &mut ReconnectState,
    ) -> Result<()> {
        let stream = timeout(
            config.connect_timeout,
            TcpStream::connect(&config.server_addr),
        )
        .await
        .map_err(|_| ClientError::Timeout("Connection timed out".to_string()))?
        .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;

        let addr = stream
            .peer_addr()
            .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;
        let _ = event_tx.send(ClientEvent::Connected { addr });

        let (read_half, write_half) = stream.into_split();
        let mut framed_read = FramedRead::new(read_half, MessageCodec::new());
        let mut framed_write = FramedWrite::new(write_half, MessageCodec::new());

        // Handshake first: nothing else may be sent on this connection
        let auth = ProtocolMessage::new(
            msg_type::AUTH_REQUEST,
            sequence.fetch_add(1, Ordering::Relaxed),
            config.auth_token.clone(),
        );
        framed_write
            .send(auth)
            .await
            .map_err(|e| ClientError::SendFailed(e.to_string()))?;

        let reply = timeout(config.connect_timeout, framed_read.next())
            .await
            .map_err(|_| ClientError::Timeout("Handshake timed out".to_string()))?
            .ok_or_else(|| {
                ClientError::ReceiveFailed("Connection closed during handshake".to_string())
            })?
            .map_err(|e| ClientError::ReceiveFailed(e.to_string()))?;

        if reply.msg_type != msg_type::AUTH_RESPONSE {
            return Err(ClientError::ReceiveFailed(format!(
                "Unexpected handshake reply type {}",
                reply.msg_type
            )));
        }
        if reply.payload.first() != Some(&auth_result::SUCCESS) {
            return Err(ClientError::AuthRejected);
        }

        reconnect.reset();
        info!(%addr, "Authenticated");
        let _ = event_tx.send(ClientEvent::Authenticated);

        // Write task owns the sink; last-write time is tracked as a
        // millisecond offset so the read loop can check it lock-free
        let clock = Instant::now();
        let last_write = Arc::new(AtomicU64::new(0));
        let (tx, mut rx) = mpsc::channel::<ProtocolMessage>(128);
        *outbound.write().await = Some(tx.clone());

        let writer_clock = clock;
        let writer_last = last_write.clone();
        let writer = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = framed_write.send(message).await {
                    debug!(error = %e, "Write task stopping");
                    break;
                }
                writer_last.store(writer_clock.elapsed().as_millis() as u64, Ordering::Relaxed);
            }
        });

        // The read deadline is an absolute instant pushed forward on every
        // inbound frame; outgoing traffic must not extend it
        let mut read_deadline = Instant::now() + config.reader_idle;
        let mut tick = tokio::time::interval(write_check_period(config));

        let result = loop {
            tokio::select! {
                maybe = framed_read.next() => match maybe {
                    Some(Ok(message)) => {
                        read_deadline = Instant::now() + config.reader_idle;
                        if message.msg_type == msg_type::HEARTBEAT_PING {
                            let pong = ProtocolMessage::empty(
                                msg_type::HEARTBEAT_PONG,
                                message.sequence,
                            );
                            if tx.send(pong).await.is_err() {
                                break Err(ClientError::SendFailed(
                                    "Write task stopped".to_string(),
                                ));
                            }
                        } else {
                            let _ = event_tx.send(ClientEvent::MessageReceived {
                                msg_type: message.msg_type,
                            });
                            handlers.dispatch(message).await;
                        }
                    }
                    Some(Err(e)) => break Err(ClientError::ReceiveFailed(e.to_string())),
                    None => break Err(ClientError::ReceiveFailed(
                        "Connection closed by server".to_string(),
                    )),
                },
                _ = sleep_until(read_deadline) => {
                    break Err(ClientError::IdleTimeout);
                }
                _ = tick.tick() => {
                    if !config.writer_idle.is_zero() {
                        let idle_ms = clock
                            .elapsed()
                            .as_millis()
                            .saturating_sub(last_write.load(Ordering::Relaxed) as u128);
                        if Duration::from_millis(idle_ms as u64) >= config.writer_idle {
                            let ping = ProtocolMessage::empty(
                                msg_type::HEARTBEAT_PING,
                                sequence.fetch_add(1, Ordering::Relaxed),
                            );
                            if tx.send(ping).await.is_err() {
                                break Err(ClientError::SendFailed(
                                    "Write task stopped".to_string(),
                                ));
                            }
                        }
                    }
                }
            }
        };

        *outbound.write().await = None;
        drop(tx);
        let _ = writer.await;
        result
    }
}

/// Write-idle check period: a quarter of the shortest enabled threshold
fn write_check_period(config: &ClientConfig) -> Duration {
    let mut shortest = config.reader_idle;
    if !config.writer_idle.is_zero() && config.writer_idle < shortest {
        shortest = config.writer_idle;
    }
    (shortest / 4).clamp(Duration::from_millis(20), Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_budget_exhausted() {
        let mut state = ReconnectState::new(2);
        assert!(!state.record_failure());
        assert!(!state.record_failure());
        assert!(state.record_failure());
    }

    #[test]
    fn test_reconnect_reset_restores_budget() {
        let mut state = ReconnectState::new(1);
        assert!(!state.record_failure());
        state.reset();
        assert!(!state.record_failure());
        assert!(state.record_failure());
    }

    #[test]
    fn test_zero_budget_fails_immediately() {
        let mut state = ReconnectState::new(0);
        assert!(state.record_failure());
    }

    #[test]
    fn test_write_check_period_clamped() {
        let config = ClientConfig::new("127.0.0.1:1")
            .with_reader_idle(Duration::from_millis(40))
            .with_writer_idle(Duration::ZERO);
        assert_eq!(write_check_period(&config), Duration::from_millis(20));

        let config = ClientConfig::new("127.0.0.1:1")
            .with_reader_idle(Duration::from_secs(90))
            .with_writer_idle(Duration::from_secs(20));
        assert_eq!(write_check_period(&config), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_send_before_start_fails() {
        let connector = Connector::new(ClientConfig::new("127.0.0.1:1"));
        let result = connector.send(100, Bytes::from("x")).await;
        assert!(matches!(result, Err(ClientError::NotConnected)));
    }

    #[tokio::test]
    async fn test_register_handler_after_start_fails() {
        use async_trait::async_trait;

        struct NoopHandler;

        #[async_trait]
        impl crate::handler::MessageHandler for NoopHandler {
            fn msg_type(&self) -> u16 {
                100
            }
            async fn handle(&self, _message: ProtocolMessage) {}
        }

        let mut connector = Connector::new(
            ClientConfig::new("127.0.0.1:1").with_reconnect_delay(Duration::from_millis(10)),
        );
        connector.start().unwrap();
        let result = connector.register_handler(Arc::new(NoopHandler));
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
        connector.shutdown().await;
    }
}
