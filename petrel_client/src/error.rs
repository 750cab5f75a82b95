//! Client-specific error types

use petrel_core::GatewayError;
use thiserror::Error;

/// Client-specific errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected to server
    #[error("Not connected")]
    NotConnected,

    /// Send operation failed
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Receive operation failed
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Server rejected the authentication handshake
    #[error("Authentication rejected by server")]
    AuthRejected,

    /// Reconnect exhausted
    #[error("Reconnect exhausted after {0} attempts")]
    ReconnectExhausted(u32),

    /// Timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// No traffic from server within the read-idle threshold
    #[error("Connection idle timeout")]
    IdleTimeout,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Whether the supervisor may retry with a fresh connection.
    ///
    /// Authentication rejection and configuration errors are permanent;
    /// everything else is a transport-level failure worth retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ClientError::AuthRejected
                | ClientError::InvalidConfig(_)
                | ClientError::ReconnectExhausted(_)
        )
    }
}

impl From<ClientError> for GatewayError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::ConnectionFailed(msg) => GatewayError::connect(msg),
            ClientError::NotConnected => GatewayError::connect("Not connected"),
            ClientError::SendFailed(msg) => GatewayError::network(msg),
            ClientError::ReceiveFailed(msg) => GatewayError::network(msg),
            ClientError::AuthRejected => GatewayError::auth_failed("Rejected by server"),
            ClientError::ReconnectExhausted(n) => {
                GatewayError::connect(format!("Reconnect failed after {} attempts", n))
            }
            ClientError::Timeout(msg) => GatewayError::connect(msg),
            ClientError::IdleTimeout => GatewayError::idle_timeout(),
            ClientError::InvalidConfig(msg) => GatewayError::config(msg),
        }
    }
}

/// Client result type
pub type Result<T> = std::result::Result<T, ClientError>;
