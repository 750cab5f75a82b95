//! Client events

use std::net::SocketAddr;

/// Client event
///
/// Broadcast to subscribers as the connector moves through its lifecycle.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// TCP connection established (handshake not yet complete)
    Connected { addr: SocketAddr },

    /// Authentication handshake accepted by the server
    Authenticated,

    /// Disconnected from server
    Disconnected { reason: String },

    /// Attempting to reconnect
    Reconnecting { attempt: u32 },

    /// Message received
    MessageReceived { msg_type: u16 },

    /// Message sent
    MessageSent { msg_type: u16 },

    /// Error occurred
    Error { error: String },
}
