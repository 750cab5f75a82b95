//! # Petrel Client
//!
//! Client library for connecting to Petrel gateways.
//!
//! ## Features
//!
//! - Authentication handshake on every connection
//! - Automatic reconnection with a fixed delay and bounded attempts
//! - Heartbeat keep-alive (replies to server pings, sends its own when
//!   write-idle)
//! - Handler-based message dispatch and lifecycle event broadcast
//!
//! ## Quick Start
//!
//! ```rust,no_run,ignore
//! use petrel_client::{ClientConfig, Connector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("127.0.0.1:8520")
//!         .with_auth_token("my-token");
//!
//!     let mut connector = Connector::new(config);
//!     let mut events = connector.subscribe_events();
//!     connector.start()?;
//!
//!     // React to lifecycle events
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("{:?}", event);
//!         }
//!     });
//!
//!     // Send a business message
//!     connector.send(100, "hello".into()).await?;
//!
//!     // Block until a fatal error (auth rejected, reconnect exhausted)
//!     connector.join().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connector;
pub mod error;
pub mod event;
pub mod handler;

pub use config::ClientConfig;
pub use connector::Connector;
pub use error::{ClientError, Result};
pub use event::ClientEvent;
pub use handler::{HandlerRegistry, MessageHandler};

// Re-export protocol types used in the public API
pub use petrel_network::{auth_result, msg_type, ProtocolMessage};
