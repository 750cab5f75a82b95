//! 内置消息处理器
//!
//! 认证握手处理器（网关自身定义的唯一必需处理器）和心跳处理器。

pub mod auth;
pub mod heartbeat;

pub use auth::{AuthProcessor, Authenticator};
pub use heartbeat::HeartbeatProcessor;
