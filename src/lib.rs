//! # Petrel - IM 长连接网关框架
//!
//! Petrel 是一个面向即时通讯场景的长连接网关框架，负责海量 TCP
//! 连接的接入、认证握手、心跳保活和消息分发。
//!
//! ## 特性
//!
//! - 基于 Tokio 异步运行时的 Acceptor / Worker 模型
//! - 显式长度前缀的二进制帧协议
//! - 认证门禁：握手完成前拒绝一切业务消息
//! - 读/写空闲检测与心跳保活
//! - 客户端自动重连（固定间隔、有限次数）
//!
//! ## 快速开始
//!
//! ### 服务端
//!
//! ```rust,no_run,ignore
//! use petrel::Server;
//!
//! #[tokio::main]
//! async fn main() -> petrel::Result<()> {
//!     Server::bind("127.0.0.1:8520")
//!         .authenticator(my_authenticator)
//!         .processor(my_processor)
//!         .run()
//!         .await
//! }
//! ```
//!
//! ### 客户端
//!
//! ```rust,no_run,ignore
//! use petrel::Client;
//!
//! #[tokio::main]
//! async fn main() -> petrel::Result<()> {
//!     let client = Client::connect("127.0.0.1:8520", "my-token").await?;
//!     client.send(100, "hello".into()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## 模块组织
//!
//! ### 配置模块
//! - ServerConfig - 网关服务端配置
//! - ClientConfig - 客户端连接配置
//!
//! ### 核心模块
//! - GatewayError - 统一框架错误
//! - ConnectionId - 连接唯一标识
//!
//! ### 网络模块
//! - ProtocolMessage - 协议消息帧
//! - Gateway - TCP 网关
//! - MessageProcessor - 消息处理器 trait
//!
//! ### 客户端模块
//! - Connector - 带自动重连的网关连接器

// ============================================================================
// Conditional Compilation Based on Features
// ============================================================================

// Client API
#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "client")]
pub use crate::client::Client;

// Server API
#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "server")]
pub use crate::server::{Server, ServerBuilder};

// ============================================================================
// Crate Re-exports (for advanced users)
// ============================================================================

#[cfg(feature = "server")]
pub use petrel_config;

#[cfg(any(feature = "server", feature = "client"))]
pub use petrel_core;

#[cfg(any(feature = "server", feature = "client"))]
pub use petrel_network;

#[cfg(feature = "client")]
pub use petrel_client;

// ============================================================================
// Prelude Module
// ============================================================================

/// 预导出常用类型
///
/// 通过 `use petrel::prelude::*;` 导入所有常用类型
pub mod prelude {
    // Common types
    pub use std::result::Result as StdResult;

    #[cfg(any(feature = "server", feature = "client"))]
    pub use petrel_core::{ConnectionId, GatewayError};

    #[cfg(any(feature = "server", feature = "client"))]
    pub use petrel_network::{auth_result, msg_type, ProtocolMessage};

    #[cfg(feature = "server")]
    pub use petrel_config::{ConfigError, GatewayConfig, ServerConfig};

    #[cfg(feature = "server")]
    pub use petrel_network::{
        Authenticator, Gateway, MessageProcessor, ProcessingError, SessionContext,
    };

    #[cfg(feature = "client")]
    pub use petrel_client::{ClientConfig, ClientEvent, Connector, MessageHandler};

    #[cfg(feature = "client")]
    pub use crate::client::Client;

    #[cfg(feature = "server")]
    pub use crate::server::{Server, ServerBuilder};
}

// ============================================================================
// Error Types
// ============================================================================

/// Petrel 统一错误类型
pub type Result<T> = std::result::Result<T, Error>;

/// Petrel 统一错误枚举
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 框架核心错误
    #[cfg(any(feature = "server", feature = "client"))]
    #[error(transparent)]
    Core(#[from] petrel_core::GatewayError),

    /// 客户端错误
    #[cfg(feature = "client")]
    #[error(transparent)]
    Client(#[from] petrel_client::ClientError),

    /// 配置错误
    #[cfg(feature = "server")]
    #[error(transparent)]
    Config(#[from] petrel_config::ConfigError),

    /// IO 错误
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// 自定义错误
    #[error("{0}")]
    Custom(String),
}

// ============================================================================
// Version Information
// ============================================================================

/// Petrel 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Petrel 包名
pub const NAME: &str = env!("CARGO_PKG_NAME");
