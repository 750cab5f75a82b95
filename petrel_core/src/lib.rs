//! Petrel 核心类型
//!
//! 提供网关各 crate 共享的错误类型和连接标识。

pub mod connection;
pub mod error;

// 导出主要类型到 crate root
pub use crate::connection::{ConnectionId, ConnectionIdGenerator, ConnectionState};
pub use crate::error::{ErrorContext, GatewayError, GatewayErrorKind, Result};

// 预导出
pub mod prelude {
    pub use crate::connection::{ConnectionId, ConnectionIdGenerator, ConnectionState};
    pub use crate::error::{ErrorContext, GatewayError, GatewayErrorKind, Result};
}
