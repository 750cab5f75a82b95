//! 错误上下文
//!
//! 标注错误发生所在的连接或地址，随错误一起打入日志，
//! 便于从汇总日志回溯到具体连接。

use crate::connection::ConnectionId;
use std::fmt;
use std::net::SocketAddr;

/// 错误上下文信息
#[derive(Debug, Clone)]
pub enum ErrorContext {
    /// 关联的连接
    Connection(ConnectionId),
    /// 关联的地址（绑定地址或对端地址）
    Addr(SocketAddr),
    /// 键值对上下文
    KeyValue(&'static str, String),
    /// 自定义上下文
    Custom(String),
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorContext::Connection(id) => write!(f, "connection_id={}", id),
            ErrorContext::Addr(addr) => write!(f, "addr={}", addr),
            ErrorContext::KeyValue(key, value) => write!(f, "{}={}", key, value),
            ErrorContext::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<ConnectionId> for ErrorContext {
    fn from(id: ConnectionId) -> Self {
        ErrorContext::Connection(id)
    }
}

impl From<SocketAddr> for ErrorContext {
    fn from(addr: SocketAddr) -> Self {
        ErrorContext::Addr(addr)
    }
}

impl From<(&'static str, String)> for ErrorContext {
    fn from((key, value): (&'static str, String)) -> Self {
        ErrorContext::KeyValue(key, value)
    }
}

impl From<(&'static str, &str)> for ErrorContext {
    fn from((key, value): (&'static str, &str)) -> Self {
        ErrorContext::KeyValue(key, value.to_string())
    }
}

impl From<String> for ErrorContext {
    fn from(msg: String) -> Self {
        ErrorContext::Custom(msg)
    }
}

impl From<&str> for ErrorContext {
    fn from(msg: &str) -> Self {
        ErrorContext::Custom(msg.to_string())
    }
}
