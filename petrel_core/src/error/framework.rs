//! Petrel 网关核心错误类型
//!
//! 定义协议、连接生命周期相关的所有错误类型。
//! 错误分类对应各自的处理策略：
//! - 帧格式错误 / 协议违规 → 关闭连接，不回复
//! - 处理器错误 → 向调用方传播，由调用方决定策略
//! - 认证失败 → 回复失败消息后关闭连接
//! - 连接失败 / 空闲超时 → 客户端有界重连

use super::context::ErrorContext;
use std::io;
use thiserror::Error;

/// Petrel 网关核心错误类型
#[derive(Error, Debug)]
pub enum GatewayError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 帧格式错误（解码失败，帧边界不可信）
    #[error("帧格式错误: {0}")]
    MalformedFrame(String),

    /// 协议违规（未认证连接发送了非握手消息）
    #[error("协议违规: {0}")]
    ProtocolViolation(String),

    /// 消息处理器错误
    #[error("消息处理错误: {0}")]
    Processing(String),

    /// 认证失败（凭证被拒绝）
    #[error("认证失败: {0}")]
    AuthFailed(String),

    /// 连接建立失败
    #[error("连接失败: {0}")]
    Connect(String),

    /// 空闲超时
    #[error("空闲超时")]
    IdleTimeout,

    /// 带上下文的错误
    #[error("{0} ({1})")]
    WithContext(#[source] Box<GatewayError>, ErrorContext),
}

impl GatewayError {
    /// 获取错误类型
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::Io(_) => GatewayErrorKind::Io,
            GatewayError::Config(_) => GatewayErrorKind::Config,
            GatewayError::Network(_) => GatewayErrorKind::Network,
            GatewayError::MalformedFrame(_) => GatewayErrorKind::MalformedFrame,
            GatewayError::ProtocolViolation(_) => GatewayErrorKind::ProtocolViolation,
            GatewayError::Processing(_) => GatewayErrorKind::Processing,
            GatewayError::AuthFailed(_) => GatewayErrorKind::AuthFailed,
            GatewayError::Connect(_) => GatewayErrorKind::Connect,
            GatewayError::IdleTimeout => GatewayErrorKind::IdleTimeout,
            GatewayError::WithContext(inner, _) => inner.kind(),
        }
    }

    /// 添加上下文信息
    pub fn with_context<C>(self, context: C) -> Self
    where
        C: Into<ErrorContext>,
    {
        GatewayError::WithContext(Box::new(self), context.into())
    }

    /// 创建配置错误
    pub fn config(msg: impl Into<String>) -> Self {
        GatewayError::Config(msg.into())
    }

    /// 创建网络错误
    pub fn network(msg: impl Into<String>) -> Self {
        GatewayError::Network(msg.into())
    }

    /// 创建帧格式错误
    pub fn malformed_frame(msg: impl Into<String>) -> Self {
        GatewayError::MalformedFrame(msg.into())
    }

    /// 创建协议违规错误
    pub fn protocol_violation(msg: impl Into<String>) -> Self {
        GatewayError::ProtocolViolation(msg.into())
    }

    /// 创建处理器错误
    pub fn processing(msg: impl Into<String>) -> Self {
        GatewayError::Processing(msg.into())
    }

    /// 创建认证失败错误
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        GatewayError::AuthFailed(msg.into())
    }

    /// 创建连接失败错误
    pub fn connect(msg: impl Into<String>) -> Self {
        GatewayError::Connect(msg.into())
    }

    /// 创建空闲超时错误
    pub fn idle_timeout() -> Self {
        GatewayError::IdleTimeout
    }
}

/// 错误类型分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayErrorKind {
    /// IO 错误
    Io,
    /// 配置错误
    Config,
    /// 网络错误
    Network,
    /// 帧格式错误
    MalformedFrame,
    /// 协议违规
    ProtocolViolation,
    /// 处理器错误
    Processing,
    /// 认证失败
    AuthFailed,
    /// 连接失败
    Connect,
    /// 空闲超时
    IdleTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = GatewayError::config("test error");
        assert!(matches!(err, GatewayError::Config(_)));
        assert_eq!(err.kind(), GatewayErrorKind::Config);
    }

    #[test]
    fn test_error_with_context() {
        let err = GatewayError::protocol_violation("握手前收到业务消息")
            .with_context(crate::ConnectionId::new(7));
        assert!(matches!(err, GatewayError::WithContext(_, _)));
        // 包装后 kind 仍然指向内部错误，展示时附带上下文
        assert_eq!(err.kind(), GatewayErrorKind::ProtocolViolation);
        assert_eq!(err.to_string(), "协议违规: 握手前收到业务消息 (connection_id=7)");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            GatewayError::malformed_frame("").kind(),
            GatewayErrorKind::MalformedFrame
        );
        assert_eq!(
            GatewayError::auth_failed("").kind(),
            GatewayErrorKind::AuthFailed
        );
        assert_eq!(
            GatewayError::idle_timeout().kind(),
            GatewayErrorKind::IdleTimeout
        );
    }
}
