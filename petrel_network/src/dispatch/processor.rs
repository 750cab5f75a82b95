//! 消息处理器接口
//!
//! 每个消息类型对应一个处理器。处理器的副作用限于向连接写回
//! 应答消息和请求关闭连接。

use crate::connection::SessionContext;
use crate::protocol::ProtocolMessage;
use async_trait::async_trait;
use petrel_core::GatewayError;
use thiserror::Error;

/// 处理器级错误
///
/// 向调用方传播，由调用方决定策略（关闭或忽略）；分发层不会
/// 因处理器错误自动关闭连接。
#[derive(Debug, Clone, Error)]
#[error("消息处理错误: {message}")]
pub struct ProcessingError {
    /// 错误描述
    pub message: String,
}

impl ProcessingError {
    /// 创建处理器错误
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ProcessingError> for GatewayError {
    fn from(err: ProcessingError) -> Self {
        GatewayError::processing(err.message)
    }
}

/// 消息处理器
///
/// 同一连接内的 `process` 调用在该连接的 I/O 任务上串行执行，
/// 消息按到达顺序处理。耗时的外部调用（例如认证服务）应在
/// 实现内部自行异步等待，只会阻塞本连接的后续处理。
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    /// 本处理器负责的消息类型
    fn msg_type(&self) -> u16;

    /// 处理一条消息
    async fn process(
        &self,
        ctx: &SessionContext,
        msg: ProtocolMessage,
    ) -> Result<(), ProcessingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_error_display() {
        let err = ProcessingError::new("认证数据为空");
        assert_eq!(err.to_string(), "消息处理错误: 认证数据为空");
    }

    #[test]
    fn test_processing_error_into_gateway_error() {
        let err: GatewayError = ProcessingError::new("x").into();
        assert_eq!(err.kind(), petrel_core::GatewayErrorKind::Processing);
    }
}
