//! 心跳处理器
//!
//! 对 `HEARTBEAT_PING` 回复携带相同序列号的 `HEARTBEAT_PONG`。
//! 空闲时钟的刷新发生在连接读写路径上，与消息内容无关，心跳
//! 处理器只负责应答。

use crate::connection::SessionContext;
use crate::dispatch::{MessageProcessor, ProcessingError};
use crate::protocol::{msg_type, ProtocolMessage};
use async_trait::async_trait;

/// 心跳处理器
#[derive(Debug, Default)]
pub struct HeartbeatProcessor;

impl HeartbeatProcessor {
    /// 创建心跳处理器
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessageProcessor for HeartbeatProcessor {
    fn msg_type(&self) -> u16 {
        msg_type::HEARTBEAT_PING
    }

    async fn process(
        &self,
        ctx: &SessionContext,
        msg: ProtocolMessage,
    ) -> Result<(), ProcessingError> {
        ctx.send(ProtocolMessage::empty(msg_type::HEARTBEAT_PONG, msg.sequence))
            .await
    }
}
