//! 认证握手处理器
//!
//! 握手流程：客户端连接后的第一条消息必须是 `AUTH_REQUEST`，负载
//! 为不透明的凭证字节。凭证校验委托给外部授权协作方，本处理器
//! 只负责执行握手协议：
//!
//! - 空负载：返回处理器错误，不回复、不关闭（连接保持未认证）
//! - 校验通过：标记会话已认证，回复携带原始序列号的成功应答
//! - 校验拒绝：回复失败应答后强制关闭连接，失败的握手绝不留下
//!   半开连接

use crate::connection::SessionContext;
use crate::dispatch::{MessageProcessor, ProcessingError};
use crate::protocol::{auth_result, msg_type, ProtocolMessage};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};

/// 外部授权协作方
///
/// 凭证如何校验不在网关职责范围内，网关只关心校验结果。
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// 校验凭证，返回是否通过
    async fn authenticate(&self, token: &[u8]) -> bool;
}

/// 认证握手处理器
pub struct AuthProcessor {
    authenticator: Arc<dyn Authenticator>,
}

impl AuthProcessor {
    /// 创建认证处理器
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }

    fn response(sequence: u32, result: u8) -> ProtocolMessage {
        ProtocolMessage::new(
            msg_type::AUTH_RESPONSE,
            sequence,
            Bytes::copy_from_slice(&[result]),
        )
    }
}

#[async_trait]
impl MessageProcessor for AuthProcessor {
    fn msg_type(&self) -> u16 {
        msg_type::AUTH_REQUEST
    }

    async fn process(
        &self,
        ctx: &SessionContext,
        msg: ProtocolMessage,
    ) -> Result<(), ProcessingError> {
        if msg.payload.is_empty() {
            return Err(ProcessingError::new("认证数据为空"));
        }

        let session = ctx.session();

        if self.authenticator.authenticate(&msg.payload).await {
            let first = session.mark_authenticated();
            if first {
                info!(
                    connection_id = %session.id(),
                    remote_addr = %session.remote_addr(),
                    "连接认证通过"
                );
            }
            ctx.send(Self::response(msg.sequence, auth_result::SUCCESS))
                .await?;
        } else {
            warn!(
                connection_id = %session.id(),
                remote_addr = %session.remote_addr(),
                "连接认证被拒绝，关闭连接"
            );
            ctx.send(Self::response(msg.sequence, auth_result::FAILURE))
                .await?;
            ctx.close().await;
        }

        Ok(())
    }
}
