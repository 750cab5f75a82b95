//! 消息分发器
//!
//! 按消息类型查找处理器并投递消息，在投递前集中执行认证门禁，
//! 处理器内部无需各自检查认证状态。

use crate::connection::SessionContext;
use crate::dispatch::{ProcessingError, ProcessorRegistry};
use crate::protocol::{msg_type, ProtocolMessage};
use petrel_core::ConnectionState;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// 分发错误
#[derive(Debug, Error)]
pub enum DispatchError {
    /// 未认证连接发送了非握手消息，连接应立即关闭且不回复
    #[error("协议违规: 未认证连接发送消息类型 {msg_type}")]
    ProtocolViolation {
        /// 违规的消息类型
        msg_type: u16,
    },

    /// 处理器执行失败，策略由调用方决定
    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

/// 消息分发器
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ProcessorRegistry>,
}

impl Dispatcher {
    /// 创建分发器
    ///
    /// 注册表必须在服务开始接受连接前构建完成。
    pub fn new(registry: Arc<ProcessorRegistry>) -> Self {
        Self { registry }
    }

    /// 分发一条消息
    ///
    /// 按顺序执行三道检查：
    /// - 会话已关闭：直接丢弃（拆除过程中缓冲的帧不再处理）
    /// - 未注册的消息类型：丢弃并记录，属于定义内行为（协议兼容性
    ///   要求未知类型可忽略），不算错误，未认证连接同样适用
    /// - 未认证且非握手类型：返回协议违规，处理器不会被调用
    pub async fn dispatch(
        &self,
        ctx: &SessionContext,
        msg: ProtocolMessage,
    ) -> Result<(), DispatchError> {
        let session = ctx.session();
        let state = session.state();

        if state == ConnectionState::Closed {
            debug!(connection_id = %session.id(), "会话已关闭，丢弃消息 {}", msg);
            return Ok(());
        }

        let processor = match self.registry.get(msg.msg_type) {
            Some(p) => p,
            None => {
                debug!(
                    connection_id = %session.id(),
                    msg_type = msg.msg_type,
                    "未注册的消息类型，丢弃"
                );
                return Ok(());
            }
        };

        if state == ConnectionState::Unauthenticated && msg.msg_type != msg_type::AUTH_REQUEST {
            return Err(DispatchError::ProtocolViolation {
                msg_type: msg.msg_type,
            });
        }

        processor.process(ctx, msg).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Session;
    use crate::dispatch::MessageProcessor;
    use async_trait::async_trait;
    use bytes::Bytes;
    use petrel_core::ConnectionId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    struct CountingProcessor {
        msg_type: u16,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MessageProcessor for CountingProcessor {
        fn msg_type(&self) -> u16 {
            self.msg_type
        }

        async fn process(
            &self,
            _ctx: &SessionContext,
            _msg: ProtocolMessage,
        ) -> Result<(), ProcessingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn make_ctx() -> SessionContext {
        let (tx, _rx) = mpsc::channel(16);
        let addr = "127.0.0.1:9000".parse().unwrap();
        SessionContext::new(Arc::new(Session::new(ConnectionId::new(1), addr, tx)))
    }

    fn make_dispatcher(msg_type: u16, calls: Arc<AtomicUsize>) -> Dispatcher {
        let registry = ProcessorRegistry::builder()
            .register(Arc::new(CountingProcessor { msg_type, calls }))
            .build();
        Dispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_gate_rejects_unauthenticated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = make_dispatcher(10, calls.clone());
        let ctx = make_ctx();

        let msg = ProtocolMessage::new(10, 0, Bytes::from("data"));
        let err = dispatcher.dispatch(&ctx, msg).await.unwrap_err();

        assert!(matches!(
            err,
            DispatchError::ProtocolViolation { msg_type: 10 }
        ));
        // 处理器从未被调用
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_auth_type_passes_gate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = make_dispatcher(msg_type::AUTH_REQUEST, calls.clone());
        let ctx = make_ctx();

        let msg = ProtocolMessage::new(msg_type::AUTH_REQUEST, 0, Bytes::from("token"));
        dispatcher.dispatch(&ctx, msg).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_authenticated_dispatch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = make_dispatcher(10, calls.clone());
        let ctx = make_ctx();
        ctx.session().mark_authenticated();

        let msg = ProtocolMessage::new(10, 0, Bytes::from("data"));
        dispatcher.dispatch(&ctx, msg).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_type_dropped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = make_dispatcher(10, calls.clone());
        let ctx = make_ctx();
        ctx.session().mark_authenticated();

        // 未注册类型：丢弃，非错误
        let msg = ProtocolMessage::new(999, 0, Bytes::new());
        dispatcher.dispatch(&ctx, msg).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_unknown_type_dropped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = make_dispatcher(10, calls.clone());
        let ctx = make_ctx();

        // 未认证 + 未注册类型：按未知类型丢弃，不触发门禁，连接保持打开
        let msg = ProtocolMessage::new(999, 0, Bytes::new());
        dispatcher.dispatch(&ctx, msg).await.unwrap();
        assert!(!ctx.session().is_closed());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_closed_session_discards() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = make_dispatcher(10, calls.clone());
        let ctx = make_ctx();
        ctx.session().mark_authenticated();
        ctx.close().await;

        let msg = ProtocolMessage::new(10, 0, Bytes::from("data"));
        dispatcher.dispatch(&ctx, msg).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
