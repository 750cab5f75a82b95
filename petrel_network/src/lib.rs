//! Petrel 网络层
//!
//! 提供 IM 网关的二进制帧协议、消息分发和连接生命周期管理：
//!
//! - `protocol`: 帧格式与流式编解码器
//! - `dispatch`: 消息处理器注册表、分发器和认证门禁
//! - `processor`: 内置消息处理器（认证握手、心跳）
//! - `connection`: 会话状态与会话表
//! - `reactor`: Acceptor / Worker 模型的 TCP 网关

pub mod connection;
pub mod dispatch;
pub mod processor;
pub mod protocol;
pub mod reactor;

// 导出主要类型到 crate root
pub use crate::connection::{Session, SessionContext, SessionTable};
pub use crate::dispatch::{
    DispatchError, Dispatcher, MessageProcessor, ProcessingError, ProcessorRegistry,
    ProcessorRegistryBuilder,
};
pub use crate::processor::{AuthProcessor, Authenticator, HeartbeatProcessor};
pub use crate::protocol::{
    auth_result, msg_type, now_millis, FrameError, MessageCodec, MessageDecoder, MessageEncoder,
    ProtocolMessage,
};
pub use crate::reactor::Gateway;
