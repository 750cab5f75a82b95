//! 消息分发
//!
//! 将解码后的消息路由到按类型注册的处理器，并在分发前统一执行
//! 认证门禁检查。

pub mod dispatcher;
pub mod processor;
pub mod registry;

pub use dispatcher::{DispatchError, Dispatcher};
pub use processor::{MessageProcessor, ProcessingError};
pub use registry::{ProcessorRegistry, ProcessorRegistryBuilder};
