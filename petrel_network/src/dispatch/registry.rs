//! 处理器注册表
//!
//! 启动阶段由静态列表显式构建，构建完成后作为进程级不可变状态
//! 共享（以 Arc 包裹传给各连接），运行期无锁访问。

use crate::dispatch::MessageProcessor;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// 处理器注册表
///
/// `msg_type` 到处理器的不可变映射，必须在 Acceptor 开始接受
/// 连接之前构建完成。
pub struct ProcessorRegistry {
    map: HashMap<u16, Arc<dyn MessageProcessor>>,
}

impl ProcessorRegistry {
    /// 创建构建器
    pub fn builder() -> ProcessorRegistryBuilder {
        ProcessorRegistryBuilder::new()
    }

    /// 按消息类型查找处理器
    pub fn get(&self, msg_type: u16) -> Option<&Arc<dyn MessageProcessor>> {
        self.map.get(&msg_type)
    }

    /// 已注册的处理器数量
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// 注册表构建器
#[derive(Default)]
pub struct ProcessorRegistryBuilder {
    map: HashMap<u16, Arc<dyn MessageProcessor>>,
}

impl ProcessorRegistryBuilder {
    /// 创建空构建器
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// 注册一个处理器
    ///
    /// 同一消息类型重复注册时以最后一次为准，并输出警告。
    pub fn register(mut self, processor: Arc<dyn MessageProcessor>) -> Self {
        let msg_type = processor.msg_type();
        if self.map.insert(msg_type, processor).is_some() {
            warn!(msg_type, "消息类型重复注册，使用最后一次注册的处理器");
        }
        self
    }

    /// 完成构建
    pub fn build(self) -> ProcessorRegistry {
        ProcessorRegistry { map: self.map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::SessionContext;
    use crate::dispatch::ProcessingError;
    use crate::protocol::ProtocolMessage;
    use async_trait::async_trait;

    struct NoopProcessor {
        msg_type: u16,
        tag: &'static str,
    }

    #[async_trait]
    impl MessageProcessor for NoopProcessor {
        fn msg_type(&self) -> u16 {
            self.msg_type
        }

        async fn process(
            &self,
            _ctx: &SessionContext,
            _msg: ProtocolMessage,
        ) -> Result<(), ProcessingError> {
            let _ = self.tag;
            Ok(())
        }
    }

    #[test]
    fn test_register_and_get() {
        let registry = ProcessorRegistry::builder()
            .register(Arc::new(NoopProcessor {
                msg_type: 1,
                tag: "a",
            }))
            .register(Arc::new(NoopProcessor {
                msg_type: 2,
                tag: "b",
            }))
            .build();

        assert_eq!(registry.len(), 2);
        assert!(registry.get(1).is_some());
        assert!(registry.get(2).is_some());
        assert!(registry.get(3).is_none());
    }

    #[test]
    fn test_duplicate_registration_last_wins() {
        let registry = ProcessorRegistry::builder()
            .register(Arc::new(NoopProcessor {
                msg_type: 1,
                tag: "first",
            }))
            .register(Arc::new(NoopProcessor {
                msg_type: 1,
                tag: "second",
            }))
            .build();

        assert_eq!(registry.len(), 1);
        assert!(registry.get(1).is_some());
    }

    #[test]
    fn test_empty_registry() {
        let registry = ProcessorRegistry::builder().build();
        assert!(registry.is_empty());
    }
}
