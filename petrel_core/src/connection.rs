//! 连接标识
//!
//! 定义连接 ID、ID 生成器和连接状态，供网关和客户端共享使用。

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// 连接唯一标识符
///
/// 由生成器单调分配，连接关闭后不会复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// 创建新的连接 ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// 获取内部值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 连接 ID 生成器
///
/// 单调递增，进程生命周期内不产生重复 ID。
#[derive(Debug)]
pub struct ConnectionIdGenerator {
    next_id: AtomicU64,
}

impl ConnectionIdGenerator {
    /// 创建新的生成器
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// 生成下一个 ID
    pub fn next(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for ConnectionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 连接认证状态机
///
/// `Unauthenticated` 为初始状态，只允许转移到 `Authenticated`（且仅一次）
/// 或 `Closed`；`Closed` 为终态，进入后不再处理任何帧。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 未认证（仅允许握手消息）
    Unauthenticated,
    /// 已认证
    Authenticated,
    /// 已关闭
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id() {
        let id1 = ConnectionId::new(1);
        let id2 = ConnectionId::new(2);
        assert_ne!(id1, id2);
        assert_eq!(id1.value(), 1);
    }

    #[test]
    fn test_id_generator() {
        let generator = ConnectionIdGenerator::new();
        let id1 = generator.next();
        let id2 = generator.next();
        assert_eq!(id1.value(), 1);
        assert_eq!(id2.value(), 2);
    }

    #[test]
    fn test_id_generator_no_reuse() {
        let generator = ConnectionIdGenerator::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(generator.next()));
        }
    }

    #[test]
    fn test_state_display_semantics() {
        assert_ne!(
            ConnectionState::Unauthenticated,
            ConnectionState::Authenticated
        );
        assert_ne!(ConnectionState::Authenticated, ConnectionState::Closed);
    }
}
