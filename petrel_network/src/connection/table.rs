//! 会话表
//!
//! 单节点的存活会话集合。会话随连接接受注册、随连接关闭移除；
//! 移除与关闭标志置位共同构成连接拆除的原子边界。

use crate::connection::Session;
use petrel_core::{ConnectionId, GatewayError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// 会话表
#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    /// 内部存储（Arc<RwLock> 实现并发访问）
    inner: Arc<RwLock<HashMap<ConnectionId, Arc<Session>>>>,
}

impl SessionTable {
    /// 创建新的会话表
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 注册会话
    pub fn insert(&self, session: Arc<Session>) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| GatewayError::network(format!("获取写锁失败: {}", e)))?;

        inner.insert(session.id(), session);
        Ok(())
    }

    /// 移除会话
    pub fn remove(&self, id: ConnectionId) -> Result<Option<Arc<Session>>> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| GatewayError::network(format!("获取写锁失败: {}", e)))?;

        Ok(inner.remove(&id))
    }

    /// 获取会话
    pub fn get(&self, id: ConnectionId) -> Result<Option<Arc<Session>>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| GatewayError::network(format!("获取读锁失败: {}", e)))?;

        Ok(inner.get(&id).cloned())
    }

    /// 会话是否存在
    pub fn contains(&self, id: ConnectionId) -> Result<bool> {
        let inner = self
            .inner
            .read()
            .map_err(|e| GatewayError::network(format!("获取读锁失败: {}", e)))?;

        Ok(inner.contains_key(&id))
    }

    /// 存活会话数量
    pub fn len(&self) -> Result<usize> {
        let inner = self
            .inner
            .read()
            .map_err(|e| GatewayError::network(format!("获取读锁失败: {}", e)))?;

        Ok(inner.len())
    }

    /// 是否为空
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// 所有会话 ID
    pub fn all_ids(&self) -> Result<Vec<ConnectionId>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| GatewayError::network(format!("获取读锁失败: {}", e)))?;

        Ok(inner.keys().copied().collect())
    }
}
