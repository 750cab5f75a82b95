//! TCP 网关
//!
//! Reactor 模式的主入口：绑定监听 socket、启动 Worker 池和
//! boss accept 任务。处理器注册表在绑定前构建完成，之后作为
//! 不可变状态共享给所有连接。

use crate::dispatch::{Dispatcher, ProcessorRegistry};
use crate::reactor::{Acceptor, Worker, WorkerConfig};
use crate::reactor::worker::ConnectionEnv;
use crate::SessionTable;
use petrel_config::ServerConfig;
use petrel_core::{ConnectionIdGenerator, GatewayError, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpSocket};
use tracing::{info, warn};

/// TCP 网关
pub struct Gateway {
    /// 监听器（绑定时已应用 backlog）
    listener: TcpListener,
    /// 服务端配置
    config: ServerConfig,
    /// 消息分发器
    dispatcher: Dispatcher,
    /// 会话表
    table: SessionTable,
    /// 连接 ID 生成器
    id_gen: Arc<ConnectionIdGenerator>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// 绑定监听地址
    ///
    /// 校验配置并以配置的 backlog 建立监听。注册表在此处交付后
    /// 即冻结，不再接受新的处理器注册。
    pub async fn bind(config: ServerConfig, registry: ProcessorRegistry) -> Result<Self> {
        config
            .validate()
            .map_err(|e| GatewayError::config(e.to_string()))?;

        let addr: SocketAddr = config
            .bind_addr()
            .parse()
            .map_err(|e| GatewayError::config(format!("无效的绑定地址: {}", e)))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket
            .bind(addr)
            .map_err(|e| GatewayError::Io(e).with_context(("bind_addr", config.bind_addr())))?;
        let listener = socket
            .listen(config.backlog)
            .map_err(|e| GatewayError::Io(e).with_context(("bind_addr", config.bind_addr())))?;

        info!(
            bind_addr = %config.bind_addr(),
            backlog = config.backlog,
            processors = registry.len(),
            "网关监听就绪"
        );

        Ok(Self {
            listener,
            config,
            dispatcher: Dispatcher::new(Arc::new(registry)),
            table: SessionTable::new(),
            id_gen: Arc::new(ConnectionIdGenerator::new()),
        })
    }

    /// 实际绑定的本地地址（端口 0 时为系统分配的端口）
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// 会话表
    pub fn session_table(&self) -> &SessionTable {
        &self.table
    }

    /// 服务端配置
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// 运行网关
    ///
    /// 启动 Worker 池和 boss accept 任务，阻塞直到 accept 循环出错。
    pub async fn run(self) -> Result<()> {
        let worker_count = self.config.worker_threads.unwrap_or_else(num_cpus::get);

        let env = Arc::new(ConnectionEnv {
            dispatcher: self.dispatcher.clone(),
            table: self.table.clone(),
            id_gen: self.id_gen.clone(),
            reader_idle: self.config.reader_idle(),
            writer_idle: self.config.writer_idle(),
        });

        info!(
            workers = worker_count,
            bosses = self.config.boss_threads,
            reader_idle_secs = self.config.reader_idle_secs,
            "网关启动"
        );

        let mut worker_handles = Vec::with_capacity(worker_count);
        let mut worker_txs = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let config = WorkerConfig {
                id,
                ..Default::default()
            };
            let (worker, tx) = Worker::new(config, env.clone());
            worker_handles.push(worker.spawn());
            worker_txs.push(tx);
        }

        let acceptor = Acceptor::new(Arc::new(self.listener), worker_txs);

        let mut boss_handles = Vec::with_capacity(self.config.boss_threads);
        for _ in 0..self.config.boss_threads {
            let acceptor = acceptor.clone();
            boss_handles.push(tokio::spawn(async move { acceptor.run().await }));
        }

        // 任一 boss 退出即视为致命错误
        for handle in boss_handles {
            handle
                .await
                .map_err(|e| GatewayError::network(format!("boss 任务异常退出: {}", e)))??;
        }

        for handle in worker_handles {
            if let Ok(Err(e)) = handle.await {
                warn!("Worker 错误: {}", e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let config = ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            port: 0,
            ..Default::default()
        };
        let registry = ProcessorRegistry::builder().build();

        let gateway = Gateway::bind(config, registry).await.unwrap();
        let addr = gateway.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
        assert!(gateway.session_table().is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_bind_conflict_reports_bind_addr() {
        let config = ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            port: 0,
            ..Default::default()
        };
        let first = Gateway::bind(config, ProcessorRegistry::builder().build())
            .await
            .unwrap();
        let port = first.local_addr().unwrap().port();

        // 端口已被占用，错误应携带绑定地址上下文
        let config = ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        };
        let err = Gateway::bind(config, ProcessorRegistry::builder().build())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), petrel_core::GatewayErrorKind::Io);
        assert!(err.to_string().contains("bind_addr=127.0.0.1"));
    }

    #[tokio::test]
    async fn test_bind_invalid_config() {
        let config = ServerConfig {
            bind_address: String::new(),
            ..Default::default()
        };
        let registry = ProcessorRegistry::builder().build();

        let result = Gateway::bind(config, registry).await;
        assert!(result.is_err());
    }
}
