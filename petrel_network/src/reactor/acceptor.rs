//! 连接接受器
//!
//! 负责接受新的 TCP 连接并轮询分配给 Worker。可克隆后在多个
//! boss 任务上并发运行，共享同一个监听 socket 和轮询游标。

use petrel_core::{GatewayError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// 新连接消息
pub struct NewConnection {
    /// TCP 流
    pub stream: tokio::net::TcpStream,
    /// 远程地址
    pub remote_addr: std::net::SocketAddr,
}

/// 连接接受器
#[derive(Clone)]
pub struct Acceptor {
    /// TCP 监听器
    listener: Arc<TcpListener>,
    /// 发送通道到各 Worker
    worker_txs: Vec<mpsc::Sender<NewConnection>>,
    /// 轮询游标，所有 boss 任务共享
    cursor: Arc<AtomicUsize>,
}

impl Acceptor {
    /// 创建新的连接接受器
    pub fn new(listener: Arc<TcpListener>, worker_txs: Vec<mpsc::Sender<NewConnection>>) -> Self {
        assert!(!worker_txs.is_empty(), "至少需要一个 Worker");
        Self {
            listener,
            worker_txs,
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 选择下一个 Worker
    fn next_worker(&self) -> usize {
        self.cursor.fetch_add(1, Ordering::Relaxed) % self.worker_txs.len()
    }

    /// 运行 accept 循环
    ///
    /// 超出 backlog 的连接由操作系统拒绝，本层不做额外的准入控制。
    pub async fn run(&self) -> Result<()> {
        info!(local_addr = ?self.listener.local_addr(), "开始接受连接");

        loop {
            match self.listener.accept().await {
                Ok((stream, remote_addr)) => {
                    let worker_id = self.next_worker();
                    debug!(%remote_addr, worker_id, "接受新连接");

                    if self.worker_txs[worker_id]
                        .send(NewConnection {
                            stream,
                            remote_addr,
                        })
                        .await
                        .is_err()
                    {
                        return Err(GatewayError::network(format!(
                            "无法发送连接到 Worker {}",
                            worker_id
                        )));
                    }
                }
                Err(e) => {
                    return Err(GatewayError::Io(e).with_context("accept 循环中止"));
                }
            }
        }
    }
}
