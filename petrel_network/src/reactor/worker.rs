//! Worker 任务
//!
//! 每个 Worker 拥有分配给它的连接。单个连接上的读取、解码、
//! 分发、处理全部在该连接的任务内串行执行，因此连接内消息
//! 顺序由构造保证；跨连接无顺序保证。

use crate::connection::{Outbound, Session, SessionContext, SessionTable};
use crate::dispatch::{DispatchError, Dispatcher};
use crate::protocol::{msg_type, MessageCodec, ProtocolMessage};
use crate::reactor::acceptor::NewConnection;
use futures_util::{SinkExt, StreamExt};
use petrel_core::{ConnectionIdGenerator, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

/// 连接运行环境
///
/// 在网关启动时构建完成，连接建立后按引用传入，运行期不可变。
pub(crate) struct ConnectionEnv {
    /// 消息分发器
    pub dispatcher: Dispatcher,
    /// 会话表
    pub table: SessionTable,
    /// 连接 ID 生成器
    pub id_gen: Arc<ConnectionIdGenerator>,
    /// 读空闲阈值，超过后关闭连接回收资源
    pub reader_idle: Duration,
    /// 写空闲阈值，超过后发送心跳；0 表示禁用
    pub writer_idle: Duration,
}

/// Worker 配置
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Worker ID
    pub id: usize,
    /// 新连接通道大小
    pub channel_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: 0,
            channel_size: 1024,
        }
    }
}

/// Worker 任务
///
/// 接收新连接并驱动连接生命周期
pub struct Worker {
    /// Worker ID
    id: usize,
    /// 接收新连接的通道
    rx: mpsc::Receiver<NewConnection>,
    /// 连接运行环境
    env: Arc<ConnectionEnv>,
    /// 活跃连接数
    active_connections: Arc<AtomicUsize>,
}

impl Worker {
    /// 创建新的 Worker
    pub(crate) fn new(
        config: WorkerConfig,
        env: Arc<ConnectionEnv>,
    ) -> (Self, mpsc::Sender<NewConnection>) {
        let (tx, rx) = mpsc::channel(config.channel_size);

        let worker = Self {
            id: config.id,
            rx,
            env,
            active_connections: Arc::new(AtomicUsize::new(0)),
        };

        (worker, tx)
    }

    /// 启动 Worker
    pub fn spawn(mut self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            debug!(worker_id = self.id, "Worker 启动");

            while let Some(conn) = self.rx.recv().await {
                let env = self.env.clone();
                let worker_id = self.id;
                let active = self.active_connections.clone();

                active.fetch_add(1, Ordering::Relaxed);
                tokio::spawn(async move {
                    run_connection(env, worker_id, conn).await;
                    active.fetch_sub(1, Ordering::Relaxed);
                });
            }

            debug!(worker_id = self.id, "Worker 通道关闭，退出");
            Ok(())
        })
    }

    /// 获取活跃连接数
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }
}

/// 空闲检查周期
///
/// 取各阈值中最小者的四分之一，避免检查粒度过粗导致超时明显滞后。
fn idle_tick_period(reader_idle: Duration, writer_idle: Duration) -> Duration {
    let mut shortest = reader_idle;
    if !writer_idle.is_zero() && writer_idle < shortest {
        shortest = writer_idle;
    }
    (shortest / 4).clamp(Duration::from_millis(20), Duration::from_secs(1))
}

/// 驱动单个连接的完整生命周期
///
/// 进入时注册会话，退出时置关闭标志并移除会话；关闭标志先于
/// 会话移除置位，保证拆除过程中不会再向该连接分发消息。
pub(crate) async fn run_connection(env: Arc<ConnectionEnv>, worker_id: usize, conn: NewConnection) {
    let NewConnection {
        stream,
        remote_addr,
    } = conn;

    let id = env.id_gen.next();
    let (read_half, write_half) = stream.into_split();
    let mut framed_read = FramedRead::new(read_half, MessageCodec::new());
    let framed_write = FramedWrite::new(write_half, MessageCodec::new());

    let (tx, rx) = mpsc::channel(128);
    let session = Arc::new(Session::new(id, remote_addr, tx));

    if let Err(e) = env.table.insert(session.clone()) {
        warn!(%remote_addr, "注册会话失败: {}", e.with_context(id));
        return;
    }
    info!(connection_id = %id, %remote_addr, worker_id, "连接建立");

    let writer = tokio::spawn(write_loop(framed_write, rx, session.clone()));
    let ctx = SessionContext::new(session.clone());

    let mut tick = tokio::time::interval(idle_tick_period(env.reader_idle, env.writer_idle));

    loop {
        tokio::select! {
            maybe = framed_read.next() => match maybe {
                Some(Ok(msg)) => {
                    session.touch_read();
                    match env.dispatcher.dispatch(&ctx, msg).await {
                        Ok(()) => {}
                        Err(DispatchError::ProtocolViolation { msg_type }) => {
                            warn!(
                                connection_id = %id,
                                %remote_addr,
                                msg_type,
                                "未认证连接跳过握手，关闭连接"
                            );
                            session.close().await;
                        }
                        Err(DispatchError::Processing(e)) => {
                            // 处理器错误不隐式关闭连接，策略由处理器显式决定
                            warn!(connection_id = %id, "消息处理失败: {}", e);
                        }
                    }
                }
                Some(Err(e)) => {
                    // 帧边界已不可信，不尝试恢复
                    warn!(connection_id = %id, %remote_addr, "帧解码失败，关闭连接: {}", e);
                    session.close().await;
                }
                None => {
                    debug!(connection_id = %id, "对端关闭连接");
                    break;
                }
            },
            _ = tick.tick() => {
                if session.read_idle() >= env.reader_idle {
                    info!(connection_id = %id, %remote_addr, "读空闲超时，关闭连接");
                    session.close().await;
                } else if !env.writer_idle.is_zero()
                    && session.write_idle() >= env.writer_idle
                {
                    let ping = ProtocolMessage::empty(
                        msg_type::HEARTBEAT_PING,
                        session.next_sequence(),
                    );
                    let _ = session.send(ping).await;
                }
            }
        }

        if session.is_closed() {
            break;
        }
    }

    // 拆除：关闭标志先置位，之后才移除会话并回收写任务
    session.close().await;
    let _ = env.table.remove(id);
    let _ = writer.await;
    info!(connection_id = %id, %remote_addr, "连接拆除完成");
}

/// 写任务
///
/// 按提交顺序写出消息；收到关闭指令时刷新缓冲并关闭写半边，
/// 保证关闭前已有的应答（例如认证失败消息）送达对端。
async fn write_loop(
    mut framed: FramedWrite<OwnedWriteHalf, MessageCodec>,
    mut rx: mpsc::Receiver<Outbound>,
    session: Arc<Session>,
) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            Outbound::Message(msg) => {
                if let Err(e) = framed.send(msg).await {
                    debug!(connection_id = %session.id(), "写出失败: {}", e);
                    break;
                }
                session.touch_write();
            }
            Outbound::Close => {
                let _ = framed.flush().await;
                let _ = framed.get_mut().shutdown().await;
                break;
            }
        }
    }
}
