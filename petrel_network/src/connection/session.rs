//! 会话状态
//!
//! 每个存活的 socket 对应一个 [`Session`]，随连接接受而创建、
//! 随连接关闭（空闲超时、认证失败或显式断开）而销毁，销毁后
//! 连接 ID 不会复用。

use crate::dispatch::ProcessingError;
use crate::protocol::ProtocolMessage;
use petrel_core::{ConnectionId, ConnectionState};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// 出站指令
///
/// 写任务按接收顺序处理，保证认证失败应答先于连接关闭送达。
#[derive(Debug)]
pub(crate) enum Outbound {
    /// 写出一条消息
    Message(ProtocolMessage),
    /// 刷新并关闭写半边
    Close,
}

/// 连接会话
///
/// 认证状态只允许 `未认证 → 已认证` 单向转移一次，不存在降级；
/// `closed` 置位后不再分发任何帧（包括已缓冲的帧，直接丢弃）。
#[derive(Debug)]
pub struct Session {
    /// 连接 ID
    id: ConnectionId,
    /// 对端地址
    remote_addr: SocketAddr,
    /// 认证状态（单次置位）
    authenticated: AtomicBool,
    /// 关闭标志，置位后分发器不再投递消息
    closed: AtomicBool,
    /// 会话创建时刻，空闲时间的计算基准
    created: Instant,
    /// 最近一次读相对创建时刻的毫秒数
    last_read_ms: AtomicU64,
    /// 最近一次写相对创建时刻的毫秒数
    last_write_ms: AtomicU64,
    /// 出站通道（写任务持有接收端）
    outbound: mpsc::Sender<Outbound>,
    /// 本端出站消息序列号
    sequence: AtomicU32,
}

impl Session {
    /// 创建新会话
    pub(crate) fn new(
        id: ConnectionId,
        remote_addr: SocketAddr,
        outbound: mpsc::Sender<Outbound>,
    ) -> Self {
        Self {
            id,
            remote_addr,
            authenticated: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            created: Instant::now(),
            last_read_ms: AtomicU64::new(0),
            last_write_ms: AtomicU64::new(0),
            outbound,
            sequence: AtomicU32::new(0),
        }
    }

    /// 连接 ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// 对端地址
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// 是否已通过认证
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    /// 标记认证通过
    ///
    /// 返回是否为首次置位；重复认证保持已认证状态不变。
    pub fn mark_authenticated(&self) -> bool {
        self.authenticated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// 是否已进入关闭状态
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 当前连接状态
    ///
    /// 由关闭、认证两个标志推导，关闭优先；分发器以此决定门禁。
    pub fn state(&self) -> ConnectionState {
        if self.is_closed() {
            ConnectionState::Closed
        } else if self.is_authenticated() {
            ConnectionState::Authenticated
        } else {
            ConnectionState::Unauthenticated
        }
    }

    /// 记录一次读活动
    pub fn touch_read(&self) {
        self.last_read_ms
            .store(self.created.elapsed().as_millis() as u64, Ordering::Release);
    }

    /// 记录一次写活动
    pub fn touch_write(&self) {
        self.last_write_ms
            .store(self.created.elapsed().as_millis() as u64, Ordering::Release);
    }

    /// 距最近一次读的时长
    pub fn read_idle(&self) -> Duration {
        let now_ms = self.created.elapsed().as_millis() as u64;
        let last = self.last_read_ms.load(Ordering::Acquire);
        Duration::from_millis(now_ms.saturating_sub(last))
    }

    /// 距最近一次写的时长
    pub fn write_idle(&self) -> Duration {
        let now_ms = self.created.elapsed().as_millis() as u64;
        let last = self.last_write_ms.load(Ordering::Acquire);
        Duration::from_millis(now_ms.saturating_sub(last))
    }

    /// 分配下一个出站序列号
    pub fn next_sequence(&self) -> u32 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// 写出一条消息
    ///
    /// 消息经出站通道交给写任务，同一连接内按提交顺序写出。
    pub async fn send(&self, msg: ProtocolMessage) -> Result<(), ProcessingError> {
        self.outbound
            .send(Outbound::Message(msg))
            .await
            .map_err(|_| ProcessingError::new("连接写通道已关闭"))
    }

    /// 请求关闭连接
    ///
    /// 先置关闭标志（分发器此后丢弃所有帧），再通知写任务刷新并
    /// 关闭写半边。可重复调用。
    pub async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let _ = self.outbound.send(Outbound::Close).await;
    }
}

/// 处理器视角的会话上下文
///
/// 处理器通过它写回应答或请求关闭连接。
#[derive(Debug, Clone)]
pub struct SessionContext {
    session: std::sync::Arc<Session>,
}

impl SessionContext {
    /// 创建上下文
    pub(crate) fn new(session: std::sync::Arc<Session>) -> Self {
        Self { session }
    }

    /// 访问会话
    pub fn session(&self) -> &std::sync::Arc<Session> {
        &self.session
    }

    /// 写回一条消息
    pub async fn send(&self, msg: ProtocolMessage) -> Result<(), ProcessingError> {
        self.session.send(msg).await
    }

    /// 请求关闭连接
    pub async fn close(&self) {
        self.session.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn make_session() -> (Session, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(16);
        let addr = "127.0.0.1:9000".parse().unwrap();
        (Session::new(ConnectionId::new(1), addr, tx), rx)
    }

    #[test]
    fn test_initial_state() {
        let (session, _rx) = make_session();
        assert!(!session.is_authenticated());
        assert!(!session.is_closed());
        assert_eq!(session.id().value(), 1);
    }

    #[test]
    fn test_mark_authenticated_once() {
        let (session, _rx) = make_session();
        // 首次置位成功，重复置位保持已认证
        assert!(session.mark_authenticated());
        assert!(!session.mark_authenticated());
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let (session, _rx) = make_session();
        assert_eq!(session.state(), ConnectionState::Unauthenticated);

        session.mark_authenticated();
        assert_eq!(session.state(), ConnectionState::Authenticated);

        // 关闭为终态，覆盖认证状态
        session.close().await;
        assert_eq!(session.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_sequence_monotonic() {
        let (session, _rx) = make_session();
        assert_eq!(session.next_sequence(), 0);
        assert_eq!(session.next_sequence(), 1);
        assert_eq!(session.next_sequence(), 2);
    }

    #[tokio::test]
    async fn test_send_and_close_ordering() {
        let (session, mut rx) = make_session();

        session
            .send(ProtocolMessage::new(2, 0, Bytes::from_static(&[0])))
            .await
            .unwrap();
        session.close().await;

        assert!(matches!(rx.recv().await, Some(Outbound::Message(_))));
        assert!(matches!(rx.recv().await, Some(Outbound::Close)));
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn test_idle_tracking() {
        let (session, _rx) = make_session();
        session.touch_read();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(session.read_idle() >= Duration::from_millis(20));

        session.touch_read();
        assert!(session.read_idle() < Duration::from_millis(20));
    }
}
