//! 消息帧
//!
//! 定义网关消息的帧格式。

use crate::protocol::now_millis;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use petrel_core::GatewayError;
use std::fmt;
use thiserror::Error;

/// 协议消息
///
/// 网关通信的基本单元，采用显式长度前缀格式（大端序）：
///
/// ```text
/// +----------+----------+-----------+-------------+----------+
/// | Msg Type | Sequence | Timestamp | Payload Len | Payload  |
/// |  2 bytes |  4 bytes |  8 bytes  |   4 bytes   | variable |
/// +----------+----------+-----------+-------------+----------+
/// ```
///
/// 负载是不透明的字节序列，由 `msg_type` 对应的处理器解释；
/// 长度为 0 的负载是合法的（例如纯 ACK）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolMessage {
    /// 消息类型编码，决定由哪个处理器处理
    pub msg_type: u16,
    /// 连接内单调分配的序列号，用于请求/应答关联
    pub sequence: u32,
    /// 消息创建时间（Unix 毫秒）
    pub timestamp: i64,
    /// 消息负载
    pub payload: Bytes,
}

impl ProtocolMessage {
    /// 帧头大小（消息类型 + 序列号 + 时间戳 + 负载长度）
    pub const HEADER_SIZE: usize = 2 + 4 + 8 + 4;

    /// 最大负载大小（1MB）
    pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

    /// 创建新消息，时间戳取当前时间
    pub fn new(msg_type: u16, sequence: u32, payload: Bytes) -> Self {
        Self {
            msg_type,
            sequence,
            timestamp: now_millis(),
            payload,
        }
    }

    /// 创建无负载的消息
    pub fn empty(msg_type: u16, sequence: u32) -> Self {
        Self::new(msg_type, sequence, Bytes::new())
    }

    /// 完整帧大小
    pub fn frame_size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }

    /// 编码为字节流
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.frame_size());
        buf.put_u16(self.msg_type);
        buf.put_u32(self.sequence);
        buf.put_i64(self.timestamp);
        buf.put_u32(self.payload.len() as u32);
        buf.put(self.payload.clone());
        buf
    }

    /// 从字节流解码
    ///
    /// 返回 `Ok(None)` 表示数据不完整，需要更多字节；只有在解出
    /// 完整一帧时才消费缓冲区。负载长度超出上限视为帧损坏，此时
    /// 帧边界已不可信，调用方应关闭连接。
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, FrameError> {
        if buf.len() < Self::HEADER_SIZE {
            return Ok(None);
        }

        // 先探测负载长度，不消费字节
        let mut peek = &buf[Self::HEADER_SIZE - 4..Self::HEADER_SIZE];
        let payload_len = peek.get_u32() as usize;

        if payload_len > Self::MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge(payload_len));
        }

        if buf.len() < Self::HEADER_SIZE + payload_len {
            return Ok(None);
        }

        let msg_type = buf.get_u16();
        let sequence = buf.get_u32();
        let timestamp = buf.get_i64();
        let _payload_len = buf.get_u32();
        let payload = buf.split_to(payload_len).freeze();

        Ok(Some(Self {
            msg_type,
            sequence,
            timestamp,
            payload,
        }))
    }

    /// 检查帧是否可编码
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.payload.len() > Self::MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge(self.payload.len()));
        }
        Ok(())
    }
}

impl fmt::Display for ProtocolMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message[type={}, seq={}, payload_len={}]",
            self.msg_type,
            self.sequence,
            self.payload.len()
        )
    }
}

/// 帧错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// 负载超出上限
    #[error("负载过大: {0} 字节")]
    PayloadTooLarge(usize),
    /// 无效的帧格式
    #[error("无效的帧格式: {0}")]
    InvalidFormat(String),
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        FrameError::Io(err.to_string())
    }
}

impl From<FrameError> for GatewayError {
    fn from(err: FrameError) -> Self {
        GatewayError::malformed_frame(err.to_string())
    }
}
