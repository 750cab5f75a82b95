//! 消息编解码器
//!
//! 基于 tokio-util 的流式编解码实现。编解码器无共享可变状态，
//! 线程安全地绑定在各自连接的 I/O 上下文中。

use crate::protocol::frame::{FrameError, ProtocolMessage};
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

/// 消息编码器
///
/// 将 [`ProtocolMessage`] 编码为字节流
#[derive(Debug, Clone, Default)]
pub struct MessageEncoder;

impl MessageEncoder {
    /// 创建新的编码器
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<ProtocolMessage> for MessageEncoder {
    type Error = FrameError;

    fn encode(&mut self, item: ProtocolMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.validate()?;
        dst.extend_from_slice(&item.encode());
        Ok(())
    }
}

/// 消息解码器
///
/// 从字节流解码 [`ProtocolMessage`]
#[derive(Debug, Clone, Default)]
pub struct MessageDecoder;

impl MessageDecoder {
    /// 创建新的解码器
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for MessageDecoder {
    type Item = ProtocolMessage;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        ProtocolMessage::decode(src)
    }
}

/// 编解码器组合
///
/// 同时提供编码和解码功能
#[derive(Debug, Clone, Default)]
pub struct MessageCodec {
    encoder: MessageEncoder,
    decoder: MessageDecoder,
}

impl MessageCodec {
    /// 创建新的编解码器
    pub fn new() -> Self {
        Self {
            encoder: MessageEncoder::new(),
            decoder: MessageDecoder::new(),
        }
    }
}

impl Encoder<ProtocolMessage> for MessageCodec {
    type Error = FrameError;

    fn encode(&mut self, item: ProtocolMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encoder.encode(item, dst)
    }
}

impl Decoder for MessageCodec {
    type Item = ProtocolMessage;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decoder.decode(src)
    }
}
