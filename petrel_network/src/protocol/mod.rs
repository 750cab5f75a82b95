//! 帧协议
//!
//! 定义网关的二进制消息格式与流式编解码器。

pub mod codec;
pub mod frame;

pub use codec::{MessageCodec, MessageDecoder, MessageEncoder};
pub use frame::{FrameError, ProtocolMessage};

use std::time::{SystemTime, UNIX_EPOCH};

/// 消息类型编码
///
/// 封闭枚举，随协议版本演进。认证请求/应答是网关自身定义的类型，
/// 其余业务消息类型由上层协作方约定；未注册处理器的类型会被丢弃
/// 而非报错，以保证协议前后向兼容。
pub mod msg_type {
    /// 认证握手请求
    pub const AUTH_REQUEST: u16 = 1;
    /// 认证握手应答
    pub const AUTH_RESPONSE: u16 = 2;
    /// 心跳请求
    pub const HEARTBEAT_PING: u16 = 3;
    /// 心跳应答
    pub const HEARTBEAT_PONG: u16 = 4;
}

/// 认证应答负载取值
pub mod auth_result {
    /// 认证成功
    pub const SUCCESS: u8 = 1;
    /// 认证失败
    pub const FAILURE: u8 = 0;
}

/// 当前 Unix 毫秒时间戳
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_monotonic_epoch() {
        // 2020-01-01 之后
        assert!(now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_msg_type_codes_distinct() {
        let codes = [
            msg_type::AUTH_REQUEST,
            msg_type::AUTH_RESPONSE,
            msg_type::HEARTBEAT_PING,
            msg_type::HEARTBEAT_PONG,
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
