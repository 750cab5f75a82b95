//! 连接会话
//!
//! 管理单连接的可变状态（认证状态、活跃时间、序列号）和
//! 全局会话表。

pub mod session;
pub mod table;

pub use session::{Session, SessionContext};
pub use table::SessionTable;

pub(crate) use session::Outbound;
