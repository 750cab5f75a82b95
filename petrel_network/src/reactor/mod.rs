//! TCP 网关 Reactor
//!
//! Acceptor / Worker 模型：少量 boss 任务负责 accept，新连接经
//! 轮询均衡器分配给 Worker；每个连接在其 Worker 上以单任务串行
//! 处理（读 → 解码 → 分发 → 写），连接生命周期内不迁移。

pub mod acceptor;
pub mod gateway;
pub mod worker;

pub use acceptor::{Acceptor, NewConnection};
pub use gateway::Gateway;
pub use worker::{Worker, WorkerConfig};
