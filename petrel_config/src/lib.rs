//! 配置管理系统
//!
//! 提供网关服务端与客户端的配置加载，支持 TOML 文件和环境变量覆盖。
//! 配置在启动阶段构建完成后按值传递，运行期不可变。

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析配置文件失败: {0}")]
    Parse(String),

    /// 验证错误
    #[error("配置验证失败: {0}")]
    Validation(String),

    /// 环境变量错误
    #[error("环境变量解析失败: {0}")]
    EnvVar(String),
}

/// 配置 Result 类型
pub type Result<T> = std::result::Result<T, ConfigError>;

/// 服务端配置
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 绑定地址
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// 监听端口（0 表示由系统分配临时端口）
    #[serde(default = "default_port")]
    pub port: u16,

    /// Boss 任务数量（accept 循环并发度）
    #[serde(default = "default_boss_threads")]
    pub boss_threads: usize,

    /// 工作线程数量（None 表示使用 CPU 核心数）
    #[serde(default)]
    pub worker_threads: Option<usize>,

    /// 待决连接队列深度（传入 listen 的 backlog）
    #[serde(default = "default_backlog")]
    pub backlog: u32,

    /// 读空闲阈值（秒），超过后关闭连接
    #[serde(default = "default_reader_idle_secs")]
    pub reader_idle_secs: u64,

    /// 写空闲阈值（秒），超过后发送心跳保活
    #[serde(default = "default_writer_idle_secs")]
    pub writer_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            boss_threads: default_boss_threads(),
            worker_threads: None,
            backlog: default_backlog(),
            reader_idle_secs: default_reader_idle_secs(),
            writer_idle_secs: default_writer_idle_secs(),
        }
    }
}

impl ServerConfig {
    /// 从环境变量加载配置并覆盖
    ///
    /// 支持的环境变量：
    /// - PETREL_BIND_ADDRESS: 绑定地址
    /// - PETREL_PORT: 端口
    /// - PETREL_BOSS_THREADS: Boss 任务数
    /// - PETREL_WORKER_THREADS: 工作线程数
    /// - PETREL_BACKLOG: 待决连接队列深度
    /// - PETREL_READER_IDLE_SECS: 读空闲阈值（秒）
    /// - PETREL_WRITER_IDLE_SECS: 写空闲阈值（秒）
    pub fn load_with_env_override(mut self) -> Result<Self> {
        if let Ok(addr) = std::env::var("PETREL_BIND_ADDRESS") {
            self.bind_address = addr;
        }

        if let Ok(port_str) = std::env::var("PETREL_PORT") {
            self.port = port_str
                .parse()
                .map_err(|_| ConfigError::EnvVar("PETREL_PORT 必须是有效的 u16 数字".to_string()))?;
        }

        if let Ok(boss) = std::env::var("PETREL_BOSS_THREADS") {
            self.boss_threads = boss.parse().map_err(|_| {
                ConfigError::EnvVar("PETREL_BOSS_THREADS 必须是有效的 usize 数字".to_string())
            })?;
        }

        if let Ok(threads) = std::env::var("PETREL_WORKER_THREADS") {
            self.worker_threads = Some(threads.parse().map_err(|_| {
                ConfigError::EnvVar("PETREL_WORKER_THREADS 必须是有效的 usize 数字".to_string())
            })?);
        }

        if let Ok(backlog) = std::env::var("PETREL_BACKLOG") {
            self.backlog = backlog.parse().map_err(|_| {
                ConfigError::EnvVar("PETREL_BACKLOG 必须是有效的 u32 数字".to_string())
            })?;
        }

        if let Ok(idle) = std::env::var("PETREL_READER_IDLE_SECS") {
            self.reader_idle_secs = idle.parse().map_err(|_| {
                ConfigError::EnvVar("PETREL_READER_IDLE_SECS 必须是有效的 u64 数字".to_string())
            })?;
        }

        if let Ok(idle) = std::env::var("PETREL_WRITER_IDLE_SECS") {
            self.writer_idle_secs = idle.parse().map_err(|_| {
                ConfigError::EnvVar("PETREL_WRITER_IDLE_SECS 必须是有效的 u64 数字".to_string())
            })?;
        }

        Ok(self)
    }

    /// 验证配置是否有效
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.is_empty() {
            return Err(ConfigError::Validation("绑定地址不能为空".to_string()));
        }

        if self.boss_threads == 0 {
            return Err(ConfigError::Validation("Boss 任务数不能为 0".to_string()));
        }

        if let Some(threads) = self.worker_threads {
            if threads == 0 {
                return Err(ConfigError::Validation("工作线程数不能为 0".to_string()));
            }
            if threads > 512 {
                return Err(ConfigError::Validation(
                    "工作线程数过大 (建议 <= 512)".to_string(),
                ));
            }
        }

        if self.backlog == 0 {
            return Err(ConfigError::Validation("backlog 不能为 0".to_string()));
        }

        if self.reader_idle_secs == 0 {
            return Err(ConfigError::Validation("读空闲阈值不能为 0".to_string()));
        }

        Ok(())
    }

    /// 获取完整的绑定地址字符串
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// 读空闲阈值
    pub fn reader_idle(&self) -> Duration {
        Duration::from_secs(self.reader_idle_secs)
    }

    /// 写空闲阈值
    pub fn writer_idle(&self) -> Duration {
        Duration::from_secs(self.writer_idle_secs)
    }
}

/// 客户端配置
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// 服务端主机
    #[serde(default = "default_server_host")]
    pub server_host: String,

    /// 服务端端口
    #[serde(default = "default_port")]
    pub server_port: u16,

    /// 连接超时（毫秒）
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// 读空闲阈值（毫秒），超过后视为连接失效并触发重连
    #[serde(default = "default_client_reader_idle_ms")]
    pub reader_idle_ms: u64,

    /// 写空闲阈值（毫秒），超过后发送心跳
    #[serde(default = "default_client_writer_idle_ms")]
    pub writer_idle_ms: u64,

    /// 重连间隔（毫秒），固定间隔，不做指数退避
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// 最大重连次数，达到后放弃并上报致命错误
    #[serde(default = "default_max_reconnect_times")]
    pub max_reconnect_times: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_host: default_server_host(),
            server_port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            reader_idle_ms: default_client_reader_idle_ms(),
            writer_idle_ms: default_client_writer_idle_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_times: default_max_reconnect_times(),
        }
    }
}

impl ClientConfig {
    /// 验证配置是否有效
    pub fn validate(&self) -> Result<()> {
        if self.server_host.is_empty() {
            return Err(ConfigError::Validation("服务端主机不能为空".to_string()));
        }

        if self.server_port == 0 {
            return Err(ConfigError::Validation("服务端端口不能为 0".to_string()));
        }

        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::Validation("连接超时不能为 0".to_string()));
        }

        if self.max_reconnect_times == 0 {
            return Err(ConfigError::Validation("最大重连次数不能为 0".to_string()));
        }

        Ok(())
    }

    /// 获取服务端完整地址字符串
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// 网关完整配置（服务端 + 客户端）
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// 服务端配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 客户端配置
    #[serde(default)]
    pub client: ClientConfig,
}

impl GatewayConfig {
    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("读取配置文件失败: {}", e)))?;

        let config: GatewayConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("解析配置文件失败: {}", e)))?;

        Ok(config)
    }

    /// 从文件加载并应用环境变量覆盖
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.server = config.server.load_with_env_override()?;
        Ok(config)
    }

    /// 验证配置是否有效
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.client.validate()?;
        Ok(())
    }
}

// 默认值函数
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8520
}

fn default_boss_threads() -> usize {
    1
}

fn default_backlog() -> u32 {
    1024
}

fn default_reader_idle_secs() -> u64 {
    60
}

fn default_writer_idle_secs() -> u64 {
    30
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_client_reader_idle_ms() -> u64 {
    90_000
}

fn default_client_writer_idle_ms() -> u64 {
    20_000
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_max_reconnect_times() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 8520);
        assert_eq!(config.boss_threads, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_validate_ephemeral_port_allowed() {
        // 端口 0 表示由系统分配，属于合法配置
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_worker_threads() {
        let config = ServerConfig {
            worker_threads: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            worker_threads: Some(1000),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_backlog() {
        let config = ServerConfig {
            backlog: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_client_config() {
        let config = ClientConfig::default();
        assert_eq!(config.server_addr(), "127.0.0.1:8520");
        assert_eq!(config.reconnect_delay_ms, 3000);
        assert_eq!(config.max_reconnect_times, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_validate_zero_reconnect() {
        let config = ClientConfig {
            max_reconnect_times: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gateway_config_from_toml() {
        let toml_str = r#"
            [server]
            port = 9100
            reader_idle_secs = 30

            [client]
            server_host = "10.0.0.2"
            server_port = 9100
            max_reconnect_times = 3
        "#;

        let config: GatewayConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.reader_idle_secs, 30);
        // 未出现的字段取默认值
        assert_eq!(config.server.backlog, 1024);
        assert_eq!(config.client.server_host, "10.0.0.2");
        assert_eq!(config.client.max_reconnect_times, 3);
        assert!(config.validate().is_ok());
    }

    // 环境变量是进程级状态，合并为单个用例避免并发测试互相干扰
    #[test]
    fn test_env_override() {
        std::env::set_var("PETREL_PORT", "9999");
        std::env::set_var("PETREL_BACKLOG", "256");

        let config = ServerConfig::default().load_with_env_override().unwrap();
        assert_eq!(config.port, 9999);
        assert_eq!(config.backlog, 256);

        std::env::set_var("PETREL_PORT", "not-a-number");
        assert!(ServerConfig::default().load_with_env_override().is_err());

        std::env::remove_var("PETREL_PORT");
        std::env::remove_var("PETREL_BACKLOG");
    }
}
