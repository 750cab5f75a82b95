//! Client configuration

use crate::error::{ClientError, Result};
use bytes::Bytes;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address to connect to ("host:port")
    pub server_addr: String,

    /// Connection and handshake timeout
    pub connect_timeout: Duration,

    /// Credential payload sent in the authentication handshake
    pub auth_token: Bytes,

    /// Read-idle threshold: no server traffic for this long drops the
    /// connection and triggers a reconnect
    pub reader_idle: Duration,

    /// Write-idle threshold: no outgoing traffic for this long sends a
    /// heartbeat ping (zero disables)
    pub writer_idle: Duration,

    /// Fixed delay between reconnect attempts
    pub reconnect_delay: Duration,

    /// Max consecutive reconnect attempts before giving up
    pub max_reconnect_times: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8520".to_string(),
            connect_timeout: Duration::from_secs(5),
            auth_token: Bytes::new(),
            reader_idle: Duration::from_secs(90),
            writer_idle: Duration::from_secs(20),
            reconnect_delay: Duration::from_secs(3),
            max_reconnect_times: 5,
        }
    }
}

impl ClientConfig {
    /// Create new client config
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            ..Default::default()
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set authentication token
    pub fn with_auth_token(mut self, token: impl Into<Bytes>) -> Self {
        self.auth_token = token.into();
        self
    }

    /// Set read-idle threshold
    pub fn with_reader_idle(mut self, idle: Duration) -> Self {
        self.reader_idle = idle;
        self
    }

    /// Set write-idle threshold
    pub fn with_writer_idle(mut self, idle: Duration) -> Self {
        self.writer_idle = idle;
        self
    }

    /// Set reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set max reconnect attempts
    pub fn with_max_reconnect_times(mut self, max: u32) -> Self {
        self.max_reconnect_times = max;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server_addr.is_empty() {
            return Err(ClientError::InvalidConfig(
                "server_addr cannot be empty".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "connect_timeout must be greater than 0".to_string(),
            ));
        }
        if self.reader_idle.is_zero() {
            return Err(ClientError::InvalidConfig(
                "reader_idle must be greater than 0".to_string(),
            ));
        }
        if self.reconnect_delay.is_zero() {
            return Err(ClientError::InvalidConfig(
                "reconnect_delay must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<petrel_config::ClientConfig> for ClientConfig {
    fn from(cfg: petrel_config::ClientConfig) -> Self {
        Self {
            server_addr: cfg.server_addr(),
            connect_timeout: Duration::from_millis(cfg.connect_timeout_ms),
            auth_token: Bytes::new(),
            reader_idle: Duration::from_millis(cfg.reader_idle_ms),
            writer_idle: Duration::from_millis(cfg.writer_idle_ms),
            reconnect_delay: Duration::from_millis(cfg.reconnect_delay_ms),
            max_reconnect_times: cfg.max_reconnect_times,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.server_addr, "127.0.0.1:8520");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.max_reconnect_times, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("127.0.0.1:9000")
            .with_connect_timeout(Duration::from_secs(10))
            .with_auth_token("secret")
            .with_reconnect_delay(Duration::from_secs(2))
            .with_max_reconnect_times(3);

        assert_eq!(config.server_addr, "127.0.0.1:9000");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.auth_token, Bytes::from("secret"));
        assert_eq!(config.reconnect_delay, Duration::from_secs(2));
        assert_eq!(config.max_reconnect_times, 3);
    }

    #[test]
    fn test_validate_rejects_zero_thresholds() {
        let config = ClientConfig::new("").with_connect_timeout(Duration::from_secs(1));
        assert!(config.validate().is_err());

        let config = ClientConfig::new("127.0.0.1:9000").with_reader_idle(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_based_config() {
        let file_cfg = petrel_config::ClientConfig::default();
        let config = ClientConfig::from(file_cfg.clone());
        assert_eq!(config.server_addr, file_cfg.server_addr());
        assert_eq!(
            config.reconnect_delay,
            Duration::from_millis(file_cfg.reconnect_delay_ms)
        );
    }
}
