//! Node configuration.

use std::time::Duration;

/// Upper bound for `max_connections`.
pub const MAX_CONNECTIONS_LIMIT: usize = 1 << 20;

/// Smallest accepted `max_line_length`; a publish request with short
/// identifiers already takes around a hundred bytes.
pub const MIN_LINE_LENGTH: usize = 256;

/// Main node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port. `0` asks the OS for a free port.
    pub listen_port: u16,
    /// Maximum concurrently served connections.
    pub max_connections: usize,
    /// Longest accepted request line in bytes, newline excluded.
    pub max_line_length: usize,
    /// How long open connections may keep running after shutdown starts.
    pub shutdown_grace_period: Duration,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 9090,
            max_connections: 1024,
            max_line_length: 64 * 1024,
            shutdown_grace_period: Duration::from_secs(5),
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("RATEMESH_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Ok(port) = std::env::var("RATEMESH_LISTEN_PORT") {
            if let Ok(port) = port.parse() {
                config.listen_port = port;
            }
        }

        if let Ok(max) = std::env::var("RATEMESH_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse() {
                config.max_connections = max;
            }
        }

        if let Ok(bytes) = std::env::var("RATEMESH_MAX_LINE_BYTES") {
            if let Ok(bytes) = bytes.parse() {
                config.max_line_length = bytes;
            }
        }

        if let Ok(secs) = std::env::var("RATEMESH_SHUTDOWN_GRACE_SECS") {
            if let Ok(secs) = secs.parse() {
                config.shutdown_grace_period = Duration::from_secs(secs);
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("Listen address cannot be empty".to_string());
        }

        if self.max_connections == 0 {
            return Err("Max connections must be at least 1".to_string());
        }

        if self.max_connections > MAX_CONNECTIONS_LIMIT {
            return Err(format!(
                "Max connections {} exceeds limit {}",
                self.max_connections, MAX_CONNECTIONS_LIMIT
            ));
        }

        if self.max_line_length < MIN_LINE_LENGTH {
            return Err(format!(
                "Max line length {} is below minimum {}",
                self.max_line_length, MIN_LINE_LENGTH
            ));
        }

        Ok(())
    }

    /// `addr:port` string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn test_invalid_config() {
        let mut config = NodeConfig::default();
        config.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.listen_addr = String::new();
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.max_connections = MAX_CONNECTIONS_LIMIT + 1;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.max_line_length = 16;
        assert!(config.validate().is_err());
    }
}
