//! Cobranza configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CobranzaConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub sending: SendingConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl CobranzaConfig {
    /// Load config from the default path (~/.cobranza/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::CobranzaError::Config(format!("Failed to read config: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::CobranzaError::Config(format!("Failed to parse config: {e}"))
        })?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| {
            crate::error::CobranzaError::Config(format!("Failed to serialize config: {e}"))
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Cobranza home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cobranza")
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3001
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Chat transport (bridge sidecar) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_bridge_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_token: String,
    /// Delay before re-opening the connection after a non-logout close.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    /// How long the deeplink fallback waits for the input surface.
    #[serde(default = "default_deeplink_ready_timeout")]
    pub deeplink_ready_timeout_ms: u64,
    /// Settle period after a deeplink submit.
    #[serde(default = "default_deeplink_settle")]
    pub deeplink_settle_ms: u64,
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:8750".into()
}
fn default_reconnect_delay() -> u64 {
    5000
}
fn default_deeplink_ready_timeout() -> u64 {
    15000
}
fn default_deeplink_settle() -> u64 {
    3000
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_bridge_url(),
            api_token: String::new(),
            reconnect_delay_ms: default_reconnect_delay(),
            deeplink_ready_timeout_ms: default_deeplink_ready_timeout(),
            deeplink_settle_ms: default_deeplink_settle(),
        }
    }
}

/// Sending discipline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendingConfig {
    /// Monthly reporting ceiling. Informational only — never blocks sends.
    #[serde(default = "default_monthly_limit")]
    pub monthly_limit: u32,
    /// Hard per-call batch size cap.
    #[serde(default = "default_batch_cap")]
    pub batch_cap: usize,
    /// Default inter-item delay inside a batch.
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,
    /// Maximum message excerpt length stored in the ledger.
    #[serde(default = "default_excerpt_len")]
    pub message_excerpt_len: usize,
}

fn default_monthly_limit() -> u32 {
    1500
}
fn default_batch_cap() -> usize {
    30
}
fn default_batch_delay() -> u64 {
    2000
}
fn default_excerpt_len() -> usize {
    200
}

impl Default for SendingConfig {
    fn default() -> Self {
        Self {
            monthly_limit: default_monthly_limit(),
            batch_cap: default_batch_cap(),
            batch_delay_ms: default_batch_delay(),
            message_excerpt_len: default_excerpt_len(),
        }
    }
}

/// Notification ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_dir")]
    pub dir: String,
    #[serde(default = "default_ledger_capacity")]
    pub capacity: usize,
}

fn default_ledger_dir() -> String {
    "~/.cobranza/logs".into()
}
fn default_ledger_capacity() -> usize {
    1000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            dir: default_ledger_dir(),
            capacity: default_ledger_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CobranzaConfig::default();
        assert_eq!(config.gateway.port, 3001);
        assert_eq!(config.sending.monthly_limit, 1500);
        assert_eq!(config.sending.batch_cap, 30);
        assert_eq!(config.sending.batch_delay_ms, 2000);
        assert_eq!(config.transport.reconnect_delay_ms, 5000);
        assert_eq!(config.ledger.capacity, 1000);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [gateway]
            port = 8080

            [transport]
            base_url = "http://10.0.0.5:9000"
            reconnect_delay_ms = 1000

            [sending]
            batch_cap = 10
        "#;

        let config: CobranzaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.transport.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.transport.reconnect_delay_ms, 1000);
        assert_eq!(config.sending.batch_cap, 10);
        // untouched sections keep defaults
        assert_eq!(config.sending.monthly_limit, 1500);
        assert_eq!(config.ledger.capacity, 1000);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: CobranzaConfig = toml::from_str("").unwrap();
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.transport.deeplink_settle_ms, 3000);
    }

    #[test]
    fn test_home_dir() {
        let home = CobranzaConfig::home_dir();
        assert!(home.to_string_lossy().contains("cobranza"));
    }
}
