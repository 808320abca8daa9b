//! Configuration module for fxchat.

use serde::Deserialize;
use std::path::Path;

use crate::{FxChatError, Result};

/// Environment variable overriding `exchange.api_url`.
pub const RATES_URL_ENV: &str = "FXCHAT_RATES_URL";

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of outbound messages queued per session before senders wait.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_outbound_buffer() -> usize {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

/// Exchange rate provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// Archive endpoint; the date is appended as the `date` query parameter.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total timeout per request in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.privatbank.ua/p24api/exchange_rates".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_timeout() -> u64 {
    10
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Path to the append-only audit file.
    #[serde(default = "default_audit_file")]
    pub file: String,
}

fn default_audit_file() -> String {
    "exchange.log".to_string()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            file: default_audit_file(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty disables file output.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/fxchat.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Exchange rate provider configuration.
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// Audit log configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FxChatError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FxChatError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FXCHAT_RATES_URL`: Override the exchange rate archive endpoint
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(RATES_URL_ENV) {
            if !url.is_empty() {
                self.exchange.api_url = url;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.exchange.api_url).map_err(|e| {
            FxChatError::Validation(format!(
                "exchange.api_url '{}' is not a valid URL: {e}",
                self.exchange.api_url
            ))
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(FxChatError::Validation(format!(
                    "exchange.api_url uses unsupported scheme: {scheme}"
                )));
            }
        }

        if self.exchange.connect_timeout_secs == 0 || self.exchange.timeout_secs == 0 {
            return Err(FxChatError::Validation(
                "exchange timeouts must be greater than zero".to_string(),
            ));
        }

        if self.server.outbound_buffer == 0 {
            return Err(FxChatError::Validation(
                "server.outbound_buffer must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
