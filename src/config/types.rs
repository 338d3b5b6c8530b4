// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

use crate::cors::CorsSetting;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Runtime worker threads, CPU cores if unset
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Expose error chains in 500 responses
    #[serde(default)]
    pub debug: bool,
    /// Treat `/a` and `/a/` as different paths
    #[serde(default)]
    pub strict_slashes: bool,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: u64,
    #[serde(default)]
    pub cors: CorsSetting,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: false,
            strict_slashes: false,
            max_body_size: default_max_body_size(),
            cors: CorsSetting::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of `error`, `warn`, `info`, `debug`
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            access_log: true,
            access_log_format: default_access_log_format(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PerformanceConfig {
    #[serde(default = "default_true")]
    pub keep_alive: bool,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive: true,
            request_timeout: default_request_timeout(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_max_body_size() -> u64 {
    10_485_760
}

#[allow(clippy::missing_const_for_fn)]
fn default_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}
