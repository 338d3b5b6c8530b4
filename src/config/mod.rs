// Configuration module entry point
// Loads layered configuration: file, then RESTGLUE_* environment variables, then defaults

mod types;

use std::net::SocketAddr;

use config::{Environment, File, FileFormat};

pub use types::{AppConfig, Config, LoggingConfig, PerformanceConfig, ServerConfig};

use crate::error::{Error, Result};

/// Environment variable prefix, e.g. `RESTGLUE_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "RESTGLUE";

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

impl Config {
    /// Load configuration from specified file path (without extension)
    /// The file is optional; environment variables override it
    pub fn load_from(config_path: &str) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::build(builder)
    }

    /// Parse a TOML document, filling in the same defaults as [`Config::load_from`]
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::build(config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn build(builder: Builder) -> Result<Self> {
        let settings = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("app.debug", false)?
            .set_default("app.strict_slashes", false)?
            .set_default("app.max_body_size", 10_485_760)? // 10MB
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.request_timeout", 30)?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse().map_err(|_| Error::InvalidAddress(addr))
    }
}
