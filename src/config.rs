//! Configuration module for the random-names server.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use crate::error::ConfigError;
use crate::protocol::MIN_HEADER_WIDTH;
use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Command-line arguments for the name server
#[derive(Parser, Debug, Default)]
#[command(name = "random-names")]
#[command(version)]
#[command(about = "Serves random baby names over a length-prefixed TCP protocol", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0:7567)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Maximum number of concurrent client sessions
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Width in bytes of the length header that precedes every message
    #[arg(long)]
    pub header_width: Option<usize>,

    /// Base URL of the name catalog
    #[arg(long)]
    pub catalog_url: Option<String>,

    /// Timeout for each catalog request in seconds
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Upper bound on concurrently running sessions
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Listen backlog handed to the kernel
    #[serde(default = "default_backlog")]
    pub backlog: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_connections: default_max_connections(),
            backlog: default_backlog(),
        }
    }
}

/// Wire protocol configuration
#[derive(Debug, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default = "default_header_width")]
    pub header_width: usize,
    /// Text sent back as soon as a request payload arrives
    #[serde(default = "default_ack_message")]
    pub ack_message: String,
    /// Largest payload accepted from a client, in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            header_width: default_header_width(),
            ack_message: default_ack_message(),
            max_message_size: default_max_message_size(),
        }
    }
}

/// Per-session timing
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Seconds to wait for the request frame (0 = wait forever)
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Milliseconds to wait for the client to close after the last reply
    #[serde(default = "default_linger_timeout_ms")]
    pub linger_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: default_read_timeout_secs(),
            linger_timeout_ms: default_linger_timeout_ms(),
        }
    }
}

/// Name catalog provider configuration
#[derive(Debug, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Names listed per catalog page
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Names returned per request
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            page_size: default_page_size(),
            sample_size: default_sample_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:7567".to_string()
}

fn default_max_connections() -> usize {
    1024
}

fn default_backlog() -> i32 {
    1024
}

fn default_header_width() -> usize {
    64
}

fn default_ack_message() -> String {
    "Message received".to_string()
}

fn default_max_message_size() -> usize {
    1024 * 1024 // 1 MB
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_linger_timeout_ms() -> u64 {
    3000
}

fn default_base_url() -> String {
    "https://www.momjunction.com/baby-names".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_page_size() -> u64 {
    100
}

fn default_sample_size() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    pub max_connections: usize,
    pub backlog: i32,
    pub header_width: usize,
    pub ack_message: String,
    pub max_message_size: usize,
    pub read_timeout: Option<Duration>,
    pub linger_timeout: Duration,
    pub catalog_url: String,
    pub request_timeout: Duration,
    pub page_size: u64,
    pub sample_size: usize,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::FileRead {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&contents).map_err(|e| ConfigError::TomlParse {
                path: config_path.clone(),
                source: e,
            })?
        } else {
            TomlConfig::default()
        };

        Self::merge(cli, toml_config)
    }

    /// Merge CLI args over TOML values and validate the result.
    pub fn merge(cli: CliArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let listen = cli.listen.unwrap_or(toml_config.server.listen);
        let listen: SocketAddr = listen
            .parse()
            .map_err(|_| ConfigError::InvalidListen(listen.clone()))?;

        let read_timeout = match toml_config.session.read_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let config = Config {
            listen,
            max_connections: cli
                .max_connections
                .unwrap_or(toml_config.server.max_connections),
            backlog: toml_config.server.backlog,
            header_width: cli
                .header_width
                .unwrap_or(toml_config.protocol.header_width),
            ack_message: toml_config.protocol.ack_message,
            max_message_size: toml_config.protocol.max_message_size,
            read_timeout,
            linger_timeout: Duration::from_millis(toml_config.session.linger_timeout_ms),
            catalog_url: cli.catalog_url.unwrap_or(toml_config.catalog.base_url),
            request_timeout: Duration::from_secs(
                cli.request_timeout
                    .unwrap_or(toml_config.catalog.request_timeout_secs),
            ),
            page_size: toml_config.catalog.page_size,
            sample_size: toml_config.catalog.sample_size,
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the protocol or the catalog client cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.header_width < MIN_HEADER_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "header_width must be at least {MIN_HEADER_WIDTH}"
            )));
        }
        let max_digits = self.max_message_size.to_string().len();
        if max_digits > self.header_width {
            return Err(ConfigError::Invalid(format!(
                "max_message_size {} needs {max_digits} digits but header_width is {}",
                self.max_message_size, self.header_width
            )));
        }
        if self.ack_message.len().to_string().len() > self.header_width {
            return Err(ConfigError::Invalid(
                "ack_message is too long for header_width".into(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be at least 1".into()));
        }
        if self.max_connections > Semaphore::MAX_PERMITS {
            return Err(ConfigError::Invalid(format!(
                "max_connections must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        if self.sample_size == 0 {
            return Err(ConfigError::Invalid("sample_size must be at least 1".into()));
        }
        Ok(())
    }
}
