//! Configuration management for the learning server.
//!
//! Settings come from built-in defaults, an optional TOML file and
//! `MCP_LEARNING__<SECTION>__<KEY>` environment variables, in that order of
//! precedence (last wins).

use crate::error::{McpError, Result};
use crate::utils::validation::{validate_non_empty, validate_range};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "MCP_LEARNING";

/// Separator between prefix, section and key in environment overrides
pub const ENV_SEPARATOR: &str = "__";

/// Main configuration structure for the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Server information
    #[serde(default)]
    pub server: ServerConfig,

    /// Transport configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Feature configuration
    #[serde(default)]
    pub features: FeatureConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server name
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Server version
    #[serde(default = "default_server_version")]
    pub version: String,

    /// Server description/instructions
    #[serde(default = "default_instructions")]
    pub instructions: Option<String>,

    /// Per-request handler timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// Transport layer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Stdio transport settings
    #[serde(default)]
    pub stdio: StdioConfig,
}

/// Stdio transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdioConfig {
    /// Read buffer capacity in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Longest accepted input line in bytes
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Report transport errors on stderr
    #[serde(default = "default_true")]
    pub enable_stderr_logging: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Enable request/response logging
    #[serde(default = "default_enable_request_logging")]
    pub enable_request_logging: bool,
}

/// Log format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

/// Feature configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Enable resources feature
    #[serde(default = "default_true")]
    pub resources: bool,

    /// Enable tools feature
    #[serde(default = "default_true")]
    pub tools: bool,

    /// Enable prompts feature
    #[serde(default = "default_true")]
    pub prompts: bool,
}

// Default value functions
fn default_server_name() -> String {
    crate::SERVER_NAME.to_string()
}
fn default_server_version() -> String {
    crate::SERVER_VERSION.to_string()
}
fn default_instructions() -> Option<String> {
    Some(
        "Learning server for the Model Context Protocol: try the calculate, text-utils and \
         greeting tools, read learning-guide://mcp-basics, or fetch the code-review prompt."
            .to_string(),
    )
}
fn default_request_timeout() -> u64 {
    30
}
fn default_buffer_size() -> usize {
    8192
}
fn default_max_line_length() -> usize {
    1024 * 1024
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}
fn default_enable_request_logging() -> bool {
    false
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            version: default_server_version(),
            instructions: default_instructions(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for StdioConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            max_line_length: default_max_line_length(),
            enable_stderr_logging: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            enable_request_logging: default_enable_request_logging(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            resources: default_true(),
            tools: default_true(),
            prompts: default_true(),
        }
    }
}

impl ServerConfig {
    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Config {
    /// Load configuration: defaults, then the file if given, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::new(
                &path.to_string_lossy(),
                config::FileFormat::Toml,
            ));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR),
            )
            .build()
            .map_err(|e| McpError::Config(format!("Failed to load configuration: {}", e)))?;

        settings
            .try_deserialize()
            .map_err(|e| McpError::Config(format!("Failed to parse configuration: {}", e)))
    }

    /// Load configuration from a file, with environment overrides applied
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(Some(path.as_ref()))
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| McpError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| McpError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let invalid = |e: McpError| McpError::Config(e.to_string());

        validate_non_empty(&self.server.name, "server.name").map_err(invalid)?;
        validate_range(self.server.request_timeout, 1, 3600, "server.request_timeout")
            .map_err(invalid)?;
        validate_range(
            self.transport.stdio.buffer_size,
            1,
            usize::MAX,
            "transport.stdio.buffer_size",
        )
        .map_err(invalid)?;
        validate_range(
            self.transport.stdio.max_line_length,
            1,
            usize::MAX,
            "transport.stdio.max_line_length",
        )
        .map_err(invalid)?;

        validate_log_level(&self.logging.level)
    }
}

/// Check that a string names a log level (`off`, `error` .. `trace`)
pub fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<LevelFilter>()
        .map(|_| ())
        .map_err(|_| McpError::Config(format!("Unknown log level '{}'", level)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.name, crate::SERVER_NAME);
        assert_eq!(config.server.request_timeout(), Duration::from_secs(30));
        assert!(config.features.tools && config.features.resources && config.features.prompts);
    }

    #[test]
    fn test_file_round_trip_with_partial_sections() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("server.toml");

        let mut config = Config::default();
        config.server.name = "classroom".to_string();
        config.features.prompts = false;
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.server.name, "classroom");
        assert!(!loaded.features.prompts);

        let partial = temp_dir.path().join("partial.toml");
        std::fs::write(&partial, "[transport.stdio]\nmax_line_length = 4096\n").unwrap();
        let loaded = Config::from_file(&partial).unwrap();
        assert_eq!(loaded.transport.stdio.max_line_length, 4096);
        assert_eq!(loaded.server.name, crate::SERVER_NAME);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::from_file(temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(McpError::Config(_))));
    }

    #[test]
    fn test_environment_override() {
        std::env::set_var("MCP_LEARNING__TRANSPORT__STDIO__BUFFER_SIZE", "64");
        let loaded = Config::load(None);
        std::env::remove_var("MCP_LEARNING__TRANSPORT__STDIO__BUFFER_SIZE");

        assert_eq!(loaded.unwrap().transport.stdio.buffer_size, 64);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.server.request_timeout = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.name = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.transport.stdio.max_line_length = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "chatty".to_string();
        assert!(config.validate().is_err());

        assert!(validate_log_level("debug").is_ok());
        assert!(validate_log_level("off").is_ok());
    }
}
