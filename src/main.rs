//! MCP learning server CLI.
//!
//! Entry point for the server binary.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use mcp_learning_server::config::validate_log_level;
use mcp_learning_server::utils::format_duration;
use mcp_learning_server::utils::logging::init_logging;
use mcp_learning_server::{Config, McpError, McpServer};

/// MCP learning server CLI
#[derive(Parser)]
#[command(name = "mcp-learning-server")]
#[command(about = "A Model Context Protocol (MCP) learning server over stdio")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging (forces debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level, overriding the configuration file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server on stdio (default)
    Start {
        /// Server name
        #[arg(long)]
        name: Option<String>,

        /// Server instructions
        #[arg(long)]
        instructions: Option<String>,

        /// Per-request handler timeout in seconds
        #[arg(long)]
        request_timeout: Option<u64>,
    },

    /// Generate a default configuration file
    Config {
        /// Output file path
        #[arg(short, long, default_value = "mcp-learning-server.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show server information
    Info,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        validate_log_level(level)?;
        config.logging.level = level.clone();
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    init_logging(&config.logging)?;

    let serving = matches!(cli.command, None | Some(Commands::Start { .. }));
    let result = match cli.command {
        Some(Commands::Start {
            name,
            instructions,
            request_timeout,
        }) => {
            if let Some(name) = name {
                config.server.name = name;
            }
            if let Some(instructions) = instructions {
                config.server.instructions = Some(instructions);
            }
            if let Some(seconds) = request_timeout {
                config.server.request_timeout = seconds;
            }
            start_server(config).await
        }
        Some(Commands::Config { output, force }) => generate_config(&output, force),
        Some(Commands::Validate { file }) => validate_config(&file),
        Some(Commands::Info) => {
            show_info(&config);
            Ok(())
        }
        None => start_server(config).await,
    };

    if let Err(e) = &result {
        error!("{}", e);
    }
    result?;

    if serving {
        // After Ctrl-C the stdin reader is still parked in a blocking read,
        // which would hold up runtime shutdown indefinitely
        std::process::exit(0);
    }
    Ok(())
}

/// Start the server and block until it stops
async fn start_server(config: Config) -> Result<(), McpError> {
    info!("Starting {} v{}", config.server.name, config.server.version);

    let server = McpServer::new(config)?;
    if let Some(instructions) = &server.config().server.instructions {
        info!("Instructions: {}", instructions);
    }

    server.run().await
}

/// Generate a default configuration file
fn generate_config(output: &Path, force: bool) -> Result<(), McpError> {
    if output.exists() && !force {
        return Err(McpError::Config(format!(
            "Configuration file already exists: {} (use --force to overwrite)",
            output.display()
        )));
    }

    Config::default().to_file(output)?;

    info!("Generated configuration file: {}", output.display());
    Ok(())
}

/// Validate a configuration file
fn validate_config(file: &Path) -> Result<(), McpError> {
    info!("Validating configuration file: {}", file.display());

    let config = Config::from_file(file)?;
    config.validate()?;

    info!("Configuration file is valid");
    Ok(())
}

/// Show server information
fn show_info(config: &Config) {
    info!("{}", config.server.name);
    info!("Version: {}", config.server.version);
    info!("Protocol Version: {}", mcp_learning_server::PROTOCOL_VERSION);
    info!("Description: {}", env!("CARGO_PKG_DESCRIPTION"));
    info!("--------------------------------");
    info!("Transport: stdio (newline-delimited JSON-RPC)");
    info!(
        "Features: tools={} resources={} prompts={}",
        config.features.tools, config.features.resources, config.features.prompts
    );
    info!(
        "Request timeout: {}",
        format_duration(config.server.request_timeout())
    );
    info!("--------------------------------");
    info!("Repository: {}", env!("CARGO_PKG_REPOSITORY"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["mcp-learning-server", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from([
            "mcp-learning-server",
            "start",
            "--name",
            "classroom",
            "--request-timeout",
            "5",
            "--log-level",
            "warn",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("warn"));

        match cli.command {
            Some(Commands::Start {
                name,
                request_timeout,
                ..
            }) => {
                assert_eq!(name.as_deref(), Some("classroom"));
                assert_eq!(request_timeout, Some(5));
            }
            _ => panic!("Expected Start command"),
        }
    }

    #[test]
    fn test_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("server.toml");

        assert!(generate_config(&config_path, false).is_ok());
        assert!(config_path.exists());
        assert!(validate_config(&config_path).is_ok());

        assert!(generate_config(&config_path, false).is_err());
        assert!(generate_config(&config_path, true).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        std::fs::write(&config_path, "[server]\nrequest_timeout = 0\n").unwrap();

        assert!(validate_config(&config_path).is_err());
    }
}
