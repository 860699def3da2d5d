pub mod doctor;
pub mod config;

use clap::{Parser, Subcommand};

/// Pryx — a local-first agent gateway.
#[derive(Debug, Parser)]
#[command(name = "pryx", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Run diagnostic checks against the current configuration.
    Doctor,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any issues.
    Validate,
    /// Dump the resolved configuration (with defaults) as YAML.
    Show,
}

/// Load the configuration from the path named by `PRYX_CONFIG` (default
/// `<home>/.pryx/config.yaml`). Returns the parsed config and the path used.
pub fn load_config() -> anyhow::Result<(pryx_domain::config::Config, std::path::PathBuf)> {
    let config_path = std::env::var("PRYX_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());

    let config = pryx_domain::config::Config::load(&config_path)
        .map_err(|e| anyhow::anyhow!("loading {}: {e}", config_path.display()))?;

    Ok((config, config_path))
}

fn default_config_path() -> std::path::PathBuf {
    std::env::var("HOME")
        .map(|home| std::path::PathBuf::from(home).join(".pryx").join("config.yaml"))
        .unwrap_or_else(|_| std::path::PathBuf::from("config.yaml"))
}
