use clap::{Parser, Subcommand};

use hf_domain::config::Config;
use hf_domain::error::{Error, Result};

/// HireFlow — an AI interview orchestration gateway.
#[derive(Debug, Parser)]
#[command(name = "hireflow", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults and env overrides)
    /// as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `HIREFLOW_CONFIG`
/// (or `config.toml` by default), then apply the recognized environment
/// overrides. Returns the parsed [`Config`] and the path that was used.
pub fn load_config() -> Result<(Config, String)> {
    let config_path =
        std::env::var("HIREFLOW_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let mut config: Config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("reading {config_path}: {e}")))?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {config_path}: {e}")))?
    } else {
        Config::default()
    };

    config.apply_env_overrides();
    Ok((config, config_path))
}
