// src/cli/config_args.rs
use clap::{Args, Subcommand};

/// Arguments for configuration management.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Configuration operation
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration operations.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Dot-separated key (e.g. alignment.threshold)
        key: String,
        /// New value
        value: String,
    },
    /// Read a configuration value
    Get {
        /// Dot-separated key
        key: String,
    },
    /// List every key with its current value
    List,
    /// Reset the configuration file to defaults
    Reset,
    /// Print the configuration file path
    Path,
}
