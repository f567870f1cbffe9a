//! Runtime settings for Umbra, persisted as `config.ron`.
//!
//! CLI arguments parsed with clap override whatever the file holds.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE, Config, DebugConfig, StreamConfig, TerrainKind, WorldConfig, default_config_dir,
};
pub use error::ConfigError;
