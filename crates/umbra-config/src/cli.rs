//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Umbra command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "umbra", about = "Headless voxel world streamer")]
pub struct CliArgs {
    /// World save directory.
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// View radius in columns.
    #[arg(long)]
    pub view_radius: Option<u32>,

    /// Number of world ticks to run before shutting down.
    #[arg(long, default_value_t = 200)]
    pub ticks: u32,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref dir) = args.save_dir {
            self.world.save_dir = dir.clone();
        }
        if let Some(radius) = args.view_radius {
            self.stream.view_radius = radius;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            save_dir: Some(PathBuf::from("saves/alpha")),
            view_radius: Some(6),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.world.save_dir, PathBuf::from("saves/alpha"));
        assert_eq!(config.stream.view_radius, 6);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "umbra",
            "--view-radius",
            "3",
            "--ticks",
            "10",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.view_radius, Some(3));
        assert_eq!(args.ticks, 10);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.config, None);
        assert_eq!(CliArgs::parse_from(["umbra"]).ticks, 200);
    }
}
