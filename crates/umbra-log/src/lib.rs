//! Structured logging for Umbra via the `tracing` ecosystem.
//!
//! Console output carries uptime timestamps and module paths; debug builds
//! also write JSON lines to a file for post-mortem analysis. The level comes
//! from `RUST_LOG` when set, else from the config's `debug.log_level`.

use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use umbra_config::Config;

/// File name of the JSON log inside the log directory.
pub const LOG_FILE: &str = "umbra.log";

/// Workspace crates whose verbosity follows the configured level.
const UMBRA_TARGETS: [&str; 5] = [
    "umbra_app",
    "umbra_config",
    "umbra_lighting",
    "umbra_voxel",
    "umbra_world",
];

const DEFAULT_LEVEL: &str = "info";

/// Builds the filter directive for `level`.
///
/// Umbra's own crates log at `level`; everything else stays at `warn` unless
/// `level` is quieter than that.
pub fn filter_directives(level: &str) -> String {
    let level = if level.trim().is_empty() {
        DEFAULT_LEVEL
    } else {
        level.trim()
    };
    let base = match level.to_ascii_lowercase().as_str() {
        "error" => "error",
        _ => "warn",
    };
    let mut directives = base.to_string();
    for target in UMBRA_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Install the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - whether file logging is enabled
/// * `config` - source of the log level when `RUST_LOG` is unset
///
/// ```no_run
/// use umbra_config::Config;
/// use umbra_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), cfg!(debug_assertions), Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let level = config.map_or(DEFAULT_LEVEL, |config| config.debug.log_level.as_str());
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// The filter used when neither `RUST_LOG` nor a config is available.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(filter_directives(DEFAULT_LEVEL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_quiets_dependencies() {
        let filter_str = default_env_filter().to_string();
        assert!(filter_str.contains("warn"));
        assert!(filter_str.contains("umbra_world=info"));
        assert!(filter_str.contains("umbra_lighting=info"));
    }

    #[test]
    fn test_directives_follow_config_level() {
        let mut config = Config::default();
        config.debug.log_level = "debug".to_string();
        let directives = filter_directives(&config.debug.log_level);
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("umbra_voxel=debug"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_error_level_lowers_base() {
        assert!(filter_directives("error").starts_with("error,"));
        assert!(filter_directives("  ").contains("umbra_app=info"));
    }
}
