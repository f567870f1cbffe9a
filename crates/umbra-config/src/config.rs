//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the configuration document inside the config directory.
pub const CONFIG_FILE: &str = "config.ron";

/// Largest accepted view radius, in columns.
const MAX_VIEW_RADIUS: u32 = 32;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub world: WorldConfig,
    pub stream: StreamConfig,
    pub debug: DebugConfig,
}

/// Which generator fills columns that have never been saved.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TerrainKind {
    /// Perlin-noise hills.
    #[default]
    Noise,
    /// Flat ground of the given height.
    Flat(u32),
}

/// Where the world lives and how it is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Directory holding `world.json` and the region files.
    pub save_dir: PathBuf,
    /// RON block catalog replacing the built-in one.
    pub block_catalog: Option<PathBuf>,
    pub terrain: TerrainKind,
}

/// Column streaming settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    /// Chebyshev radius, in columns, of the resident square around the view.
    pub view_radius: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        let save_dir = dirs::data_dir()
            .map(|dir| dir.join("umbra").join("world"))
            .unwrap_or_else(|| PathBuf::from("world"));
        Self {
            save_dir,
            block_catalog: None,
            terrain: TerrainKind::default(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { view_radius: 4 }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// `<platform config dir>/umbra`, or `./config` where the platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("umbra"))
        .unwrap_or_else(|| PathBuf::from("config"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let write_error = |source| ConfigError::WriteError {
            path: config_path.clone(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_error)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(write_error)
    }

    /// Re-reads the file; `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;
        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Rejects values that parse but cannot drive a world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.view_radius > MAX_VIEW_RADIUS {
            return Err(ConfigError::InvalidValue {
                field: "stream.view_radius",
                reason: format!("{} exceeds {MAX_VIEW_RADIUS}", self.stream.view_radius),
            });
        }
        let level = self.debug.log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "debug.log_level",
                reason: format!("unknown level {:?}", self.debug.log_level),
            });
        }
        if let TerrainKind::Flat(height) = self.world.terrain
            && height > 64
        {
            return Err(ConfigError::InvalidValue {
                field: "world.terrain",
                reason: format!("flat height {height} is taller than a column"),
            });
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }
}
