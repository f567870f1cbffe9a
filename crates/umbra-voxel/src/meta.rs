//! Per-world metadata persisted next to the region files (`world.json`).

use std::path::Path;

use serde::{Deserialize, Serialize};

/// File name of the metadata document inside a world directory.
pub const META_FILE: &str = "world.json";

/// Errors that can occur when loading or saving world metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// Failed to read the metadata file.
    #[error("failed to read world metadata: {0}")]
    ReadError(#[source] std::io::Error),
    /// Failed to write the metadata file.
    #[error("failed to write world metadata: {0}")]
    WriteError(#[source] std::io::Error),
    /// The metadata file is not valid JSON for [`WorldMeta`].
    #[error("failed to parse world metadata: {0}")]
    ParseError(#[source] serde_json::Error),
    /// Failed to serialize [`WorldMeta`] to JSON.
    #[error("failed to serialize world metadata: {0}")]
    SerializeError(#[source] serde_json::Error),
}

/// Settings that must survive across sessions for generation to stay consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldMeta {
    /// Seed handed to the terrain generator.
    pub seed: u64,
}

impl WorldMeta {
    /// Loads `world.json` from `dir`, or creates it with a fresh random seed.
    pub fn load_or_create(dir: &Path) -> Result<Self, MetadataError> {
        let path = dir.join(META_FILE);
        if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(MetadataError::ReadError)?;
            let meta: WorldMeta =
                serde_json::from_str(&contents).map_err(MetadataError::ParseError)?;
            tracing::info!(seed = meta.seed, "loaded world metadata from {}", path.display());
            Ok(meta)
        } else {
            let meta = WorldMeta {
                seed: rand::random(),
            };
            meta.save(dir)?;
            tracing::info!(seed = meta.seed, "created world metadata at {}", path.display());
            Ok(meta)
        }
    }

    /// Writes `world.json` into `dir`, creating the directory if needed.
    pub fn save(&self, dir: &Path) -> Result<(), MetadataError> {
        std::fs::create_dir_all(dir).map_err(MetadataError::WriteError)?;
        let json = serde_json::to_string_pretty(self).map_err(MetadataError::SerializeError)?;
        std::fs::write(dir.join(META_FILE), json).map_err(MetadataError::WriteError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_creates_seed() {
        let dir = tempfile::tempdir().unwrap();
        let created = WorldMeta::load_or_create(dir.path()).unwrap();
        assert!(dir.path().join(META_FILE).exists());
        let reloaded = WorldMeta::load_or_create(dir.path()).unwrap();
        assert_eq!(created, reloaded);
    }

    #[test]
    fn test_existing_seed_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(META_FILE), r#"{ "seed": 424242 }"#).unwrap();
        let meta = WorldMeta::load_or_create(dir.path()).unwrap();
        assert_eq!(meta.seed, 424242);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(META_FILE), "{{ nope").unwrap();
        let result = WorldMeta::load_or_create(dir.path());
        assert!(matches!(result, Err(MetadataError::ParseError(_))));
    }
}
