//! Block catalog: maps compact [`BlockId`] values to [`BlockDef`] metadata.
//!
//! The catalog is built once during startup and is read-only afterwards. Air is
//! always ID 0 so that zero-filled grids represent empty space.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::light_field::LightChannel;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Compact identifier stored in every voxel cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The empty block.
    pub const AIR: BlockId = BlockId(0);
}

/// Structural type of a block, as consumed by mesh building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// No geometry.
    Air,
    /// Full cube hiding the faces of its neighbours.
    OpaqueCube,
    /// Full cube that does not cull neighbouring faces (glass, leaves).
    TransparentCube,
    /// Two crossed quads (grass tufts, flowers).
    CrossPlant,
}

/// Full descriptor for a block type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDef {
    /// Human-readable name (e.g. "stone", "glass").
    pub name: String,
    /// Structural type.
    pub kind: BlockKind,
    /// Whether light propagates through this block.
    pub light_passing: bool,
    /// Emitted red/green/blue light (0–15 each). Any non-zero value makes this a light source.
    #[serde(default)]
    pub emission: [u8; 3],
    /// Texture index per face, ordered +X, −X, +Y, −Y, +Z, −Z.
    #[serde(default)]
    pub textures: [u16; 6],
}

impl BlockDef {
    /// Returns `true` if the block emits light on any colour channel.
    pub fn is_light_source(&self) -> bool {
        self.emission.iter().any(|&e| e > 0)
    }

    /// Emission on one channel. Blocks never emit sunlight.
    pub fn emission_on(&self, channel: LightChannel) -> u8 {
        match channel {
            LightChannel::Red => self.emission[0],
            LightChannel::Green => self.emission[1],
            LightChannel::Blue => self.emission[2],
            LightChannel::Sun => 0,
        }
    }

    fn air() -> Self {
        Self {
            name: "air".to_string(),
            kind: BlockKind::Air,
            light_passing: true,
            emission: [0; 3],
            textures: [0; 6],
        }
    }
}

/// Errors that can occur while building a block catalog.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A block with the same name has already been registered.
    #[error("duplicate block name: {0}")]
    DuplicateName(String),
    /// All 65 536 ids have been consumed.
    #[error("block registry is full (max 65536 types)")]
    RegistryFull,
    /// An emission value exceeds the 0–15 light range.
    #[error("block {name} has emission {value} above 15")]
    EmissionOutOfRange {
        /// Offending block name.
        name: String,
        /// Offending emission value.
        value: u8,
    },
    /// Failed to read the catalog file.
    #[error("failed to read block catalog: {0}")]
    ReadError(#[source] std::io::Error),
    /// Failed to parse the catalog file.
    #[error("failed to parse block catalog: {0}")]
    ParseError(#[source] ron::error::SpannedError),
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps [`BlockId`] → [`BlockDef`] with O(1) lookup by index and by name.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    /// Dense array where `index == BlockId.0`.
    blocks: Vec<BlockDef>,
    name_to_id: HashMap<String, BlockId>,
}

impl BlockRegistry {
    /// Creates a registry containing only air (ID 0).
    pub fn new() -> Self {
        let mut name_to_id = HashMap::new();
        name_to_id.insert("air".to_string(), BlockId::AIR);
        Self {
            blocks: vec![BlockDef::air()],
            name_to_id,
        }
    }

    /// Built-in catalog used when no catalog file is configured.
    ///
    /// Ids: air 0, stone 1, dirt 2, grass 3, glass 4, red lamp 5, green lamp 6,
    /// blue lamp 7, glowstone 8, tall grass 9.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let defaults = [
            ("stone", BlockKind::OpaqueCube, false, [0, 0, 0], [1; 6]),
            ("dirt", BlockKind::OpaqueCube, false, [0, 0, 0], [2; 6]),
            ("grass", BlockKind::OpaqueCube, false, [0, 0, 0], [3, 3, 4, 2, 3, 3]),
            ("glass", BlockKind::TransparentCube, true, [0, 0, 0], [5; 6]),
            ("red_lamp", BlockKind::OpaqueCube, false, [14, 0, 0], [6; 6]),
            ("green_lamp", BlockKind::OpaqueCube, false, [0, 14, 0], [7; 6]),
            ("blue_lamp", BlockKind::OpaqueCube, false, [0, 0, 14], [8; 6]),
            ("glowstone", BlockKind::OpaqueCube, false, [15, 13, 9], [9; 6]),
            ("tall_grass", BlockKind::CrossPlant, true, [0, 0, 0], [10; 6]),
        ];
        for (name, kind, light_passing, emission, textures) in defaults {
            // Names above are unique and well below the id limit.
            let _ = registry.register(BlockDef {
                name: name.to_string(),
                kind,
                light_passing,
                emission,
                textures,
            });
        }
        registry
    }

    /// Parses a RON list of block definitions. Air is implicit and must not be listed.
    pub fn from_ron_str(source: &str) -> Result<Self, RegistryError> {
        let defs: Vec<BlockDef> = ron::from_str(source).map_err(RegistryError::ParseError)?;
        let mut registry = Self::new();
        for def in defs {
            registry.register(def)?;
        }
        Ok(registry)
    }

    /// Loads a RON catalog file (see [`BlockRegistry::from_ron_str`]).
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let contents = std::fs::read_to_string(path).map_err(RegistryError::ReadError)?;
        let registry = Self::from_ron_str(&contents)?;
        tracing::info!(blocks = registry.len(), "loaded block catalog from {}", path.display());
        Ok(registry)
    }

    /// Registers a new block and returns its sequential ID.
    ///
    /// # Errors
    ///
    /// Fails on duplicate names, emission above 15, or a full registry.
    pub fn register(&mut self, def: BlockDef) -> Result<BlockId, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        if let Some(&value) = def.emission.iter().find(|&&e| e > 15) {
            return Err(RegistryError::EmissionOutOfRange {
                name: def.name,
                value,
            });
        }
        if self.blocks.len() > u16::MAX as usize {
            return Err(RegistryError::RegistryFull);
        }

        let id = BlockId(self.blocks.len() as u16);
        self.name_to_id.insert(def.name.clone(), id);
        self.blocks.push(def);
        Ok(id)
    }

    /// Returns the definition for `id`, or `None` for ids the catalog does not know.
    pub fn get(&self, id: BlockId) -> Option<&BlockDef> {
        self.blocks.get(id.0 as usize)
    }

    /// Returns the id registered under `name`.
    pub fn lookup_by_name(&self, name: &str) -> Option<BlockId> {
        self.name_to_id.get(name).copied()
    }

    /// Whether light passes through `id`. Unknown ids are treated as opaque.
    pub fn is_light_passing(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|def| def.light_passing)
    }

    /// Whether `id` emits light on any channel.
    pub fn is_light_source(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(BlockDef::is_light_source)
    }

    /// Emission of `id` on `channel` (0 for unknown ids).
    pub fn emission(&self, id: BlockId, channel: LightChannel) -> u8 {
        self.get(id).map_or(0, |def| def.emission_on(channel))
    }

    /// Structural type of `id`. Unknown ids are reported as opaque cubes.
    pub fn kind(&self, id: BlockId) -> BlockKind {
        self.get(id).map_or(BlockKind::OpaqueCube, |def| def.kind)
    }

    /// Total number of registered blocks (including air).
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if only air is registered.
    pub fn is_empty(&self) -> bool {
        self.blocks.len() <= 1
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
