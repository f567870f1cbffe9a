//! In-memory column store and the light adapter the solvers run against.

use glam::IVec3;
use rustc_hash::FxHashMap;
use umbra_lighting::LightAccess;
use umbra_voxel::{
    BlockId, BlockRegistry, CHUNK_SIZE_Y, ChunkCoord, LightChannel, LightField, MAX_LIGHT,
    VoxelGrid, split,
};

/// One loaded column: its voxels and, once solved, its light.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry {
    /// Block ids for every voxel of the column.
    pub voxels: VoxelGrid,
    /// `None` only while the column is being admitted and not yet lit.
    pub light: Option<LightField>,
}

impl ChunkEntry {
    /// A column whose light has not been computed yet.
    pub fn unlit(voxels: VoxelGrid) -> Self {
        Self {
            voxels,
            light: None,
        }
    }

    /// A column with both voxels and light present.
    pub fn lit(voxels: VoxelGrid, light: LightField) -> Self {
        Self {
            voxels,
            light: Some(light),
        }
    }

    /// Whether the light field has been computed.
    pub fn is_lit(&self) -> bool {
        self.light.is_some()
    }
}

/// Columns keyed by coordinate, plus the block catalog needed to answer
/// light-passing and emission queries at world positions.
///
/// Implements [`LightAccess`] with the out-of-range defaults applied: below
/// the floor everything reads 0, above the column top sun reads 15, and
/// columns that are not loaded are opaque and dark.
pub struct ChunkMap {
    chunks: FxHashMap<ChunkCoord, ChunkEntry>,
    registry: BlockRegistry,
}

impl ChunkMap {
    pub fn new(registry: BlockRegistry) -> Self {
        Self {
            chunks: FxHashMap::default(),
            registry,
        }
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn insert(&mut self, coord: ChunkCoord, entry: ChunkEntry) -> Option<ChunkEntry> {
        self.chunks.insert(coord, entry)
    }

    pub fn remove(&mut self, coord: ChunkCoord) -> Option<ChunkEntry> {
        self.chunks.remove(&coord)
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&ChunkEntry> {
        self.chunks.get(&coord)
    }

    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut ChunkEntry> {
        self.chunks.get_mut(&coord)
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Whether `coord` is loaded and its light has been computed.
    pub fn is_lit(&self, coord: ChunkCoord) -> bool {
        self.chunks.get(&coord).is_some_and(ChunkEntry::is_lit)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Loaded coordinates in arbitrary order.
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Block at world position `pos`, or `None` when the column is not loaded
    /// or `y` is outside the column.
    pub fn block_at(&self, pos: IVec3) -> Option<BlockId> {
        if pos.y < 0 || pos.y as usize >= CHUNK_SIZE_Y {
            return None;
        }
        let (coord, local) = split(pos);
        let entry = self.chunks.get(&coord)?;
        Some(entry.voxels.get(local.x as usize, local.y as usize, local.z as usize))
    }

    /// Replaces the block at `pos`, returning the previous id. Does nothing
    /// and returns `None` when the position is not editable.
    pub fn set_block(&mut self, pos: IVec3, block: BlockId) -> Option<BlockId> {
        if pos.y < 0 || pos.y as usize >= CHUNK_SIZE_Y {
            return None;
        }
        let (coord, local) = split(pos);
        let entry = self.chunks.get_mut(&coord)?;
        let (x, y, z) = (local.x as usize, local.y as usize, local.z as usize);
        let previous = entry.voxels.get(x, y, z);
        entry.voxels.set(x, y, z, block);
        Some(previous)
    }

    /// Light level of `channel` at world position `pos`.
    pub fn light_at(&self, pos: IVec3, channel: LightChannel) -> u8 {
        if pos.y < 0 {
            return 0;
        }
        let (coord, local) = split(pos);
        match self.chunks.get(&coord).and_then(|entry| entry.light.as_ref()) {
            Some(field) => field.get(local.x as usize, local.y, local.z as usize, channel),
            None if channel == LightChannel::Sun && pos.y as usize >= CHUNK_SIZE_Y => MAX_LIGHT,
            None => 0,
        }
    }
}

impl LightAccess for ChunkMap {
    fn light(&self, pos: IVec3, channel: LightChannel) -> u8 {
        self.light_at(pos, channel)
    }

    fn set_light(&mut self, pos: IVec3, channel: LightChannel, level: u8) {
        if pos.y < 0 {
            return;
        }
        let (coord, local) = split(pos);
        if let Some(field) = self
            .chunks
            .get_mut(&coord)
            .and_then(|entry| entry.light.as_mut())
        {
            field.set(local.x as usize, local.y, local.z as usize, channel, level);
        }
    }

    fn is_light_passing(&self, pos: IVec3) -> bool {
        self.block_at(pos)
            .is_some_and(|block| self.registry.is_light_passing(block))
    }

    fn emission(&self, pos: IVec3, channel: LightChannel) -> u8 {
        self.block_at(pos)
            .map_or(0, |block| self.registry.emission(block, channel))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
