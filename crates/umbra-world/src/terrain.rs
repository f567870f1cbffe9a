//! Procedural column generation.
//!
//! Generation is a pure function of `(coord, seed)`: the same inputs always
//! produce the same grid, so a column that was never saved can be recreated
//! identically on the next visit.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use umbra_voxel::{
    BlockId, BlockRegistry, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, ChunkCoord, VoxelGrid,
};

/// Produces the initial voxel grid for a column that has no saved data.
pub trait TerrainGenerator {
    /// Generates the column at `coord` for the world seeded with `seed`.
    fn generate(&self, coord: ChunkCoord, seed: u64) -> VoxelGrid;
}

// ---------------------------------------------------------------------------
// Seed derivation
// ---------------------------------------------------------------------------

/// Combines the world seed with a column coordinate into a per-column seed.
pub fn derive_column_seed(world_seed: u64, coord: ChunkCoord) -> u64 {
    let mut hasher = DefaultHasher::new();
    world_seed.hash(&mut hasher);
    coord.x.hash(&mut hasher);
    coord.z.hash(&mut hasher);
    hasher.finish()
}

/// Deterministic RNG for decorating one column.
pub fn column_rng(world_seed: u64, coord: ChunkCoord) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_column_seed(world_seed, coord))
}

// ---------------------------------------------------------------------------
// Flat terrain
// ---------------------------------------------------------------------------

/// Horizontal layers stacked from y = 0 upward, the same in every column.
#[derive(Debug, Clone)]
pub struct FlatTerrain {
    layers: Vec<(BlockId, usize)>,
}

impl FlatTerrain {
    /// Builds a flat world from `(block, thickness)` layers, bottom first.
    pub fn new(layers: Vec<(BlockId, usize)>) -> Self {
        Self { layers }
    }

    /// Solid `block` from y = 0 up to (but excluding) `height`.
    pub fn solid(block: BlockId, height: usize) -> Self {
        Self::new(vec![(block, height)])
    }

    /// Total height of all layers, clamped to the column height.
    pub fn height(&self) -> usize {
        self.layers
            .iter()
            .map(|(_, thickness)| thickness)
            .sum::<usize>()
            .min(CHUNK_SIZE_Y)
    }
}

impl TerrainGenerator for FlatTerrain {
    fn generate(&self, _coord: ChunkCoord, _seed: u64) -> VoxelGrid {
        let mut grid = VoxelGrid::new_air();
        let mut y = 0;
        for &(block, thickness) in &self.layers {
            let top = (y + thickness).min(CHUNK_SIZE_Y);
            grid.fill_layers(y..top, block);
            y = top;
        }
        grid
    }
}

// ---------------------------------------------------------------------------
// Noise terrain
// ---------------------------------------------------------------------------

/// Rolling hills from 2D Perlin noise, with the occasional surface lamp.
#[derive(Debug, Clone)]
pub struct NoiseTerrain {
    stone: BlockId,
    dirt: BlockId,
    grass: BlockId,
    lamp: Option<BlockId>,
    plant: Option<BlockId>,
    /// Mean surface height in voxels.
    pub base_height: f64,
    /// Peak deviation from `base_height` in voxels.
    pub amplitude: f64,
    /// Horizontal noise frequency in cycles per voxel.
    pub frequency: f64,
    /// Probability that a column receives one lamp on its surface.
    pub lamp_chance: f64,
}

impl NoiseTerrain {
    /// Resolves block ids by name from `registry`. Missing names fall back to
    /// the first block id so the generator still produces solid ground.
    pub fn new(registry: &BlockRegistry) -> Self {
        let solid = BlockId(1);
        Self {
            stone: registry.lookup_by_name("stone").unwrap_or(solid),
            dirt: registry.lookup_by_name("dirt").unwrap_or(solid),
            grass: registry.lookup_by_name("grass").unwrap_or(solid),
            lamp: registry.lookup_by_name("glowstone"),
            plant: registry.lookup_by_name("tall_grass"),
            base_height: 32.0,
            amplitude: 8.0,
            frequency: 1.0 / 48.0,
            lamp_chance: 0.125,
        }
    }

    /// Surface height at world column `(wx, wz)`, in `[1, CHUNK_SIZE_Y - 8]`.
    pub fn surface_height(&self, perlin: &Perlin, wx: i32, wz: i32) -> usize {
        let sample = perlin.get([wx as f64 * self.frequency, wz as f64 * self.frequency]);
        let height = self.base_height + sample * self.amplitude;
        (height.round() as i64).clamp(1, CHUNK_SIZE_Y as i64 - 8) as usize
    }
}

impl TerrainGenerator for NoiseTerrain {
    fn generate(&self, coord: ChunkCoord, seed: u64) -> VoxelGrid {
        let perlin = Perlin::new(seed as u32);
        let origin = coord.origin();
        let mut grid = VoxelGrid::new_air();
        let mut heights = [[0usize; CHUNK_SIZE_X]; CHUNK_SIZE_Z];

        for (z, row) in heights.iter_mut().enumerate() {
            for (x, height) in row.iter_mut().enumerate() {
                let h = self.surface_height(&perlin, origin.x + x as i32, origin.z + z as i32);
                *height = h;
                for y in 0..h {
                    let block = if y + 1 == h {
                        self.grass
                    } else if y + 4 >= h {
                        self.dirt
                    } else {
                        self.stone
                    };
                    grid.set(x, y, z, block);
                }
            }
        }

        let mut rng = column_rng(seed, coord);
        if let Some(plant) = self.plant {
            for _ in 0..rng.random_range(0..6) {
                let x = rng.random_range(0..CHUNK_SIZE_X);
                let z = rng.random_range(0..CHUNK_SIZE_Z);
                grid.set(x, heights[z][x], z, plant);
            }
        }
        if let Some(lamp) = self.lamp
            && rng.random_bool(self.lamp_chance)
        {
            let x = rng.random_range(0..CHUNK_SIZE_X);
            let z = rng.random_range(0..CHUNK_SIZE_Z);
            grid.set(x, heights[z][x], z, lamp);
        }
        grid
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
