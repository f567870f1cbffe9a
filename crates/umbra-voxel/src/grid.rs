//! Dense block storage for one column.

use crate::registry::BlockId;

/// Column width along X, in voxels.
pub const CHUNK_SIZE_X: usize = 16;
/// Column height, in voxels.
pub const CHUNK_SIZE_Y: usize = 64;
/// Column depth along Z, in voxels.
pub const CHUNK_SIZE_Z: usize = 16;

/// Total number of voxels in a column.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z;

/// Block ids for a `16 × 64 × 16` column, indexed `x + y*SX + z*SX*SY`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    blocks: Box<[BlockId]>,
}

impl VoxelGrid {
    /// Creates a grid filled entirely with `fill`.
    pub fn new(fill: BlockId) -> Self {
        Self {
            blocks: vec![fill; CHUNK_VOLUME].into_boxed_slice(),
        }
    }

    /// Creates an all-air grid.
    pub fn new_air() -> Self {
        Self::new(BlockId::AIR)
    }

    /// Builds a grid from a flat array in canonical index order.
    ///
    /// Returns `None` unless `blocks.len() == CHUNK_VOLUME`.
    pub fn from_vec(blocks: Vec<BlockId>) -> Option<Self> {
        (blocks.len() == CHUNK_VOLUME).then(|| Self {
            blocks: blocks.into_boxed_slice(),
        })
    }

    /// Returns the block at local `(x, y, z)`.
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[Self::linear_index(x, y, z)]
    }

    /// Sets the block at local `(x, y, z)`.
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: BlockId) {
        self.blocks[Self::linear_index(x, y, z)] = block;
    }

    /// Fills the horizontal layers `y_range` with `block`.
    pub fn fill_layers(&mut self, y_range: std::ops::Range<usize>, block: BlockId) {
        for z in 0..CHUNK_SIZE_Z {
            for y in y_range.clone() {
                let start = Self::linear_index(0, y, z);
                self.blocks[start..start + CHUNK_SIZE_X].fill(block);
            }
        }
    }

    /// The flat block array in canonical index order.
    pub fn as_slice(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Y of the highest non-air block in column `(x, z)`, if any.
    pub fn top_solid(&self, x: usize, z: usize) -> Option<usize> {
        (0..CHUNK_SIZE_Y)
            .rev()
            .find(|&y| self.get(x, y, z) != BlockId::AIR)
    }

    /// Converts local `(x, y, z)` to a linear index (x varies fastest, then y).
    pub fn linear_index(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < CHUNK_SIZE_X && y < CHUNK_SIZE_Y && z < CHUNK_SIZE_Z);
        x + y * CHUNK_SIZE_X + z * CHUNK_SIZE_X * CHUNK_SIZE_Y
    }
}

impl Default for VoxelGrid {
    fn default() -> Self {
        Self::new_air()
    }
}
