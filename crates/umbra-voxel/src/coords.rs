//! Column and region addressing, plus world ↔ local coordinate conversion.
//!
//! All horizontal conversions use floor semantics so that world coordinate
//! `-1` lands in column `-1` at local offset `SIZE - 1`, never in column `0`.

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::grid::{CHUNK_SIZE_X, CHUNK_SIZE_Z};

/// Side length of a region, in columns.
pub const REGION_SIZE: i32 = 32;

/// `log2(REGION_SIZE)`, used for the arithmetic-shift region mapping.
const REGION_SHIFT: i32 = 5;

/// Number of column slots in one region file.
pub const REGION_SLOTS: usize = (REGION_SIZE * REGION_SIZE) as usize;

/// Identifies one column in the infinite horizontal grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Column-grid X coordinate.
    pub x: i32,
    /// Column-grid Z coordinate.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new column coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the coordinate offset by `(dx, dz)` columns.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// The four orthogonally adjacent columns (+X, −X, +Z, −Z).
    pub fn lateral_neighbors(self) -> [ChunkCoord; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }

    /// Squared Euclidean distance in column units.
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx * dx + dz * dz
    }

    /// Chebyshev (square) distance in column units.
    pub fn chebyshev(self, other: ChunkCoord) -> u32 {
        self.x.abs_diff(other.x).max(self.z.abs_diff(other.z))
    }

    /// World position of local voxel `(0, 0, 0)` of this column.
    pub fn origin(self) -> IVec3 {
        IVec3::new(self.x * CHUNK_SIZE_X as i32, 0, self.z * CHUNK_SIZE_Z as i32)
    }

    /// The region file this column is stored in.
    pub fn region(self) -> RegionCoord {
        RegionCoord {
            x: self.x >> REGION_SHIFT,
            z: self.z >> REGION_SHIFT,
        }
    }

    /// Slot index of this column inside its region file (`local_x + local_z * 32`).
    pub fn region_slot(self) -> usize {
        let region = self.region();
        let local_x = self.x - region.x * REGION_SIZE;
        let local_z = self.z - region.z * REGION_SIZE;
        (local_x + local_z * REGION_SIZE) as usize
    }
}

/// Identifies one 32×32-column region file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionCoord {
    /// Region-grid X coordinate.
    pub x: i32,
    /// Region-grid Z coordinate.
    pub z: i32,
}

/// Returns the column containing world position `(world_x, world_z)`.
pub fn chunk_of(world_x: i32, world_z: i32) -> ChunkCoord {
    ChunkCoord {
        x: world_x.div_euclid(CHUNK_SIZE_X as i32),
        z: world_z.div_euclid(CHUNK_SIZE_Z as i32),
    }
}

/// Converts a world position into local coordinates of `chunk`. Y is unchanged.
///
/// The result is only within the column's bounds when `chunk == chunk_of(pos.x, pos.z)`.
pub fn local_of(pos: IVec3, chunk: ChunkCoord) -> IVec3 {
    pos - chunk.origin()
}

/// Splits a world position into its column and in-column local position.
pub fn split(pos: IVec3) -> (ChunkCoord, IVec3) {
    let chunk = chunk_of(pos.x, pos.z);
    (chunk, local_of(pos, chunk))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_one_maps_to_chunk_negative_one() {
        assert_eq!(chunk_of(-1, -1), ChunkCoord::new(-1, -1));
        let local = local_of(IVec3::new(-1, 5, -1), ChunkCoord::new(-1, -1));
        assert_eq!(local, IVec3::new(15, 5, 15));
    }

    #[test]
    fn test_local_always_in_range_across_boundaries() {
        for wx in -70..70 {
            for wz in [-33, -17, -16, -1, 0, 15, 16, 31, 47] {
                let (chunk, local) = split(IVec3::new(wx, 10, wz));
                assert!(
                    (0..CHUNK_SIZE_X as i32).contains(&local.x),
                    "x={wx} gave local {local:?} in {chunk:?}"
                );
                assert!((0..CHUNK_SIZE_Z as i32).contains(&local.z));
                assert_eq!(local.y, 10);
                assert_eq!(chunk.origin() + local, IVec3::new(wx, 10, wz));
            }
        }
    }

    #[test]
    fn test_region_mapping_uses_floor() {
        assert_eq!(ChunkCoord::new(0, 0).region(), RegionCoord { x: 0, z: 0 });
        assert_eq!(ChunkCoord::new(31, 31).region(), RegionCoord { x: 0, z: 0 });
        assert_eq!(ChunkCoord::new(32, -1).region(), RegionCoord { x: 1, z: -1 });
        assert_eq!(ChunkCoord::new(-32, -33).region(), RegionCoord { x: -1, z: -2 });
    }

    #[test]
    fn test_region_slot_index() {
        assert_eq!(ChunkCoord::new(0, 0).region_slot(), 0);
        assert_eq!(ChunkCoord::new(1, 0).region_slot(), 1);
        assert_eq!(ChunkCoord::new(0, 1).region_slot(), 32);
        assert_eq!(ChunkCoord::new(-1, -1).region_slot(), 31 + 31 * 32);
        assert!(ChunkCoord::new(-1000, 777).region_slot() < REGION_SLOTS);
    }

    #[test]
    fn test_distances() {
        let a = ChunkCoord::new(0, 0);
        let b = ChunkCoord::new(3, -4);
        assert_eq!(a.distance_sq(b), 25);
        assert_eq!(a.chebyshev(b), 4);
    }
}
