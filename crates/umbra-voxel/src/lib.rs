//! Column voxel storage, four-channel light fields, block catalog and region persistence.

pub mod coords;
pub mod grid;
pub mod light_field;
pub mod meta;
pub mod region;
pub mod registry;
pub mod rle;

pub use coords::{ChunkCoord, REGION_SIZE, RegionCoord, chunk_of, local_of, split};
pub use grid::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, CHUNK_VOLUME, VoxelGrid};
pub use light_field::{LIGHT_SIZE_Y, LIGHT_VOLUME, LightChannel, LightField, MAX_LIGHT, PackedLight};
pub use meta::{MetadataError, WorldMeta};
pub use region::{RegionError, RegionStore, SLOT_SIZE, StoredColumn};
pub use registry::{BlockDef, BlockId, BlockKind, BlockRegistry, RegistryError};
