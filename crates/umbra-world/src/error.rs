use umbra_voxel::{MetadataError, RegionError};

/// Errors surfaced by [`World`](crate::World) operations that touch disk.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Reading or writing a region file failed.
    #[error(transparent)]
    Region(#[from] RegionError),
    /// Reading or writing `world.json` failed.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}
