//! Mesh scheduling. Building meshes is the host's job; the world only decides
//! which columns need one and hands them to a [`MeshSink`].

use rustc_hash::FxHashSet;
use umbra_voxel::ChunkCoord;

use crate::world::World;

/// Receives mesh work. Implementations read voxels and light through the
/// world's query methods.
pub trait MeshSink {
    /// Build the first mesh for a newly resident column.
    fn create_mesh(&mut self, coord: ChunkCoord, world: &World);
    /// Rebuild the mesh of a column whose voxels or light changed.
    fn update_mesh(&mut self, coord: ChunkCoord, world: &World);
}

/// Discards all mesh work.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMeshSink;

impl MeshSink for NullMeshSink {
    fn create_mesh(&mut self, _coord: ChunkCoord, _world: &World) {}
    fn update_mesh(&mut self, _coord: ChunkCoord, _world: &World) {}
}

/// Pending mesh-create and mesh-update sets.
#[derive(Debug, Default)]
pub struct MeshRequests {
    create: FxHashSet<ChunkCoord>,
    update: FxHashSet<ChunkCoord>,
}

impl MeshRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a first mesh for `coord`, superseding any pending update.
    pub fn request_create(&mut self, coord: ChunkCoord) {
        self.update.remove(&coord);
        self.create.insert(coord);
    }

    /// Schedules a rebuild, unless a create is already pending.
    pub fn request_update(&mut self, coord: ChunkCoord) {
        if !self.create.contains(&coord) {
            self.update.insert(coord);
        }
    }

    /// Drops all pending work for `coord`.
    pub fn forget(&mut self, coord: ChunkCoord) {
        self.create.remove(&coord);
        self.update.remove(&coord);
    }

    /// Pops the pending create closest to `view`; ties go to the smaller `(x, z)`.
    pub fn pop_nearest_create(&mut self, view: ChunkCoord) -> Option<ChunkCoord> {
        let nearest = self
            .create
            .iter()
            .copied()
            .min_by_key(|coord| (coord.distance_sq(view), coord.x, coord.z))?;
        self.create.remove(&nearest);
        Some(nearest)
    }

    /// Pops any pending update.
    pub fn pop_update(&mut self) -> Option<ChunkCoord> {
        let coord = self.update.iter().next().copied()?;
        self.update.remove(&coord);
        Some(coord)
    }

    pub fn creates(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.create.iter().copied()
    }

    pub fn updates(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.update.iter().copied()
    }

    pub fn has_create(&self, coord: ChunkCoord) -> bool {
        self.create.contains(&coord)
    }

    pub fn has_update(&self, coord: ChunkCoord) -> bool {
        self.update.contains(&coord)
    }

    pub fn clear(&mut self) {
        self.create.clear();
        self.update.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
