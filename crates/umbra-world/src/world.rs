//! The streaming world: column residency around a view point, persistence to
//! region files, and the per-tick scheduling of generation, unloading and
//! mesh work.

use std::path::{Path, PathBuf};

use glam::IVec3;
use rustc_hash::FxHashSet;
use umbra_lighting::LightSolver;
use umbra_voxel::{
    BlockId, BlockRegistry, ChunkCoord, LightChannel, PackedLight, RegionError, RegionStore,
    StoredColumn, WorldMeta,
};

use crate::chunk_map::{ChunkEntry, ChunkMap};
use crate::error::WorldError;
use crate::mesh::{MeshRequests, MeshSink};
use crate::streaming::{ChunkState, PendingQueue, visible_square};
use crate::terrain::TerrainGenerator;

/// Subdirectory of the save directory holding region files.
pub const REGION_DIR: &str = "region";

/// What one [`World::tick`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Column generated and lit this tick.
    pub created: Option<ChunkCoord>,
    /// Column saved and dropped this tick.
    pub unloaded: Option<ChunkCoord>,
    /// Column handed to [`MeshSink::create_mesh`] this tick.
    pub meshed: Option<ChunkCoord>,
    /// Column handed to [`MeshSink::update_mesh`] this tick.
    pub remeshed: Option<ChunkCoord>,
    /// Column whose save failed this tick; it stays loaded and is retried
    /// after the other pending unloads.
    pub unload_failed: Option<ChunkCoord>,
}

/// A voxel world streamed in columns around a moving view point.
pub struct World {
    pub(crate) chunks: ChunkMap,
    pub(crate) solvers: [LightSolver; 4],
    pub(crate) mesh: MeshRequests,
    regions: RegionStore,
    terrain: Box<dyn TerrainGenerator>,
    meta: WorldMeta,
    save_dir: PathBuf,
    visible: FxHashSet<ChunkCoord>,
    pending_load: PendingQueue,
    pending_unload: PendingQueue,
    unload_seq: u64,
    view: Option<ChunkCoord>,
}

impl World {
    /// Opens (or creates) the world stored in `save_dir`.
    ///
    /// Reads `world.json` for the seed, creating it with a random seed when
    /// missing. No columns are loaded until [`World::recompute_visible`].
    pub fn open(
        save_dir: impl Into<PathBuf>,
        registry: BlockRegistry,
        terrain: Box<dyn TerrainGenerator>,
    ) -> Result<Self, WorldError> {
        let save_dir = save_dir.into();
        let meta = WorldMeta::load_or_create(&save_dir)?;
        tracing::info!(seed = meta.seed, "opened world at {}", save_dir.display());
        Ok(Self {
            chunks: ChunkMap::new(registry),
            solvers: LightChannel::ALL.map(LightSolver::new),
            mesh: MeshRequests::new(),
            regions: RegionStore::new(save_dir.join(REGION_DIR)),
            terrain,
            meta,
            save_dir,
            visible: FxHashSet::default(),
            pending_load: PendingQueue::new(),
            pending_unload: PendingQueue::new(),
            unload_seq: 0,
            view: None,
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    pub fn seed(&self) -> u64 {
        self.meta.seed
    }

    pub fn registry(&self) -> &BlockRegistry {
        self.chunks.registry()
    }

    /// The loaded column at `coord`, resident or pending unload.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&ChunkEntry> {
        self.chunks.get(coord)
    }

    /// Lifecycle state of the column at `coord`.
    pub fn state(&self, coord: ChunkCoord) -> ChunkState {
        if self.pending_load.contains(coord) {
            ChunkState::PendingLoad
        } else if self.pending_unload.contains(coord) {
            ChunkState::PendingUnload
        } else if self.chunks.contains(coord) {
            ChunkState::Resident
        } else {
            ChunkState::Absent
        }
    }

    /// Block at world position `pos`, if its column is loaded.
    pub fn block_at(&self, pos: IVec3) -> Option<BlockId> {
        self.chunks.block_at(pos)
    }

    /// Light of `channel` at world position `pos`, with out-of-range defaults.
    pub fn light_at(&self, pos: IVec3, channel: LightChannel) -> u8 {
        self.chunks.light_at(pos, channel)
    }

    /// All four channels at `pos` in packed form.
    pub fn packed_light_at(&self, pos: IVec3) -> PackedLight {
        LightChannel::ALL
            .into_iter()
            .fold(PackedLight::default(), |packed, channel| {
                packed.with(channel, self.light_at(pos, channel))
            })
    }

    /// Number of columns held in memory (resident or pending unload).
    pub fn loaded_count(&self) -> usize {
        self.chunks.len()
    }

    /// The visible set from the last [`World::recompute_visible`].
    pub fn visible(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.visible.iter().copied()
    }

    pub fn pending_loads(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.pending_load.iter()
    }

    pub fn pending_unloads(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.pending_unload.iter()
    }

    pub fn pending_mesh_creates(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.mesh.creates()
    }

    pub fn pending_mesh_updates(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.mesh.updates()
    }

    // -----------------------------------------------------------------------
    // Streaming
    // -----------------------------------------------------------------------

    /// Recomputes the visible square of radius `radius` around `view` and
    /// reconciles residency against it.
    ///
    /// Columns leaving the square are queued for unload. Columns entering it
    /// are loaded from disk when saved data exists (nearest first), and
    /// otherwise queued for generation. When the view moves, columns already
    /// waiting for generation are re-ranked by their distance to the new view.
    /// Resident columns that come back into view before being unloaded stay
    /// resident.
    pub fn recompute_visible(&mut self, view: ChunkCoord, radius: u32) -> Result<(), WorldError> {
        let visible = visible_square(view, radius);

        let leaving: Vec<ChunkCoord> = self
            .chunks
            .coords()
            .filter(|coord| !visible.contains(coord) && !self.pending_unload.contains(*coord))
            .collect();
        for coord in leaving {
            self.unload_seq += 1;
            self.pending_unload.enqueue(coord, self.unload_seq);
            self.mesh.forget(coord);
            tracing::trace!(?coord, "column queued for unload");
        }
        self.pending_load.retain(|coord| visible.contains(&coord));
        if self.view != Some(view) {
            self.pending_load
                .reprioritize(|coord| coord.distance_sq(view) as u64);
            self.view = Some(view);
        }

        let mut entering: Vec<ChunkCoord> = Vec::new();
        for &coord in &visible {
            if self.pending_unload.contains(coord) {
                self.pending_unload.remove(coord);
                self.mesh.request_create(coord);
                tracing::trace!(?coord, "column unload cancelled");
            } else if !self.chunks.contains(coord) && !self.pending_load.contains(coord) {
                entering.push(coord);
            }
        }
        entering.sort_by_key(|coord| (coord.distance_sq(view), coord.x, coord.z));

        self.visible = visible;
        for coord in entering {
            self.admit(coord, view)?;
        }
        Ok(())
    }

    /// Brings a newly visible column in from disk, or queues it for generation.
    fn admit(&mut self, coord: ChunkCoord, view: ChunkCoord) -> Result<(), WorldError> {
        match self.load_column(coord)? {
            Some(StoredColumn {
                voxels,
                light: Some(light),
            }) => {
                self.chunks.insert(coord, ChunkEntry::lit(voxels, light));
                tracing::debug!(?coord, "column loaded from disk");
                self.on_resident(coord);
            }
            Some(StoredColumn { voxels, light: None }) => {
                self.chunks.insert(coord, ChunkEntry::unlit(voxels));
                self.light_new_column(coord);
                tracing::debug!(?coord, "column loaded from disk and relit");
                self.on_resident(coord);
            }
            None => {
                self.pending_load
                    .enqueue(coord, coord.distance_sq(view) as u64);
                self.request_neighbor_updates(coord);
            }
        }
        Ok(())
    }

    /// Reads a saved column. Corrupt slots are logged and treated as absent.
    fn load_column(&self, coord: ChunkCoord) -> Result<Option<StoredColumn>, WorldError> {
        match self.regions.load(coord) {
            Ok(stored) => Ok(stored),
            Err(err) if err.is_corrupt() => {
                tracing::warn!(?coord, "discarding corrupt saved column: {err}");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Writes a loaded column to its region slot. If voxels and light do not
    /// fit together, the light is left out and recomputed on the next load.
    fn save_column(&self, coord: ChunkCoord) -> Result<(), WorldError> {
        let Some(entry) = self.chunks.get(coord) else {
            return Ok(());
        };
        match self
            .regions
            .save(coord, &entry.voxels, entry.light.as_ref())
        {
            Err(RegionError::SlotOverflow { needed, .. }) if entry.light.is_some() => {
                tracing::warn!(?coord, needed, "column overflows its slot; saving without light");
                self.regions.save(coord, &entry.voxels, None)?;
                Ok(())
            }
            result => Ok(result?),
        }
    }

    fn on_resident(&mut self, coord: ChunkCoord) {
        self.mesh.request_create(coord);
        self.request_neighbor_updates(coord);
    }

    pub(crate) fn request_neighbor_updates(&mut self, coord: ChunkCoord) {
        for neighbor in coord.lateral_neighbors() {
            if self.chunks.is_lit(neighbor) && !self.pending_unload.contains(neighbor) {
                self.mesh.request_update(neighbor);
            }
        }
    }

    /// Generates and lights at most one pending column.
    pub fn step_create(&mut self) -> Option<ChunkCoord> {
        let coord = self.pending_load.dequeue()?;
        let voxels = self.terrain.generate(coord, self.meta.seed);
        self.chunks.insert(coord, ChunkEntry::unlit(voxels));
        self.light_new_column(coord);
        self.on_resident(coord);
        tracing::debug!(?coord, "column generated");
        Some(coord)
    }

    /// Saves and drops at most one column that left the visible set.
    ///
    /// On a write failure the column stays in memory and moves to the back
    /// of the unload queue.
    pub fn step_unload(&mut self) -> Result<Option<ChunkCoord>, WorldError> {
        let Some(coord) = self.pending_unload.dequeue() else {
            return Ok(None);
        };
        if let Err(err) = self.save_column(coord) {
            self.unload_seq += 1;
            self.pending_unload.enqueue(coord, self.unload_seq);
            return Err(err);
        }
        self.chunks.remove(coord);
        self.mesh.forget(coord);
        tracing::debug!(?coord, "column unloaded");
        Ok(Some(coord))
    }

    /// Hands the pending mesh-create nearest to `view` to `sink`.
    pub fn step_mesh_create(
        &mut self,
        view: ChunkCoord,
        sink: &mut dyn MeshSink,
    ) -> Option<ChunkCoord> {
        let coord = self.mesh.pop_nearest_create(view)?;
        sink.create_mesh(coord, self);
        Some(coord)
    }

    /// Hands one pending mesh-update to `sink`.
    pub fn step_mesh_update(&mut self, sink: &mut dyn MeshSink) -> Option<ChunkCoord> {
        let coord = self.mesh.pop_update()?;
        sink.update_mesh(coord, self);
        Some(coord)
    }

    /// One frame of world maintenance: visibility, then one step of each queue.
    ///
    /// A failed unload is logged and reported in [`TickReport::unload_failed`];
    /// the mesh steps still run. Only a failure to read saved columns while
    /// reconciling visibility aborts the tick.
    pub fn tick(
        &mut self,
        view: ChunkCoord,
        radius: u32,
        sink: &mut dyn MeshSink,
    ) -> Result<TickReport, WorldError> {
        self.recompute_visible(view, radius)?;
        let created = self.step_create();
        let next_unload = self.pending_unload.peek();
        let (unloaded, unload_failed) = match self.step_unload() {
            Ok(unloaded) => (unloaded, None),
            Err(err) => {
                tracing::warn!(coord = ?next_unload, "column unload failed: {err}");
                (None, next_unload)
            }
        };
        let meshed = self.step_mesh_create(view, sink);
        let remeshed = self.step_mesh_update(sink);
        Ok(TickReport {
            created,
            unloaded,
            meshed,
            remeshed,
            unload_failed,
        })
    }

    /// Saves every loaded column and the world metadata, then drops all
    /// in-memory state.
    ///
    /// A column that fails to save does not stop the others. The first such
    /// error is returned and nothing is dropped, so the call can be retried.
    pub fn shutdown(&mut self) -> Result<(), WorldError> {
        let mut coords: Vec<ChunkCoord> = self.chunks.coords().collect();
        coords.sort();
        let mut first_err = None;
        for &coord in &coords {
            if let Err(err) = self.save_column(coord) {
                tracing::warn!(?coord, "failed to save column: {err}");
                first_err.get_or_insert(err);
            }
        }
        self.meta.save(&self.save_dir)?;
        if let Some(err) = first_err {
            return Err(err);
        }

        self.chunks.clear();
        self.mesh.clear();
        self.visible.clear();
        self.pending_load.clear();
        self.pending_unload.clear();
        tracing::info!(saved = coords.len(), "world shut down");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
