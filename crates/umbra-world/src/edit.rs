//! Lighting of newly resident columns and incremental relighting after edits.

use glam::IVec3;
use umbra_lighting::{LightSolver, NEIGHBORS_6};
use umbra_voxel::{
    BlockId, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, ChunkCoord, LightChannel, LightField, split,
};

use crate::chunk_map::ChunkMap;
use crate::streaming::ChunkState;
use crate::world::World;

/// What a voxel edit does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// Write the given block id.
    Place,
    /// Clear the voxel to air; the given block id is ignored.
    Destroy,
}

const COLOR_CHANNELS: [LightChannel; 3] =
    [LightChannel::Red, LightChannel::Green, LightChannel::Blue];

fn solver(solvers: &mut [LightSolver; 4], channel: LightChannel) -> &mut LightSolver {
    &mut solvers[channel.index()]
}

fn solve_all(solvers: &mut [LightSolver; 4], chunks: &mut ChunkMap) {
    for solver in solvers.iter_mut() {
        solver.solve(chunks);
    }
}

impl World {
    /// Computes the light field of a column whose voxels were just inserted.
    ///
    /// Sunlight falls straight down every column to the first opaque block,
    /// each emitting block seeds its colour channels, and light already
    /// present on the facing boundary of lit neighbour columns flows in.
    pub(crate) fn light_new_column(&mut self, coord: ChunkCoord) {
        let Some(entry) = self.chunks.get_mut(coord) else {
            return;
        };
        entry.light = Some(LightField::new());

        let origin = coord.origin();
        let chunks = &mut self.chunks;
        let solvers = &mut self.solvers;

        let top = CHUNK_SIZE_Y as i32 - 1;
        for z in 0..CHUNK_SIZE_Z as i32 {
            for x in 0..CHUNK_SIZE_X as i32 {
                solver(solvers, LightChannel::Sun)
                    .seed_sun_column(chunks, origin + IVec3::new(x, top, z));
            }
        }

        let mut sources = Vec::new();
        if let Some(entry) = chunks.get(coord) {
            for z in 0..CHUNK_SIZE_Z {
                for y in 0..CHUNK_SIZE_Y {
                    for x in 0..CHUNK_SIZE_X {
                        let block = entry.voxels.get(x, y, z);
                        if chunks.registry().is_light_source(block) {
                            sources.push((origin + IVec3::new(x as i32, y as i32, z as i32), block));
                        }
                    }
                }
            }
        }
        for (pos, block) in sources {
            for channel in COLOR_CHANNELS {
                let level = chunks.registry().emission(block, channel);
                solver(solvers, channel).add(chunks, pos, level);
            }
        }

        for pos in boundary_inflow(coord) {
            let (neighbor, _) = split(pos);
            if !chunks.is_lit(neighbor) {
                continue;
            }
            for channel in LightChannel::ALL {
                solver(solvers, channel).add_current(chunks, pos);
            }
        }

        solve_all(solvers, chunks);
    }

    /// Edits one voxel and relights around it.
    ///
    /// Returns `false` without changing anything when `pos` is outside the
    /// column height, its column is not resident, or the voxel already holds
    /// the resulting block. Otherwise the block is written, light is updated
    /// on all four channels, and the column plus its lateral neighbours are
    /// scheduled for a mesh update.
    pub fn set_voxel(&mut self, id: BlockId, pos: IVec3, kind: EditKind) -> bool {
        if pos.y < 0 || pos.y as usize >= CHUNK_SIZE_Y {
            return false;
        }
        let (coord, _) = split(pos);
        if self.state(coord) != ChunkState::Resident || !self.chunks.is_lit(coord) {
            return false;
        }
        let block = match kind {
            EditKind::Place => id,
            EditKind::Destroy => BlockId::AIR,
        };
        let Some(previous) = self.chunks.block_at(pos) else {
            return false;
        };
        if previous == block {
            return false;
        }
        self.chunks.set_block(pos, block);
        self.relight_edit(pos, block);

        self.mesh.request_update(coord);
        self.request_neighbor_updates(coord);
        tracing::debug!(?pos, ?kind, from = previous.0, to = block.0, "voxel edited");
        true
    }

    fn relight_edit(&mut self, pos: IVec3, block: BlockId) {
        let chunks = &mut self.chunks;
        let solvers = &mut self.solvers;
        let passing = chunks.registry().is_light_passing(block);

        for channel in LightChannel::ALL {
            solver(solvers, channel).remove(chunks, pos);
        }

        let sun = solver(solvers, LightChannel::Sun);
        if passing {
            sun.open_to_sky(chunks, pos);
        } else {
            sun.shade_sun_column(chunks, pos - IVec3::Y);
        }

        for channel in COLOR_CHANNELS {
            let level = chunks.registry().emission(block, channel);
            solver(solvers, channel).add(chunks, pos, level);
        }

        for offset in NEIGHBORS_6 {
            let neighbor = pos + offset;
            for channel in LightChannel::ALL {
                solver(solvers, channel).add_current(chunks, neighbor);
            }
        }

        solve_all(solvers, chunks);
    }
}

/// World positions just outside `coord` on its four lateral faces, from
/// which light of already lit neighbours flows in.
fn boundary_inflow(coord: ChunkCoord) -> impl Iterator<Item = IVec3> {
    let origin = coord.origin();
    let (sx, sz) = (CHUNK_SIZE_X as i32, CHUNK_SIZE_Z as i32);
    (0..CHUNK_SIZE_Y as i32).flat_map(move |y| {
        let along_z = (0..sz).flat_map(move |z| {
            [
                origin + IVec3::new(-1, y, z),
                origin + IVec3::new(sx, y, z),
            ]
        });
        let along_x = (0..sx).flat_map(move |x| {
            [
                origin + IVec3::new(x, y, -1),
                origin + IVec3::new(x, y, sz),
            ]
        });
        along_z.chain(along_x)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
