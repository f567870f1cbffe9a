//! Stand-in mesher: counts the faces a real mesher would emit.

use glam::IVec3;
use rustc_hash::FxHashMap;
use umbra_lighting::NEIGHBORS_6;
use umbra_voxel::{BlockKind, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, ChunkCoord, LightChannel};
use umbra_world::{MeshSink, World};

/// Per-column face counts plus totals of the work received.
#[derive(Debug, Default)]
pub struct FaceCounter {
    faces: FxHashMap<ChunkCoord, usize>,
    /// Mesh-create requests received.
    pub created: usize,
    /// Mesh-update requests received.
    pub updated: usize,
    /// Faces that would be drawn fully dark.
    pub unlit_faces: usize,
}

impl FaceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total faces across all meshed columns.
    pub fn total_faces(&self) -> usize {
        self.faces.values().sum()
    }

    pub fn faces(&self, coord: ChunkCoord) -> Option<usize> {
        self.faces.get(&coord).copied()
    }

    fn count(&mut self, coord: ChunkCoord, world: &World) {
        let registry = world.registry();
        let origin = coord.origin();
        let mut faces = 0;
        let mut unlit = 0;
        for z in 0..CHUNK_SIZE_Z as i32 {
            for y in 0..CHUNK_SIZE_Y as i32 {
                for x in 0..CHUNK_SIZE_X as i32 {
                    let pos = origin + IVec3::new(x, y, z);
                    let Some(block) = world.block_at(pos) else {
                        continue;
                    };
                    if registry.kind(block) == BlockKind::Air {
                        continue;
                    }
                    for offset in NEIGHBORS_6 {
                        let facing = pos + offset;
                        // Unloaded neighbours and the world floor hide the face.
                        let exposed = world
                            .block_at(facing)
                            .map_or(facing.y >= CHUNK_SIZE_Y as i32, |neighbor| {
                                registry.is_light_passing(neighbor)
                            });
                        if exposed {
                            faces += 1;
                            let dark = LightChannel::ALL
                                .into_iter()
                                .all(|channel| world.light_at(facing, channel) == 0);
                            if dark {
                                unlit += 1;
                            }
                        }
                    }
                }
            }
        }
        self.faces.insert(coord, faces);
        self.unlit_faces += unlit;
        tracing::trace!(?coord, faces, unlit, "column meshed");
    }
}

impl MeshSink for FaceCounter {
    fn create_mesh(&mut self, coord: ChunkCoord, world: &World) {
        self.created += 1;
        self.count(coord, world);
    }

    fn update_mesh(&mut self, coord: ChunkCoord, world: &World) {
        self.updated += 1;
        self.count(coord, world);
    }
}
