//! Column streaming, lighting and persistence for a voxel world.
//!
//! A [`World`] keeps the columns within a square view radius resident,
//! generates missing ones through a [`TerrainGenerator`], saves columns that
//! leave the view to region files, and keeps four light channels consistent
//! across voxel edits. Meshing is delegated to a host-supplied [`MeshSink`].

pub mod chunk_map;
pub mod edit;
pub mod error;
pub mod mesh;
pub mod streaming;
pub mod terrain;
pub mod world;

pub use chunk_map::{ChunkEntry, ChunkMap};
pub use edit::EditKind;
pub use error::WorldError;
pub use mesh::{MeshRequests, MeshSink, NullMeshSink};
pub use streaming::{ChunkState, PendingQueue, visible_square};
pub use terrain::{FlatTerrain, NoiseTerrain, TerrainGenerator};
pub use world::{REGION_DIR, TickReport, World};
