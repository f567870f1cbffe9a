//! Headless session: open the world, walk a view point through it for a
//! number of ticks, make one edit on the way, then save everything.

use glam::IVec3;
use tracing::info;
use umbra_config::{Config, ConfigError, TerrainKind};
use umbra_voxel::{BlockId, BlockRegistry, CHUNK_SIZE_Y, ChunkCoord, RegistryError};
use umbra_world::{
    EditKind, FlatTerrain, NoiseTerrain, TerrainGenerator, TickReport, World, WorldError,
};

use crate::face_count::FaceCounter;

/// Ticks the view stays over one column before stepping to the next.
pub const STEP_TICKS: u32 = 24;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to load block catalog: {0}")]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Counters accumulated from every [`TickReport`] of a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u32,
    pub created: u32,
    pub unloaded: u32,
    pub meshed: u32,
    pub remeshed: u32,
    pub edits: u32,
    /// Ticks whose unload step failed to save its column.
    pub failed_unloads: u32,
}

impl RunSummary {
    fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.created += u32::from(report.created.is_some());
        self.unloaded += u32::from(report.unloaded.is_some());
        self.meshed += u32::from(report.meshed.is_some());
        self.remeshed += u32::from(report.remeshed.is_some());
        self.failed_unloads += u32::from(report.unload_failed.is_some());
    }
}

/// Opens the world described by `config`.
pub fn open_world(config: &Config) -> Result<World, AppError> {
    config.validate()?;
    let registry = match &config.world.block_catalog {
        Some(path) => BlockRegistry::load(path)?,
        None => BlockRegistry::with_defaults(),
    };
    let terrain: Box<dyn TerrainGenerator> = match config.world.terrain {
        TerrainKind::Noise => Box::new(NoiseTerrain::new(&registry)),
        TerrainKind::Flat(height) => {
            let stone = registry.lookup_by_name("stone").unwrap_or(BlockId(1));
            Box::new(FlatTerrain::solid(stone, height as usize))
        }
    };
    Ok(World::open(&config.world.save_dir, registry, terrain)?)
}

/// Column under the view at `tick`; the view walks along +X.
pub fn view_at(tick: u32) -> ChunkCoord {
    ChunkCoord::new((tick / STEP_TICKS) as i32, 0)
}

/// Runs `ticks` world ticks, edits once halfway through, then shuts down.
pub fn run(
    world: &mut World,
    ticks: u32,
    radius: u32,
    sink: &mut FaceCounter,
) -> Result<RunSummary, AppError> {
    let mut summary = RunSummary::default();
    let edit_tick = ticks / 2;
    for tick in 0..ticks {
        let view = view_at(tick);
        let report = world.tick(view, radius, sink)?;
        summary.record(&report);
        if tick == edit_tick {
            summary.edits = dig_and_light(world, view);
        }
    }
    world.shutdown()?;
    info!(
        ticks = summary.ticks,
        created = summary.created,
        unloaded = summary.unloaded,
        meshed = summary.meshed,
        remeshed = summary.remeshed,
        failed_unloads = summary.failed_unloads,
        faces = sink.total_faces(),
        unlit_faces = sink.unlit_faces,
        faces_under_view = ?sink.faces(view_at(ticks.saturating_sub(1))),
        "session finished"
    );
    Ok(summary)
}

/// Digs out the surface block at the middle of `view` and puts a lamp in
/// its place. Returns how many edits were applied.
fn dig_and_light(world: &mut World, view: ChunkCoord) -> u32 {
    let column = view.origin() + IVec3::new(8, 0, 8);
    let surface = (0..CHUNK_SIZE_Y as i32)
        .rev()
        .map(|y| column.with_y(y))
        .find(|&pos| world.block_at(pos).is_some_and(|block| block != BlockId::AIR));
    let Some(surface) = surface else {
        info!(?view, "view column not resident yet, skipping edit");
        return 0;
    };

    let mut edits = 0;
    if world.set_voxel(BlockId::AIR, surface, EditKind::Destroy) {
        edits += 1;
    }
    if let Some(lamp) = world.registry().lookup_by_name("glowstone")
        && world.set_voxel(lamp, surface, EditKind::Place)
    {
        edits += 1;
    }
    info!(
        ?surface,
        edits,
        sun_above = world.light_at(surface + IVec3::Y, umbra_voxel::LightChannel::Sun),
        red_above = world.light_at(surface + IVec3::Y, umbra_voxel::LightChannel::Red),
        "edited surface"
    );
    edits
}
