//! The binary entry point: a headless Umbra session.

mod driver;
mod face_count;

use clap::Parser;
use tracing::{error, info};
use umbra_config::{CliArgs, Config, default_config_dir};

use crate::driver::AppError;
use crate::face_count::FaceCounter;

fn main() {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    umbra_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    );

    if let Err(e) = session(&config, args.ticks) {
        error!("session failed: {e}");
        eprintln!("umbra: {e}");
        std::process::exit(1);
    }
}

fn session(config: &Config, ticks: u32) -> Result<(), AppError> {
    info!(
        save_dir = %config.world.save_dir.display(),
        view_radius = config.stream.view_radius,
        ticks,
        "starting session"
    );
    let mut world = driver::open_world(config)?;
    let mut sink = FaceCounter::new();
    let summary = driver::run(&mut world, ticks, config.stream.view_radius, &mut sink)?;
    println!(
        "umbra: {} ticks, {} columns generated, {} unloaded, {} meshes built, {} rebuilt, {} edits",
        summary.ticks,
        summary.created,
        summary.unloaded,
        summary.meshed,
        summary.remeshed,
        summary.edits
    );
    println!(
        "umbra: mesher saw {} creates and {} updates, {} faces",
        sink.created,
        sink.updated,
        sink.total_faces()
    );
    Ok(())
}
