//! Demo binary that builds a planet mesh topology and runs fields over it.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p terra-demo -- --subdivisions 5 --log-level debug`.

mod field_demos;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use terra_config::{CliArgs, Config};
use terra_grid::{GridError, MeshTopology, icosphere};
use tracing::{error, info};

fn main() {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(Config::default_dir)
        .unwrap_or_else(|| PathBuf::from("terra"));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    terra_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = run(&config) {
        error!("Demo failed: {e}");
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), GridError> {
    let topology = build_planet(config.mesh.subdivisions, config.index.cells_per_spacing)?;

    let height = field_demos::demonstrate_height_gradient(&topology, &config.field);
    field_demos::demonstrate_nearest_vertex(&topology, &config.field);

    let coarse_level = config.mesh.subdivisions.saturating_sub(2);
    let coarse = build_planet(coarse_level, config.index.cells_per_spacing)?;
    field_demos::demonstrate_resampling(&height, &coarse);
    field_demos::demonstrate_scattered_samples(&topology, &config.field)?;

    info!("All terra demonstrations completed successfully");
    Ok(())
}

fn build_planet(subdivisions: u32, cells_per_spacing: f32) -> Result<Arc<MeshTopology>, GridError> {
    let mesh = icosphere(subdivisions);
    let topology = MeshTopology::with_index_resolution(&mesh.vertices, &mesh.faces, cells_per_spacing)?;

    info!(
        "Built planet at subdivision {subdivisions}: {} vertices, {} faces, {} edges, Euler characteristic {}",
        topology.vertex_count(),
        topology.face_count(),
        topology.edge_count(),
        topology.euler_characteristic()
    );
    info!(
        "Mean edge length {:.4}, mean face area {:.6}, index {}x{} per octant ({} cells, {} KiB index buffer)",
        topology.edges().average_distance,
        topology.faces().average_area,
        topology.index().dimension(),
        topology.index().dimension(),
        topology.index().cell_count(),
        topology.index_buffer_bytes().len() / 1024
    );

    Ok(Arc::new(topology))
}
