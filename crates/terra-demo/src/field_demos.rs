//! Field demonstrations over a planet topology.

use std::sync::Arc;

use glam::Vec3;
use noise::{NoiseFn, Simplex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use terra_config::FieldConfig;
use terra_grid::{GridError, MeshTopology, ScalarRaster};
use tracing::info;

const OCTAVES: u32 = 4;

/// Fractal simplex noise on the unit sphere, roughly in `[-1, 1]`.
fn fbm(noise: &Simplex, p: Vec3, base_frequency: f64) -> f32 {
    let mut total = 0.0;
    let mut frequency = base_frequency;
    let mut amplitude = 0.5;
    for _ in 0..OCTAVES {
        let sample = [
            f64::from(p.x) * frequency,
            f64::from(p.y) * frequency,
            f64::from(p.z) * frequency,
        ];
        total += noise.get(sample) * amplitude;
        frequency *= 2.0;
        amplitude *= 0.5;
    }
    total as f32
}

fn random_directions(rng: &mut ChaCha8Rng, count: usize) -> Vec<Vec3> {
    let mut directions = Vec::with_capacity(count);
    while directions.len() < count {
        let v = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        let len = v.length();
        if len > 1e-3 && len <= 1.0 {
            directions.push(v / len);
        }
    }
    directions
}

/// Builds a noise height field, differentiates it, and logs slope statistics.
pub(crate) fn demonstrate_height_gradient(
    topology: &Arc<MeshTopology>,
    field: &FieldConfig,
) -> ScalarRaster {
    info!("Starting height gradient demonstration");

    let noise = Simplex::new(field.seed);
    let height = ScalarRaster::from_fn(Arc::clone(topology), |_, p| fbm(&noise, p, field.frequency));
    let slope = height.gradient().map(|g| g.length());
    let laplacian = height.laplacian();

    let values = height.values();
    let (lowest, highest) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| (lo.min(h), hi.max(h)));
    let mean_slope = slope.values().iter().sum::<f32>() / slope.len() as f32;
    let max_slope = slope.values().iter().copied().fold(0.0_f32, f32::max);
    let mean_laplacian = laplacian.values().iter().sum::<f32>() / laplacian.len() as f32;

    info!("Height range [{lowest:.3}, {highest:.3}] over {} vertices", values.len());
    info!("Slope mean {mean_slope:.3}, max {max_slope:.3}; mean Laplacian {mean_laplacian:.3e}");
    info!("Height gradient demonstration completed successfully");
    height
}

/// Snaps random queries to vertices and checks them against a brute-force search.
pub(crate) fn demonstrate_nearest_vertex(topology: &MeshTopology, field: &FieldConfig) {
    info!("Starting nearest-vertex demonstration");

    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(field.seed));
    let queries = random_directions(&mut rng, field.sample_count);
    let positions = &topology.vertices().positions;

    let mut exact = 0;
    let mut worst_excess: f32 = 0.0;
    for (&query, id) in queries.iter().zip(topology.nearest_vertices(&queries)) {
        let found = positions[id as usize].distance(query);
        let best = positions
            .iter()
            .map(|p| p.distance(query))
            .fold(f32::INFINITY, f32::min);
        if found <= best {
            exact += 1;
        }
        worst_excess = worst_excess.max(found - best);
    }

    info!(
        "{exact}/{} queries resolved to the exact nearest vertex (worst excess distance {worst_excess:.2e})",
        queries.len()
    );
    info!("Nearest-vertex demonstration completed successfully");
}

/// Re-grids a field onto a coarser planet.
pub(crate) fn demonstrate_resampling(height: &ScalarRaster, coarse: &Arc<MeshTopology>) {
    info!("Starting resampling demonstration");

    let resampled = height.resample_onto(Arc::clone(coarse));
    let mean = |r: &ScalarRaster| r.values().iter().sum::<f32>() / r.len() as f32;
    info!(
        "Resampled {} vertices onto {} (mean height {:.4} -> {:.4})",
        height.len(),
        resampled.len(),
        mean(height),
        mean(&resampled)
    );
    info!("Resampling demonstration completed successfully");
}

/// Grids scattered noise samples onto the planet by nearest-vertex assignment.
pub(crate) fn demonstrate_scattered_samples(
    topology: &Arc<MeshTopology>,
    field: &FieldConfig,
) -> Result<(), GridError> {
    info!("Starting scattered sample demonstration");

    let noise = Simplex::new(field.seed.wrapping_add(1));
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(field.seed) ^ 0x5eed);
    let points = random_directions(&mut rng, field.sample_count);
    let values: Vec<f32> = points.iter().map(|&p| fbm(&noise, p, field.frequency)).collect();

    let raster = ScalarRaster::from_scattered(Arc::clone(topology), &points, &values)?;
    let mut covered = vec![false; topology.vertex_count()];
    for id in topology.nearest_vertices(&points) {
        covered[id as usize] = true;
    }
    let covered = covered.iter().filter(|&&c| c).count();

    info!(
        "Gridded {} samples onto {covered}/{} vertices",
        points.len(),
        raster.len()
    );
    info!("Scattered sample demonstration completed successfully");
    Ok(())
}
