//! Precomputed nearest-seed lookup over the unit sphere.
//!
//! The sphere is split into eight octants. Each octant's tangent plane is covered by a
//! `dim × dim` grid; every grid cell is lifted back onto the sphere once at build time
//! and the id of the seed nearest to it is cached. A runtime query is then a sign test,
//! two dot products, and one table read.

use glam::Vec3;
use tracing::debug;

use crate::{GridError, Octant, OctantBasis, SpatialBucketGrid3D};

/// Coarsening steps attempted before falling back to a linear scan.
const MAX_COARSENING_STEPS: usize = 24;

/// Upper bound on the cached cells across all octants.
const MAX_CELLS: usize = 1 << 27;

/// Narrowest first rung of the resolver ladder, which keeps its bucket grid small for
/// unit-sphere seeds however fine the index is.
const MIN_RESOLVER_WIDTH: f32 = 1.0 / 128.0;

/// Voronoi cache over the unit sphere, mapping each surface cell to its nearest seed.
///
/// Read-only once built, so it can be shared across threads without synchronization.
#[derive(Debug, Clone)]
pub struct SphereNearestPointIndex {
    dimension: usize,
    cell_width: f32,
    bases: [OctantBasis; Octant::COUNT],
    cells: Vec<u32>,
}

impl SphereNearestPointIndex {
    /// Rasterize the sphere at `cell_width` resolution against `seeds`.
    ///
    /// Seeds are expected on or near the unit sphere. Each octant gets
    /// `ceil(2 / cell_width) + 1` cells per side, and a table over `2^27` cells is
    /// rejected with [`GridError::IndexTooLarge`]. The nearest seed for each cell is
    /// resolved on a bucket grid of twice the cell width, but no finer than `1/128`;
    /// cells whose answer that grid cannot confirm are retried on successively
    /// coarser grids.
    pub fn new(seeds: &[Vec3], cell_width: f32) -> Result<Self, GridError> {
        if !(cell_width.is_finite() && cell_width > 0.0) {
            return Err(GridError::InvalidCellWidth(cell_width));
        }
        if seeds.is_empty() {
            return Err(GridError::EmptyPointSet);
        }

        let dimension = ((2.0 / cell_width).ceil() as usize).saturating_add(1);
        let cell_count = dimension
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(Octant::COUNT))
            .filter(|&n| n <= MAX_CELLS)
            .ok_or(GridError::IndexTooLarge { dimension })?;

        let bases = Octant::ALL.map(Octant::basis);
        let base_width = (2.0 * cell_width).max(MIN_RESOLVER_WIDTH);
        let mut resolver = CoarseningResolver::new(seeds, base_width)?;

        let mut cells = Vec::with_capacity(cell_count);
        for basis in &bases {
            for xi in 0..dimension {
                let x = cell_center(xi, cell_width);
                for yi in 0..dimension {
                    let y = cell_center(yi, cell_width);
                    cells.push(resolver.nearest(basis.lift(x, y))?);
                }
            }
        }

        debug!(
            seeds = seeds.len(),
            dimension,
            cells = cells.len(),
            coarse_fallbacks = resolver.fallbacks,
            "built sphere nearest-point index"
        );

        Ok(Self {
            dimension,
            cell_width,
            bases,
            cells,
        })
    }

    /// Id of the seed nearest to a point on the unit sphere.
    ///
    /// The octant is picked from the point's sign bits and the cell coordinates are
    /// clamped to the table, so off-sphere points still resolve, just with less accuracy.
    #[must_use]
    pub fn nearest(&self, point: Vec3) -> u32 {
        let octant = Octant::containing(point);
        let (x, y) = self.bases[octant.index()].project(point);
        let xi = self.cell_coord(x);
        let yi = self.cell_coord(y);
        self.cells[self.cell_id(octant, xi, yi)]
    }

    /// Batch form of [`nearest`](Self::nearest).
    #[must_use]
    pub fn nearest_many(&self, points: &[Vec3]) -> Vec<u32> {
        points.iter().map(|&p| self.nearest(p)).collect()
    }

    /// Cells per side of each octant grid.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Side length of a cell in tangent-plane units.
    #[must_use]
    pub fn cell_width(&self) -> f32 {
        self.cell_width
    }

    /// Total number of cached cells across all octants.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cell_coord(&self, coord: f32) -> usize {
        let scaled = ((coord + 1.0) / self.cell_width).floor();
        (scaled.max(0.0) as usize).min(self.dimension - 1)
    }

    fn cell_id(&self, octant: Octant, xi: usize, yi: usize) -> usize {
        octant.index() * self.dimension * self.dimension + xi * self.dimension + yi
    }
}

/// Tangent-plane coordinate at the center of cell `i`.
fn cell_center(i: usize, cell_width: f32) -> f32 {
    (i as f32 + 0.5) * cell_width - 1.0
}

/// Exact nearest-seed resolution on a ladder of bucket grids, each twice as coarse as the last.
///
/// A bucket holds every point within half a cell of the query on each axis, so a
/// candidate closer than half a cell width is the true nearest. Otherwise the search
/// climbs to coarser rungs, built on demand, keeping the best candidate seen. A rung
/// whose cells span the whole point set stores every point in every bucket, so the
/// ladder always terminates.
struct CoarseningResolver<'a> {
    seeds: &'a [Vec3],
    rungs: Vec<SpatialBucketGrid3D>,
    fallbacks: usize,
}

impl<'a> CoarseningResolver<'a> {
    fn new(seeds: &'a [Vec3], base_width: f32) -> Result<Self, GridError> {
        Ok(Self {
            seeds,
            rungs: vec![SpatialBucketGrid3D::new(seeds, base_width)?],
            fallbacks: 0,
        })
    }

    fn nearest(&mut self, query: Vec3) -> Result<u32, GridError> {
        let mut best: Option<(u32, f32)> = None;

        for step in 0..MAX_COARSENING_STEPS {
            if step == self.rungs.len() {
                let width = self.rungs[step - 1].cell_width() * 2.0;
                self.rungs.push(SpatialBucketGrid3D::new(self.seeds, width)?);
            }
            let rung = &self.rungs[step];

            if let Some(id) = rung.nearest(query) {
                let distance = self.seeds[id as usize].distance(query);
                if best.is_none_or(|(_, d)| distance < d) {
                    best = Some((id, distance));
                }
            }
            if let Some((id, distance)) = best
                && distance < 0.5 * rung.cell_width()
            {
                if step > 0 {
                    self.fallbacks += 1;
                }
                return Ok(id);
            }
        }

        self.fallbacks += 1;
        self.seeds
            .iter()
            .enumerate()
            .min_by(|a, b| {
                a.1.distance_squared(query)
                    .total_cmp(&b.1.distance_squared(query))
            })
            .map(|(id, _)| id as u32)
            .ok_or(GridError::EmptyPointSet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// Fibonacci lattice: near-uniform points on the unit sphere.
    fn fibonacci_sphere(n: usize) -> Vec<Vec3> {
        let golden = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
        (0..n)
            .map(|i| {
                let y = 1.0 - 2.0 * (i as f32 + 0.5) / n as f32;
                let r = (1.0 - y * y).sqrt();
                let theta = golden * i as f32;
                Vec3::new(r * theta.cos(), y, r * theta.sin())
            })
            .collect()
    }

    fn random_unit_vector(rng: &mut ChaCha8Rng) -> Vec3 {
        loop {
            let v = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            let len = v.length();
            if len > 1e-3 && len <= 1.0 {
                return v / len;
            }
        }
    }

    fn brute_force_nearest(seeds: &[Vec3], query: Vec3) -> u32 {
        seeds
            .iter()
            .enumerate()
            .min_by(|a, b| {
                a.1.distance_squared(query)
                    .total_cmp(&b.1.distance_squared(query))
            })
            .map(|(i, _)| i as u32)
            .unwrap()
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            SphereNearestPointIndex::new(&[], 0.1).unwrap_err(),
            GridError::EmptyPointSet
        );
        assert!(matches!(
            SphereNearestPointIndex::new(&[Vec3::X], 0.0),
            Err(GridError::InvalidCellWidth(_))
        ));
    }

    #[test]
    fn test_oversized_index_is_rejected() {
        for width in [1e-4, 1e-6, f32::MIN_POSITIVE] {
            let result = SphereNearestPointIndex::new(&[Vec3::X], width);
            assert!(
                matches!(result, Err(GridError::IndexTooLarge { .. })),
                "width {width} should be rejected"
            );
        }
    }

    #[test]
    fn test_dimensions() {
        let index = SphereNearestPointIndex::new(&[Vec3::X, Vec3::NEG_X], 0.25).unwrap();
        assert_eq!(index.dimension(), 9);
        assert_eq!(index.cell_count(), 8 * 9 * 9);
        assert_eq!(index.cell_width(), 0.25);
    }

    #[test]
    fn test_single_seed_owns_whole_sphere() {
        let index = SphereNearestPointIndex::new(&[Vec3::Y], 0.1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(index.nearest(random_unit_vector(&mut rng)), 0);
        }
    }

    #[test]
    fn test_axis_seeds_partition_sphere() {
        let seeds = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        let index = SphereNearestPointIndex::new(&seeds, 0.05).unwrap();
        for (i, &seed) in seeds.iter().enumerate() {
            assert_eq!(index.nearest(seed), i as u32, "seed {seed:?}");
            // nudged toward a neighboring axis but still well inside its own cell
            let nudged = (seed + Vec3::new(0.1, 0.2, 0.15)).normalize();
            assert_eq!(index.nearest(nudged), i as u32, "nudged seed {seed:?}");
        }
    }

    #[test]
    fn test_self_lookup_on_fibonacci_sphere() {
        let seeds = fibonacci_sphere(200);
        let index = SphereNearestPointIndex::new(&seeds, 0.02).unwrap();
        for (i, &seed) in seeds.iter().enumerate() {
            assert_eq!(index.nearest(seed), i as u32, "seed {i} at {seed:?}");
        }
    }

    #[test]
    fn test_random_queries_are_near_true_nearest() {
        let seeds = fibonacci_sphere(100);
        let cell_width = 0.02;
        let index = SphereNearestPointIndex::new(&seeds, cell_width).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..500 {
            let query = random_unit_vector(&mut rng);
            let found = seeds[index.nearest(query) as usize];
            let best = seeds[brute_force_nearest(&seeds, query) as usize];
            // the cached answer is exact for the cell center, which sits within
            // a cell width of the query on the sphere
            assert!(
                found.distance(query) <= best.distance(query) + 4.0 * cell_width,
                "query {query:?}: found {found:?}, best {best:?}"
            );
        }
    }

    #[test]
    fn test_off_sphere_query_is_clamped() {
        let seeds = fibonacci_sphere(50);
        let index = SphereNearestPointIndex::new(&seeds, 0.1).unwrap();
        let id = index.nearest(Vec3::new(30.0, -40.0, 5.0));
        assert!((id as usize) < seeds.len());
        let id = index.nearest(Vec3::ZERO);
        assert!((id as usize) < seeds.len());
    }

    #[test]
    fn test_nearest_many_matches_nearest() {
        let seeds = fibonacci_sphere(64);
        let index = SphereNearestPointIndex::new(&seeds, 0.05).unwrap();
        let batch = index.nearest_many(&seeds);
        let single: Vec<u32> = seeds.iter().map(|&s| index.nearest(s)).collect();
        assert_eq!(batch, single);
    }

    #[test]
    fn test_coarsening_resolver_always_answers() {
        // a tiny base width leaves almost every bucket empty
        let seeds = [Vec3::X, Vec3::NEG_X];
        let mut resolver = CoarseningResolver::new(&seeds, 0.01).unwrap();
        assert_eq!(resolver.nearest(Vec3::new(0.9, 0.4, 0.0)).unwrap(), 0);
        assert_eq!(resolver.nearest(Vec3::new(-0.8, -0.5, 0.3)).unwrap(), 1);
        assert!(resolver.fallbacks > 0);
    }
}
