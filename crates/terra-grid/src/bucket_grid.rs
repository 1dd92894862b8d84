//! Uniform 3D bucket grid for approximate nearest-point queries.
//!
//! Points are bucketed by rounding their offset from the bounding-box minimum to the
//! nearest cell, and each point is also copied into the seven "upper" neighbors of
//! that cell. Queries round *up* instead. Together these guarantee that a query's
//! bucket holds every point within half a cell of it on each axis, so a single bucket
//! scan suffices for queries close to the point set.

use glam::Vec3;
use terra_math::Aabb3;

use crate::GridError;

/// Offsets of a home cell and its seven upper neighbors.
const UPPER_NEIGHBORHOOD: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 1, 0],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// Upper bound on the bucket count of a single grid.
const MAX_BUCKETS: usize = 1 << 27;

/// A uniform spatial hash over a fixed point set.
///
/// Built once, read-only afterwards. Each point is stored in up to eight buckets.
#[derive(Debug, Clone)]
pub struct SpatialBucketGrid3D {
    bounds: Aabb3,
    dimensions: [usize; 3],
    cell_width: f32,
    buckets: Vec<Vec<(u32, Vec3)>>,
}

impl SpatialBucketGrid3D {
    /// Bucket `points` into cells of side `cell_width`.
    ///
    /// Each axis gets `ceil(extent / cell_width) + 1` cells, and never fewer than two,
    /// so the upper-neighbor copies always stay in range even for a flat point set.
    /// Grids whose bucket count would exceed `2^27` are rejected with
    /// [`GridError::GridTooLarge`].
    pub fn new(points: &[Vec3], cell_width: f32) -> Result<Self, GridError> {
        if !(cell_width.is_finite() && cell_width > 0.0) {
            return Err(GridError::InvalidCellWidth(cell_width));
        }
        let bounds = Aabb3::from_points(points).ok_or(GridError::EmptyPointSet)?;

        let extent = bounds.size() / cell_width;
        let dimensions =
            [extent.x, extent.y, extent.z].map(|e| (e.ceil() as usize).saturating_add(1).max(2));
        let bucket_count = dimensions
            .iter()
            .try_fold(1_usize, |count, &d| count.checked_mul(d))
            .filter(|&count| count <= MAX_BUCKETS)
            .ok_or(GridError::GridTooLarge { dimensions })?;

        let mut grid = Self {
            bounds,
            dimensions,
            cell_width,
            buckets: vec![Vec::new(); bucket_count],
        };

        for (id, &point) in points.iter().enumerate() {
            let home = grid.home_cell(point);
            for offset in UPPER_NEIGHBORHOOD {
                let bucket = grid.bucket_id([
                    home[0] + offset[0],
                    home[1] + offset[1],
                    home[2] + offset[2],
                ]);
                grid.buckets[bucket].push((id as u32, point));
            }
        }

        Ok(grid)
    }

    /// Id of the closest point stored in the query's bucket.
    ///
    /// Returns `None` when that bucket is empty. Queries outside the bounding box are
    /// clamped to the nearest edge bucket, so the answer is only approximate there.
    #[must_use]
    pub fn nearest(&self, query: Vec3) -> Option<u32> {
        self.candidates(query)
            .iter()
            .min_by(|a, b| {
                a.1.distance_squared(query)
                    .total_cmp(&b.1.distance_squared(query))
            })
            .map(|&(id, _)| id)
    }

    /// All `(id, position)` pairs stored in the bucket a query resolves to.
    #[must_use]
    pub fn candidates(&self, query: Vec3) -> &[(u32, Vec3)] {
        let cell = self.query_cell(query);
        &self.buckets[self.bucket_id(cell)]
    }

    /// Number of cells along each axis.
    #[must_use]
    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    /// Side length of a cell.
    #[must_use]
    pub fn cell_width(&self) -> f32 {
        self.cell_width
    }

    /// Bounding box of the indexed points.
    #[must_use]
    pub fn bounds(&self) -> Aabb3 {
        self.bounds
    }

    /// Total number of buckets, empty or not.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of stored entries, counting the neighbor copies.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Cell a point is inserted into: rounded, clamped to `[0, dim - 2]`.
    fn home_cell(&self, point: Vec3) -> [usize; 3] {
        let scaled = ((point - self.bounds.min) / self.cell_width).round();
        [
            clamp_axis(scaled.x, self.dimensions[0] - 2),
            clamp_axis(scaled.y, self.dimensions[1] - 2),
            clamp_axis(scaled.z, self.dimensions[2] - 2),
        ]
    }

    /// Cell a query reads from: rounded up, clamped to `[0, dim - 1]`.
    fn query_cell(&self, point: Vec3) -> [usize; 3] {
        let scaled = ((point - self.bounds.min) / self.cell_width).ceil();
        [
            clamp_axis(scaled.x, self.dimensions[0] - 1),
            clamp_axis(scaled.y, self.dimensions[1] - 1),
            clamp_axis(scaled.z, self.dimensions[2] - 1),
        ]
    }

    fn bucket_id(&self, [xi, yi, zi]: [usize; 3]) -> usize {
        xi * self.dimensions[1] * self.dimensions[2] + yi * self.dimensions[2] + zi
    }
}

/// Convert an already rounded coordinate to an index in `[0, max_index]`.
/// Negative values and NaN map to zero.
fn clamp_axis(scaled: f32, max_index: usize) -> usize {
    (scaled.max(0.0) as usize).min(max_index)
}
