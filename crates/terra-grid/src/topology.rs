//! Mesh topology: edges, arrows, and per-entity geometry derived from a triangle mesh.
//!
//! A [`MeshTopology`] is built once from a vertex list and a face list describing a
//! closed convex polyhedron, and is immutable afterwards. Per-vertex fields
//! ([`Raster`](crate::Raster)s) share it through an `Arc`.

use std::time::Instant;

use glam::Vec3;
use rustc_hash::FxHashSet;
use terra_math::{aggregate_into, gather, map, mean, min, zip_map};
use tracing::{debug, warn};

use crate::{GridError, SphereNearestPointIndex};

/// Default resolution of the topology's nearest-vertex index, in index cells per
/// mean arrow length on the unit sphere.
pub const DEFAULT_CELLS_PER_SPACING: f32 = 4.0;

/// Per-vertex attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttributes {
    /// Input positions.
    pub positions: Vec<Vec3>,
    /// Area-weighted mean of incident face normals, normalized.
    pub normals: Vec<Vec3>,
    /// Portion of the incident faces' area attributed to the vertex.
    pub areas: Vec<f32>,
    /// Number of outgoing arrows.
    pub neighbor_counts: Vec<u32>,
    /// Targets of each vertex's outgoing arrows, ascending.
    pub neighbor_ids: Vec<Vec<u32>>,
    pub average_area: f32,
}

/// Per-face attributes. Faces keep their input order and winding.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceAttributes {
    pub vertex_ids: Vec<[u32; 3]>,
    pub endpoint_a: Vec<Vec3>,
    pub endpoint_b: Vec<Vec3>,
    pub endpoint_c: Vec<Vec3>,
    pub midpoints: Vec<Vec3>,
    /// `normalize(cross(c - b, a - b))`.
    pub normals: Vec<Vec3>,
    pub areas: Vec<f32>,
    pub average_area: f32,
}

/// Per-edge attributes. Each undirected edge appears once, as `[a, b]` with `a < b`.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeAttributes {
    pub vertex_ids: Vec<[u32; 2]>,
    pub endpoint_a: Vec<Vec3>,
    pub endpoint_b: Vec<Vec3>,
    pub midpoints: Vec<Vec3>,
    pub distances: Vec<f32>,
    /// Mean of the two endpoint vertex normals.
    pub normals: Vec<Vec3>,
    pub average_distance: f32,
}

/// Per-arrow attributes. Every edge yields two arrows, `[from, to]` and `[to, from]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowAttributes {
    pub vertex_ids: Vec<[u32; 2]>,
    pub endpoint_from: Vec<Vec3>,
    pub endpoint_to: Vec<Vec3>,
    pub midpoints: Vec<Vec3>,
    /// `endpoint_to - endpoint_from`.
    pub offsets: Vec<Vec3>,
    pub distances: Vec<f32>,
    /// Mean of the two endpoint vertex normals.
    pub normals: Vec<Vec3>,
    pub average_distance: f32,
}

/// Derived adjacency and geometry of a triangle mesh, plus a nearest-vertex index.
///
/// The input must describe a closed, convex, manifold surface with consistent outward
/// winding. That is a caller contract: violating it produces counts that break
/// `|E| = |V| + |F| - 2` and geometrically meaningless attributes, but never a panic.
#[derive(Debug, Clone)]
pub struct MeshTopology {
    buffer_array_vertex_ids: Vec<u32>,
    vertices: VertexAttributes,
    faces: FaceAttributes,
    edges: EdgeAttributes,
    arrows: ArrowAttributes,
    index: SphereNearestPointIndex,
}

impl MeshTopology {
    /// Build the topology with the default nearest-vertex index resolution.
    pub fn new(vertices: &[Vec3], faces: &[[u32; 3]]) -> Result<Self, GridError> {
        Self::with_index_resolution(vertices, faces, DEFAULT_CELLS_PER_SPACING)
    }

    /// Build the topology, sizing the nearest-vertex index at `cells_per_spacing`
    /// cells per mean arrow length.
    ///
    /// The index works on vertex directions: it is seeded with the normalized positions,
    /// and the arrow length is measured in units of the mean vertex radius, so the index
    /// size does not depend on the scale of the mesh. The mesh must be centered on the
    /// origin.
    pub fn with_index_resolution(
        vertices: &[Vec3],
        faces: &[[u32; 3]],
        cells_per_spacing: f32,
    ) -> Result<Self, GridError> {
        let started = Instant::now();
        validate(vertices, faces, cells_per_spacing)?;

        let buffer_array_vertex_ids: Vec<u32> = faces.iter().flatten().copied().collect();

        let faces = face_attributes(vertices, faces);
        let (areas, normals) = vertex_aggregates(vertices.len(), &faces);
        let arrow_ids = arrow_vertex_ids(&faces.vertex_ids);
        let edge_ids: Vec<[u32; 2]> = arrow_ids.iter().copied().filter(|[a, b]| b > a).collect();

        let edges = edge_attributes(vertices, &normals, edge_ids);
        let arrows = arrow_attributes(vertices, &normals, arrow_ids);

        let neighbor_ids = group_neighbor_ids(vertices.len(), &arrows.vertex_ids);
        let neighbor_counts = map(&neighbor_ids, |ids| ids.len() as u32);

        let vertices = VertexAttributes {
            positions: vertices.to_vec(),
            normals,
            average_area: mean(&areas),
            areas,
            neighbor_counts,
            neighbor_ids,
        };

        // a zero mean radius yields a non-finite width, which the index rejects
        let mean_radius = mean(&map(&vertices.positions, |p| p.length()));
        let directions = map(&vertices.positions, |p| p.normalize_or_zero());
        let index = SphereNearestPointIndex::new(
            &directions,
            arrows.average_distance / mean_radius / cells_per_spacing,
        )?;

        let topology = Self {
            buffer_array_vertex_ids,
            vertices,
            faces,
            edges,
            arrows,
            index,
        };

        debug!(
            vertices = topology.vertex_count(),
            faces = topology.face_count(),
            edges = topology.edge_count(),
            arrows = topology.arrow_count(),
            euler_characteristic = topology.euler_characteristic(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "built mesh topology"
        );
        if topology.euler_characteristic() != 2 {
            warn!(
                euler_characteristic = topology.euler_characteristic(),
                "mesh is not a closed genus-0 surface; derived attributes may be meaningless"
            );
        }

        Ok(topology)
    }

    /// Face vertex ids flattened to `3 * face_count` entries, for GPU index buffers.
    #[must_use]
    pub fn buffer_array_vertex_ids(&self) -> &[u32] {
        &self.buffer_array_vertex_ids
    }

    /// The flattened index buffer as raw bytes.
    #[must_use]
    pub fn index_buffer_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buffer_array_vertex_ids)
    }

    #[must_use]
    pub fn vertices(&self) -> &VertexAttributes {
        &self.vertices
    }

    #[must_use]
    pub fn faces(&self) -> &FaceAttributes {
        &self.faces
    }

    #[must_use]
    pub fn edges(&self) -> &EdgeAttributes {
        &self.edges
    }

    #[must_use]
    pub fn arrows(&self) -> &ArrowAttributes {
        &self.arrows
    }

    /// The nearest-vertex index over the vertex positions.
    #[must_use]
    pub fn index(&self) -> &SphereNearestPointIndex {
        &self.index
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.positions.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.vertex_ids.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.vertex_ids.len()
    }

    #[must_use]
    pub fn arrow_count(&self) -> usize {
        self.arrows.vertex_ids.len()
    }

    /// `V - E + F`; equals 2 for a closed genus-0 surface.
    #[must_use]
    pub fn euler_characteristic(&self) -> i64 {
        self.vertex_count() as i64 - self.edge_count() as i64 + self.face_count() as i64
    }

    /// Ids of the vertices one arrow away from `vertex`, ascending.
    ///
    /// # Panics
    ///
    /// Panics if `vertex` is out of range.
    #[must_use]
    pub fn neighbors(&self, vertex: u32) -> &[u32] {
        &self.vertices.neighbor_ids[vertex as usize]
    }

    /// Id of the vertex whose direction is nearest to `point`'s direction.
    #[must_use]
    pub fn nearest_vertex(&self, point: Vec3) -> u32 {
        self.index.nearest(point.normalize_or_zero())
    }

    /// Batch form of [`nearest_vertex`](Self::nearest_vertex).
    #[must_use]
    pub fn nearest_vertices(&self, points: &[Vec3]) -> Vec<u32> {
        points.iter().map(|&p| self.nearest_vertex(p)).collect()
    }

    /// Shortest arrow length, or `0.0` for a topology without arrows.
    #[must_use]
    pub fn min_arrow_distance(&self) -> f32 {
        min(&self.arrows.distances).unwrap_or(0.0)
    }
}

fn validate(vertices: &[Vec3], faces: &[[u32; 3]], cells_per_spacing: f32) -> Result<(), GridError> {
    if vertices.is_empty() {
        return Err(GridError::EmptyPointSet);
    }
    if faces.is_empty() {
        return Err(GridError::NoFaces);
    }
    if !(cells_per_spacing.is_finite() && cells_per_spacing > 0.0) {
        return Err(GridError::InvalidResolution(cells_per_spacing));
    }
    for (face, ids) in faces.iter().enumerate() {
        if let Some(&index) = ids.iter().find(|&&id| id as usize >= vertices.len()) {
            return Err(GridError::FaceIndexOutOfRange {
                face,
                index,
                vertex_count: vertices.len(),
            });
        }
    }
    Ok(())
}

fn face_attributes(vertices: &[Vec3], faces: &[[u32; 3]]) -> FaceAttributes {
    let endpoint_a = gather(vertices, &map(faces, |f| f[0]));
    let endpoint_b = gather(vertices, &map(faces, |f| f[1]));
    let endpoint_c = gather(vertices, &map(faces, |f| f[2]));

    let midpoints: Vec<Vec3> = (0..faces.len())
        .map(|i| (endpoint_a[i] + endpoint_b[i] + endpoint_c[i]) / 3.0)
        .collect();
    // |cross| is the parallelogram area, so half of it is the triangle's
    let crosses: Vec<Vec3> = (0..faces.len())
        .map(|i| (endpoint_c[i] - endpoint_b[i]).cross(endpoint_a[i] - endpoint_b[i]))
        .collect();
    let normals = map(&crosses, |c| c.normalize_or_zero());
    let areas = map(&crosses, |c| c.length() * 0.5);

    FaceAttributes {
        vertex_ids: faces.to_vec(),
        endpoint_a,
        endpoint_b,
        endpoint_c,
        midpoints,
        normals,
        average_area: mean(&areas),
        areas,
    }
}

/// Per-vertex areas and normals accumulated from the incident faces.
///
/// A face contributes to each corner the area of the triangle spanned by the halves of
/// the two edges leaving that corner, and its area-weighted normal.
fn vertex_aggregates(vertex_count: usize, faces: &FaceAttributes) -> (Vec<f32>, Vec<Vec3>) {
    let corner_area = |v: &Vec3, other1: &Vec3, other2: &Vec3| {
        ((*other1 - *v) * 0.5).cross((*other2 - *v) * 0.5).length() * 0.5
    };
    let area_a: Vec<f32> = (0..faces.areas.len())
        .map(|i| corner_area(&faces.endpoint_a[i], &faces.endpoint_c[i], &faces.endpoint_b[i]))
        .collect();
    let area_b: Vec<f32> = (0..faces.areas.len())
        .map(|i| corner_area(&faces.endpoint_b[i], &faces.endpoint_a[i], &faces.endpoint_c[i]))
        .collect();
    let area_c: Vec<f32> = (0..faces.areas.len())
        .map(|i| corner_area(&faces.endpoint_c[i], &faces.endpoint_b[i], &faces.endpoint_a[i]))
        .collect();

    let id_a = map(&faces.vertex_ids, |f| f[0]);
    let id_b = map(&faces.vertex_ids, |f| f[1]);
    let id_c = map(&faces.vertex_ids, |f| f[2]);

    let mut areas = vec![0.0_f32; vertex_count];
    aggregate_into(&area_a, &id_a, &mut areas, |acc, a| acc + a);
    aggregate_into(&area_b, &id_b, &mut areas, |acc, a| acc + a);
    aggregate_into(&area_c, &id_c, &mut areas, |acc, a| acc + a);

    let weighted = zip_map(&faces.normals, &faces.areas, |n, a| *n * *a);
    let mut normals = vec![Vec3::ZERO; vertex_count];
    aggregate_into(&weighted, &id_a, &mut normals, |acc, n| acc + n);
    aggregate_into(&weighted, &id_b, &mut normals, |acc, n| acc + n);
    aggregate_into(&weighted, &id_c, &mut normals, |acc, n| acc + n);
    for normal in &mut normals {
        *normal = normal.normalize_or_zero();
    }

    (areas, normals)
}

/// Both directions of every face edge, deduplicated and sorted by
/// `(min(from, to), max(from, to), from)`.
fn arrow_vertex_ids(faces: &[[u32; 3]]) -> Vec<[u32; 2]> {
    let mut set: FxHashSet<[u32; 2]> = FxHashSet::default();
    set.reserve(faces.len() * 3);
    for &[a, b, c] in faces {
        for (from, to) in [(a, b), (b, c), (c, a)] {
            set.insert([from, to]);
            set.insert([to, from]);
        }
    }

    let mut arrows: Vec<[u32; 2]> = set.into_iter().collect();
    arrows.sort_unstable_by_key(|&[from, to]| (from.min(to), from.max(to), from));
    arrows
}

/// Per-vertex lists of arrow targets. Arrows sorted by undirected pair list each
/// vertex's targets in ascending order.
fn group_neighbor_ids(vertex_count: usize, arrows: &[[u32; 2]]) -> Vec<Vec<u32>> {
    let mut ids = vec![Vec::new(); vertex_count];
    for &[from, to] in arrows {
        ids[from as usize].push(to);
    }
    ids
}

fn edge_attributes(vertices: &[Vec3], vertex_normals: &[Vec3], vertex_ids: Vec<[u32; 2]>) -> EdgeAttributes {
    let id_a = map(&vertex_ids, |e| e[0]);
    let id_b = map(&vertex_ids, |e| e[1]);
    let endpoint_a = gather(vertices, &id_a);
    let endpoint_b = gather(vertices, &id_b);
    let distances = zip_map(&endpoint_a, &endpoint_b, |a, b| a.distance(*b));
    let midpoints = zip_map(&endpoint_a, &endpoint_b, |a, b| (*a + *b) * 0.5);
    let normals = zip_map(
        &gather(vertex_normals, &id_a),
        &gather(vertex_normals, &id_b),
        |a, b| (*a + *b) * 0.5,
    );

    EdgeAttributes {
        vertex_ids,
        endpoint_a,
        endpoint_b,
        midpoints,
        average_distance: mean(&distances),
        distances,
        normals,
    }
}

fn arrow_attributes(vertices: &[Vec3], vertex_normals: &[Vec3], vertex_ids: Vec<[u32; 2]>) -> ArrowAttributes {
    let id_from = map(&vertex_ids, |a| a[0]);
    let id_to = map(&vertex_ids, |a| a[1]);
    let endpoint_from = gather(vertices, &id_from);
    let endpoint_to = gather(vertices, &id_to);
    let distances = zip_map(&endpoint_from, &endpoint_to, |a, b| a.distance(*b));
    let offsets = zip_map(&endpoint_from, &endpoint_to, |from, to| *to - *from);
    let midpoints = zip_map(&endpoint_from, &endpoint_to, |a, b| (*a + *b) * 0.5);
    let normals = zip_map(
        &gather(vertex_normals, &id_from),
        &gather(vertex_normals, &id_to),
        |a, b| (*a + *b) * 0.5,
    );

    ArrowAttributes {
        vertex_ids,
        endpoint_from,
        endpoint_to,
        midpoints,
        offsets,
        average_distance: mean(&distances),
        distances,
        normals,
    }
}
