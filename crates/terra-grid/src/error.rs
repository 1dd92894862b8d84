//! Error types for grid construction.

/// Errors raised by the cheaply checkable construction preconditions.
///
/// Geometric preconditions (closed, convex, consistently wound meshes) are not
/// checked; violating them yields meaningless but non-crashing output.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// A spatial structure was requested over zero points.
    #[error("cannot build a spatial index over an empty point set")]
    EmptyPointSet,

    /// Cell widths must be positive and finite.
    #[error("cell width must be positive and finite, got {0}")]
    InvalidCellWidth(f32),

    /// Index resolution (cells per vertex spacing) must be positive and finite.
    #[error("index resolution must be positive and finite, got {0}")]
    InvalidResolution(f32),

    /// The sphere index would need more cells than it is allowed to allocate.
    #[error("sphere index with {dimension} cells per octant side exceeds the cell budget")]
    IndexTooLarge { dimension: usize },

    /// The bucket grid would need more buckets than it is allowed to allocate.
    #[error("bucket grid of {dimensions:?} cells exceeds the bucket budget")]
    GridTooLarge { dimensions: [usize; 3] },

    /// A mesh topology needs at least one face.
    #[error("cannot build a mesh topology with no faces")]
    NoFaces,

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    /// A per-vertex series does not match the vertex count of its topology.
    #[error("expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Two rasters combined elementwise were defined over different topologies.
    #[error("rasters are defined over different mesh topologies")]
    TopologyMismatch,
}
