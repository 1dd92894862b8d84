//! Planet mesh topology, spherical point location, and discrete vector calculus.
//!
//! [`MeshTopology`] derives edges, arrows (directed edges), and per-entity geometry from a
//! closed triangle mesh. Nearest-vertex queries are answered by a
//! [`SphereNearestPointIndex`], an octahedral lookup table populated once with the help of
//! a [`SpatialBucketGrid3D`]. Per-vertex fields live in [`Raster`]s that share a topology
//! through an `Arc`.

mod bucket_grid;
mod calculus;
mod error;
mod icosphere;
mod octant;
mod raster;
mod sphere_index;
mod topology;

pub use bucket_grid::SpatialBucketGrid3D;
pub use calculus::{
    arrow_differential, average_difference, curl, divergence, gradient, laplacian,
};
pub use error::GridError;
pub use icosphere::{SphereMesh, icosphere};
pub use octant::{Octant, OctantBasis};
pub use raster::{Raster, ScalarRaster, VectorRaster};
pub use sphere_index::SphereNearestPointIndex;
pub use topology::{
    ArrowAttributes, DEFAULT_CELLS_PER_SPACING, EdgeAttributes, FaceAttributes, MeshTopology,
    VertexAttributes,
};
