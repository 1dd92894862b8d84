//! Per-vertex fields over a shared mesh topology.

use std::ops::{Add, Index, Mul};
use std::sync::Arc;

use glam::Vec3;

use crate::calculus::{
    scalar_average_difference, scalar_gradient, scalar_laplacian, vector_curl, vector_divergence,
};
use crate::{GridError, MeshTopology};

/// One value per vertex of a [`MeshTopology`].
///
/// Many rasters can share one topology; the topology never refers back to them.
#[derive(Debug, Clone)]
pub struct Raster<T> {
    topology: Arc<MeshTopology>,
    values: Vec<T>,
}

/// A scalar field such as elevation or temperature.
pub type ScalarRaster = Raster<f32>;

/// A vector field such as a gradient or a velocity.
pub type VectorRaster = Raster<Vec3>;

impl<T> Raster<T> {
    /// Wrap existing values, checking there is exactly one per vertex.
    pub fn from_values(topology: Arc<MeshTopology>, values: Vec<T>) -> Result<Self, GridError> {
        let expected = topology.vertex_count();
        if values.len() != expected {
            return Err(GridError::LengthMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { topology, values })
    }

    /// Evaluate `f(vertex_id, position)` at every vertex.
    pub fn from_fn(topology: Arc<MeshTopology>, mut f: impl FnMut(u32, Vec3) -> T) -> Self {
        let values = topology
            .vertices()
            .positions
            .iter()
            .enumerate()
            .map(|(id, &position)| f(id as u32, position))
            .collect();
        Self { topology, values }
    }

    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[must_use]
    pub fn topology(&self) -> &Arc<MeshTopology> {
        &self.topology
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Apply `f` to every value, keeping the topology.
    #[must_use]
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Raster<U> {
        Raster {
            topology: Arc::clone(&self.topology),
            values: self.values.iter().map(f).collect(),
        }
    }

    /// Combine two rasters vertex by vertex.
    ///
    /// Both must share the same topology instance.
    pub fn zip_map<U, V>(
        &self,
        other: &Raster<U>,
        mut f: impl FnMut(&T, &U) -> V,
    ) -> Result<Raster<V>, GridError> {
        if !Arc::ptr_eq(&self.topology, &other.topology) {
            if self.len() != other.len() {
                return Err(GridError::LengthMismatch {
                    expected: self.len(),
                    actual: other.len(),
                });
            }
            return Err(GridError::TopologyMismatch);
        }
        Ok(Raster {
            topology: Arc::clone(&self.topology),
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| f(a, b))
                .collect(),
        })
    }
}

impl<T: Clone> Raster<T> {
    /// The same value at every vertex.
    pub fn filled(topology: Arc<MeshTopology>, value: T) -> Self {
        let values = vec![value; topology.vertex_count()];
        Self { topology, values }
    }

    /// Re-grid onto another topology, giving each target vertex the value of the
    /// nearest vertex of this raster.
    #[must_use]
    pub fn resample_onto(&self, target: Arc<MeshTopology>) -> Raster<T> {
        let values = self
            .topology
            .nearest_vertices(&target.vertices().positions)
            .into_iter()
            .map(|id| self.values[id as usize].clone())
            .collect();
        Raster {
            topology: target,
            values,
        }
    }
}

impl<T> Raster<T>
where
    T: Copy + Default + Add<Output = T> + Mul<f32, Output = T>,
{
    /// Re-grid scattered samples by snapping each point to its nearest vertex.
    ///
    /// Samples landing on the same vertex are averaged; vertices that receive no sample
    /// hold `T::default()`.
    pub fn from_scattered(
        topology: Arc<MeshTopology>,
        points: &[Vec3],
        values: &[T],
    ) -> Result<Self, GridError> {
        if points.len() != values.len() {
            return Err(GridError::LengthMismatch {
                expected: points.len(),
                actual: values.len(),
            });
        }

        let mut sums = vec![T::default(); topology.vertex_count()];
        let mut counts = vec![0_u32; topology.vertex_count()];
        for (id, &value) in topology.nearest_vertices(points).into_iter().zip(values) {
            sums[id as usize] = sums[id as usize] + value;
            counts[id as usize] += 1;
        }

        let values = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, count)| {
                if count == 0 {
                    T::default()
                } else {
                    sum * (1.0 / count as f32)
                }
            })
            .collect();
        Ok(Self { topology, values })
    }
}

impl ScalarRaster {
    /// Per-vertex gradient, see [`gradient`](crate::gradient).
    #[must_use]
    pub fn gradient(&self) -> VectorRaster {
        Raster {
            topology: Arc::clone(&self.topology),
            values: scalar_gradient(&self.topology, &self.values),
        }
    }

    /// Per-vertex Laplacian, see [`laplacian`](crate::laplacian).
    #[must_use]
    pub fn laplacian(&self) -> ScalarRaster {
        Raster {
            topology: Arc::clone(&self.topology),
            values: scalar_laplacian(&self.topology, &self.values),
        }
    }

    #[must_use]
    pub fn average_difference(&self) -> ScalarRaster {
        Raster {
            topology: Arc::clone(&self.topology),
            values: scalar_average_difference(&self.topology, &self.values),
        }
    }
}

impl VectorRaster {
    /// Per-vertex divergence, see [`divergence`](crate::divergence).
    #[must_use]
    pub fn divergence(&self) -> ScalarRaster {
        Raster {
            topology: Arc::clone(&self.topology),
            values: vector_divergence(&self.topology, &self.values),
        }
    }

    /// Per-vertex curl, see [`curl`](crate::curl).
    #[must_use]
    pub fn curl(&self) -> VectorRaster {
        Raster {
            topology: Arc::clone(&self.topology),
            values: vector_curl(&self.topology, &self.values),
        }
    }
}

impl<T> Index<usize> for Raster<T> {
    type Output = T;

    fn index(&self, vertex: usize) -> &T {
        &self.values[vertex]
    }
}
