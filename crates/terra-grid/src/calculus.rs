//! Discrete differential operators over per-vertex fields.

use std::ops::Sub;

use glam::Vec3;
use terra_math::aggregate_into;

use crate::{GridError, MeshTopology};

/// Finite-volume gradient of a per-vertex scalar field.
///
/// Every arrow contributes `(field[to] - field[from]) * offset` to its `from` vertex.
/// The sums are averaged over each vertex's neighbors and scaled by
/// `1 / (mean_arrow_length / 2)²`, the area term of a disc of half the typical
/// neighbor spacing. The unit-length offset is deliberately not used, so longer arrows
/// carry proportionally more flux.
///
/// A vertex without neighbors divides by zero and yields NaN components; meshes built
/// from closed surfaces have none.
pub fn gradient(topology: &MeshTopology, field: &[f32]) -> Result<Vec<Vec3>, GridError> {
    check_len(topology, field.len())?;
    Ok(scalar_gradient(topology, field))
}

/// Discrete divergence of a per-vertex vector field.
///
/// Every arrow contributes the change of the field along its unit direction, divided by
/// its length, to its `from` vertex. Sums are averaged over each vertex's neighbors;
/// vertices without neighbors stay at zero.
pub fn divergence(topology: &MeshTopology, field: &[Vec3]) -> Result<Vec<f32>, GridError> {
    check_len(topology, field.len())?;
    Ok(vector_divergence(topology, field))
}

/// Discrete curl of a per-vertex vector field.
///
/// The rotational counterpart of [`divergence`]: every arrow contributes the cross
/// product of its unit direction with the change of the field along it, divided by its
/// length. Sums are averaged over each vertex's neighbors; vertices without neighbors
/// stay at zero.
pub fn curl(topology: &MeshTopology, field: &[Vec3]) -> Result<Vec<Vec3>, GridError> {
    check_len(topology, field.len())?;
    Ok(vector_curl(topology, field))
}

/// Mean change of a scalar field from each vertex to its neighbors.
///
/// Vertices without neighbors stay at zero.
pub fn average_difference(topology: &MeshTopology, field: &[f32]) -> Result<Vec<f32>, GridError> {
    check_len(topology, field.len())?;
    Ok(scalar_average_difference(topology, field))
}

/// Graph Laplacian of a scalar field.
///
/// The [`average_difference`] per unit area, taking the square of the mean arrow length
/// as the area a vertex covers. Positive where a vertex lies below its neighbors.
pub fn laplacian(topology: &MeshTopology, field: &[f32]) -> Result<Vec<f32>, GridError> {
    check_len(topology, field.len())?;
    Ok(scalar_laplacian(topology, field))
}

/// Change of a per-vertex field along every arrow, `field[to] - field[from]`, in arrow
/// order.
pub fn arrow_differential<T>(topology: &MeshTopology, field: &[T]) -> Result<Vec<T>, GridError>
where
    T: Copy + Sub<Output = T>,
{
    check_len(topology, field.len())?;
    Ok(topology
        .arrows()
        .vertex_ids
        .iter()
        .map(|&[from, to]| field[to as usize] - field[from as usize])
        .collect())
}

pub(crate) fn scalar_gradient(topology: &MeshTopology, field: &[f32]) -> Vec<Vec3> {
    let arrows = topology.arrows();
    let mut result = vec![Vec3::ZERO; topology.vertex_count()];
    for (&[from, to], &offset) in arrows.vertex_ids.iter().zip(&arrows.offsets) {
        let delta = field[to as usize] - field[from as usize];
        result[from as usize] += offset * delta;
    }

    let half_spacing = arrows.average_distance * 0.5;
    let inverse_area = 1.0 / (half_spacing * half_spacing);
    for (value, &count) in result.iter_mut().zip(&topology.vertices().neighbor_counts) {
        *value = *value / count as f32 * inverse_area;
    }
    result
}

pub(crate) fn vector_divergence(topology: &MeshTopology, field: &[Vec3]) -> Vec<f32> {
    let arrows = topology.arrows();
    let mut result = vec![0.0_f32; topology.vertex_count()];
    for ((&[from, to], &offset), &distance) in arrows
        .vertex_ids
        .iter()
        .zip(&arrows.offsets)
        .zip(&arrows.distances)
    {
        if distance == 0.0 {
            continue;
        }
        let delta = field[to as usize] - field[from as usize];
        result[from as usize] += delta.dot(offset / distance) / distance;
    }

    for (value, &count) in result.iter_mut().zip(&topology.vertices().neighbor_counts) {
        if count > 0 {
            *value /= count as f32;
        }
    }
    result
}

pub(crate) fn vector_curl(topology: &MeshTopology, field: &[Vec3]) -> Vec<Vec3> {
    let arrows = topology.arrows();
    let mut result = vec![Vec3::ZERO; topology.vertex_count()];
    for ((&[from, to], &offset), &distance) in arrows
        .vertex_ids
        .iter()
        .zip(&arrows.offsets)
        .zip(&arrows.distances)
    {
        if distance == 0.0 {
            continue;
        }
        let delta = field[to as usize] - field[from as usize];
        result[from as usize] += (offset / distance).cross(delta) / distance;
    }

    for (value, &count) in result.iter_mut().zip(&topology.vertices().neighbor_counts) {
        if count > 0 {
            *value /= count as f32;
        }
    }
    result
}

pub(crate) fn scalar_average_difference(topology: &MeshTopology, field: &[f32]) -> Vec<f32> {
    let arrows = &topology.arrows().vertex_ids;
    let deltas: Vec<f32> = arrows
        .iter()
        .map(|&[from, to]| field[to as usize] - field[from as usize])
        .collect();
    let from_ids: Vec<u32> = arrows.iter().map(|&[from, _]| from).collect();

    let mut result = vec![0.0_f32; topology.vertex_count()];
    aggregate_into(&deltas, &from_ids, &mut result, |acc, delta| acc + delta);
    for (value, &count) in result.iter_mut().zip(&topology.vertices().neighbor_counts) {
        if count > 0 {
            *value /= count as f32;
        }
    }
    result
}

pub(crate) fn scalar_laplacian(topology: &MeshTopology, field: &[f32]) -> Vec<f32> {
    let spacing = topology.arrows().average_distance;
    let inverse_area = 1.0 / (spacing * spacing);
    let mut result = scalar_average_difference(topology, field);
    for value in &mut result {
        *value *= inverse_area;
    }
    result
}

fn check_len(topology: &MeshTopology, actual: usize) -> Result<(), GridError> {
    let expected = topology.vertex_count();
    if actual != expected {
        return Err(GridError::LengthMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icosphere;

    /// Planar mesh: a center vertex with four arms along the x and y axes.
    fn diamond() -> MeshTopology {
        let vertices = [
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::NEG_X,
            Vec3::NEG_Y,
        ];
        let faces = [[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
        MeshTopology::new(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_gradient_on_diamond_follows_the_raised_arm() {
        let topology = diamond();
        let field = [0.0, 1.0, 0.0, 0.0, 0.0];
        let g = gradient(&topology, &field).unwrap()[0];
        assert!(g.length() > 0.0, "gradient vanished: {g:?}");
        assert!(g.x > 0.0, "gradient {g:?} does not point toward +x");
        assert!(g.y.abs() < 1e-6 && g.z.abs() < 1e-6, "gradient {g:?} is not along x");

        let half_spacing = topology.arrows().average_distance * 0.5;
        let expected = 0.25 / (half_spacing * half_spacing);
        assert!((g.x - expected).abs() < 1e-5, "got {}, expected {expected}", g.x);
    }

    #[test]
    fn test_gradient_of_constant_field_is_zero() {
        let mesh = icosphere(2);
        let topology = MeshTopology::new(&mesh.vertices, &mesh.faces).unwrap();
        let field = vec![3.5_f32; topology.vertex_count()];
        for (i, g) in gradient(&topology, &field).unwrap().iter().enumerate() {
            assert_eq!(*g, Vec3::ZERO, "vertex {i}");
        }
    }

    #[test]
    fn test_gradient_of_linear_field_is_tangent_aligned() {
        let mesh = icosphere(3);
        let topology = MeshTopology::new(&mesh.vertices, &mesh.faces).unwrap();
        let field: Vec<f32> = mesh.vertices.iter().map(|v| v.x).collect();
        let grad = gradient(&topology, &field).unwrap();
        for (i, (&g, &p)) in grad.iter().zip(&mesh.vertices).enumerate() {
            let tangent = Vec3::X - p * p.x;
            if tangent.length() < 0.5 {
                continue;
            }
            assert!(g.dot(tangent) > 0.0, "vertex {i}: gradient {g:?}, tangent {tangent:?}");
        }
    }

    #[test]
    fn test_gradient_rejects_wrong_length() {
        let topology = diamond();
        assert_eq!(
            gradient(&topology, &[0.0; 3]).unwrap_err(),
            GridError::LengthMismatch {
                expected: 5,
                actual: 3
            }
        );
    }

    #[test]
    fn test_divergence_of_identity_field() {
        let topology = diamond();
        let field = topology.vertices().positions.clone();
        let div = divergence(&topology, &field).unwrap();
        // every arrow sees a unit rate of change along itself
        for (i, &d) in div.iter().enumerate() {
            assert!((d - 1.0).abs() < 1e-5, "vertex {i}: divergence {d}");
        }
    }

    #[test]
    fn test_divergence_of_constant_field_is_zero() {
        let mesh = icosphere(1);
        let topology = MeshTopology::new(&mesh.vertices, &mesh.faces).unwrap();
        let field = vec![Vec3::new(1.0, -2.0, 0.5); topology.vertex_count()];
        assert!(divergence(&topology, &field).unwrap().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_curl_of_rotation_on_diamond() {
        let topology = diamond();
        let field: Vec<Vec3> = topology
            .vertices()
            .positions
            .iter()
            .map(|&p| Vec3::Z.cross(p))
            .collect();
        // each arrow sees a unit rate of turning about +z
        for (i, c) in curl(&topology, &field).unwrap().iter().enumerate() {
            assert!((*c - Vec3::Z).length() < 1e-5, "vertex {i}: curl {c:?}");
        }
    }

    #[test]
    fn test_curl_of_identity_field_is_zero() {
        let mesh = icosphere(2);
        let topology = MeshTopology::new(&mesh.vertices, &mesh.faces).unwrap();
        let c = curl(&topology, &mesh.vertices).unwrap();
        for (i, v) in c.iter().enumerate() {
            assert!(v.length() < 1e-4, "vertex {i}: curl {v:?}");
        }
        assert!(matches!(
            curl(&topology, &[Vec3::ZERO]),
            Err(GridError::LengthMismatch { actual: 1, .. })
        ));
    }

    #[test]
    fn test_average_difference_on_diamond() {
        let topology = diamond();
        let field = [0.0, 1.0, 0.0, 0.0, 0.0];
        let diff = average_difference(&topology, &field).unwrap();
        assert_eq!(diff[0], 0.25);
        // vertex 1 has neighbors 0, 2 and 4, all one lower
        assert_eq!(diff[1], -1.0);
        assert_eq!(diff[3], 0.0);
    }

    #[test]
    fn test_laplacian_scales_average_difference_by_area() {
        let topology = diamond();
        let field = [0.0, 1.0, 0.0, 0.0, 0.0];
        let lap = laplacian(&topology, &field).unwrap();
        let spacing = topology.arrows().average_distance;
        let expected = 0.25 / (spacing * spacing);
        assert!((lap[0] - expected).abs() < 1e-6, "got {}, expected {expected}", lap[0]);
        assert!(lap[1] < 0.0, "peak vertex laplacian {}", lap[1]);
    }

    #[test]
    fn test_laplacian_of_height_flips_sign_between_poles() {
        let mesh = icosphere(3);
        let topology = MeshTopology::new(&mesh.vertices, &mesh.faces).unwrap();
        let field: Vec<f32> = mesh.vertices.iter().map(|v| v.z).collect();
        let lap = laplacian(&topology, &field).unwrap();
        for (i, (&l, p)) in lap.iter().zip(&mesh.vertices).enumerate() {
            if p.z > 0.8 {
                assert!(l < 0.0, "vertex {i} at {p:?}: laplacian {l}");
            } else if p.z < -0.8 {
                assert!(l > 0.0, "vertex {i} at {p:?}: laplacian {l}");
            }
        }
        let constant = vec![2.0_f32; topology.vertex_count()];
        assert!(laplacian(&topology, &constant).unwrap().iter().all(|&l| l == 0.0));
    }

    #[test]
    fn test_arrow_differential_follows_arrow_order() {
        let topology = diamond();
        let field = [0.0_f32, 1.0, 2.0, 3.0, 4.0];
        let deltas = arrow_differential(&topology, &field).unwrap();
        assert_eq!(deltas.len(), topology.arrow_count());
        for (i, (&d, &[from, to])) in deltas.iter().zip(&topology.arrows().vertex_ids).enumerate() {
            assert_eq!(d, field[to as usize] - field[from as usize], "arrow {i}");
        }
        assert!(arrow_differential(&topology, &[Vec3::ZERO; 2]).is_err());
    }

    #[test]
    fn test_divergence_rejects_wrong_length() {
        let topology = diamond();
        assert!(matches!(
            divergence(&topology, &[]),
            Err(GridError::LengthMismatch { expected: 5, actual: 0 })
        ));
    }
}
