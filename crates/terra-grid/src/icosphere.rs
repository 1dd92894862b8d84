//! Icosphere generation: a subdivided icosahedron projected onto the unit sphere.

use glam::Vec3;
use rustc_hash::FxHashMap;

/// A closed triangle mesh on the unit sphere with outward winding.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
}

/// Icosahedron faces, counter-clockwise seen from outside.
const ICOSAHEDRON_FACES: [[u32; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Generate an icosphere with the given number of subdivisions.
///
/// Each subdivision splits every triangle into four, so the mesh has `20 * 4^n` faces
/// and `10 * 4^n + 2` vertices. Level 4 gives 2562 vertices, level 6 about 41k.
#[must_use]
pub fn icosphere(subdivisions: u32) -> SphereMesh {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;

    let mut vertices: Vec<Vec3> = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
    .iter()
    .map(|v| v.normalize())
    .collect();

    let mut faces = ICOSAHEDRON_FACES.to_vec();
    for _ in 0..subdivisions {
        faces = subdivide(&mut vertices, &faces);
    }

    SphereMesh { vertices, faces }
}

/// Split each triangle into four at its edge midpoints, keeping the winding.
fn subdivide(vertices: &mut Vec<Vec3>, faces: &[[u32; 3]]) -> Vec<[u32; 3]> {
    let mut midpoints: FxHashMap<(u32, u32), u32> = FxHashMap::default();
    let mut midpoint = |a: u32, b: u32, vertices: &mut Vec<Vec3>| -> u32 {
        *midpoints.entry((a.min(b), a.max(b))).or_insert_with(|| {
            let mid = (vertices[a as usize] + vertices[b as usize]).normalize();
            vertices.push(mid);
            vertices.len() as u32 - 1
        })
    };

    let mut subdivided = Vec::with_capacity(faces.len() * 4);
    for &[a, b, c] in faces {
        let ab = midpoint(a, b, vertices);
        let bc = midpoint(b, c, vertices);
        let ca = midpoint(c, a, vertices);
        subdivided.extend_from_slice(&[[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
    }
    subdivided
}
