//! The eight octants of the octahedral sphere parameterization and their local bases.

use glam::Vec3;

/// One of the eight sign combinations of `(x, y, z)`.
///
/// The wrapped value is a 3-bit sign code: bit 0 is set when `x > 0`, bit 1 when
/// `y > 0`, and bit 2 when `z > 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Octant(u8);

/// Orthonormal, right-handed frame of an octant.
///
/// `z` points at the octant's corner direction `normalize(±1, ±1, ±1)`; `x` and `y`
/// span the tangent plane there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OctantBasis {
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl Octant {
    /// Number of octants.
    pub const COUNT: usize = 8;

    /// All eight octants in sign-code order.
    pub const ALL: [Octant; 8] = [
        Octant(0),
        Octant(1),
        Octant(2),
        Octant(3),
        Octant(4),
        Octant(5),
        Octant(6),
        Octant(7),
    ];

    /// Octant for a 3-bit sign code. Higher bits are ignored.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        Octant(code & 0b111)
    }

    /// Octant a point falls in, chosen purely by the signs of its coordinates.
    /// Zero components count as negative.
    #[must_use]
    pub fn containing(point: Vec3) -> Self {
        Octant(
            u8::from(point.x > 0.0) | u8::from(point.y > 0.0) << 1 | u8::from(point.z > 0.0) << 2,
        )
    }

    /// The 3-bit sign code.
    #[must_use]
    pub fn code(self) -> u8 {
        self.0
    }

    /// Index of this octant in [`Octant::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Unit vector toward the octant's corner.
    #[must_use]
    pub fn corner(self) -> Vec3 {
        let sign = |bit: u8| if self.0 & bit != 0 { 1.0 } else { -1.0 };
        Vec3::new(sign(0b001), sign(0b010), sign(0b100)).normalize()
    }

    /// Local frame: `z` is the corner direction, `x = normalize(z × Z)`, `y = normalize(z × x)`.
    #[must_use]
    pub fn basis(self) -> OctantBasis {
        let z = self.corner();
        let x = z.cross(Vec3::Z).normalize();
        let y = z.cross(x).normalize();
        OctantBasis { x, y, z }
    }
}

impl OctantBasis {
    /// Coordinates of `point` in the tangent plane of this frame.
    #[must_use]
    pub fn project(&self, point: Vec3) -> (f32, f32) {
        (self.x.dot(point), self.y.dot(point))
    }

    /// Lift tangent-plane coordinates back onto the unit sphere.
    ///
    /// The omitted component is recovered as `sqrt(max(1 - x² - y², 0))`, so
    /// coordinates outside the unit disc land on the frame's equator.
    #[must_use]
    pub fn lift(&self, x: f32, y: f32) -> Vec3 {
        let z = (1.0 - x * x - y * y).max(0.0).sqrt();
        self.x * x + self.y * y + self.z * z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containing_uses_sign_bits() {
        assert_eq!(Octant::containing(Vec3::new(-1.0, -1.0, -1.0)).code(), 0);
        assert_eq!(Octant::containing(Vec3::new(1.0, -1.0, -1.0)).code(), 1);
        assert_eq!(Octant::containing(Vec3::new(-1.0, 1.0, -1.0)).code(), 2);
        assert_eq!(Octant::containing(Vec3::new(-1.0, -1.0, 1.0)).code(), 4);
        assert_eq!(Octant::containing(Vec3::new(0.3, 0.2, 0.9)).code(), 7);
        assert_eq!(Octant::containing(Vec3::ZERO).code(), 0);
    }

    #[test]
    fn test_corner_lies_in_its_octant() {
        for octant in Octant::ALL {
            assert_eq!(Octant::containing(octant.corner()), octant);
            assert!((octant.corner().length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_basis_is_orthonormal_and_right_handed() {
        for octant in Octant::ALL {
            let b = octant.basis();
            for axis in [b.x, b.y, b.z] {
                assert!(
                    (axis.length() - 1.0).abs() < 1e-6,
                    "{octant:?} axis {axis:?} not unit length"
                );
            }
            assert!(b.x.dot(b.y).abs() < 1e-6, "{octant:?} x/y not orthogonal");
            assert!(b.x.dot(b.z).abs() < 1e-6, "{octant:?} x/z not orthogonal");
            assert!(b.y.dot(b.z).abs() < 1e-6, "{octant:?} y/z not orthogonal");
            assert!(
                (b.x.cross(b.y) - b.z).length() < 1e-5,
                "{octant:?} frame is not right-handed"
            );
        }
    }

    #[test]
    fn test_lift_inverts_project_on_sphere() {
        for octant in Octant::ALL {
            let b = octant.basis();
            let point = (octant.corner() + b.x * 0.3 - b.y * 0.2).normalize();
            let (x, y) = b.project(point);
            let lifted = b.lift(x, y);
            assert!(
                (lifted - point).length() < 1e-5,
                "{octant:?}: {point:?} lifted back to {lifted:?}"
            );
        }
    }

    #[test]
    fn test_lift_outside_disc_stays_on_equator() {
        let b = Octant::from_code(7).basis();
        let lifted = b.lift(1.0, 1.0);
        assert!(lifted.dot(b.z).abs() < 1e-6);
    }

    #[test]
    fn test_from_code_masks_high_bits() {
        assert_eq!(Octant::from_code(0b1111_1010).code(), 0b010);
        assert_eq!(Octant::ALL[5].index(), 5);
    }
}
