use glam::Vec3;

/// Axis-aligned bounding box over `f32` positions.
///
/// Invariant: `min.x <= max.x`, `min.y <= max.y`, `min.z <= max.z`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb3 {
    /// Smallest AABB enclosing every point, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(
            Self {
                min: *first,
                max: *first,
            },
            |acc, p| Self {
                min: acc.min.min(*p),
                max: acc.max.max(*p),
            },
        ))
    }

    /// Returns the extent along each axis.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_encloses_all() {
        let points = [
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(-2.0, 1.0, 0.25),
            Vec3::new(0.0, -3.0, 4.0),
        ];
        let aabb = Aabb3::from_points(&points).unwrap();
        assert_eq!(aabb.min, Vec3::new(-2.0, -3.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(0.5, 1.0, 4.0));
        assert_eq!(aabb.size(), Vec3::new(2.5, 4.0, 4.0));
    }

    #[test]
    fn test_from_points_empty_is_none() {
        assert!(Aabb3::from_points(&[]).is_none());
    }

    #[test]
    fn test_single_point_has_zero_size() {
        let aabb = Aabb3::from_points(&[Vec3::ONE]).unwrap();
        assert_eq!(aabb.min, aabb.max);
        assert_eq!(aabb.size(), Vec3::ZERO);
    }
}
