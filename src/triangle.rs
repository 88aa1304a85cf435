use glam::Vec3;
use raytracer_shared::Aabb;

/// Per-triangle scratch data used while building the BVH.
///
/// The builder reorders these in place; `original_index` remembers the
/// triangle's position in the model's index stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleRecord {
    pub original_index: u32,
    pub bounds: Aabb,
    pub centroid: Vec3,
}

impl TriangleRecord {
    /// Bounds and centroid of the triangle `p0 p1 p2`. Degenerate triangles yield
    /// point or segment boxes.
    pub fn new(original_index: u32, [p0, p1, p2]: [Vec3; 3]) -> Self {
        Self {
            original_index,
            bounds: Aabb::new(p0.min(p1).min(p2).to_array(), p0.max(p1).max(p2).to_array()),
            centroid: (p0 + p1 + p2) / 3.0,
        }
    }
}

/// Surface area of the triangle `p0 p1 p2`
pub fn triangle_area(p0: Vec3, p1: Vec3, p2: Vec3) -> f32 {
    0.5 * (p1 - p0).cross(p2 - p0).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_record_bounds_and_centroid() {
        let record = TriangleRecord::new(
            7,
            [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(1.0, 2.0, 0.0),
            ],
        );

        assert_eq!(record.original_index, 7);
        assert_eq!(record.bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(record.bounds.max, [2.0, 2.0, 0.0]);
        assert!(record.centroid.abs_diff_eq(Vec3::new(1.0, 2.0 / 3.0, 0.0), 1e-6));
    }

    #[test]
    fn test_degenerate_triangle_is_a_segment_box() {
        let record = TriangleRecord::new(
            0,
            [
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(3.0, 1.0, 0.0),
                Vec3::new(3.0, 1.0, 0.0),
            ],
        );

        assert_eq!(record.bounds.min, [0.0, 1.0, 0.0]);
        assert_eq!(record.bounds.max, [3.0, 1.0, 0.0]);
        assert!(!record.bounds.is_empty());
        assert!(record.centroid.is_finite());
    }

    #[test]
    fn test_triangle_area() {
        let area = triangle_area(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 3.0),
        );
        assert!((area - 6.0).abs() < 1e-6);

        let collinear = triangle_area(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert_eq!(collinear, 0.0);
    }
}
