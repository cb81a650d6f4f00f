//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the view-space helpers the accumulator
//! needs to compute sort keys.

pub use nalgebra::{Matrix4, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Bounding sphere of a drawable in its local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Center of the sphere
    pub center: Point3,
    /// Radius of the sphere; negative radius marks an invalid bound
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a new bounding sphere
    pub fn new(center: Point3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// An invalid bound, contributes nothing to near/far computation
    pub fn invalid() -> Self {
        Self {
            center: Point3::origin(),
            radius: -1.0,
        }
    }

    /// Whether the bound carries a usable radius
    pub fn is_valid(&self) -> bool {
        self.radius >= 0.0
    }
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Transform a local-space point into view space
pub fn to_view_space(model_view: &Mat4, point: &Point3) -> Point3 {
    model_view.transform_point(point)
}

/// Distance along the view direction (cameras look down -Z in view space)
pub fn view_distance(view_point: &Point3) -> f32 {
    -view_point.z
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_space_translation() {
        let model_view = Mat4::new_translation(&Vec3::new(0.0, 0.0, -5.0));
        let p = to_view_space(&model_view, &Point3::new(1.0, 0.0, 0.0));

        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(view_distance(&p), 5.0);
    }

    #[test]
    fn test_invalid_bound() {
        assert!(!BoundingSphere::default().is_valid());
        assert!(BoundingSphere::new(Point3::origin(), 0.0).is_valid());
    }
}
