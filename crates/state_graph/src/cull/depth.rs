//! Sort keys and calculated near/far planes

use crate::core::config::DepthSortMetric;
use crate::foundation::math::{self, Mat4, Point3, Vec3};

impl DepthSortMetric {
    /// Sort key for a point already in view space
    pub fn sort_depth(self, view_point: &Point3) -> f32 {
        match self {
            Self::EyeDistanceSquared => view_point.coords.norm_squared(),
            Self::LookVectorDistance => math::view_distance(view_point),
        }
    }
}

/// Largest axis scale of a model-view matrix
pub(crate) fn max_scale(model_view: &Mat4) -> f32 {
    let axis = |c: usize| Vec3::new(model_view[(0, c)], model_view[(1, c)], model_view[(2, c)]).norm();
    axis(0).max(axis(1)).max(axis(2))
}

/// Near and far distances spanned by the accumulated drawables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearFar {
    near: f32,
    far: f32,
}

impl NearFar {
    /// An empty range that any update will replace
    pub fn new() -> Self {
        Self {
            near: f32::MAX,
            far: -f32::MAX,
        }
    }

    /// Forget every update
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Grow the range to cover a sphere at `distance` along the view direction
    pub fn include(&mut self, distance: f32, radius: f32) {
        self.near = self.near.min(distance - radius);
        self.far = self.far.max(distance + radius);
    }

    /// True once at least one sphere has been included
    pub fn is_valid(&self) -> bool {
        self.near <= self.far
    }

    /// Nearest distance, `None` when nothing was included
    pub fn near(&self) -> Option<f32> {
        self.is_valid().then_some(self.near)
    }

    /// Farthest distance, `None` when nothing was included
    pub fn far(&self) -> Option<f32> {
        self.is_valid().then_some(self.far)
    }
}

impl Default for NearFar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_metrics_agree_on_order_along_axis() {
        let near = Point3::new(0.0, 0.0, -2.0);
        let far = Point3::new(0.0, 0.0, -5.0);

        for metric in [DepthSortMetric::EyeDistanceSquared, DepthSortMetric::LookVectorDistance] {
            assert!(metric.sort_depth(&far) > metric.sort_depth(&near));
        }
        assert_relative_eq!(DepthSortMetric::EyeDistanceSquared.sort_depth(&far), 25.0);
        assert_relative_eq!(DepthSortMetric::LookVectorDistance.sort_depth(&far), 5.0);
    }

    #[test]
    fn test_near_far_tracks_spheres() {
        let mut range = NearFar::new();
        assert!(!range.is_valid());
        assert_eq!(range.near(), None);

        range.include(10.0, 1.0);
        range.include(4.0, 0.5);

        assert_relative_eq!(range.near().unwrap(), 3.5);
        assert_relative_eq!(range.far().unwrap(), 11.0);
    }

    #[test]
    fn test_max_scale_reads_axes() {
        let m = Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 3.0, 2.0));
        assert_relative_eq!(max_scale(&m), 3.0);
    }
}
