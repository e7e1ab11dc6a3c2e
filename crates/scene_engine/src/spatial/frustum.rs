//! View frustum for visibility culling
//!
//! Planes are extracted from a combined view-projection matrix with the
//! Gribb-Hartmann method. Every plane faces inward: points with a
//! non-negative signed distance are on the visible side.

use crate::foundation::math::{Mat4, Vec3, Vec4};
use super::bounding_volume::AABB;

/// Slack allowed before a box is rejected by a plane
///
/// Keeps boxes lying exactly on a plane from being culled by rounding error.
const PLANE_TOLERANCE: f32 = 1e-5;

/// Plane normals shorter than this are treated as degenerate
const DEGENERATE_NORMAL: f32 = 1e-12;

/// Clip-space depth convention of the projection matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipDepth {
    /// Depth in [0, w] (Vulkan, Direct3D, wgpu)
    #[default]
    ZeroToOne,
    /// Depth in [-w, w] (OpenGL)
    NegativeOneToOne,
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized, or zero for a degenerate plane)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self::from_coefficients(Vec4::new(normal.x, normal.y, normal.z, distance))
    }

    /// Create a plane from `(a, b, c, d)` with `a*x + b*y + c*z + d = 0`
    ///
    /// A zero-length normal yields a plane that rejects nothing.
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.magnitude();
        if length <= DEGENERATE_NORMAL || !length.is_finite() {
            log::debug!("Degenerate frustum plane {:?}, treating as unbounded", coefficients);
            return Self {
                normal: Vec3::zeros(),
                distance: 0.0,
            };
        }
        Self {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix with [0, 1] depth
    pub fn from_matrix(vp_matrix: &Mat4) -> Self {
        Self::from_matrix_with_depth(vp_matrix, ClipDepth::ZeroToOne)
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// A clip-space point is visible when `-w <= x <= w`, `-w <= y <= w` and
    /// the depth lies in the range selected by `depth`; each inequality is one
    /// combination of matrix rows.
    pub fn from_matrix_with_depth(vp_matrix: &Mat4, depth: ClipDepth) -> Self {
        let row = |index: usize| -> Vec4 { vp_matrix.row(index).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let near = match depth {
            ClipDepth::ZeroToOne => r2,
            ClipDepth::NegativeOneToOne => r3 + r2,
        };

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(near),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Frustum whose six planes are the faces of a box
    pub fn from_aabb(aabb: &AABB) -> Self {
        Self {
            planes: [
                Plane::new(Vec3::new(1.0, 0.0, 0.0), -aabb.min.x),
                Plane::new(Vec3::new(-1.0, 0.0, 0.0), aabb.max.x),
                Plane::new(Vec3::new(0.0, 1.0, 0.0), -aabb.min.y),
                Plane::new(Vec3::new(0.0, -1.0, 0.0), aabb.max.y),
                Plane::new(Vec3::new(0.0, 0.0, 1.0), -aabb.min.z),
                Plane::new(Vec3::new(0.0, 0.0, -1.0), aabb.max.z),
            ],
        }
    }

    /// Check if a point is inside the frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(point) >= -PLANE_TOLERANCE)
    }

    /// Check if an AABB is inside or intersects the frustum
    ///
    /// Conservative: a box is only rejected when it lies entirely behind one
    /// plane, so boxes near frustum corners may be reported visible.
    pub fn contains(&self, aabb: &AABB) -> bool {
        for plane in &self.planes {
            // Corner of the box furthest along the plane normal
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
            if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
            if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

            // If this point is outside the plane, the entire AABB is outside
            if plane.distance_to_point(p) < -PLANE_TOLERANCE {
                return false;
            }
        }

        true
    }
}
