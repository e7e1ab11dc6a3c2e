//! Axis-aligned and oriented bounding boxes
//!
//! Boundaries are inclusive everywhere: touching boxes intersect, and a
//! zero-extent box behaves as a point.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Mat4, Vec3};

/// Result of classifying one box against another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntersectResult {
    /// The boxes share no point
    Outside,
    /// The tested box lies entirely within this one
    Inside,
    /// The boxes partially overlap (or touch)
    Intersect,
}

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::point(Vec3::zeros())
    }
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a zero-volume AABB at a point
    pub fn point(position: Vec3) -> Self {
        Self { min: position, max: position }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest AABB enclosing every point; `None` for an empty iterator
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self::point(first);
        for point in points {
            bounds.min = bounds.min.inf(&point);
            bounds.max = bounds.max.sup(&point);
        }
        Some(bounds)
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Whether any axis has `min > max`
    pub fn is_inverted(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Copy of this box with inverted axes collapsed to their midpoint
    ///
    /// An inverted box is meaningless geometry; treating it as a point keeps
    /// every downstream test well defined.
    pub fn sanitized(&self) -> Self {
        let mut result = *self;
        for axis in 0..3 {
            if result.min[axis] > result.max[axis] {
                let mid = (result.min[axis] + result.max[axis]) * 0.5;
                result.min[axis] = mid;
                result.max[axis] = mid;
            }
        }
        result
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Classify `other` against this box
    ///
    /// `Inside` means `other` is fully contained in `self`. Touching faces and
    /// zero-volume boxes on a face count as overlapping, never `Outside`.
    pub fn intersect(&self, other: &AABB) -> IntersectResult {
        if !self.intersects(other) {
            return IntersectResult::Outside;
        }

        let contained = other.min.x >= self.min.x && other.max.x <= self.max.x &&
            other.min.y >= self.min.y && other.max.y <= self.max.y &&
            other.min.z >= self.min.z && other.max.z <= self.max.z;

        if contained {
            IntersectResult::Inside
        } else {
            IntersectResult::Intersect
        }
    }

    /// Smallest box enclosing both boxes
    pub fn merge(&self, other: &AABB) -> AABB {
        AABB::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// The eight corners of the box
    ///
    /// Bit 0 of the index selects max X, bit 1 max Y, bit 2 max Z.
    pub fn corners(&self) -> [Vec3; 8] {
        let mut corners = [Vec3::zeros(); 8];
        for (index, corner) in corners.iter_mut().enumerate() {
            *corner = Vec3::new(
                if index & 1 == 0 { self.min.x } else { self.max.x },
                if index & 2 == 0 { self.min.y } else { self.max.y },
                if index & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        corners
    }

    /// Axis-aligned box enclosing this box after transformation by `matrix`
    ///
    /// All eight corners are transformed, so rotated boxes are enclosed
    /// correctly (the result may be larger than the rotated box, never smaller).
    pub fn calculate_transformed_aabb(&self, matrix: &Mat4) -> AABB {
        let corners = self
            .corners()
            .map(|corner| utils::transform_point(matrix, corner));

        let mut min = corners[0];
        let mut max = corners[0];
        for corner in &corners[1..] {
            min = min.inf(corner);
            max = max.sup(corner);
        }
        AABB::new(min, max)
    }

    /// Oriented box obtained by transforming this box's corners by `matrix`
    pub fn to_obb(&self, matrix: &Mat4) -> OBB {
        OBB {
            corners: self
                .corners()
                .map(|corner| utils::transform_point(matrix, corner)),
        }
    }
}

/// Oriented bounding box stored as eight world-space corners
///
/// Debug visualization only; culling always works on AABBs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OBB {
    /// Corners in the same order as [`AABB::corners`]
    pub corners: [Vec3; 8],
}

impl OBB {
    /// Corner index pairs forming the twelve box edges
    pub const EDGES: [(usize, usize); 12] = [
        (0, 1), (2, 3), (4, 5), (6, 7),
        (0, 2), (1, 3), (4, 6), (5, 7),
        (0, 4), (1, 5), (2, 6), (3, 7),
    ];

    /// Line segments for debug drawing
    pub fn edges(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        Self::EDGES
            .iter()
            .map(move |&(a, b)| (self.corners[a], self.corners[b]))
    }

    /// Axis-aligned box enclosing the oriented box
    pub fn enclosing_aabb(&self) -> AABB {
        let mut bounds = AABB::point(self.corners[0]);
        for corner in &self.corners[1..] {
            bounds.min = bounds.min.inf(corner);
            bounds.max = bounds.max.sup(corner);
        }
        bounds
    }
}
