//! Local-space bounding volume component

use crate::spatial::AABB;

/// Object-space bounds of an entity's geometry
///
/// Combined with the entity's world matrix when the entity is inserted into
/// the static octree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsComponent {
    /// Local-space axis-aligned box
    pub local: AABB,
}

impl BoundsComponent {
    /// Create bounds from a local-space box
    pub fn new(local: AABB) -> Self {
        Self { local }
    }
}
