//! Spatial partitioning data structures
//!
//! Bounding volume math, frustum extraction and the octree used to cull
//! static geometry.

mod bounding_volume;
mod frustum;
mod octree;

pub use bounding_volume::{IntersectResult, AABB, OBB};
pub use frustum::{ClipDepth, Frustum, Plane};
pub use octree::{ObjectContainer, ObjectId, Octree, OctreeConfig, OctreeNode, OctreeStats};
