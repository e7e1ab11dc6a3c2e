//! # Scene Engine
//!
//! Spatial core of the engine: the entity hierarchy with transform
//! propagation, and the octree used to cull static geometry against the
//! camera frustum.
//!
//! ## Features
//!
//! - **Scene Hierarchy**: Intrusive parent/child/sibling links over entity handles
//! - **Transform Propagation**: Dirty-flag driven world matrix updates
//! - **Bounding Volumes**: AABB/OBB math and frustum plane extraction
//! - **Octree Culling**: Bounded-depth spatial index for static objects
//! - **Snapshots**: RON scene snapshots with a post-load repair pass
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! let mut world = World::new();
//! let graph = SceneGraph::new(HierarchyConfig::default());
//!
//! let root = graph.create_entity(&mut world, "root", None).unwrap();
//! let child = graph.create_entity(&mut world, "child", Some(root)).unwrap();
//!
//! if let Some(transform) = world.transform_mut(root) {
//!     transform.set_local_position(Vec3::new(1.0, 0.0, 0.0));
//! }
//! graph.update(&mut world);
//!
//! let position = world.transform(child).map(TransformComponent::world_position);
//! assert_eq!(position, Some(Vec3::new(1.0, 0.0, 0.0)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod ecs;
pub mod scene;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, HierarchyConfig, SceneEngineConfig},
        ecs::{
            components::{BoundsComponent, HierarchyComponent, TransformComponent},
            Entity, EntityFlags, World,
        },
        foundation::math::{Mat4, Mat4Ext, Vec3},
        scene::{DuplicationContext, RepairReport, SceneError, SceneGraph, SceneSnapshot, StaticSceneIndex},
        spatial::{ClipDepth, Frustum, IntersectResult, ObjectContainer, ObjectId, Octree, OctreeConfig, AABB, OBB},
    };
}
