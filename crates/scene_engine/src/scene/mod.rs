//! Scene hierarchy management
//!
//! Builds the parent/child tree on top of the ECS [`World`](crate::ecs::World)
//! and keeps cached world transforms current.
//!
//! ```text
//! World (entities + components)
//!      ↓
//! SceneGraph (hooks, reparent/reorder, transform update)
//!      ↓
//! StaticSceneIndex (octree over static geometry)
//! ```
//!
//! Hierarchy links are an intrusive linked list over entity handles. Every
//! structural edit goes through the splice helpers in [`hierarchy`], and
//! every traversal is bounded so corrupted links end a walk instead of
//! hanging it.

pub mod hierarchy;
mod duplication;
mod errors;
mod scene_graph;
mod serialization;
mod static_index;

#[cfg(test)]
mod tests;

pub use duplication::DuplicationContext;
pub use errors::SceneError;
pub use hierarchy::RepairReport;
pub use scene_graph::SceneGraph;
pub use serialization::{EntitySnapshot, LinkSnapshot, LoadedScene, SceneSnapshot, TransformSnapshot};
pub use static_index::StaticSceneIndex;
