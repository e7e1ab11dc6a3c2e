//! ECS components for the scene core

pub mod transform;
pub mod hierarchy;
pub mod bounds;

pub use transform::TransformComponent;
pub use hierarchy::HierarchyComponent;
pub use bounds::BoundsComponent;
