//! Entity-Component-System implementation
//!
//! Provides the entity store the scene graph operates on.

pub mod world;
pub mod entity;
pub mod component;
pub mod components;

pub use world::{HierarchyLinks, Transforms, World};
pub use entity::{Entity, EntityFlags, EntityRecord};
pub use component::Component;
