//! ECS World implementation
//!
//! The world is the entity store: it owns entity rows and one dense
//! secondary map per component type. It performs no hierarchy bookkeeping of
//! its own; structural hooks are driven by [`SceneGraph`](crate::scene::SceneGraph).

use slotmap::{SecondaryMap, SlotMap};

use super::components::{BoundsComponent, HierarchyComponent, TransformComponent};
use super::entity::{Entity, EntityFlags, EntityRecord};

/// Hierarchy links keyed by entity
pub type HierarchyLinks = SecondaryMap<Entity, HierarchyComponent>;

/// Transforms keyed by entity
pub type Transforms = SecondaryMap<Entity, TransformComponent>;

/// ECS World containing all entities and components
#[derive(Debug, Default)]
pub struct World {
    entities: SlotMap<Entity, EntityRecord>,
    transforms: Transforms,
    hierarchy: HierarchyLinks,
    bounds: SecondaryMap<Entity, BoundsComponent>,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity with no components
    pub fn spawn(&mut self, name: impl Into<String>) -> Entity {
        self.entities.insert(EntityRecord::new(name))
    }

    /// Remove an entity and every component it owns
    ///
    /// This is the raw store operation: no hierarchy hooks run, so other
    /// entities may keep links to the removed handle. Callers outside the
    /// crate go through
    /// [`SceneGraph::destroy_entity`](crate::scene::SceneGraph::destroy_entity).
    pub(crate) fn despawn(&mut self, entity: Entity) -> bool {
        if self.entities.remove(entity).is_none() {
            return false;
        }
        self.transforms.remove(entity);
        self.hierarchy.remove(entity);
        self.bounds.remove(entity);
        true
    }

    /// Check whether an entity is alive
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the world has no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get an iterator over all live entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys()
    }

    /// Entity name, if the entity is alive
    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.entities.get(entity).map(|record| record.name.as_str())
    }

    /// Rename an entity
    pub fn set_name(&mut self, entity: Entity, name: impl Into<String>) {
        if let Some(record) = self.entities.get_mut(entity) {
            record.name = name.into();
        }
    }

    /// Diagnostic label: the entity's name, or its handle when unnamed or dead
    pub fn label(&self, entity: Entity) -> String {
        match self.name(entity) {
            Some(name) if !name.is_empty() => format!("'{}'", name),
            _ => format!("{:?}", entity),
        }
    }

    /// Entity flags (empty for dead entities)
    pub fn flags(&self, entity: Entity) -> EntityFlags {
        self.entities
            .get(entity)
            .map_or(EntityFlags::empty(), |record| record.flags)
    }

    /// Mark or unmark an entity as static geometry
    pub fn set_static(&mut self, entity: Entity, is_static: bool) {
        if let Some(record) = self.entities.get_mut(entity) {
            record.flags.set(EntityFlags::STATIC, is_static);
        }
    }

    /// Whether the entity is flagged static
    pub fn is_static(&self, entity: Entity) -> bool {
        self.flags(entity).contains(EntityFlags::STATIC)
    }

    /// Attach or replace a transform; returns false for dead entities
    pub fn insert_transform(&mut self, entity: Entity, transform: TransformComponent) -> bool {
        if !self.contains(entity) {
            return false;
        }
        self.transforms.insert(entity, transform);
        true
    }

    /// Get an entity's transform
    pub fn transform(&self, entity: Entity) -> Option<&TransformComponent> {
        self.transforms.get(entity)
    }

    /// Get an entity's transform mutably
    pub fn transform_mut(&mut self, entity: Entity) -> Option<&mut TransformComponent> {
        self.transforms.get_mut(entity)
    }

    /// Attach or replace local bounds; returns false for dead entities
    pub fn insert_bounds(&mut self, entity: Entity, bounds: BoundsComponent) -> bool {
        if !self.contains(entity) {
            return false;
        }
        self.bounds.insert(entity, bounds);
        true
    }

    /// Get an entity's local bounds
    pub fn bounds(&self, entity: Entity) -> Option<&BoundsComponent> {
        self.bounds.get(entity)
    }

    /// Get an entity's hierarchy links
    pub fn hierarchy(&self, entity: Entity) -> Option<&HierarchyComponent> {
        self.hierarchy.get(entity)
    }

    /// All hierarchy links
    pub fn hierarchy_links(&self) -> &HierarchyLinks {
        &self.hierarchy
    }

    /// All entities that own a transform
    pub fn transform_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.transforms.keys()
    }

    /// All entities that own both a transform and hierarchy links
    pub fn hierarchy_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.transforms
            .keys()
            .filter(move |&entity| self.hierarchy.contains_key(entity))
    }

    pub(crate) fn hierarchy_links_mut(&mut self) -> &mut HierarchyLinks {
        &mut self.hierarchy
    }

    /// Store hierarchy links verbatim, without any splicing
    pub(crate) fn insert_hierarchy_raw(&mut self, entity: Entity, links: HierarchyComponent) -> bool {
        if !self.contains(entity) {
            return false;
        }
        self.hierarchy.insert(entity, links);
        true
    }

    pub(crate) fn remove_hierarchy_raw(&mut self, entity: Entity) -> Option<HierarchyComponent> {
        self.hierarchy.remove(entity)
    }

    /// Split borrow used by the transform pass
    pub(crate) fn transforms_and_links(&mut self) -> (&mut Transforms, &HierarchyLinks) {
        (&mut self.transforms, &self.hierarchy)
    }

    pub(crate) fn record(&self, entity: Entity) -> Option<&EntityRecord> {
        self.entities.get(entity)
    }

    pub(crate) fn spawn_record(&mut self, record: EntityRecord) -> Entity {
        self.entities.insert(record)
    }
}
