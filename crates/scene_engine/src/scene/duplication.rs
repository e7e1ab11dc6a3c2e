//! Subtree duplication
//!
//! Remap state lives in a [`DuplicationContext`] owned by the caller, so two
//! duplications never share scratch tables.

use std::collections::HashMap;

use crate::ecs::components::HierarchyComponent;
use crate::ecs::{Entity, World};
use super::errors::SceneError;
use super::scene_graph::SceneGraph;

/// Original to copy mapping produced by a duplication
#[derive(Debug, Default, Clone)]
pub struct DuplicationContext {
    remap: HashMap<Entity, Entity>,
    created: Vec<Entity>,
}

impl DuplicationContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy made for `original`, if any
    pub fn get(&self, original: Entity) -> Option<Entity> {
        self.remap.get(&original).copied()
    }

    /// Full original to copy table
    pub fn remap(&self) -> &HashMap<Entity, Entity> {
        &self.remap
    }

    /// Copies in creation order (pre-order over each duplicated subtree)
    pub fn created(&self) -> &[Entity] {
        &self.created
    }

    /// Number of copies recorded
    pub fn len(&self) -> usize {
        self.created.len()
    }

    /// Whether nothing has been copied
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    fn record(&mut self, original: Entity, copy: Entity) {
        self.remap.insert(original, copy);
        self.created.push(copy);
    }

    fn rollback(&mut self, from: usize) -> Vec<Entity> {
        let removed: Vec<Entity> = self.created.drain(from..).collect();
        self.remap.retain(|_, copy| !removed.contains(copy));
        removed
    }
}

impl SceneGraph {
    /// Deep-copy `entity` and its subtree
    ///
    /// The copy is appended to the original's parent. Returns the copy of
    /// `entity`.
    pub fn duplicate(&self, world: &mut World, entity: Entity) -> Result<Entity, SceneError> {
        let mut context = DuplicationContext::new();
        self.duplicate_with(world, entity, &mut context)
    }

    /// Deep-copy `entity` and its subtree, recording every copy in `context`
    ///
    /// Names, flags, transforms and bounds are copied; hierarchy links are
    /// rebuilt through the construct hook so sibling order matches the
    /// original. On failure every copy made by this call is destroyed again.
    pub fn duplicate_with(
        &self,
        world: &mut World,
        entity: Entity,
        context: &mut DuplicationContext,
    ) -> Result<Entity, SceneError> {
        if !world.contains(entity) {
            return Err(SceneError::DanglingReference { entity, target: entity });
        }

        let start = context.len();
        let order = self.collect_subtree(world.hierarchy_links(), entity);

        for original in order {
            if let Err(err) = self.copy_one(world, entity, original, context) {
                for copy in context.rollback(start).into_iter().rev() {
                    self.detach_hierarchy(world, copy);
                    world.despawn(copy);
                }
                return Err(err);
            }
        }

        let copy = context
            .get(entity)
            .ok_or(SceneError::DanglingReference { entity, target: entity })?;
        log::debug!("Duplicated {} as {:?} ({} entities)", world.label(entity), copy, context.len() - start);
        Ok(copy)
    }

    fn copy_one(
        &self,
        world: &mut World,
        root: Entity,
        original: Entity,
        context: &mut DuplicationContext,
    ) -> Result<(), SceneError> {
        let record = world
            .record(original)
            .cloned()
            .ok_or(SceneError::DanglingReference { entity: root, target: original })?;
        let transform = world.transform(original).cloned();
        let bounds = world.bounds(original).copied();
        let links = world.hierarchy(original).copied();

        let copy = world.spawn_record(record);
        context.record(original, copy);

        if let Some(mut transform) = transform {
            transform.mark_dirty();
            world.insert_transform(copy, transform);
        }
        if let Some(bounds) = bounds {
            world.insert_bounds(copy, bounds);
        }

        if let Some(links) = links {
            let parent = if original == root {
                links.parent
            } else {
                links.parent.and_then(|parent| context.get(parent))
            };
            self.attach_hierarchy(world, copy, HierarchyComponent::with_parent(parent))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HierarchyConfig;
    use crate::ecs::components::BoundsComponent;
    use crate::foundation::math::Vec3;
    use crate::spatial::AABB;

    #[test]
    fn test_duplicate_subtree_preserves_shape() {
        let mut world = World::new();
        let graph = SceneGraph::new(HierarchyConfig::default());
        let root = graph.create_entity(&mut world, "root", None).unwrap();
        let lamp = graph.create_entity(&mut world, "lamp", Some(root)).unwrap();
        let bulb = graph.create_entity(&mut world, "bulb", Some(lamp)).unwrap();
        let shade = graph.create_entity(&mut world, "shade", Some(lamp)).unwrap();
        world.transform_mut(bulb).unwrap().set_local_position(Vec3::new(0.0, 2.0, 0.0));
        world.insert_bounds(shade, BoundsComponent::new(AABB::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))));
        world.set_static(shade, true);

        let mut context = DuplicationContext::new();
        let copy = graph.duplicate_with(&mut world, lamp, &mut context).unwrap();

        assert_eq!(context.len(), 3);
        assert_eq!(graph.children(&world, root), vec![lamp, copy]);

        let copy_children = graph.children(&world, copy);
        assert_eq!(copy_children, vec![context.get(bulb).unwrap(), context.get(shade).unwrap()]);
        assert_eq!(world.name(copy_children[0]), Some("bulb"));
        assert_eq!(world.transform(copy_children[0]).unwrap().local_position(), Vec3::new(0.0, 2.0, 0.0));
        assert!(world.bounds(copy_children[1]).is_some());
        assert!(world.is_static(copy_children[1]));
        graph.validate(&world).unwrap();
    }

    #[test]
    fn test_duplicate_root_creates_new_root() {
        let mut world = World::new();
        let graph = SceneGraph::new(HierarchyConfig::default());
        let root = graph.create_entity(&mut world, "root", None).unwrap();
        graph.create_entity(&mut world, "child", Some(root)).unwrap();

        let copy = graph.duplicate(&mut world, root).unwrap();

        assert!(world.hierarchy(copy).unwrap().is_root());
        assert_eq!(graph.roots(&world).len(), 2);
        assert_eq!(world.len(), 4);
    }

    #[test]
    fn test_contexts_are_independent() {
        let mut world = World::new();
        let graph = SceneGraph::new(HierarchyConfig::default());
        let a = graph.create_entity(&mut world, "a", None).unwrap();
        let b = graph.create_entity(&mut world, "b", None).unwrap();

        let mut first = DuplicationContext::new();
        let mut second = DuplicationContext::new();
        graph.duplicate_with(&mut world, a, &mut first).unwrap();
        graph.duplicate_with(&mut world, b, &mut second).unwrap();

        assert!(first.get(b).is_none());
        assert!(second.get(a).is_none());
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_duplicate_dead_entity_fails() {
        let mut world = World::new();
        let graph = SceneGraph::new(HierarchyConfig::default());
        let gone = world.spawn("gone");
        world.despawn(gone);

        assert!(graph.duplicate(&mut world, gone).is_err());
        assert!(world.is_empty());
    }
}
