//! Scene graph: hierarchy hooks and transform propagation
//!
//! The [`World`] owns entities and components; the scene graph owns the rules
//! for changing the hierarchy and the per-frame update that brings cached
//! world matrices up to date.

use std::collections::HashSet;

use crate::config::HierarchyConfig;
use crate::ecs::components::{HierarchyComponent, TransformComponent};
use crate::ecs::{Component, Entity, HierarchyLinks, Transforms, World};
use crate::foundation::math::Mat4;
use super::errors::SceneError;
use super::hierarchy::{self, RepairReport};

/// Hierarchy operations and transform updates over a [`World`]
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    config: HierarchyConfig,
    loading: bool,
}

impl SceneGraph {
    /// Create a scene graph with the given traversal limits
    pub fn new(config: HierarchyConfig) -> Self {
        Self {
            config,
            loading: false,
        }
    }

    /// Traversal limits
    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Enter or leave loading mode
    ///
    /// While loading, attached hierarchy links are stored exactly as given and
    /// detaching does no splicing. Run [`repair_hierarchy`](Self::repair_hierarchy)
    /// after leaving loading mode.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Whether loading mode is active
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Spawn an entity with an identity transform and hierarchy links
    ///
    /// Nothing is left behind when attaching the links fails.
    pub fn create_entity(
        &self,
        world: &mut World,
        name: impl Into<String>,
        parent: Option<Entity>,
    ) -> Result<Entity, SceneError> {
        let entity = world.spawn(name);
        world.insert_transform(entity, TransformComponent::identity());

        if let Err(err) = self.attach_hierarchy(world, entity, HierarchyComponent::with_parent(parent)) {
            world.despawn(entity);
            return Err(err);
        }

        log::trace!("Created entity {} under {:?}", world.label(entity), parent);
        Ok(entity)
    }

    /// Destroy an entity together with its whole subtree
    ///
    /// Descendants are detached deepest first, so every removal leaves the
    /// remaining links consistent. Returns the number of entities destroyed.
    pub fn destroy_entity(&self, world: &mut World, entity: Entity) -> Result<usize, SceneError> {
        if !world.contains(entity) {
            return Err(SceneError::DanglingReference { entity, target: entity });
        }

        let subtree = self.collect_subtree(world.hierarchy_links(), entity);
        for &node in subtree.iter().rev() {
            self.detach_hierarchy(world, node);
            world.despawn(node);
        }

        log::debug!("Destroyed {} entities rooted at {:?}", subtree.len(), entity);
        Ok(subtree.len())
    }

    /// Attach hierarchy links to an entity (construct hook)
    ///
    /// Outside loading mode only `component.parent` is honored: the entity is
    /// appended to the end of that parent's child chain and its transform is
    /// marked dirty. In loading mode the component is stored verbatim.
    pub fn attach_hierarchy(
        &self,
        world: &mut World,
        entity: Entity,
        component: HierarchyComponent,
    ) -> Result<(), SceneError> {
        if !world.contains(entity) {
            return Err(SceneError::DanglingReference { entity, target: entity });
        }

        if self.loading {
            world.insert_hierarchy_raw(entity, component);
            return Ok(());
        }

        if world.hierarchy(entity).is_some() {
            return Err(reject(world, entity, "entity already has hierarchy links"));
        }

        if let Some(parent) = component.parent {
            if parent == entity {
                return Err(reject(world, entity, "an entity cannot be its own parent"));
            }
            if world.hierarchy(parent).is_none() {
                log::warn!("Cannot attach {} to {:?}: parent has no hierarchy links", world.label(entity), parent);
                return Err(SceneError::DanglingReference { entity, target: parent });
            }
        }

        world.insert_hierarchy_raw(entity, HierarchyComponent::default());
        if let Err(err) = hierarchy::link_last(world.hierarchy_links_mut(), entity, component.parent) {
            log::warn!("Cannot attach {}: {}", world.label(entity), err);
            world.remove_hierarchy_raw(entity);
            return Err(err);
        }

        mark_dirty(world, entity);
        Ok(())
    }

    /// Remove an entity's hierarchy links (destroy hook)
    ///
    /// The entity is spliced out of its sibling chain and its children become
    /// roots. Returns the links as they were before removal.
    pub fn detach_hierarchy(&self, world: &mut World, entity: Entity) -> Option<HierarchyComponent> {
        if self.loading {
            return world.remove_hierarchy_raw(entity);
        }

        let links = world.hierarchy_links_mut();
        let original = links.get(entity).copied()?;

        if let Err(err) = hierarchy::check_neighbors(links, entity) {
            log::warn!("Detaching {:?} from a damaged chain: {}", entity, err);
        }
        hierarchy::cut_out(links, entity);
        let orphans: Vec<Entity> = hierarchy::children(links, entity).collect();
        for &child in &orphans {
            if let Some(child_link) = links.get_mut(child) {
                child_link.clear_position();
            }
        }

        world.remove_hierarchy_raw(entity);
        for child in orphans {
            mark_dirty(world, child);
        }

        Some(original)
    }

    /// Move `entity` to the end of `new_parent`'s children, or make it a root
    ///
    /// Self-parenting and parenting to a descendant are rejected before any
    /// link is touched.
    pub fn reparent(&self, world: &mut World, entity: Entity, new_parent: Option<Entity>) -> Result<(), SceneError> {
        let links = world.hierarchy_links();
        if !links.contains_key(entity) {
            return Err(missing_links(entity));
        }

        if let Some(parent) = new_parent {
            if parent == entity {
                return Err(reject(world, entity, "an entity cannot be its own parent"));
            }
            if !links.contains_key(parent) {
                log::warn!("Cannot reparent {} to {:?}: target has no hierarchy links", world.label(entity), parent);
                return Err(SceneError::DanglingReference { entity, target: parent });
            }
            if hierarchy::is_ancestor(links, entity, parent) {
                let reason = format!("new parent {} is a descendant", world.label(parent));
                return Err(reject(world, entity, reason));
            }
        }
        check_splice(world, entity, new_parent)?;

        let links = world.hierarchy_links_mut();
        hierarchy::unlink(links, entity)?;
        hierarchy::link_last(links, entity, new_parent)?;

        mark_dirty(world, entity);
        Ok(())
    }

    /// Move `entity` next to a sibling anchor
    ///
    /// With a valid `before` the entity is placed immediately before it,
    /// otherwise immediately after `after`. Anchors under different parents are
    /// rejected. Naming the entity itself as an anchor is a no-op. The
    /// transform is only marked dirty when the parent changes.
    pub fn reorder(
        &self,
        world: &mut World,
        entity: Entity,
        after: Option<Entity>,
        before: Option<Entity>,
    ) -> Result<(), SceneError> {
        if after == Some(entity) || before == Some(entity) {
            return Ok(());
        }

        let links = world.hierarchy_links();
        let current_parent = links.get(entity).ok_or_else(|| missing_links(entity))?.parent;

        let anchor_parent = |anchor: Option<Entity>| anchor.and_then(|a| links.get(a)).map(|link| link.parent);
        let destination = match (anchor_parent(after), anchor_parent(before)) {
            (Some(after_parent), Some(before_parent)) if after_parent != before_parent => {
                return Err(reject(world, entity, "sibling anchors have different parents"));
            }
            (_, Some(parent)) | (Some(parent), None) => parent,
            (None, None) => {
                if let Some(target) = before.or(after) {
                    log::warn!("Cannot reorder {}: anchor {:?} has no hierarchy links", world.label(entity), target);
                    return Err(SceneError::DanglingReference { entity, target });
                }
                return Err(reject(world, entity, "no sibling anchor given"));
            }
        };

        if let Some(parent) = destination {
            if parent == entity || hierarchy::is_ancestor(links, entity, parent) {
                return Err(reject(world, entity, "destination is inside the entity's own subtree"));
            }
        }

        let use_before = anchor_parent(before).is_some();
        check_splice(world, entity, destination)?;

        let links = world.hierarchy_links_mut();
        hierarchy::unlink(links, entity)?;
        match (use_before, before, after) {
            (true, Some(anchor), _) => hierarchy::link_before(links, entity, anchor)?,
            (_, _, Some(anchor)) => hierarchy::link_after(links, entity, anchor)?,
            _ => hierarchy::link_last(links, entity, destination)?,
        }

        if current_parent != destination {
            mark_dirty(world, entity);
        }
        Ok(())
    }

    /// Recompute world matrices for every dirty transform and its descendants
    ///
    /// Each dirty entity is processed from its topmost dirty ancestor so
    /// parents are always current before their children. Returns the number
    /// of world matrices recomputed.
    pub fn update(&self, world: &mut World) -> usize {
        let (transforms, links) = world.transforms_and_links();
        let dirty: Vec<Entity> = transforms
            .iter()
            .filter(|(_, transform)| transform.is_dirty())
            .map(|(entity, _)| entity)
            .collect();

        let mut updated = 0;
        for entity in dirty {
            // Already refreshed through an ancestor
            if !transforms.get(entity).is_some_and(TransformComponent::is_dirty) {
                continue;
            }

            let start = self.topmost_dirty(transforms, links, entity);
            let parent_world = parent_world_matrix(transforms, links, start);
            updated += self.propagate(transforms, links, start, parent_world);
        }

        if updated > 0 {
            log::trace!("Updated {} world transforms", updated);
        }
        updated
    }

    /// Check every hierarchy link invariant
    pub fn validate(&self, world: &World) -> Result<(), SceneError> {
        hierarchy::validate(world.hierarchy_links())
    }

    /// Rebuild all sibling chains after a bulk load
    ///
    /// Parent fields are trusted, dangling parents and parent cycles turn the
    /// affected entity into a root, and every transform is marked dirty.
    pub fn repair_hierarchy(&self, world: &mut World) -> RepairReport {
        let report = hierarchy::rebuild_links(world.hierarchy_links_mut());

        let (transforms, _) = world.transforms_and_links();
        for transform in transforms.values_mut() {
            transform.mark_dirty();
        }

        if report.is_clean() {
            log::debug!("Hierarchy repair found no problems");
        } else {
            log::info!(
                "Hierarchy repair: {} relinked, {} orphaned, {} cycles broken",
                report.relinked,
                report.orphaned,
                report.cycles_broken
            );
        }
        report
    }

    /// Children of `parent` in sibling order
    pub fn children(&self, world: &World, parent: Entity) -> Vec<Entity> {
        hierarchy::children(world.hierarchy_links(), parent).collect()
    }

    /// Entities with hierarchy links and no parent
    pub fn roots(&self, world: &World) -> Vec<Entity> {
        world
            .hierarchy_links()
            .iter()
            .filter(|(_, link)| link.is_root())
            .map(|(entity, _)| entity)
            .collect()
    }

    /// Pre-order list of `root` and its descendants, in sibling order
    pub(crate) fn collect_subtree(&self, links: &HierarchyLinks, root: Entity) -> Vec<Entity> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(root, 0usize)];

        while let Some((entity, depth)) = stack.pop() {
            if !visited.insert(entity) {
                log::error!("Entity {:?} reached twice while walking the hierarchy", entity);
                continue;
            }
            order.push(entity);

            if depth >= self.config.max_depth {
                log::error!("Hierarchy below {:?} exceeds depth {}, skipping", entity, self.config.max_depth);
                continue;
            }

            let children: Vec<Entity> = hierarchy::children(links, entity).collect();
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }

        order
    }

    fn topmost_dirty(&self, transforms: &Transforms, links: &HierarchyLinks, entity: Entity) -> Entity {
        let mut topmost = entity;
        let mut current = links.get(entity).and_then(|link| link.parent);
        let mut steps = 0;

        while let Some(node) = current {
            let Some(transform) = transforms.get(node) else {
                break;
            };
            if transform.is_dirty() {
                topmost = node;
            }
            steps += 1;
            if steps > self.config.max_depth.min(links.len()) {
                log::error!("Parent chain above {:?} is too deep or cyclic", entity);
                break;
            }
            current = links.get(node).and_then(|link| link.parent);
        }

        topmost
    }

    fn propagate(&self, transforms: &mut Transforms, links: &HierarchyLinks, start: Entity, parent_world: Mat4) -> usize {
        let mut updated = 0;
        let mut visited = HashSet::new();
        let mut stack = vec![(start, parent_world, 0usize)];

        while let Some((entity, parent_world, depth)) = stack.pop() {
            if !visited.insert(entity) {
                log::error!("Cycle through {:?} during transform update", entity);
                continue;
            }

            // Entities without a transform pass identity down to their children
            let world_matrix = match transforms.get_mut(entity) {
                Some(transform) => {
                    transform.recompute_world(&parent_world);
                    updated += 1;
                    *transform.world_transform()
                }
                None => Mat4::identity(),
            };

            if depth >= self.config.max_depth {
                log::error!("Transform update below {:?} exceeds depth {}, stopping", entity, self.config.max_depth);
                continue;
            }

            for child in hierarchy::children(links, entity) {
                stack.push((child, world_matrix, depth + 1));
            }
        }

        updated
    }
}

fn parent_world_matrix(transforms: &Transforms, links: &HierarchyLinks, entity: Entity) -> Mat4 {
    let Some(parent) = links.get(entity).and_then(|link| link.parent) else {
        return Mat4::identity();
    };

    match transforms.get(parent) {
        Some(transform) => *transform.world_transform(),
        None if links.contains_key(parent) => Mat4::identity(),
        None => {
            log::warn!("{:?} has dangling parent {:?}, treating it as a root", entity, parent);
            Mat4::identity()
        }
    }
}

fn mark_dirty(world: &mut World, entity: Entity) {
    if let Some(transform) = world.transform_mut(entity) {
        transform.mark_dirty();
    }
}

fn missing_links(entity: Entity) -> SceneError {
    SceneError::MissingComponent {
        entity,
        component: HierarchyComponent::NAME,
    }
}

/// Make sure moving `entity` under `destination` only touches linked nodes
fn check_splice(world: &World, entity: Entity, destination: Option<Entity>) -> Result<(), SceneError> {
    let links = world.hierarchy_links();
    let checked = hierarchy::check_neighbors(links, entity)
        .and_then(|()| destination.map_or(Ok(()), |parent| hierarchy::check_chain(links, entity, parent)));
    if let Err(err) = &checked {
        log::warn!("Cannot move {}: {}", world.label(entity), err);
    }
    checked
}

fn reject(world: &World, entity: Entity, reason: impl Into<String>) -> SceneError {
    let reason = reason.into();
    log::warn!("Rejected hierarchy operation on {}: {}", world.label(entity), reason);
    SceneError::invalid(entity, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn graph() -> SceneGraph {
        SceneGraph::new(HierarchyConfig::default())
    }

    #[test]
    fn test_create_entity_appends_to_parent() {
        let mut world = World::new();
        let graph = graph();
        let root = graph.create_entity(&mut world, "root", None).unwrap();
        let a = graph.create_entity(&mut world, "a", Some(root)).unwrap();
        let b = graph.create_entity(&mut world, "b", Some(root)).unwrap();

        assert_eq!(graph.children(&world, root), vec![a, b]);
        assert_eq!(graph.roots(&world), vec![root]);
        assert!(world.transform(a).unwrap().is_dirty());
        graph.validate(&world).unwrap();
    }

    #[test]
    fn test_create_entity_with_dead_parent_leaves_nothing() {
        let mut world = World::new();
        let graph = graph();
        let gone = world.spawn("gone");
        world.despawn(gone);

        let result = graph.create_entity(&mut world, "orphan", Some(gone));

        assert!(matches!(result, Err(SceneError::DanglingReference { .. })));
        assert!(world.is_empty());
    }

    #[test]
    fn test_attach_twice_is_rejected() {
        let mut world = World::new();
        let graph = graph();
        let entity = graph.create_entity(&mut world, "e", None).unwrap();

        let result = graph.attach_hierarchy(&mut world, entity, HierarchyComponent::default());
        assert!(matches!(result, Err(SceneError::InvalidHierarchyOperation { .. })));
    }

    #[test]
    fn test_detach_orphans_children() {
        let mut world = World::new();
        let graph = graph();
        let root = graph.create_entity(&mut world, "root", None).unwrap();
        let mid = graph.create_entity(&mut world, "mid", Some(root)).unwrap();
        let leaf = graph.create_entity(&mut world, "leaf", Some(mid)).unwrap();
        graph.update(&mut world);

        let removed = graph.detach_hierarchy(&mut world, mid).unwrap();

        assert_eq!(removed.parent, Some(root));
        assert_eq!(removed.first_child, Some(leaf));
        assert!(world.hierarchy(mid).is_none());
        assert!(world.hierarchy(leaf).unwrap().is_root());
        assert!(world.transform(leaf).unwrap().is_dirty());
        assert!(graph.children(&world, root).is_empty());
        graph.validate(&world).unwrap();
    }

    #[test]
    fn test_destroy_entity_removes_subtree() {
        let mut world = World::new();
        let graph = graph();
        let root = graph.create_entity(&mut world, "root", None).unwrap();
        let keep = graph.create_entity(&mut world, "keep", Some(root)).unwrap();
        let doomed = graph.create_entity(&mut world, "doomed", Some(root)).unwrap();
        let doomed_child = graph.create_entity(&mut world, "doomed_child", Some(doomed)).unwrap();
        let last = graph.create_entity(&mut world, "last", Some(root)).unwrap();

        assert_eq!(graph.destroy_entity(&mut world, doomed).unwrap(), 2);

        assert!(!world.contains(doomed));
        assert!(!world.contains(doomed_child));
        assert_eq!(graph.children(&world, root), vec![keep, last]);
        graph.validate(&world).unwrap();
        assert!(graph.destroy_entity(&mut world, doomed).is_err());
    }

    #[test]
    fn test_reparent_to_root_and_back() {
        let mut world = World::new();
        let graph = graph();
        let a = graph.create_entity(&mut world, "a", None).unwrap();
        let b = graph.create_entity(&mut world, "b", Some(a)).unwrap();
        graph.update(&mut world);

        graph.reparent(&mut world, b, None).unwrap();
        assert!(world.hierarchy(b).unwrap().is_root());
        assert!(world.transform(b).unwrap().is_dirty());

        graph.reparent(&mut world, b, Some(a)).unwrap();
        assert_eq!(graph.children(&world, a), vec![b]);
        graph.validate(&world).unwrap();
    }

    #[test]
    fn test_reparent_rejects_self_and_descendant() {
        let mut world = World::new();
        let graph = graph();
        let a = graph.create_entity(&mut world, "a", None).unwrap();
        let b = graph.create_entity(&mut world, "b", Some(a)).unwrap();
        let before = world.hierarchy_links().clone();

        assert!(matches!(
            graph.reparent(&mut world, a, Some(a)),
            Err(SceneError::InvalidHierarchyOperation { .. })
        ));
        assert!(matches!(
            graph.reparent(&mut world, a, Some(b)),
            Err(SceneError::InvalidHierarchyOperation { .. })
        ));
        assert_eq!(world.hierarchy_links(), &before);
    }

    #[test]
    fn test_reorder_within_parent_keeps_transform_clean() {
        let mut world = World::new();
        let graph = graph();
        let root = graph.create_entity(&mut world, "root", None).unwrap();
        let a = graph.create_entity(&mut world, "a", Some(root)).unwrap();
        let b = graph.create_entity(&mut world, "b", Some(root)).unwrap();
        let c = graph.create_entity(&mut world, "c", Some(root)).unwrap();
        graph.update(&mut world);

        graph.reorder(&mut world, c, None, Some(a)).unwrap();
        assert_eq!(graph.children(&world, root), vec![c, a, b]);

        graph.reorder(&mut world, c, Some(b), None).unwrap();
        assert_eq!(graph.children(&world, root), vec![a, b, c]);

        assert!(!world.transform(c).unwrap().is_dirty());
        graph.validate(&world).unwrap();
    }

    #[test]
    fn test_reorder_across_parents_marks_dirty() {
        let mut world = World::new();
        let graph = graph();
        let left = graph.create_entity(&mut world, "left", None).unwrap();
        let right = graph.create_entity(&mut world, "right", None).unwrap();
        let mover = graph.create_entity(&mut world, "mover", Some(left)).unwrap();
        let anchor = graph.create_entity(&mut world, "anchor", Some(right)).unwrap();
        graph.update(&mut world);

        graph.reorder(&mut world, mover, Some(anchor), None).unwrap();

        assert_eq!(graph.children(&world, right), vec![anchor, mover]);
        assert!(graph.children(&world, left).is_empty());
        assert!(world.transform(mover).unwrap().is_dirty());
        graph.validate(&world).unwrap();
    }

    #[test]
    fn test_reorder_rejects_mismatched_anchors_and_cycles() {
        let mut world = World::new();
        let graph = graph();
        let left = graph.create_entity(&mut world, "left", None).unwrap();
        let right = graph.create_entity(&mut world, "right", None).unwrap();
        let l1 = graph.create_entity(&mut world, "l1", Some(left)).unwrap();
        let r1 = graph.create_entity(&mut world, "r1", Some(right)).unwrap();
        let mover = graph.create_entity(&mut world, "mover", Some(left)).unwrap();
        let under_mover = graph.create_entity(&mut world, "under_mover", Some(mover)).unwrap();
        let before = world.hierarchy_links().clone();

        assert!(graph.reorder(&mut world, mover, Some(l1), Some(r1)).is_err());
        assert!(graph.reorder(&mut world, left, Some(under_mover), None).is_err());
        assert!(graph.reorder(&mut world, mover, None, None).is_err());
        assert_eq!(world.hierarchy_links(), &before);

        graph.reorder(&mut world, mover, Some(mover), None).unwrap();
        assert_eq!(world.hierarchy_links(), &before);
    }

    #[test]
    fn test_reorder_next_to_root_detaches() {
        let mut world = World::new();
        let graph = graph();
        let a = graph.create_entity(&mut world, "a", None).unwrap();
        let b = graph.create_entity(&mut world, "b", None).unwrap();
        let child = graph.create_entity(&mut world, "child", Some(a)).unwrap();

        graph.reorder(&mut world, child, None, Some(b)).unwrap();

        assert!(world.hierarchy(child).unwrap().is_root());
        assert!(graph.children(&world, a).is_empty());
        graph.validate(&world).unwrap();
    }

    #[test]
    fn test_update_clean_scene_does_nothing() {
        let mut world = World::new();
        let graph = graph();
        let root = graph.create_entity(&mut world, "root", None).unwrap();
        graph.create_entity(&mut world, "child", Some(root)).unwrap();

        assert_eq!(graph.update(&mut world), 2);
        assert_eq!(graph.update(&mut world), 0);
    }

    #[test]
    fn test_update_composes_rotation_and_scale() {
        let mut world = World::new();
        let graph = graph();
        let parent = graph.create_entity(&mut world, "parent", None).unwrap();
        let child = graph.create_entity(&mut world, "child", Some(parent)).unwrap();

        world.transform_mut(parent).unwrap().set_local_rotation(Vec3::new(0.0, 0.0, 90.0));
        world.transform_mut(parent).unwrap().set_local_scale(Vec3::new(2.0, 2.0, 2.0));
        world.transform_mut(child).unwrap().set_local_position(Vec3::new(1.0, 0.0, 0.0));
        graph.update(&mut world);

        let position = world.transform(child).unwrap().world_position();
        assert_relative_eq!(position, Vec3::new(0.0, 2.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_update_dangling_parent_uses_identity() {
        let mut world = World::new();
        let graph = graph();
        let parent = graph.create_entity(&mut world, "parent", None).unwrap();
        let child = graph.create_entity(&mut world, "child", Some(parent)).unwrap();
        world.transform_mut(parent).unwrap().set_local_position(Vec3::new(5.0, 0.0, 0.0));
        world.transform_mut(child).unwrap().set_local_position(Vec3::new(0.0, 1.0, 0.0));

        // Raw removal skips the destroy hook
        world.despawn(parent);
        graph.update(&mut world);

        let position = world.transform(child).unwrap().world_position();
        assert_relative_eq!(position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_update_respects_depth_limit() {
        let mut world = World::new();
        let graph = SceneGraph::new(HierarchyConfig { max_depth: 2 });
        let a = graph.create_entity(&mut world, "a", None).unwrap();
        let b = graph.create_entity(&mut world, "b", Some(a)).unwrap();
        let c = graph.create_entity(&mut world, "c", Some(b)).unwrap();
        let d = graph.create_entity(&mut world, "d", Some(c)).unwrap();
        world.transform_mut(a).unwrap().set_local_position(Vec3::new(1.0, 0.0, 0.0));

        graph.update(&mut world);

        // d lies past the limit when walked from a and gets its own pass
        for entity in [b, c, d] {
            let transform = world.transform(entity).unwrap();
            assert!(!transform.is_dirty());
            assert_relative_eq!(transform.world_position(), Vec3::new(1.0, 0.0, 0.0));
        }
    }

    #[test]
    fn test_create_under_parent_with_dead_child_is_rejected() {
        let mut world = World::new();
        let graph = graph();
        let parent = graph.create_entity(&mut world, "parent", None).unwrap();
        let stale = graph.create_entity(&mut world, "stale", Some(parent)).unwrap();
        world.despawn(stale);
        let before = world.hierarchy_links().clone();

        let result = graph.create_entity(&mut world, "late", Some(parent));

        assert!(matches!(
            result,
            Err(SceneError::DanglingReference { target, .. }) if target == stale
        ));
        assert_eq!(world.len(), 1);
        assert_eq!(world.hierarchy_links(), &before);

        graph.repair_hierarchy(&mut world);
        let late = graph.create_entity(&mut world, "late", Some(parent)).unwrap();
        assert_eq!(graph.children(&world, parent), vec![late]);
        graph.validate(&world).unwrap();
    }

    #[test]
    fn test_moves_next_to_dead_sibling_change_nothing() {
        let mut world = World::new();
        let graph = graph();
        let parent = graph.create_entity(&mut world, "parent", None).unwrap();
        let a = graph.create_entity(&mut world, "a", Some(parent)).unwrap();
        let b = graph.create_entity(&mut world, "b", Some(parent)).unwrap();
        let c = graph.create_entity(&mut world, "c", Some(parent)).unwrap();
        let other = graph.create_entity(&mut world, "other", None).unwrap();
        world.despawn(b);
        let before = world.hierarchy_links().clone();

        assert!(matches!(
            graph.reparent(&mut world, a, Some(other)),
            Err(SceneError::DanglingReference { target, .. }) if target == b
        ));
        assert!(graph.reparent(&mut world, other, Some(parent)).is_err());
        assert!(graph.reorder(&mut world, c, None, Some(a)).is_err());
        assert_eq!(world.hierarchy_links(), &before);
    }
}
