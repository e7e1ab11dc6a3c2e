//! Octree over a scene's static geometry
//!
//! Built once per scene load, after the transform pass, from every entity
//! flagged [`EntityFlags::STATIC`](crate::ecs::EntityFlags::STATIC) that has
//! both a transform and local bounds. Moving entities are never indexed.

use crate::ecs::{Entity, World};
use crate::spatial::{Frustum, ObjectContainer, Octree, OctreeConfig, AABB};

/// Static entities indexed for frustum culling
#[derive(Debug, Clone)]
pub struct StaticSceneIndex {
    octree: Octree<Entity>,
}

impl StaticSceneIndex {
    /// Index static entities inside a region fitted to their world bounds
    pub fn build(world: &World, config: OctreeConfig) -> Self {
        let region = static_world_bounds(world).unwrap_or_default();
        Self::build_in(world, region, config)
    }

    /// Index static entities inside a fixed region
    ///
    /// Entities outside `region` are still indexed and still returned by
    /// queries.
    pub fn build_in(world: &World, region: AABB, config: OctreeConfig) -> Self {
        let mut index = Self {
            octree: Octree::new(region, config),
        };
        index.insert_static(world);
        index
    }

    /// Drop every object and index `world` again, keeping the region
    pub fn rebuild(&mut self, world: &World) {
        self.octree.clear();
        self.insert_static(world);
    }

    /// Static entities whose world bounds touch the frustum
    pub fn visible_entities(&self, frustum: &Frustum) -> Vec<Entity> {
        self.octree.query_payloads(frustum).into_iter().copied().collect()
    }

    /// Underlying octree
    pub fn octree(&self) -> &Octree<Entity> {
        &self.octree
    }

    /// Number of indexed entities
    pub fn len(&self) -> usize {
        self.octree.len()
    }

    /// Whether nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.octree.is_empty()
    }

    fn insert_static(&mut self, world: &World) {
        for entity in static_entities(world) {
            let (Some(transform), Some(bounds)) = (world.transform(entity), world.bounds(entity)) else {
                continue;
            };
            if transform.is_dirty() {
                log::warn!("Indexing {} with a stale world transform", world.label(entity));
            }
            self.octree
                .insert(ObjectContainer::new(*transform.world_transform(), bounds.local, entity));
        }

        let stats = self.octree.stats();
        log::info!(
            "Static index: {} entities, {} nodes, depth {}",
            self.octree.len(),
            stats.node_count,
            stats.deepest_node
        );
    }
}

fn static_entities(world: &World) -> impl Iterator<Item = Entity> + '_ {
    world.entities().filter(move |&entity| world.is_static(entity))
}

/// Union of the world bounds of every indexable static entity
fn static_world_bounds(world: &World) -> Option<AABB> {
    static_entities(world)
        .filter_map(|entity| {
            let transform = world.transform(entity)?;
            let bounds = world.bounds(entity)?;
            Some(bounds.local.sanitized().calculate_transformed_aabb(transform.world_transform()))
        })
        .reduce(|acc, bounds| acc.merge(&bounds))
}
