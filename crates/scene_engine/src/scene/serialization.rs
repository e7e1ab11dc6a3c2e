//! Scene snapshots
//!
//! A snapshot stores every entity's hierarchy links verbatim, keyed by a
//! snapshot-local id. Loading inserts them in loading mode and then runs the
//! repair pass, so a hand-edited or truncated file still yields a valid tree.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use slotmap::Key;

use crate::ecs::components::{BoundsComponent, HierarchyComponent, TransformComponent};
use crate::ecs::{Entity, World};
use crate::foundation::math::Vec3;
use crate::spatial::AABB;
use super::errors::SceneError;
use super::hierarchy::RepairReport;
use super::scene_graph::SceneGraph;

/// Authored transform values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformSnapshot {
    /// Local position
    pub position: Vec3,
    /// Local rotation, Euler degrees
    pub rotation: Vec3,
    /// Local scale
    pub scale: Vec3,
}

/// Hierarchy links as snapshot ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSnapshot {
    /// Parent id
    #[serde(default)]
    pub parent: Option<u64>,
    /// First child id
    #[serde(default)]
    pub first_child: Option<u64>,
    /// Next sibling id
    #[serde(default)]
    pub next_sibling: Option<u64>,
    /// Previous sibling id
    #[serde(default)]
    pub prev_sibling: Option<u64>,
}

/// One entity in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Snapshot-local id
    pub id: u64,
    /// Entity name
    #[serde(default)]
    pub name: String,
    /// Static geometry flag
    #[serde(default)]
    pub is_static: bool,
    /// Transform, if the entity has one
    #[serde(default)]
    pub transform: Option<TransformSnapshot>,
    /// Local bounds, if the entity has them
    #[serde(default)]
    pub bounds: Option<AABB>,
    /// Hierarchy links, if the entity has them
    #[serde(default)]
    pub links: Option<LinkSnapshot>,
}

/// Serializable copy of a [`World`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    /// Entities in store order
    pub entities: Vec<EntitySnapshot>,
}

/// Result of loading a snapshot
#[derive(Debug, Clone, Default)]
pub struct LoadedScene {
    /// Snapshot id to spawned entity
    pub entities: HashMap<u64, Entity>,
    /// What the post-load repair pass changed
    pub repair: RepairReport,
}

fn snapshot_id(entity: Entity) -> u64 {
    entity.data().as_ffi()
}

impl SceneSnapshot {
    /// Capture every live entity of `world`
    pub fn capture(world: &World) -> Self {
        let entities = world
            .entities()
            .map(|entity| {
                let transform = world.transform(entity).map(|t| TransformSnapshot {
                    position: t.local_position(),
                    rotation: t.local_rotation(),
                    scale: t.local_scale(),
                });
                let links = world.hierarchy(entity).map(|link| LinkSnapshot {
                    parent: link.parent.map(snapshot_id),
                    first_child: link.first_child.map(snapshot_id),
                    next_sibling: link.next_sibling.map(snapshot_id),
                    prev_sibling: link.prev_sibling.map(snapshot_id),
                });

                EntitySnapshot {
                    id: snapshot_id(entity),
                    name: world.name(entity).unwrap_or_default().to_string(),
                    is_static: world.is_static(entity),
                    transform,
                    bounds: world.bounds(entity).map(|bounds| bounds.local),
                    links,
                }
            })
            .collect();

        Self { entities }
    }

    /// Encode as pretty-printed RON
    pub fn to_ron(&self) -> Result<String, SceneError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneError::Serialization(e.to_string()))
    }

    /// Decode from RON
    pub fn from_ron(source: &str) -> Result<Self, SceneError> {
        ron::from_str(source).map_err(|e| SceneError::Serialization(e.to_string()))
    }

    /// Number of entities in the snapshot
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the snapshot holds no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl SceneGraph {
    /// Spawn every entity of `snapshot` into `world`
    ///
    /// Links are inserted verbatim in loading mode, then the repair pass
    /// rebuilds the sibling chains. Ids the snapshot does not define become
    /// dangling references, which the repair pass turns into roots.
    pub fn load_snapshot(&mut self, world: &mut World, snapshot: &SceneSnapshot) -> Result<LoadedScene, SceneError> {
        let mut entities = HashMap::with_capacity(snapshot.len());
        for entry in &snapshot.entities {
            if entities.contains_key(&entry.id) {
                return Err(SceneError::Serialization(format!("duplicate entity id {}", entry.id)));
            }
            entities.insert(entry.id, Entity::null());
        }

        for entry in &snapshot.entities {
            let entity = world.spawn(entry.name.clone());
            entities.insert(entry.id, entity);
        }

        let resolve = |id: Option<u64>| {
            id.map(|id| {
                entities.get(&id).copied().unwrap_or_else(|| {
                    log::warn!("Snapshot references unknown entity id {}", id);
                    Entity::null()
                })
            })
        };

        let was_loading = self.is_loading();
        self.set_loading(true);

        for entry in &snapshot.entities {
            let Some(&entity) = entities.get(&entry.id) else {
                continue;
            };

            world.set_static(entity, entry.is_static);
            if let Some(t) = entry.transform {
                world.insert_transform(entity, TransformComponent::from_transform(t.position, t.rotation, t.scale));
            }
            if let Some(bounds) = entry.bounds {
                world.insert_bounds(entity, BoundsComponent::new(bounds));
            }
            if let Some(links) = entry.links {
                let component = HierarchyComponent {
                    parent: resolve(links.parent),
                    first_child: resolve(links.first_child),
                    next_sibling: resolve(links.next_sibling),
                    prev_sibling: resolve(links.prev_sibling),
                };
                if let Err(err) = self.attach_hierarchy(world, entity, component) {
                    self.set_loading(was_loading);
                    return Err(err);
                }
            }
        }

        self.set_loading(was_loading);
        let repair = self.repair_hierarchy(world);
        log::info!("Loaded {} entities from snapshot", entities.len());

        Ok(LoadedScene { entities, repair })
    }
}
