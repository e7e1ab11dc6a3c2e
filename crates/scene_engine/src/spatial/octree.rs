//! Octree spatial partitioning structure
//!
//! Divides a fixed world region into hierarchical octants for frustum
//! culling of static geometry. Objects live in a central id → container map
//! owned by the tree; nodes only store [`ObjectId`]s. An object whose bounds
//! straddle a split plane is referenced by every child it overlaps, and
//! queries deduplicate by id.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat4, Vec3};
use super::bounding_volume::{IntersectResult, AABB};
use super::frustum::Frustum;

/// Configuration for octree behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Maximum objects per leaf before subdivision
    pub max_objects_per_node: usize,

    /// Maximum subdivision depth (root = 0)
    ///
    /// Leaves at this depth keep accepting objects past the threshold.
    pub max_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_objects_per_node: 8,
            max_depth: 8,
        }
    }
}

impl OctreeConfig {
    /// Copy with limits clamped to usable values
    pub fn validated(self) -> Self {
        if self.max_objects_per_node == 0 {
            log::warn!("Octree max_objects_per_node of 0 is not usable, using 1");
        }
        Self {
            max_objects_per_node: self.max_objects_per_node.max(1),
            ..self
        }
    }
}

/// Identifier assigned to an object when it is inserted
///
/// Monotonically increasing and never reused until the tree is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Raw integer value
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Object stored in the octree: world transform, local bounds and a payload
#[derive(Debug, Clone)]
pub struct ObjectContainer<T> {
    transform: Mat4,
    local_bounds: AABB,
    world_bounds: AABB,
    payload: T,
}

impl<T> ObjectContainer<T> {
    /// Wrap a payload with its world transform and object-space bounds
    ///
    /// Inverted bounds are collapsed to a point rather than rejected.
    pub fn new(transform: Mat4, local_bounds: AABB, payload: T) -> Self {
        let world_bounds = local_bounds
            .sanitized()
            .calculate_transformed_aabb(&transform)
            .sanitized();
        Self {
            transform,
            local_bounds,
            world_bounds,
            payload,
        }
    }

    /// World transform the object was inserted with
    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Object-space bounds
    pub fn local_bounds(&self) -> &AABB {
        &self.local_bounds
    }

    /// Object-space bounds transformed into world space
    pub fn world_bounds(&self) -> &AABB {
        &self.world_bounds
    }

    /// Payload handle
    pub fn payload(&self) -> &T {
        &self.payload
    }
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    bounds: AABB,
    objects: Vec<ObjectId>,
    children: Option<Box<[OctreeNode; 8]>>,
    depth: u32,
}

impl OctreeNode {
    /// Create a new leaf node
    pub fn new(bounds: AABB, depth: u32) -> Self {
        Self {
            bounds,
            objects: Vec::new(),
            children: None,
            depth,
        }
    }

    /// World-space region covered by this node
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    /// Object ids held directly by this node (empty for internal nodes)
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    /// Child octants, `None` for leaves
    pub fn children(&self) -> Option<&[OctreeNode; 8]> {
        self.children.as_deref()
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Region of one octant
    ///
    /// Octant layout: bit 0 = +X half, bit 1 = +Y half, bit 2 = +Z half.
    fn octant_bounds(&self, octant: usize) -> AABB {
        let center = self.bounds.center();
        let (min, max) = (self.bounds.min, self.bounds.max);
        AABB::new(
            Vec3::new(
                if octant & 1 == 0 { min.x } else { center.x },
                if octant & 2 == 0 { min.y } else { center.y },
                if octant & 4 == 0 { min.z } else { center.z },
            ),
            Vec3::new(
                if octant & 1 == 0 { center.x } else { max.x },
                if octant & 2 == 0 { center.y } else { max.y },
                if octant & 4 == 0 { center.z } else { max.z },
            ),
        )
    }

    /// Subdivide this node into 8 children
    ///
    /// No-op on internal nodes. Objects held by the node are left in place;
    /// [`redistribute_objects`](Self::redistribute_objects) moves them down.
    fn subdivide(&mut self) {
        if self.children.is_some() {
            return; // Already subdivided
        }

        let depth = self.depth + 1;
        let children: [OctreeNode; 8] =
            std::array::from_fn(|octant| OctreeNode::new(self.octant_bounds(octant), depth));
        self.children = Some(Box::new(children));

        log::trace!("Subdivided octree node at depth {} ({:?})", self.depth, self.bounds);
    }

    /// Push every id held by this (now internal) node into its children
    fn redistribute_objects<T>(
        &mut self,
        objects: &HashMap<ObjectId, ObjectContainer<T>>,
        config: &OctreeConfig,
    ) {
        let Some(children) = self.children.as_mut() else {
            return;
        };

        for id in std::mem::take(&mut self.objects) {
            let Some(container) = objects.get(&id) else {
                log::warn!("Octree node references unknown object {:?}, dropping it", id);
                continue;
            };
            for child in children.iter_mut() {
                child.insert(id, container.world_bounds(), objects, config);
            }
        }
    }

    /// Insert an object id; returns whether any node under this one stored it
    fn insert<T>(
        &mut self,
        id: ObjectId,
        bounds: &AABB,
        objects: &HashMap<ObjectId, ObjectContainer<T>>,
        config: &OctreeConfig,
    ) -> bool {
        if self.bounds.intersect(bounds) == IntersectResult::Outside {
            return false;
        }

        // Branch node: every overlapping child gets a reference
        if let Some(children) = self.children.as_mut() {
            let mut stored = false;
            for child in children.iter_mut() {
                stored |= child.insert(id, bounds, objects, config);
            }
            return stored;
        }

        self.objects.push(id);

        if self.objects.len() > config.max_objects_per_node && self.depth < config.max_depth {
            self.subdivide();
            self.redistribute_objects(objects, config);
        }

        true
    }

    /// Collect visible ids, skipping subtrees outside the frustum
    fn query<T>(
        &self,
        frustum: &Frustum,
        objects: &HashMap<ObjectId, ObjectContainer<T>>,
        seen: &mut HashSet<ObjectId>,
        results: &mut Vec<ObjectId>,
    ) {
        if !frustum.contains(&self.bounds) {
            return;
        }

        for &id in &self.objects {
            // An id failing the per-object test fails it in every node
            if !seen.insert(id) {
                continue;
            }
            if let Some(container) = objects.get(&id) {
                if frustum.contains(container.world_bounds()) {
                    results.push(id);
                }
            }
        }

        if let Some(ref children) = self.children {
            for child in children.iter() {
                child.query(frustum, objects, seen, results);
            }
        }
    }

    /// Get all leaf nodes (for visualization)
    pub fn get_all_leaves<'a>(&'a self, leaves: &mut Vec<&'a OctreeNode>) {
        if let Some(ref children) = self.children {
            for child in children.iter() {
                child.get_all_leaves(leaves);
            }
        } else {
            leaves.push(self);
        }
    }

    /// Get all nodes at a specific depth (for visualization)
    pub fn get_nodes_at_depth<'a>(&'a self, target_depth: u32, nodes: &mut Vec<&'a OctreeNode>) {
        if self.depth == target_depth {
            nodes.push(self);
        } else if let Some(ref children) = self.children {
            for child in children.iter() {
                child.get_nodes_at_depth(target_depth, nodes);
            }
        }
    }

    fn accumulate_stats(&self, stats: &mut OctreeStats) {
        stats.node_count += 1;
        stats.deepest_node = stats.deepest_node.max(self.depth);

        match self.children {
            Some(ref children) => {
                for child in children.iter() {
                    child.accumulate_stats(stats);
                }
            }
            None => {
                stats.leaf_count += 1;
                stats.stored_references += self.objects.len();
                stats.largest_leaf = stats.largest_leaf.max(self.objects.len());
            }
        }
    }
}

/// Structural summary of an octree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctreeStats {
    /// Total nodes, internal and leaf
    pub node_count: usize,
    /// Leaf nodes
    pub leaf_count: usize,
    /// Deepest node depth
    pub deepest_node: u32,
    /// Most ids held by a single leaf
    pub largest_leaf: usize,
    /// Id references across all leaves (straddling objects count once per leaf)
    pub stored_references: usize,
}

/// Octree spatial partitioning structure
#[derive(Debug, Clone)]
pub struct Octree<T> {
    root: OctreeNode,
    config: OctreeConfig,
    objects: HashMap<ObjectId, ObjectContainer<T>>,
    /// Objects not fully inside the root region, tested directly by queries
    out_of_bounds: Vec<ObjectId>,
    next_id: u64,
}

impl<T> Octree<T> {
    /// Create a new octree with given world bounds
    pub fn new(world_bounds: AABB, config: OctreeConfig) -> Self {
        Self {
            root: OctreeNode::new(world_bounds.sanitized(), 0),
            config: config.validated(),
            objects: HashMap::new(),
            out_of_bounds: Vec::new(),
            next_id: 0,
        }
    }

    /// Insert an object and return its freshly assigned id
    pub fn insert(&mut self, container: ObjectContainer<T>) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let bounds = *container.world_bounds();
        self.objects.insert(id, container);

        let stored = self.root.insert(id, &bounds, &self.objects, &self.config);

        // Nodes only cover the root region, so anything reaching past it is
        // also tested directly
        if self.root.bounds.intersect(&bounds) != IntersectResult::Inside {
            if stored {
                log::debug!("Object {:?} extends past the octree region {:?}", id, self.root.bounds);
            } else {
                log::warn!(
                    "Object {:?} at {:?} lies outside the octree region {:?}",
                    id, bounds, self.root.bounds
                );
            }
            self.out_of_bounds.push(id);
        }

        id
    }

    /// Ids of every object whose world bounds intersect the frustum
    ///
    /// Each id appears once even when the object is stored in several leaves.
    pub fn query(&self, frustum: &Frustum) -> Vec<ObjectId> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        self.root.query(frustum, &self.objects, &mut seen, &mut results);

        for &id in &self.out_of_bounds {
            if !seen.insert(id) {
                continue;
            }
            if let Some(container) = self.objects.get(&id) {
                if frustum.contains(container.world_bounds()) {
                    results.push(id);
                }
            }
        }

        results
    }

    /// Payloads of every object visible in the frustum
    pub fn query_payloads(&self, frustum: &Frustum) -> Vec<&T> {
        self.query(frustum)
            .into_iter()
            .filter_map(|id| self.objects.get(&id).map(ObjectContainer::payload))
            .collect()
    }

    /// Look up an inserted object
    pub fn get(&self, id: ObjectId) -> Option<&ObjectContainer<T>> {
        self.objects.get(&id)
    }

    /// Number of inserted objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no objects are inserted
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Root node
    pub fn root(&self) -> &OctreeNode {
        &self.root
    }

    /// Region covered by the root
    pub fn bounds(&self) -> &AABB {
        &self.root.bounds
    }

    /// Configuration in effect
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Structural summary
    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats::default();
        self.root.accumulate_stats(&mut stats);
        stats
    }

    /// Get all leaf nodes (for visualization)
    pub fn get_all_leaves(&self) -> Vec<&OctreeNode> {
        let mut leaves = Vec::new();
        self.root.get_all_leaves(&mut leaves);
        leaves
    }

    /// Get all nodes at a specific depth (for visualization)
    pub fn get_nodes_at_depth(&self, depth: u32) -> Vec<&OctreeNode> {
        let mut nodes = Vec::new();
        self.root.get_nodes_at_depth(depth, &mut nodes);
        nodes
    }

    /// Reset to an empty root leaf, dropping every object
    ///
    /// The id counter restarts as well: ids issued before the clear must not
    /// be used afterwards.
    pub fn clear(&mut self) {
        self.root = OctreeNode::new(self.root.bounds, 0);
        self.objects.clear();
        self.out_of_bounds.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants::PI, Mat4Ext};

    fn world_bounds() -> AABB {
        AABB::new(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(10.0, 10.0, 10.0))
    }

    fn point_object(position: Vec3, payload: u32) -> ObjectContainer<u32> {
        ObjectContainer::new(Mat4::new_translation(&position), AABB::point(Vec3::zeros()), payload)
    }

    fn small_config() -> OctreeConfig {
        OctreeConfig {
            max_objects_per_node: 2,
            max_depth: 3,
        }
    }

    #[test]
    fn test_octree_basic_insertion() {
        let mut octree = Octree::new(world_bounds(), OctreeConfig::default());

        let id = octree.insert(point_object(Vec3::zeros(), 7));

        assert_eq!(octree.len(), 1);
        assert_eq!(octree.get(id).map(|c| *c.payload()), Some(7));
        assert!(octree.root().is_leaf());
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut octree = Octree::new(world_bounds(), OctreeConfig::default());

        let ids: Vec<_> = (0..4)
            .map(|i| octree.insert(point_object(Vec3::new(i as f32, 0.0, 0.0), i)))
            .collect();

        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_overflow_subdivides_and_query_finds_all() {
        let mut octree = Octree::new(world_bounds(), small_config());

        let offsets = [
            Vec3::zeros(),
            Vec3::new(0.1, 0.0, 0.0),
            Vec3::new(-0.1, 0.1, 0.0),
            Vec3::new(0.0, -0.1, 0.1),
            Vec3::new(0.05, 0.05, -0.05),
        ];
        let mut ids: Vec<_> = offsets
            .iter()
            .enumerate()
            .map(|(i, &offset)| octree.insert(point_object(offset, i as u32)))
            .collect();

        assert!(!octree.root().is_leaf());
        assert!(octree.root().objects().is_empty());

        let mut found = octree.query(&Frustum::from_aabb(&world_bounds()));
        found.sort();
        ids.sort();
        assert_eq!(found, ids);
    }

    #[test]
    fn test_depth_bound_and_leaf_occupancy() {
        let config = small_config();
        let mut octree = Octree::new(world_bounds(), config);

        // Identical points can never be separated by subdivision
        for i in 0..20 {
            octree.insert(point_object(Vec3::new(3.0, 3.0, 3.0), i));
        }
        for i in 0..6 {
            octree.insert(point_object(Vec3::new(-7.0 + i as f32, -8.0, 6.0), 100 + i));
        }

        let stats = octree.stats();
        assert!(stats.deepest_node <= config.max_depth);

        let leaves = octree.get_all_leaves();
        for leaf in &leaves {
            assert!(leaf.depth() <= config.max_depth);
            if leaf.depth() < config.max_depth {
                assert!(leaf.objects().len() <= config.max_objects_per_node);
            }
        }

        // The cluster overflows at max depth rather than subdividing further
        assert_eq!(stats.largest_leaf, 20);
    }

    #[test]
    fn test_straddling_object_reported_once() {
        let config = OctreeConfig {
            max_objects_per_node: 1,
            max_depth: 3,
        };
        let mut octree = Octree::new(world_bounds(), config);

        octree.insert(point_object(Vec3::new(5.0, 5.0, 5.0), 0));
        // Straddles the x = 0 split plane of the root
        let straddler = octree.insert(ObjectContainer::new(
            Mat4::identity(),
            AABB::new(Vec3::new(-1.0, 4.0, 4.0), Vec3::new(1.0, 6.0, 6.0)),
            1,
        ));

        let holders = octree
            .get_all_leaves()
            .into_iter()
            .filter(|leaf| leaf.objects().contains(&straddler))
            .count();
        assert!(holders >= 2);

        let found = octree.query(&Frustum::from_aabb(&world_bounds()));
        assert_eq!(found.iter().filter(|&&id| id == straddler).count(), 1);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_query_prunes_by_object_bounds() {
        let mut octree = Octree::new(world_bounds(), small_config());

        let near = octree.insert(point_object(Vec3::new(-8.0, -8.0, -8.0), 0));
        let far = octree.insert(point_object(Vec3::new(8.0, 8.0, 8.0), 1));
        octree.insert(point_object(Vec3::new(8.0, -8.0, 8.0), 2));

        let region = AABB::new(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(-5.0, -5.0, -5.0));
        let found = octree.query(&Frustum::from_aabb(&region));

        assert_eq!(found, vec![near]);
        assert!(!found.contains(&far));
    }

    #[test]
    fn test_rotated_object_uses_enclosing_bounds() {
        let mut octree = Octree::new(world_bounds(), small_config());

        // A long thin box along X, rotated 90 degrees to lie along Z
        let transform = Mat4::new_translation(&Vec3::new(0.0, 0.0, 5.0)) * Mat4::rotation_y(PI / 2.0);
        let id = octree.insert(ObjectContainer::new(
            transform,
            AABB::new(Vec3::new(-4.0, -0.1, -0.1), Vec3::new(4.0, 0.1, 0.1)),
            0,
        ));

        let tip = AABB::new(Vec3::new(-0.5, -0.5, 8.5), Vec3::new(0.5, 0.5, 9.5));
        assert_eq!(octree.query(&Frustum::from_aabb(&tip)), vec![id]);
    }

    #[test]
    fn test_outside_region_still_queryable() {
        let mut octree = Octree::new(world_bounds(), small_config());

        let outlier = octree.insert(point_object(Vec3::new(50.0, 0.0, 0.0), 0));

        let around = AABB::from_center_extents(Vec3::new(50.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(octree.query(&Frustum::from_aabb(&around)), vec![outlier]);
        assert!(octree.query(&Frustum::from_aabb(&world_bounds())).is_empty());
    }

    #[test]
    fn test_object_crossing_region_edge_found_from_outside() {
        let mut octree = Octree::new(world_bounds(), small_config());

        let wall = octree.insert(ObjectContainer::new(
            Mat4::identity(),
            AABB::new(Vec3::new(8.0, -1.0, -1.0), Vec3::new(14.0, 1.0, 1.0)),
            0,
        ));

        let beyond = AABB::new(Vec3::new(12.0, -1.0, -1.0), Vec3::new(13.0, 1.0, 1.0));
        assert_eq!(octree.query(&Frustum::from_aabb(&beyond)), vec![wall]);
        assert_eq!(octree.query(&Frustum::from_aabb(&world_bounds())), vec![wall]);
    }

    #[test]
    fn test_degenerate_bounds_do_not_fail() {
        let mut octree = Octree::new(world_bounds(), small_config());

        let inverted = octree.insert(ObjectContainer::new(
            Mat4::identity(),
            AABB::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(-1.0, -1.0, -1.0)),
            0,
        ));

        let found = octree.query(&Frustum::from_aabb(&world_bounds()));
        assert_eq!(found, vec![inverted]);
        assert_eq!(octree.get(inverted).map(|c| c.world_bounds().min), Some(Vec3::zeros()));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut octree = Octree::new(world_bounds(), small_config());
        for i in 0..5 {
            octree.insert(point_object(Vec3::new(i as f32, 0.0, 0.0), i));
        }

        octree.clear();

        assert!(octree.is_empty());
        assert!(octree.root().is_leaf());
        assert!(octree.query(&Frustum::from_aabb(&world_bounds())).is_empty());
        assert_eq!(octree.insert(point_object(Vec3::zeros(), 9)).value(), 0);
    }

    #[test]
    fn test_query_payloads() {
        let mut octree = Octree::new(world_bounds(), small_config());
        octree.insert(point_object(Vec3::new(1.0, 1.0, 1.0), 42));

        let payloads = octree.query_payloads(&Frustum::from_aabb(&world_bounds()));
        assert_eq!(payloads, vec![&42]);
    }

    #[test]
    fn test_zero_capacity_config_is_clamped() {
        let octree: Octree<u32> = Octree::new(world_bounds(), OctreeConfig {
            max_objects_per_node: 0,
            max_depth: 2,
        });
        assert_eq!(octree.config().max_objects_per_node, 1);
    }
}
