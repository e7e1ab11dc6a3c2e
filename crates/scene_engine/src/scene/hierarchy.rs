//! Intrusive hierarchy link helpers
//!
//! Every structural change to the parent/sibling lists goes through the
//! splice functions in this module: [`unlink`], [`link_last`],
//! [`link_before`] and [`link_after`]. Traversals are bounded by the number
//! of linked entities so a corrupted chain ends the walk instead of looping.

use std::collections::{HashMap, HashSet};

use crate::ecs::{Component, Entity, HierarchyLinks};
use crate::ecs::components::HierarchyComponent;
use super::errors::SceneError;

/// Iterator over a parent's children in sibling order
pub struct Children<'a> {
    links: &'a HierarchyLinks,
    next: Option<Entity>,
    remaining: usize,
}

impl Iterator for Children<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let current = self.next?;
        if self.remaining == 0 {
            log::error!("Sibling chain through {:?} does not terminate, stopping traversal", current);
            self.next = None;
            return None;
        }
        self.remaining -= 1;
        self.next = self.links.get(current).and_then(|link| link.next_sibling);
        Some(current)
    }
}

/// Children of `parent`, first to last
pub fn children(links: &HierarchyLinks, parent: Entity) -> Children<'_> {
    Children {
        links,
        next: links.get(parent).and_then(|link| link.first_child),
        remaining: links.len(),
    }
}

/// Whether `ancestor` appears on the parent chain above `entity`
///
/// A parent chain longer than the number of linked entities can only be a
/// cycle; it is reported as an ancestor relation so callers reject the change.
pub fn is_ancestor(links: &HierarchyLinks, ancestor: Entity, entity: Entity) -> bool {
    let mut current = links.get(entity).and_then(|link| link.parent);
    let mut steps = 0;

    while let Some(node) = current {
        if node == ancestor {
            return true;
        }
        steps += 1;
        if steps > links.len() {
            log::error!("Parent chain above {:?} contains a cycle", entity);
            return true;
        }
        current = links.get(node).and_then(|link| link.parent);
    }

    false
}

/// Check that every node `entity` is linked to still has links
///
/// Covers the parent and both siblings, the nodes [`unlink`] rewrites.
pub(crate) fn check_neighbors(links: &HierarchyLinks, entity: Entity) -> Result<(), SceneError> {
    let link = require_link(links, entity)?;
    for target in [link.parent, link.prev_sibling, link.next_sibling].into_iter().flatten() {
        require_neighbor(links, entity, target)?;
    }
    Ok(())
}

/// Check that `parent` and every node of its child chain still have links
pub(crate) fn check_chain(links: &HierarchyLinks, entity: Entity, parent: Entity) -> Result<(), SceneError> {
    let mut cursor = require_neighbor(links, entity, parent)?.first_child;
    let mut steps = 0;
    while let Some(node) = cursor {
        steps += 1;
        if steps > links.len() {
            return Err(SceneError::corrupt(parent, "child chain does not terminate"));
        }
        cursor = require_neighbor(links, entity, node)?.next_sibling;
    }
    Ok(())
}

/// Remove `entity` from its parent's child chain
///
/// Neighbors are stitched together and the parent's `first_child` advances
/// when `entity` was the head. The entity keeps its own children. Nothing is
/// modified when a neighbor has lost its links.
pub(crate) fn unlink(links: &mut HierarchyLinks, entity: Entity) -> Result<(), SceneError> {
    check_neighbors(links, entity)?;
    cut_out(links, entity);
    Ok(())
}

/// Splice `entity` out of its chain, skipping neighbors without links
///
/// Used by the destroy hook, which must remove the entity even from a
/// damaged chain.
pub(crate) fn cut_out(links: &mut HierarchyLinks, entity: Entity) {
    let Some(link) = links.get(entity).copied() else {
        return;
    };

    match (link.prev_sibling, link.parent) {
        (Some(prev), _) => match links.get_mut(prev) {
            Some(prev_link) => prev_link.next_sibling = link.next_sibling,
            None => log::warn!("Previous sibling {:?} of {:?} has no hierarchy links", prev, entity),
        },
        (None, Some(parent)) => match links.get_mut(parent) {
            Some(parent_link) if parent_link.first_child == Some(entity) => {
                parent_link.first_child = link.next_sibling;
            }
            Some(_) => log::warn!("{:?} has no previous sibling but is not the first child of {:?}", entity, parent),
            None => log::warn!("Parent {:?} of {:?} has no hierarchy links", parent, entity),
        },
        (None, None) => {}
    }

    if let Some(next) = link.next_sibling {
        match links.get_mut(next) {
            Some(next_link) => next_link.prev_sibling = link.prev_sibling,
            None => log::warn!("Next sibling {:?} of {:?} has no hierarchy links", next, entity),
        }
    }

    if let Some(link) = links.get_mut(entity) {
        link.clear_position();
    }
}

fn require_link(links: &HierarchyLinks, entity: Entity) -> Result<HierarchyComponent, SceneError> {
    links.get(entity).copied().ok_or(SceneError::MissingComponent {
        entity,
        component: HierarchyComponent::NAME,
    })
}

fn require_neighbor(links: &HierarchyLinks, entity: Entity, target: Entity) -> Result<HierarchyComponent, SceneError> {
    links.get(target).copied().ok_or(SceneError::DanglingReference { entity, target })
}

fn require_anchor(links: &HierarchyLinks, entity: Entity, anchor: Entity) -> Result<HierarchyComponent, SceneError> {
    if anchor == entity {
        return Err(SceneError::invalid(entity, "an entity cannot be its own sibling anchor"));
    }
    links.get(anchor).copied().ok_or(SceneError::DanglingReference { entity, target: anchor })
}

/// Append an unlinked `entity` to the end of `parent`'s child chain
///
/// With `parent == None` the entity simply becomes a root. Nothing is
/// modified when the tail scan runs into `entity` itself.
pub(crate) fn link_last(links: &mut HierarchyLinks, entity: Entity, parent: Option<Entity>) -> Result<(), SceneError> {
    require_link(links, entity)?;

    let Some(parent) = parent else {
        if let Some(link) = links.get_mut(entity) {
            link.clear_position();
        }
        return Ok(());
    };

    if parent == entity {
        return Err(SceneError::invalid(entity, "an entity cannot be its own parent"));
    }

    let parent_link = links
        .get(parent)
        .copied()
        .ok_or(SceneError::DanglingReference { entity, target: parent })?;

    let mut tail = None;
    let mut cursor = parent_link.first_child;
    let mut steps = 0;
    while let Some(node) = cursor {
        if node == entity {
            return Err(SceneError::invalid(entity, "entity is already in the parent's child chain"));
        }
        steps += 1;
        if steps > links.len() {
            return Err(SceneError::corrupt(parent, "child chain does not terminate"));
        }
        tail = Some(node);
        cursor = require_neighbor(links, entity, node)?.next_sibling;
    }

    match tail {
        Some(tail) => {
            if let Some(tail_link) = links.get_mut(tail) {
                tail_link.next_sibling = Some(entity);
            }
        }
        None => {
            if let Some(parent_link) = links.get_mut(parent) {
                parent_link.first_child = Some(entity);
            }
        }
    }

    if let Some(link) = links.get_mut(entity) {
        link.parent = Some(parent);
        link.prev_sibling = tail;
        link.next_sibling = None;
    }

    Ok(())
}

/// Insert an unlinked `entity` immediately before `before`
///
/// Roots are not chained, so placing an entity next to a root makes it a root.
pub(crate) fn link_before(links: &mut HierarchyLinks, entity: Entity, before: Entity) -> Result<(), SceneError> {
    require_link(links, entity)?;
    let anchor = require_anchor(links, entity, before)?;

    let Some(parent) = anchor.parent else {
        return link_last(links, entity, None);
    };
    require_neighbor(links, entity, parent)?;
    if let Some(prev) = anchor.prev_sibling {
        require_neighbor(links, entity, prev)?;
    }

    match anchor.prev_sibling {
        Some(prev) => {
            if let Some(prev_link) = links.get_mut(prev) {
                prev_link.next_sibling = Some(entity);
            }
        }
        None => {
            if let Some(parent_link) = links.get_mut(parent) {
                parent_link.first_child = Some(entity);
            }
        }
    }

    if let Some(anchor_link) = links.get_mut(before) {
        anchor_link.prev_sibling = Some(entity);
    }

    if let Some(link) = links.get_mut(entity) {
        link.parent = Some(parent);
        link.prev_sibling = anchor.prev_sibling;
        link.next_sibling = Some(before);
    }

    Ok(())
}

/// Insert an unlinked `entity` immediately after `after`
pub(crate) fn link_after(links: &mut HierarchyLinks, entity: Entity, after: Entity) -> Result<(), SceneError> {
    require_link(links, entity)?;
    let anchor = require_anchor(links, entity, after)?;

    let Some(parent) = anchor.parent else {
        return link_last(links, entity, None);
    };
    require_neighbor(links, entity, parent)?;
    if let Some(next) = anchor.next_sibling {
        require_neighbor(links, entity, next)?;
    }

    if let Some(next) = anchor.next_sibling {
        if let Some(next_link) = links.get_mut(next) {
            next_link.prev_sibling = Some(entity);
        }
    }

    if let Some(anchor_link) = links.get_mut(after) {
        anchor_link.next_sibling = Some(entity);
    }

    if let Some(link) = links.get_mut(entity) {
        link.parent = Some(parent);
        link.prev_sibling = Some(after);
        link.next_sibling = anchor.next_sibling;
    }

    Ok(())
}

/// Check every link invariant
///
/// - a first child has no previous sibling and points back at its parent
/// - sibling links agree in both directions and chains terminate
/// - no entity is its own ancestor
/// - roots are not part of any sibling chain
pub fn validate(links: &HierarchyLinks) -> Result<(), SceneError> {
    let mut expected_children: HashMap<Entity, usize> = HashMap::new();

    for (entity, link) in links {
        if let Some(parent) = link.parent {
            if !links.contains_key(parent) {
                return Err(SceneError::corrupt(entity, format!("parent {:?} has no hierarchy links", parent)));
            }
            *expected_children.entry(parent).or_default() += 1;
        } else if link.prev_sibling.is_some() || link.next_sibling.is_some() {
            return Err(SceneError::corrupt(entity, "root entity is part of a sibling chain"));
        }

        if let Some(first) = link.first_child {
            let first_link = links
                .get(first)
                .ok_or_else(|| SceneError::corrupt(entity, format!("first child {:?} has no hierarchy links", first)))?;
            if first_link.prev_sibling.is_some() {
                return Err(SceneError::corrupt(first, "first child has a previous sibling"));
            }
            if first_link.parent != Some(entity) {
                return Err(SceneError::corrupt(first, "first child does not point back at its parent"));
            }
        }

        if let Some(next) = link.next_sibling {
            let next_link = links
                .get(next)
                .ok_or_else(|| SceneError::corrupt(entity, format!("next sibling {:?} has no hierarchy links", next)))?;
            if next_link.prev_sibling != Some(entity) {
                return Err(SceneError::corrupt(entity, format!("next sibling {:?} does not link back", next)));
            }
            if next_link.parent != link.parent {
                return Err(SceneError::corrupt(next, "sibling has a different parent"));
            }
        }

        if let Some(prev) = link.prev_sibling {
            let prev_link = links
                .get(prev)
                .ok_or_else(|| SceneError::corrupt(entity, format!("previous sibling {:?} has no hierarchy links", prev)))?;
            if prev_link.next_sibling != Some(entity) {
                return Err(SceneError::corrupt(entity, format!("previous sibling {:?} does not link forward", prev)));
            }
        }

        if is_ancestor(links, entity, entity) {
            return Err(SceneError::corrupt(entity, "entity is its own ancestor"));
        }
    }

    for (parent, _) in links {
        let mut seen = HashSet::new();
        let mut cursor = links.get(parent).and_then(|link| link.first_child);
        while let Some(child) = cursor {
            if !seen.insert(child) {
                return Err(SceneError::corrupt(parent, "child chain contains a cycle"));
            }
            cursor = links.get(child).and_then(|link| link.next_sibling);
        }

        let expected = expected_children.get(&parent).copied().unwrap_or(0);
        if seen.len() != expected {
            return Err(SceneError::corrupt(
                parent,
                format!("child chain holds {} entities but {} name it as parent", seen.len(), expected),
            ));
        }
    }

    Ok(())
}

/// Outcome of a post-load link rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Entities whose parent was missing and became roots
    pub orphaned: usize,
    /// Parent cycles broken by detaching one member
    pub cycles_broken: usize,
    /// Entities whose links changed
    pub relinked: usize,
}

impl RepairReport {
    /// Whether the loaded links were already canonical
    pub fn is_clean(&self) -> bool {
        self.orphaned == 0 && self.cycles_broken == 0 && self.relinked == 0
    }
}

/// Rebuild every sibling chain from the `parent` fields
///
/// Parent fields are authoritative. Each parent's children keep the order of
/// the loaded chain as far as that chain is consistent; children it missed
/// follow in store order.
pub(crate) fn rebuild_links(links: &mut HierarchyLinks) -> RepairReport {
    let mut report = RepairReport::default();
    let before: HashMap<Entity, HierarchyComponent> = links.iter().map(|(e, l)| (e, *l)).collect();
    let order: Vec<Entity> = links.keys().collect();

    // Missing or self-referential parents
    for &entity in &order {
        let parent = links.get(entity).and_then(|link| link.parent);
        if let Some(parent) = parent {
            if parent == entity || !links.contains_key(parent) {
                log::warn!("{:?} has invalid parent {:?}, making it a root", entity, parent);
                if let Some(link) = links.get_mut(entity) {
                    link.parent = None;
                }
                report.orphaned += 1;
            }
        }
    }

    // Parent cycles: detach the first member reached
    for &entity in &order {
        let mut current = links.get(entity).and_then(|link| link.parent);
        let mut steps = 0;
        while let Some(node) = current {
            if node == entity {
                log::warn!("{:?} is its own ancestor, making it a root", entity);
                if let Some(link) = links.get_mut(entity) {
                    link.parent = None;
                }
                report.cycles_broken += 1;
                break;
            }
            steps += 1;
            if steps > order.len() {
                break;
            }
            current = links.get(node).and_then(|link| link.parent);
        }
    }

    // Canonical child order per parent
    let mut by_parent: HashMap<Entity, Vec<Entity>> = HashMap::new();
    for &entity in &order {
        if let Some(parent) = links.get(entity).and_then(|link| link.parent) {
            by_parent.entry(parent).or_default().push(entity);
        }
    }

    let mut chains: Vec<(Entity, Vec<Entity>)> = Vec::with_capacity(by_parent.len());
    for &parent in &order {
        let Some(members) = by_parent.get(&parent) else {
            continue;
        };
        let mut ordered = Vec::with_capacity(members.len());
        let mut placed = HashSet::new();

        let mut cursor = links.get(parent).and_then(|link| link.first_child);
        while let Some(child) = cursor {
            let belongs = links.get(child).and_then(|link| link.parent) == Some(parent);
            if !belongs || !placed.insert(child) {
                break;
            }
            ordered.push(child);
            cursor = links.get(child).and_then(|link| link.next_sibling);
        }

        ordered.extend(members.iter().copied().filter(|child| !placed.contains(child)));
        chains.push((parent, ordered));
    }

    for (_, link) in links.iter_mut() {
        link.first_child = None;
        link.next_sibling = None;
        link.prev_sibling = None;
    }

    for (parent, ordered) in chains {
        if let Some(link) = links.get_mut(parent) {
            link.first_child = ordered.first().copied();
        }
        for (index, &child) in ordered.iter().enumerate() {
            if let Some(link) = links.get_mut(child) {
                link.prev_sibling = index.checked_sub(1).map(|prev| ordered[prev]);
                link.next_sibling = ordered.get(index + 1).copied();
            }
        }
    }

    report.relinked = links
        .iter()
        .filter(|(entity, link)| before.get(entity) != Some(*link))
        .count();

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn setup(count: usize) -> (HierarchyLinks, Vec<Entity>) {
        let mut keys: SlotMap<Entity, ()> = SlotMap::with_key();
        let mut links = HierarchyLinks::new();
        let entities: Vec<Entity> = (0..count).map(|_| keys.insert(())).collect();
        for &entity in &entities {
            links.insert(entity, HierarchyComponent::default());
        }
        (links, entities)
    }

    fn child_list(links: &HierarchyLinks, parent: Entity) -> Vec<Entity> {
        children(links, parent).collect()
    }

    #[test]
    fn test_link_last_appends_in_order() {
        let (mut links, e) = setup(4);
        for &child in &e[1..] {
            link_last(&mut links, child, Some(e[0])).unwrap();
        }

        assert_eq!(child_list(&links, e[0]), vec![e[1], e[2], e[3]]);
        assert_eq!(links[e[1]].prev_sibling, None);
        assert_eq!(links[e[3]].prev_sibling, Some(e[2]));
        validate(&links).unwrap();
    }

    #[test]
    fn test_unlink_head_middle_and_tail() {
        let (mut links, e) = setup(5);
        for &child in &e[1..] {
            link_last(&mut links, child, Some(e[0])).unwrap();
        }

        unlink(&mut links, e[2]).unwrap();
        assert_eq!(child_list(&links, e[0]), vec![e[1], e[3], e[4]]);
        assert!(links[e[2]].is_root());
        validate(&links).unwrap();

        unlink(&mut links, e[1]).unwrap();
        unlink(&mut links, e[4]).unwrap();
        assert_eq!(child_list(&links, e[0]), vec![e[3]]);
        assert_eq!(links[e[0]].first_child, Some(e[3]));
        assert_eq!(links[e[3]].prev_sibling, None);
        assert_eq!(links[e[3]].next_sibling, None);
    }

    #[test]
    fn test_unlink_only_child_clears_first_child() {
        let (mut links, e) = setup(2);
        link_last(&mut links, e[1], Some(e[0])).unwrap();

        unlink(&mut links, e[1]).unwrap();

        assert_eq!(links[e[0]].first_child, None);
        assert_eq!(links[e[1]], HierarchyComponent::default());
    }

    #[test]
    fn test_link_before_and_after() {
        let (mut links, e) = setup(5);
        link_last(&mut links, e[1], Some(e[0])).unwrap();
        link_last(&mut links, e[2], Some(e[0])).unwrap();

        link_before(&mut links, e[3], e[1]).unwrap();
        assert_eq!(child_list(&links, e[0]), vec![e[3], e[1], e[2]]);
        assert_eq!(links[e[0]].first_child, Some(e[3]));

        link_after(&mut links, e[4], e[1]).unwrap();
        assert_eq!(child_list(&links, e[0]), vec![e[3], e[1], e[4], e[2]]);
        validate(&links).unwrap();
    }

    #[test]
    fn test_link_last_rejects_self_and_existing_member() {
        let (mut links, e) = setup(3);
        link_last(&mut links, e[1], Some(e[0])).unwrap();

        assert!(matches!(
            link_last(&mut links, e[0], Some(e[0])),
            Err(SceneError::InvalidHierarchyOperation { .. })
        ));
        // e[1] is still chained; a second append must not corrupt the list
        assert!(link_last(&mut links, e[1], Some(e[0])).is_err());
        assert_eq!(child_list(&links, e[0]), vec![e[1]]);
    }

    #[test]
    fn test_splices_refuse_unlinked_neighbors() {
        let (mut links, e) = setup(4);
        link_last(&mut links, e[1], Some(e[0])).unwrap();
        link_last(&mut links, e[2], Some(e[0])).unwrap();
        links.remove(e[2]);
        let before = links.clone();

        assert_eq!(
            link_last(&mut links, e[3], Some(e[0])),
            Err(SceneError::DanglingReference { entity: e[3], target: e[2] })
        );
        assert!(link_after(&mut links, e[3], e[1]).is_err());
        assert!(unlink(&mut links, e[1]).is_err());
        assert!(check_chain(&links, e[3], e[0]).is_err());
        assert_eq!(links, before);

        cut_out(&mut links, e[1]);
        assert!(links[e[1]].is_root());
        assert_eq!(links[e[0]].first_child, Some(e[2]));
    }

    #[test]
    fn test_is_ancestor() {
        let (mut links, e) = setup(3);
        link_last(&mut links, e[1], Some(e[0])).unwrap();
        link_last(&mut links, e[2], Some(e[1])).unwrap();

        assert!(is_ancestor(&links, e[0], e[2]));
        assert!(is_ancestor(&links, e[1], e[2]));
        assert!(!is_ancestor(&links, e[2], e[0]));
        assert!(!is_ancestor(&links, e[2], e[2]));
    }

    #[test]
    fn test_children_iteration_stops_on_cycle() {
        let (mut links, e) = setup(3);
        links[e[0]].first_child = Some(e[1]);
        links[e[1]].next_sibling = Some(e[2]);
        links[e[2]].next_sibling = Some(e[1]);

        assert!(children(&links, e[0]).count() <= links.len());
        assert!(validate(&links).is_err());
    }

    #[test]
    fn test_rebuild_links_repairs_broken_chain() {
        let (mut links, e) = setup(5);
        // Parent fields say e1..e4 belong to e0, but the chain only reaches e2 -> e1
        for &child in &e[1..] {
            links[child].parent = Some(e[0]);
        }
        links[e[0]].first_child = Some(e[2]);
        links[e[2]].next_sibling = Some(e[1]);
        links[e[1]].next_sibling = Some(e[1]);

        let report = rebuild_links(&mut links);

        validate(&links).unwrap();
        let order = child_list(&links, e[0]);
        assert_eq!(&order[..2], &[e[2], e[1]]);
        assert_eq!(order.len(), 4);
        assert!(report.relinked > 0);
        assert_eq!(report.orphaned, 0);
    }

    #[test]
    fn test_rebuild_links_breaks_cycles_and_orphans() {
        let (mut links, e) = setup(5);
        let dead = e[4];
        links.remove(dead);
        links[e[0]].parent = Some(e[1]);
        links[e[1]].parent = Some(e[0]);
        links[e[2]].parent = Some(dead);
        links[e[3]].parent = Some(e[3]);

        let report = rebuild_links(&mut links);

        validate(&links).unwrap();
        assert_eq!(report.cycles_broken, 1);
        assert_eq!(report.orphaned, 2);
        assert!(links[e[2]].is_root());
        assert!(links[e[3]].is_root());
    }

    #[test]
    fn test_rebuild_links_keeps_clean_tree() {
        let (mut links, e) = setup(4);
        link_last(&mut links, e[1], Some(e[0])).unwrap();
        link_last(&mut links, e[2], Some(e[0])).unwrap();
        link_last(&mut links, e[3], Some(e[2])).unwrap();
        let snapshot = links.clone();

        let report = rebuild_links(&mut links);

        assert!(report.is_clean());
        assert_eq!(links, snapshot);
    }
}
