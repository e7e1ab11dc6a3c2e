//! Hierarchy link component
//!
//! Parent/child relations are stored as an intrusive doubly linked list of
//! entity handles: each parent knows only its first child, and children are
//! chained through `next_sibling`/`prev_sibling`. All mutation goes through
//! the splice helpers in [`crate::scene::hierarchy`].

use crate::ecs::Entity;

/// Per-entity parent/sibling links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HierarchyComponent {
    /// Parent entity, `None` for roots
    pub parent: Option<Entity>,
    /// Head of this entity's child chain
    pub first_child: Option<Entity>,
    /// Next sibling under the same parent
    pub next_sibling: Option<Entity>,
    /// Previous sibling under the same parent
    pub prev_sibling: Option<Entity>,
}

impl HierarchyComponent {
    /// Create an unlinked component that declares a parent
    ///
    /// The construct hook appends the entity to the end of `parent`'s child
    /// chain when the component is attached.
    pub fn with_parent(parent: Option<Entity>) -> Self {
        Self {
            parent,
            ..Default::default()
        }
    }

    /// Whether this entity has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Clear parent and sibling links, keeping the child chain
    pub(crate) fn clear_position(&mut self) {
        self.parent = None;
        self.next_sibling = None;
        self.prev_sibling = None;
    }
}
