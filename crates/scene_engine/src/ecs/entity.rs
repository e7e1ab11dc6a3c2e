//! Entity implementation

use bitflags::bitflags;

slotmap::new_key_type! {
    /// Entity identifier
    ///
    /// Index plus generation: a handle to a destroyed entity never aliases a
    /// later entity that reuses the same slot.
    pub struct Entity;
}

bitflags! {
    /// Per-entity behavior flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntityFlags: u32 {
        /// Entity never moves after scene load and is indexed by the static octree
        const STATIC = 1 << 0;
    }
}

/// Row data owned by the entity store for every live entity
#[derive(Debug, Clone, Default)]
pub struct EntityRecord {
    /// Human readable tag used in diagnostics
    pub name: String,
    /// Behavior flags
    pub flags: EntityFlags,
}

impl EntityRecord {
    /// Create a record with the given name and no flags
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: EntityFlags::empty(),
        }
    }
}
