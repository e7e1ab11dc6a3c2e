//! Transform component for the ECS system
//!
//! Local position/rotation/scale are authored values; the world matrix is a
//! cache owned by the scene graph's update pass and only valid while the
//! component is clean.

use crate::foundation::math::{utils, Mat4, Vec3};

/// ECS Transform component
///
/// Rotation is stored as Euler angles in degrees (applied X, then Y, then Z).
/// Every setter marks the component dirty; the world matrix is recomputed by
/// [`SceneGraph::update`](crate::scene::SceneGraph::update).
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    local_position: Vec3,
    local_rotation: Vec3,
    local_scale: Vec3,
    world_matrix: Mat4,
    dirty: bool,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            local_position: Vec3::zeros(),
            local_rotation: Vec3::zeros(),
            local_scale: Vec3::new(1.0, 1.0, 1.0),
            world_matrix: Mat4::identity(),
            dirty: true,
        }
    }
}

impl TransformComponent {
    /// Create identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from position only
    pub fn from_position(position: Vec3) -> Self {
        Self {
            local_position: position,
            ..Default::default()
        }
    }

    /// Create from full transform specification (rotation in degrees)
    pub fn from_transform(position: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Self {
        Self {
            local_position: position,
            local_rotation: rotation_degrees,
            local_scale: scale,
            ..Default::default()
        }
    }

    /// Local position relative to the parent
    pub fn local_position(&self) -> Vec3 {
        self.local_position
    }

    /// Local rotation as Euler angles in degrees
    pub fn local_rotation(&self) -> Vec3 {
        self.local_rotation
    }

    /// Local scale factors
    pub fn local_scale(&self) -> Vec3 {
        self.local_scale
    }

    /// Set local position
    pub fn set_local_position(&mut self, position: Vec3) {
        self.local_position = position;
        self.dirty = true;
    }

    /// Set local rotation (Euler degrees)
    pub fn set_local_rotation(&mut self, rotation_degrees: Vec3) {
        self.local_rotation = rotation_degrees;
        self.dirty = true;
    }

    /// Set local scale
    pub fn set_local_scale(&mut self, scale: Vec3) {
        self.local_scale = scale;
        self.dirty = true;
    }

    /// Builder pattern: Set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_local_position(position);
        self
    }

    /// Builder pattern: Set rotation (Euler degrees)
    pub fn with_rotation(mut self, rotation_degrees: Vec3) -> Self {
        self.set_local_rotation(rotation_degrees);
        self
    }

    /// Builder pattern: Set scale (non-uniform)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.set_local_scale(scale);
        self
    }

    /// Flag the world matrix as stale
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the cached world matrix is stale
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Local TRS matrix
    pub fn local_matrix(&self) -> Mat4 {
        utils::compose_trs(self.local_position, self.local_rotation, self.local_scale)
    }

    /// Cached world matrix
    ///
    /// Only meaningful when [`is_dirty`](Self::is_dirty) is false.
    pub fn world_transform(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// Translation part of the cached world matrix
    pub fn world_position(&self) -> Vec3 {
        utils::translation_of(&self.world_matrix)
    }

    /// Recompute the world matrix from the parent's and clear the dirty flag
    pub(crate) fn recompute_world(&mut self, parent_world: &Mat4) {
        self.world_matrix = parent_world * self.local_matrix();
        self.dirty = false;
    }
}
