//! Probe hit data.
//!
//! These structures hold the results of the circle casts the motion
//! controller issues against terrain layers.

use bevy::prelude::*;

/// Information about a circle-cast hit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance travelled along the cast direction before the hit.
    pub distance: f32,
    /// Normal of the surface at hit point (points away from the surface).
    pub normal: Vec2,
    /// World position of the hit point.
    pub point: Vec2,
    /// Entity that was hit (if known).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec2, point: Vec2, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }

    /// Check whether the hit surface faces `direction` closely enough.
    ///
    /// `alignment` is compared against the dot product of the surface normal
    /// and `direction`, so a zero normal never qualifies.
    #[inline]
    pub fn faces(&self, direction: Vec2, alignment: f32) -> bool {
        self.normal.dot(direction) > alignment
    }

    /// Check whether the hit surface is a floor (faces world up).
    #[inline]
    pub fn faces_up(&self, alignment: f32) -> bool {
        self.faces(Vec2::Y, alignment)
    }

    /// Check whether the hit surface is a ceiling (faces world down).
    #[inline]
    pub fn faces_down(&self, alignment: f32) -> bool {
        self.faces(Vec2::NEG_Y, alignment)
    }
}
