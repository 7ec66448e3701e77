//! Collision probe contract and terrain layer configuration.
//!
//! The motion controller never talks to a physics engine directly. It asks a
//! [`CollisionProbe`] for circle casts and overlaps against named terrain
//! layers, and the physics backend answers them.

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::config::ConfigError;

/// Terrain layers the controller distinguishes.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionLayer {
    /// Solid terrain: floors, ceilings and anything drillable.
    Ground,
    /// Bounce-capable terrain that reflects the player instead of letting it drill in.
    Bounce,
    /// Hazard terrain; touching it ends the current life.
    Lava,
}

/// Synchronous collision queries against the terrain.
///
/// Implementations must answer within the calling tick.
pub trait CollisionProbe {
    /// Sweep a circle from `center` along `direction` for up to `max_distance`
    /// and return the nearest hit on `layer`.
    ///
    /// A circle that already overlaps the layer at `center` reports a hit at
    /// distance zero.
    fn circle_cast(
        &self,
        center: Vec2,
        radius: f32,
        direction: Vec2,
        max_distance: f32,
        layer: CollisionLayer,
    ) -> Option<CollisionData>;

    /// Check whether a circle at `center` overlaps anything on `layer`.
    fn overlaps_circle(&self, center: Vec2, radius: f32, layer: CollisionLayer) -> bool;
}

/// Collision group bitmasks for each terrain layer.
///
/// Colliders whose memberships intersect a mask are considered part of that
/// layer. A bounce surface is usually also a member of the ground layer, so
/// that it blocks movement and gets reported by ground casts.
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Resource)]
pub struct TerrainLayers {
    /// Membership bits of solid terrain.
    pub ground: u32,
    /// Membership bits of bounce-capable terrain.
    pub bounce: u32,
    /// Membership bits of lava.
    pub lava: u32,
}

impl Default for TerrainLayers {
    fn default() -> Self {
        Self {
            ground: 1 << 0,
            bounce: 1 << 1,
            lava: 1 << 2,
        }
    }
}

impl TerrainLayers {
    /// Create a layer configuration from raw bitmasks.
    pub fn new(ground: u32, bounce: u32, lava: u32) -> Self {
        Self {
            ground,
            bounce,
            lava,
        }
    }

    /// Get the bitmask for a layer.
    pub fn mask(&self, layer: CollisionLayer) -> u32 {
        match layer {
            CollisionLayer::Ground => self.ground,
            CollisionLayer::Bounce => self.bounce,
            CollisionLayer::Lava => self.lava,
        }
    }

    /// Check that every layer selects at least one collision group.
    ///
    /// The controller cannot run with an undefined terrain, bounce or lava layer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for layer in [
            CollisionLayer::Ground,
            CollisionLayer::Bounce,
            CollisionLayer::Lava,
        ] {
            if self.mask(layer) == 0 {
                return Err(ConfigError::EmptyLayer(layer));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layers_are_distinct_and_valid() {
        let layers = TerrainLayers::default();
        assert!(layers.validate().is_ok());
        assert_eq!(layers.ground & layers.bounce, 0);
        assert_eq!(layers.ground & layers.lava, 0);
    }

    #[test]
    fn mask_selects_layer() {
        let layers = TerrainLayers::new(0b001, 0b010, 0b100);
        assert_eq!(layers.mask(CollisionLayer::Ground), 0b001);
        assert_eq!(layers.mask(CollisionLayer::Bounce), 0b010);
        assert_eq!(layers.mask(CollisionLayer::Lava), 0b100);
    }

    #[test]
    fn empty_layer_is_a_config_fault() {
        let layers = TerrainLayers::new(0b001, 0, 0b100);
        assert_eq!(
            layers.validate(),
            Err(ConfigError::EmptyLayer(CollisionLayer::Bounce))
        );
    }
}
