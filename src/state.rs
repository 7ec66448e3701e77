//! Controller state.
//!
//! [`MotionState`] is the kinematic state owned by the motion controller. The
//! marker components mirror it for queries and are synced by the controller
//! systems.

use bevy::prelude::*;

/// Kinematic state of a drill controller.
///
/// Mutated once per fixed step by the controller. Presentation systems may
/// read it between steps and only ever touch [`MotionState::fall_time`].
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct MotionState {
    /// World position, refreshed from the body before each step.
    pub position: Vec2,
    /// Velocity handed to the body after each step.
    pub velocity: Vec2,
    /// The latest ground probe hit terrain.
    pub grounded: bool,
    /// Tunneling through terrain; the body is kinematic.
    pub drilling: bool,
    /// Lowest height since the last time the player was grounded.
    pub min_air_height: f32,
    /// Highest height since the last time the player was grounded.
    pub max_air_height: f32,
    /// Normalized progress of the cosmetic fall rotation.
    pub fall_time: f32,
    /// Footstep loop state.
    pub walking: bool,
}

impl Default for MotionState {
    fn default() -> Self {
        Self::spawn_at(Vec2::ZERO)
    }
}

impl MotionState {
    /// Fresh state for a player spawned at `position`.
    ///
    /// The player is assumed grounded and both air-height extrema equal the
    /// spawn height.
    pub fn spawn_at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            grounded: true,
            drilling: false,
            min_air_height: position.y,
            max_air_height: position.y,
            fall_time: 0.0,
            walking: false,
        }
    }

    /// Distance fallen from the highest point since last grounded.
    #[inline]
    pub fn fall_depth(&self) -> f32 {
        self.max_air_height - self.position.y
    }

    /// Distance risen from the lowest point since last grounded.
    #[inline]
    pub fn rise_height(&self) -> f32 {
        self.position.y - self.min_air_height
    }

    /// Collapse both air-height extrema onto the current height.
    #[inline]
    pub fn reset_air_height(&mut self) {
        self.min_air_height = self.position.y;
        self.max_air_height = self.position.y;
    }

    /// Track the air-height extrema after a step.
    ///
    /// Grounded players reset them, airborne players widen them.
    pub fn track_air_height(&mut self) {
        if self.grounded {
            self.reset_air_height();
        } else {
            self.min_air_height = self.min_air_height.min(self.position.y);
            self.max_air_height = self.max_air_height.max(self.position.y);
        }
    }

    /// Check if the player is airborne.
    #[inline]
    pub fn is_airborne(&self) -> bool {
        !self.grounded
    }
}

/// Whether a controller entity is on its current life.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[reflect(Component)]
pub enum Life {
    /// Stepped every fixed tick.
    #[default]
    Alive,
    /// Died this life; never stepped until respawned.
    Dead,
}

impl Life {
    /// Check if the entity is alive.
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Alive)
    }
}

/// Marker placed on controllers whose [`DrillConfig`](crate::config::DrillConfig)
/// failed validation. They are never stepped.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ConfigFault;

/// Marker component indicating the character is grounded.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the character is in drill mode.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Drilling;

/// Where a controller entity was placed before any checkpoint was reached.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct SpawnOrigin(pub Vec2);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_state() {
        let state = MotionState::spawn_at(Vec2::new(2.0, 5.0));
        assert!(state.grounded);
        assert!(!state.drilling);
        assert_eq!(state.velocity, Vec2::ZERO);
        assert_eq!(state.min_air_height, 5.0);
        assert_eq!(state.max_air_height, 5.0);
    }

    #[test]
    fn air_height_expands_while_airborne() {
        let mut state = MotionState::spawn_at(Vec2::new(0.0, 5.0));
        state.grounded = false;

        state.position.y = 7.0;
        state.track_air_height();
        state.position.y = 3.0;
        state.track_air_height();

        assert_eq!(state.max_air_height, 7.0);
        assert_eq!(state.min_air_height, 3.0);
        assert_eq!(state.fall_depth(), 4.0);
        assert_eq!(state.rise_height(), 0.0);
    }

    #[test]
    fn air_height_resets_when_grounded() {
        let mut state = MotionState::spawn_at(Vec2::new(0.0, 5.0));
        state.grounded = false;
        state.position.y = 9.0;
        state.track_air_height();

        state.grounded = true;
        state.position.y = 1.0;
        state.track_air_height();

        assert_eq!(state.min_air_height, 1.0);
        assert_eq!(state.max_air_height, 1.0);
    }

    #[test]
    fn life_defaults_to_alive() {
        assert!(Life::default().is_alive());
        assert!(!Life::Dead.is_alive());
    }
}
