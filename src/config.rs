//! Controller configuration.
//!
//! This module defines the tuning constants of the drill controller and the
//! configuration faults that stop a controller from running.

use bevy::prelude::*;
use thiserror::Error;

use crate::intent::MovementIntent;
use crate::presentation::MotionPresentation;
use crate::probe::CollisionLayer;
use crate::state::{Life, MotionState};

/// Configuration fault detected at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// A terrain layer has no collision groups selected.
    #[error("the {0:?} layer has an empty collision mask")]
    EmptyLayer(CollisionLayer),
    /// A parameter that must be strictly positive is not.
    #[error("`{field}` must be positive and finite, got {value}")]
    NonPositive {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// A parameter that must not be negative is.
    #[error("`{field}` must not be negative, got {value}")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// The probe radius fraction lies outside `(0, 1]`.
    #[error("`cast_radius_fraction` must lie in (0, 1], got {0}")]
    CastFraction(f32),
    /// The surface alignment threshold lies outside `[0, 1)`.
    #[error("`surface_alignment` must lie in [0, 1), got {0}")]
    SurfaceAlignment(f32),
}

/// Tuning parameters for the drill controller.
///
/// Distances are in world units, speeds in world units per second. All
/// height-to-speed conversions go through [`DrillConfig::velocity_from_height`].
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[require(Transform, MotionState, MovementIntent, Life, MotionPresentation)]
pub struct DrillConfig {
    // === Movement Settings ===
    /// Horizontal speed at full input.
    pub move_speed: f32,

    /// Fraction of `move_speed` gained per second while airborne.
    pub air_control: f32,

    /// Height reached by a jump.
    pub jump_height: f32,

    // === Gravity Settings ===
    /// Downward acceleration.
    pub gravity: f32,

    /// Terminal falling speed.
    pub max_fall_speed: f32,

    /// Downward speed held while resting on ground so the probe keeps hitting.
    pub grounding_force: f32,

    // === Probe Settings ===
    /// Radius of the player's circle collider.
    pub body_radius: f32,

    /// Probe circle radius as a fraction of `body_radius`.
    ///
    /// Lava overlaps use `body_radius / cast_radius_fraction` instead, so
    /// hazards are felt slightly before the body touches them.
    pub cast_radius_fraction: f32,

    /// Length of the up/down contact probes while not drilling.
    pub grounded_distance: f32,

    /// Minimum `normal · up` (or `normal · down`) for a surface to count as
    /// a floor (or ceiling).
    pub surface_alignment: f32,

    // === Drill Settings ===
    /// Fall depth needed to drill into a floor.
    pub dig_down_threshold: f32,

    /// Maximum rise height at which a ceiling can still be drilled into.
    pub dig_up_threshold: f32,

    /// Tunneling speed.
    pub drill_speed: f32,

    /// Height the player is launched to when a drill breaks out of terrain.
    pub drill_exit_height: f32,

    /// Height lost by a floor bounce compared to the fall depth.
    pub bounce_height_loss: f32,

    // === Presentation Settings ===
    /// Horizontal speed above which the player counts as walking.
    pub walk_speed_threshold: f32,

    /// Fall depth after which the sprite starts turning towards its velocity.
    pub drill_rotation_height: f32,

    /// Seconds the fall rotation takes to fully align with the velocity.
    pub drill_rotation_duration: f32,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            // Movement settings
            move_speed: 3.0,
            air_control: 0.2,
            jump_height: 3.0,

            // Gravity settings
            gravity: 10.0,
            max_fall_speed: 6.0,
            grounding_force: 0.2,

            // Probe settings
            body_radius: 0.5,
            cast_radius_fraction: 0.9,
            grounded_distance: 0.05,
            surface_alignment: 0.9,

            // Drill settings
            dig_down_threshold: 2.0,
            dig_up_threshold: 1.0,
            drill_speed: 4.0,
            drill_exit_height: 2.0,
            bounce_height_loss: 1.0,

            // Presentation settings
            walk_speed_threshold: 0.1,
            drill_rotation_height: 1.5,
            drill_rotation_duration: 0.25,
        }
    }
}

impl DrillConfig {
    /// Convert a height into the launch speed that reaches it.
    ///
    /// `v = sqrt(2 * height * gravity)`. Negative heights yield zero.
    #[inline]
    pub fn velocity_from_height(&self, height: f32) -> f32 {
        (2.0 * height.max(0.0) * self.gravity).sqrt()
    }

    /// Jump launch speed.
    #[inline]
    pub fn jump_velocity(&self) -> f32 {
        self.velocity_from_height(self.jump_height)
    }

    /// Speed a drill leaves terrain with.
    #[inline]
    pub fn drill_exit_velocity(&self) -> f32 {
        self.velocity_from_height(self.drill_exit_height)
    }

    /// Radius of the circle used for terrain probes.
    #[inline]
    pub fn cast_radius(&self) -> f32 {
        self.body_radius * self.cast_radius_fraction
    }

    /// Radius of the circle used for lava overlaps.
    #[inline]
    pub fn lava_radius(&self) -> f32 {
        self.body_radius / self.cast_radius_fraction
    }

    /// Create a config for a snappier, heavier character.
    pub fn heavy() -> Self {
        Self {
            gravity: 14.0,
            max_fall_speed: 8.0,
            air_control: 0.3,
            ..default()
        }
    }

    /// Builder: set movement speed.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Builder: set air control.
    pub fn with_air_control(mut self, air_control: f32) -> Self {
        self.air_control = air_control;
        self
    }

    /// Builder: set jump height.
    pub fn with_jump_height(mut self, height: f32) -> Self {
        self.jump_height = height;
        self
    }

    /// Builder: set gravity and terminal fall speed.
    pub fn with_gravity(mut self, gravity: f32, max_fall_speed: f32) -> Self {
        self.gravity = gravity;
        self.max_fall_speed = max_fall_speed;
        self
    }

    /// Builder: set the drill entry thresholds.
    pub fn with_dig_thresholds(mut self, down: f32, up: f32) -> Self {
        self.dig_down_threshold = down;
        self.dig_up_threshold = up;
        self
    }

    /// Builder: set drill speed.
    pub fn with_drill_speed(mut self, speed: f32) -> Self {
        self.drill_speed = speed;
        self
    }

    /// Builder: set drill exit height.
    pub fn with_drill_exit_height(mut self, height: f32) -> Self {
        self.drill_exit_height = height;
        self
    }

    /// Builder: set the body radius.
    pub fn with_body_radius(mut self, radius: f32) -> Self {
        self.body_radius = radius;
        self
    }

    /// Check that the parameters describe a controller that can run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("move_speed", self.move_speed),
            ("gravity", self.gravity),
            ("max_fall_speed", self.max_fall_speed),
            ("body_radius", self.body_radius),
            ("drill_speed", self.drill_speed),
            ("drill_rotation_duration", self.drill_rotation_duration),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        let non_negative = [
            ("air_control", self.air_control),
            ("jump_height", self.jump_height),
            ("grounding_force", self.grounding_force),
            ("grounded_distance", self.grounded_distance),
            ("dig_down_threshold", self.dig_down_threshold),
            ("dig_up_threshold", self.dig_up_threshold),
            ("drill_exit_height", self.drill_exit_height),
            ("bounce_height_loss", self.bounce_height_loss),
            ("walk_speed_threshold", self.walk_speed_threshold),
            ("drill_rotation_height", self.drill_rotation_height),
        ];
        for (field, value) in non_negative {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if !(self.cast_radius_fraction > 0.0 && self.cast_radius_fraction <= 1.0) {
            return Err(ConfigError::CastFraction(self.cast_radius_fraction));
        }
        if !(0.0..1.0).contains(&self.surface_alignment) {
            return Err(ConfigError::SurfaceAlignment(self.surface_alignment));
        }

        Ok(())
    }
}
