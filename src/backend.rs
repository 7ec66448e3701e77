//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the drill controller. The motion logic only needs terrain
//! queries and a body to hand velocities to, so swapping physics engines
//! means providing those two things.

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// A backend contributes a plugin that adds its step system to
/// [`DrillControllerSet::Simulation`](crate::DrillControllerSet::Simulation).
/// That system builds a [`CollisionProbe`](crate::probe::CollisionProbe)
/// over the engine's query pipeline, calls
/// [`drive_controller`](crate::systems::drive_controller) for every live
/// controller and hands the resulting velocity to the body.
///
/// The static functions are used by exclusive systems, such as respawning,
/// that must reset bodies outside the step.
///
/// For an example implementation, see the `rapier` module's `Rapier2dBackend`.
pub trait DrillPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Switch an entity between a kinematic body (drilling) and a dynamic one.
    fn set_kinematic(world: &mut World, entity: Entity, kinematic: bool);
}
