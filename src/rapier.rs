//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::DrillPhysicsBackend;
use crate::collision::CollisionData;
use crate::config::DrillConfig;
use crate::intent::MovementIntent;
use crate::probe::{CollisionLayer, CollisionProbe, TerrainLayers};
use crate::state::{ConfigFault, Life, MotionState};
use crate::systems::{drive_controller, fixed_step_seconds, ControllerEvents};
use crate::DrillControllerSet;

/// Rapier2D physics backend for the drill controller.
///
/// Terrain queries go through Rapier's query pipeline; the controller hands
/// its velocity to the body's [`Velocity`]. The body is dynamic while
/// walking and kinematic while drilling, so it can pass through terrain.
pub struct Rapier2dBackend;

impl DrillPhysicsBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn set_kinematic(world: &mut World, entity: Entity, kinematic: bool) {
        if let Some(mut body) = world.get_mut::<RigidBody>(entity) {
            body.set_if_neq(body_for(kinematic));
        }
    }
}

/// Plugin that sets up Rapier2D-specific systems for the drill controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        // Keep the step ahead of Rapier when it is moved into the fixed schedule
        app.configure_sets(
            FixedUpdate,
            DrillControllerSet::Simulation.before(PhysicsSet::SyncBackend),
        );

        app.add_systems(
            FixedUpdate,
            rapier_step_controllers.in_set(DrillControllerSet::Simulation),
        );
    }
}

fn body_for(kinematic: bool) -> RigidBody {
    if kinematic {
        RigidBody::KinematicVelocityBased
    } else {
        RigidBody::Dynamic
    }
}

/// Terrain queries for one controller against a Rapier context.
pub struct RapierProbe<'a> {
    context: &'a RapierContext<'a>,
    layers: &'a TerrainLayers,
    exclude: Entity,
}

impl<'a> RapierProbe<'a> {
    /// Create a probe that ignores the controller's own body.
    pub fn new(context: &'a RapierContext<'a>, layers: &'a TerrainLayers, exclude: Entity) -> Self {
        Self {
            context,
            layers,
            exclude,
        }
    }

    fn groups(&self, layer: CollisionLayer) -> CollisionGroups {
        CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(self.layers.mask(layer)),
        )
    }
}

impl CollisionProbe for RapierProbe<'_> {
    fn circle_cast(
        &self,
        center: Vec2,
        radius: f32,
        direction: Vec2,
        max_distance: f32,
        layer: CollisionLayer,
    ) -> Option<CollisionData> {
        let filter = QueryFilter::default()
            .exclude_rigid_body(self.exclude)
            .exclude_sensors()
            .groups(self.groups(layer));

        self.context
            .cast_shape(
                center,
                0.0,
                direction,
                &Collider::ball(radius),
                ShapeCastOptions {
                    max_time_of_impact: max_distance,
                    stop_at_penetration: true,
                    ..default()
                },
                filter,
            )
            .map(|(hit_entity, hit)| {
                // Extract normal from hit details or use default
                let normal = hit.details.map(|d| d.normal1).unwrap_or(-direction);
                let hit_point = center + direction * hit.time_of_impact;
                CollisionData::new(hit.time_of_impact, normal, hit_point, Some(hit_entity))
            })
    }

    fn overlaps_circle(&self, center: Vec2, radius: f32, layer: CollisionLayer) -> bool {
        // Lava is usually a sensor, so sensors are not excluded here
        let filter = QueryFilter::default()
            .exclude_rigid_body(self.exclude)
            .groups(self.groups(layer));

        self.context
            .query_pipeline
            .intersection_with_shape(
                self.context.colliders,
                self.context.rigidbody_set,
                center,
                0.0,
                &Collider::ball(radius),
                filter,
            )
            .is_some()
    }
}

/// Step every live controller against the Rapier world.
#[allow(clippy::type_complexity)]
fn rapier_step_controllers(
    rapier_context: ReadRapierContext,
    layers: Res<TerrainLayers>,
    time: Res<Time<Fixed>>,
    mut events: ControllerEvents,
    mut q_controllers: Query<
        (
            Entity,
            &GlobalTransform,
            &DrillConfig,
            &mut MotionState,
            &mut MovementIntent,
            &mut Life,
            &mut Velocity,
            &mut RigidBody,
        ),
        Without<ConfigFault>,
    >,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };
    let dt = fixed_step_seconds(&time);

    for (entity, transform, config, mut state, mut intent, mut life, mut velocity, mut body) in
        &mut q_controllers
    {
        if !life.is_alive() {
            continue;
        }

        let probe = RapierProbe::new(&context, &layers, entity);
        let outcome = drive_controller(
            entity,
            transform.translation().xy(),
            config,
            &mut state,
            &mut intent,
            &mut life,
            &probe,
            dt,
            &mut events,
        );

        velocity.linvel = if outcome.died {
            Vec2::ZERO
        } else {
            outcome.state.velocity
        };
        body.set_if_neq(body_for(outcome.state.drilling));
    }
}

/// Bundle containing the Rapier2D components a drill controller needs.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use drill_character_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     let config = DrillConfig::default();
///     commands.spawn((
///         Transform::from_xyz(2.0, 4.0, 0.0),
///         config,
///         Rapier2dDrillerBundle::for_config(&config),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`], switched to kinematic while drilling
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`]; the sprite turns, the body doesn't
/// - `gravity_scale`: zero, since the controller integrates its own gravity
/// - `collider`: a ball of the config's body radius
#[derive(Bundle)]
pub struct Rapier2dDrillerBundle {
    /// The rigid body type.
    pub rigid_body: RigidBody,
    /// Linear velocity, written by the controller every fixed step.
    pub velocity: Velocity,
    /// Which axes are locked.
    pub locked_axes: LockedAxes,
    /// Rapier's own gravity scale.
    pub gravity_scale: GravityScale,
    /// Collision shape.
    pub collider: Collider,
}

impl Default for Rapier2dDrillerBundle {
    fn default() -> Self {
        Self::for_config(&DrillConfig::default())
    }
}

impl Rapier2dDrillerBundle {
    /// Create a bundle sized for a config.
    pub fn for_config(config: &DrillConfig) -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::zero(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            gravity_scale: GravityScale(0.0),
            collider: Collider::ball(config.body_radius),
        }
    }

    /// Put the body in collision groups.
    ///
    /// Returns the bundle together with the [`CollisionGroups`] component.
    pub fn with_groups(self, memberships: u32, filters: u32) -> (Self, CollisionGroups) {
        (
            self,
            CollisionGroups::new(
                Group::from_bits_truncate(memberships),
                Group::from_bits_truncate(filters),
            ),
        )
    }
}
