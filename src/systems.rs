//! Core controller systems.
//!
//! These systems wire the motion controller into the ECS. They are generic
//! over the physics backend; the backend's own step system calls
//! [`drive_controller`] with a probe over its query pipeline.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::backend::DrillPhysicsBackend;
use crate::checkpoint::ActiveCheckpoint;
use crate::config::DrillConfig;
use crate::effects::{EventSink, MotionEffectEvent};
use crate::intent::MovementIntent;
use crate::lifecycle::{ReloadRequested, SceneReload};
use crate::motion::{step, StepOutcome};
use crate::probe::CollisionProbe;
use crate::state::{Airborne, ConfigFault, Drilling, Grounded, Life, MotionState, SpawnOrigin};

/// Event writers a fixed step reports into.
#[derive(SystemParam)]
pub struct ControllerEvents<'w> {
    effects: EventWriter<'w, MotionEffectEvent>,
    reloads: EventWriter<'w, ReloadRequested>,
}

impl ControllerEvents<'_> {
    /// Send the effects of a step, and a reload request if it was fatal.
    pub fn report(&mut self, entity: Entity, outcome: &StepOutcome) {
        outcome.emit_into(&mut EventSink::new(entity, &mut self.effects));
        if outcome.died {
            self.reloads.write(ReloadRequested { source: entity });
        }
    }
}

/// Seconds covered by one fixed step.
///
/// Falls back to the configured timestep before the fixed clock has ticked,
/// which is the case when the schedule is run by hand.
pub fn fixed_step_seconds(time: &Time<Fixed>) -> f32 {
    let delta = time.delta_secs();
    if delta > 0.0 {
        delta
    } else {
        time.timestep().as_secs_f32()
    }
}

/// Run one fixed step for a controller.
///
/// Refreshes the position from the body, samples the intent, steps the
/// motion state and reports the effects. A fatal step marks the controller
/// [`Life::Dead`]. Returns the outcome so the caller can hand the velocity
/// to the body.
#[allow(clippy::too_many_arguments)]
pub fn drive_controller<P: CollisionProbe>(
    entity: Entity,
    position: Vec2,
    config: &DrillConfig,
    state: &mut MotionState,
    intent: &mut MovementIntent,
    life: &mut Life,
    probe: &P,
    dt: f32,
    events: &mut ControllerEvents,
) -> StepOutcome {
    state.position = position;
    let input = intent.sample();
    let outcome = step(state, &input, probe, config, dt);

    if outcome.state.drilling != state.drilling {
        if outcome.state.drilling {
            debug!("{entity} started drilling at {position}");
        } else {
            debug!("{entity} stopped drilling at {position}");
        }
    }

    *state = outcome.state;
    intent.clear_jump_request();
    events.report(entity, &outcome);

    if outcome.died {
        *life = Life::Dead;
        info!("{entity} fell into lava at {position}");
    }

    outcome
}

/// Validate and place newly spawned controllers.
///
/// Controllers with an invalid config get [`ConfigFault`] and are never
/// stepped. Valid ones start at the current checkpoint, or where they were
/// spawned if none was reached yet.
pub fn initialize_controllers(
    mut commands: Commands,
    checkpoint: Res<ActiveCheckpoint>,
    mut q_new: Query<
        (Entity, &DrillConfig, &mut Transform, &mut MotionState),
        Added<DrillConfig>,
    >,
) {
    for (entity, config, mut transform, mut state) in &mut q_new {
        if let Err(error) = config.validate() {
            error!("{entity} has an invalid drill config: {error}");
            commands.entity(entity).insert(ConfigFault);
            continue;
        }

        let origin = transform.translation.xy();
        let spawn = checkpoint.current_spawn_position().unwrap_or(origin);
        if spawn != origin {
            transform.translation = spawn.extend(transform.translation.z);
        }
        *state = MotionState::spawn_at(spawn);

        commands.entity(entity).insert(SpawnOrigin(origin));
        debug!("{entity} spawned at {spawn}");
    }
}

/// Sync marker components with the motion state.
pub fn sync_state_markers(
    mut commands: Commands,
    q: Query<(
        Entity,
        &MotionState,
        Has<Grounded>,
        Has<Airborne>,
        Has<Drilling>,
    )>,
) {
    for (entity, state, has_grounded, has_airborne, has_drilling) in &q {
        if state.grounded && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !state.grounded && !has_airborne {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }

        if state.drilling && !has_drilling {
            commands.entity(entity).insert(Drilling);
        } else if !state.drilling && has_drilling {
            commands.entity(entity).remove::<Drilling>();
        }
    }
}

/// Put every controller back at its spawn point after the level was rebuilt.
///
/// Runs once per reload, on the edge where the sweep has fully covered the
/// screen.
pub fn respawn_players<B: DrillPhysicsBackend>(world: &mut World) {
    let Some(mut reload) = world.get_resource_mut::<SceneReload>() else {
        return;
    };
    if !reload.take_respawn() {
        return;
    }

    let checkpoint = world
        .get_resource::<ActiveCheckpoint>()
        .and_then(ActiveCheckpoint::current_spawn_position);

    let players: Vec<(Entity, Vec2)> = world
        .query_filtered::<(Entity, &Transform, Option<&SpawnOrigin>), With<DrillConfig>>()
        .iter(world)
        .map(|(entity, transform, origin)| {
            let fallback = origin.map_or(transform.translation.xy(), |origin| origin.0);
            (entity, checkpoint.unwrap_or(fallback))
        })
        .collect();

    for &(entity, spawn) in &players {
        {
            let Ok(mut player) = world.get_entity_mut(entity) else {
                continue;
            };
            if let Some(mut transform) = player.get_mut::<Transform>() {
                transform.translation = spawn.extend(transform.translation.z);
            }
            if let Some(mut state) = player.get_mut::<MotionState>() {
                *state = MotionState::spawn_at(spawn);
            }
            if let Some(mut intent) = player.get_mut::<MovementIntent>() {
                intent.clear();
            }
            if let Some(mut life) = player.get_mut::<Life>() {
                *life = Life::Alive;
            }
        }

        B::set_velocity(world, entity, Vec2::ZERO);
        B::set_kinematic(world, entity, false);
    }

    info!("respawned {} player(s)", players.len());
}
