//! Room-by-room camera.
//!
//! The level is cut into a grid of equally sized rooms. The camera sits at
//! the center of the player's room and slides to the next room when the
//! player crosses over, holding the simulation still while it moves.

use bevy::prelude::*;

use crate::config::DrillConfig;
use crate::lifecycle::{ease_out_quad, LevelReloaded, SimulationPhase};

/// Room grid layout.
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Resource)]
pub struct RoomGrid {
    /// Size of one room in world units.
    pub cell_size: Vec2,
    /// World position of the corner of room `(0, 0)`.
    pub offset: Vec2,
    /// Seconds of real time a room transition takes.
    pub transition_duration: f32,
}

impl Default for RoomGrid {
    fn default() -> Self {
        Self {
            cell_size: Vec2::new(24.0, 18.0),
            offset: Vec2::ZERO,
            transition_duration: 0.5,
        }
    }
}

impl RoomGrid {
    /// Room containing a world position.
    pub fn cell_of(&self, world: Vec2) -> IVec2 {
        ((world - self.offset) / self.cell_size).floor().as_ivec2()
    }

    /// World position of a room's center.
    pub fn cell_center(&self, cell: IVec2) -> Vec2 {
        cell.as_vec2() * self.cell_size + self.offset + self.cell_size * 0.5
    }

    /// Builder: set the transition duration.
    pub fn with_transition_duration(mut self, seconds: f32) -> Self {
        self.transition_duration = seconds;
        self
    }
}

/// A camera slide between two room centers.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct RoomTransition {
    /// Where the slide started.
    pub from: Vec2,
    /// Where it ends.
    pub to: Vec2,
    /// Seconds since it started.
    pub elapsed: f32,
}

impl RoomTransition {
    /// Advance by `dt` seconds. Returns the camera position and whether the
    /// slide is done.
    pub fn advance(&mut self, dt: f32, duration: f32) -> (Vec2, bool) {
        self.elapsed += dt.max(0.0);
        if duration <= 0.0 || self.elapsed >= duration {
            return (self.to, true);
        }
        let t = ease_out_quad(self.elapsed / duration);
        (self.from.lerp(self.to, t), false)
    }
}

/// Camera that frames the room its target is in.
#[derive(Component, Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(Component)]
#[require(Transform)]
pub struct RoomCamera {
    /// Entity to follow. Follows the first drill controller when unset.
    pub target: Option<Entity>,
    /// Room currently framed.
    pub cell: IVec2,
    /// Slide in progress.
    pub transition: Option<RoomTransition>,
    placed: bool,
}

impl RoomCamera {
    /// Camera following a specific entity.
    pub fn following(target: Entity) -> Self {
        Self {
            target: Some(target),
            ..default()
        }
    }

    /// Check if a slide is in progress.
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }
}

/// Keep room cameras on their target's room.
pub fn follow_rooms(
    time: Res<Time<Real>>,
    grid: Res<RoomGrid>,
    mut phase: ResMut<SimulationPhase>,
    mut reloaded: EventReader<LevelReloaded>,
    q_targets: Query<&Transform, (With<DrillConfig>, Without<RoomCamera>)>,
    mut q_cameras: Query<(&mut RoomCamera, &mut Transform)>,
) {
    let snap = reloaded.read().count() > 0;
    let dt = time.delta_secs();

    for (mut camera, mut transform) in &mut q_cameras {
        let target = match camera.target {
            Some(entity) => q_targets.get(entity).ok(),
            None => q_targets.iter().next(),
        };
        let Some(target) = target else {
            continue;
        };
        let target_cell = grid.cell_of(target.translation.xy());

        if snap || !camera.placed {
            camera.placed = true;
            camera.cell = target_cell;
            camera.transition = None;
            let center = grid.cell_center(target_cell);
            transform.translation = center.extend(transform.translation.z);
            continue;
        }

        if let Some(mut transition) = camera.transition {
            let (position, done) = transition.advance(dt, grid.transition_duration);
            transform.translation = position.extend(transform.translation.z);
            if done {
                camera.transition = None;
                if *phase == SimulationPhase::Transitioning {
                    *phase = SimulationPhase::Active;
                }
                debug!("camera arrived in room {}", camera.cell);
            } else {
                camera.transition = Some(transition);
            }
            continue;
        }

        if phase.is_active() && target_cell != camera.cell {
            debug!("camera moving from room {} to {}", camera.cell, target_cell);
            camera.transition = Some(RoomTransition {
                from: transform.translation.xy(),
                to: grid.cell_center(target_cell),
                elapsed: 0.0,
            });
            camera.cell = target_cell;
            *phase = SimulationPhase::Transitioning;
        }
    }
}
