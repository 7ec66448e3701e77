//! Checkpoints.
//!
//! A checkpoint becomes current when a live player touches it. The current
//! checkpoint is remembered by name in [`ActiveCheckpoint`], so it survives
//! the level being despawned and rebuilt on reload.

use bevy::math::bounding::{Aabb2d, BoundingCircle, IntersectsVolume};
use bevy::prelude::*;

use crate::config::DrillConfig;
use crate::state::Life;

/// A respawn point in the level.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
#[require(Transform)]
pub struct Checkpoint {
    /// Stable name; matched against [`ActiveCheckpoint`] after a reload.
    pub name: String,
    /// Half size of the trigger box around the checkpoint's translation.
    pub half_extents: Vec2,
    /// This is the current checkpoint. Drives its activate/deactivate animation.
    pub active: bool,
}

impl Checkpoint {
    /// Create an inactive checkpoint.
    pub fn new(name: impl Into<String>, half_extents: Vec2) -> Self {
        Self {
            name: name.into(),
            half_extents,
            active: false,
        }
    }

    /// Check whether a circle overlaps this checkpoint's trigger box.
    pub fn overlaps_circle(&self, center: Vec2, circle_center: Vec2, radius: f32) -> bool {
        Aabb2d::new(center, self.half_extents).intersects(&BoundingCircle::new(circle_center, radius))
    }
}

/// The checkpoint players respawn at.
#[derive(Resource, Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(Resource)]
pub struct ActiveCheckpoint {
    name: Option<String>,
    spawn_position: Option<Vec2>,
}

impl ActiveCheckpoint {
    /// Name of the current checkpoint.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Where players respawn, if a checkpoint was reached.
    pub fn current_spawn_position(&self) -> Option<Vec2> {
        self.spawn_position
    }

    /// Make `name` current. Returns false if it already was.
    pub fn activate(&mut self, name: &str, spawn_position: Vec2) -> bool {
        if self.name() == Some(name) {
            return false;
        }
        self.name = Some(name.to_owned());
        self.spawn_position = Some(spawn_position);
        true
    }

    /// Forget the current checkpoint.
    pub fn clear(&mut self) {
        self.name = None;
        self.spawn_position = None;
    }
}

/// Sent when a checkpoint becomes current.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct CheckpointActivated {
    /// The checkpoint entity.
    pub checkpoint: Entity,
    /// Its name.
    pub name: String,
}

/// Activate checkpoints touched by live players.
pub fn activate_checkpoints(
    q_players: Query<(&Transform, &DrillConfig, &Life)>,
    q_checkpoints: Query<(Entity, &Transform, &Checkpoint)>,
    mut active: ResMut<ActiveCheckpoint>,
    mut activated: EventWriter<CheckpointActivated>,
) {
    for (player_transform, config, life) in &q_players {
        if !life.is_alive() {
            continue;
        }
        let player = player_transform.translation.xy();

        for (entity, transform, checkpoint) in &q_checkpoints {
            let center = transform.translation.xy();
            if active.name() == Some(checkpoint.name.as_str())
                || !checkpoint.overlaps_circle(center, player, config.body_radius)
            {
                continue;
            }
            if active.activate(&checkpoint.name, center) {
                info!("checkpoint {:?} reached", checkpoint.name);
                activated.write(CheckpointActivated {
                    checkpoint: entity,
                    name: checkpoint.name.clone(),
                });
            }
        }
    }
}

/// Mirror [`ActiveCheckpoint`] into each checkpoint's `active` flag.
pub fn sync_checkpoint_flags(
    active: Res<ActiveCheckpoint>,
    mut q_checkpoints: Query<&mut Checkpoint>,
) {
    for mut checkpoint in &mut q_checkpoints {
        let current = active.name() == Some(checkpoint.name.as_str());
        if checkpoint.active != current {
            checkpoint.active = current;
        }
    }
}
