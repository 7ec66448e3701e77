//! Presentation state derived from motion.
//!
//! Nothing here feeds back into physics. A game reads [`MotionPresentation`]
//! to pick sprite animations, orient the sprite and run the drill loop.

use bevy::prelude::*;

use crate::config::DrillConfig;
use crate::state::{Life, MotionState};

/// Animation the player sprite should play.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AnimationClip {
    /// Standing still on the ground.
    #[default]
    Idle,
    /// Walking right.
    WalkRight,
    /// Walking left.
    WalkLeft,
    /// In the air.
    Jump,
    /// Drilling.
    Drill,
}

/// Presentation state of a controller entity, refreshed every frame.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct MotionPresentation {
    /// Animation to play.
    pub clip: AnimationClip,
    /// Up direction of the sprite.
    pub sprite_up: Vec2,
    /// Drill particles and sound should be running.
    pub drill_loop: bool,
    /// The sprite is shown. Hidden after death.
    pub visible: bool,
}

impl Default for MotionPresentation {
    fn default() -> Self {
        Self {
            clip: AnimationClip::Idle,
            sprite_up: Vec2::Y,
            drill_loop: false,
            visible: true,
        }
    }
}

/// Pick the animation clip for a motion state.
pub fn animation_clip(state: &MotionState, walk_threshold: f32) -> AnimationClip {
    if state.drilling {
        AnimationClip::Drill
    } else if !state.grounded {
        AnimationClip::Jump
    } else if state.velocity.x > walk_threshold {
        AnimationClip::WalkRight
    } else if state.velocity.x < -walk_threshold {
        AnimationClip::WalkLeft
    } else {
        AnimationClip::Idle
    }
}

/// Rotate `from` towards `to` by fraction `t` along the shorter arc.
///
/// `t` is clamped to `[0, 1]`. Zero vectors are treated as pointing along +X.
pub fn lerp_direction(from: Vec2, to: Vec2, t: f32) -> Vec2 {
    let start = Rot2::radians(from.to_angle());
    let end = Rot2::radians(to.to_angle());
    start.slerp(end, t.clamp(0.0, 1.0)) * Vec2::X
}

/// Advance the sprite orientation by `dt` seconds.
///
/// Returns the new sprite up vector and writes the fall rotation progress
/// into `state.fall_time`.
pub fn sprite_orientation(state: &mut MotionState, config: &DrillConfig, dt: f32) -> Vec2 {
    let heading = state.velocity.normalize_or(Vec2::Y);
    if state.drilling {
        return heading;
    }
    if !state.grounded && state.fall_depth() >= config.drill_rotation_height {
        state.fall_time += dt / config.drill_rotation_duration;
        lerp_direction(Vec2::Y, heading, state.fall_time.clamp(0.0, 1.0))
    } else {
        state.fall_time = 0.0;
        Vec2::Y
    }
}

/// Refresh [`MotionPresentation`] for every controller.
pub fn update_presentation(
    time: Res<Time>,
    mut q_players: Query<(
        &DrillConfig,
        &Life,
        &mut MotionState,
        &mut MotionPresentation,
    )>,
) {
    let dt = time.delta_secs();
    for (config, life, mut state, mut presentation) in &mut q_players {
        let clip = animation_clip(&state, config.walk_speed_threshold);

        // Skip change detection on MotionState when nothing cosmetic moves
        let mut scratch = *state;
        let sprite_up = sprite_orientation(&mut scratch, config, dt);
        if scratch.fall_time != state.fall_time {
            state.fall_time = scratch.fall_time;
        }

        let drill_loop = life.is_alive() && state.drilling && state.grounded;
        if drill_loop != presentation.drill_loop {
            debug!("drill loop {}", if drill_loop { "started" } else { "stopped" });
        }

        presentation.set_if_neq(MotionPresentation {
            clip,
            sprite_up,
            drill_loop,
            visible: life.is_alive(),
        });
    }
}
