//! The motion controller.
//!
//! [`step`] advances a [`MotionState`] by one fixed tick. It is a pure
//! function of the previous state, the sampled input, the terrain as seen
//! through a [`CollisionProbe`] and the config: it returns the next state
//! together with the effects it emitted, and never touches the ECS.
//!
//! Each tick runs exactly one of two branches:
//!
//! - **Grounded movement** (not drilling): probe up and down for contact,
//!   possibly bouncing or starting a drill, then walk, jump and fall.
//! - **Drill movement** (drilling): probe along the velocity, handling drill
//!   exits, bounces and leaving the terrain, then tunnel or fall.

use bevy::prelude::*;

use crate::config::DrillConfig;
use crate::effects::{EffectSink, MotionEffect};
use crate::intent::FrameInput;
use crate::probe::{CollisionLayer, CollisionProbe};
use crate::state::MotionState;

/// Which branch integrated the vertical motion of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionBranch {
    /// Grounded movement ran.
    Grounded,
    /// Drill movement ran.
    Drill,
    /// Nothing ran (zero elapsed time).
    Idle,
}

/// Result of one [`step`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// The state after the step.
    pub state: MotionState,
    /// Effects emitted during the step, in order.
    pub effects: Vec<MotionEffect>,
    /// The branch that integrated vertical motion.
    pub branch: MotionBranch,
    /// The player touched lava; the current life is over.
    pub died: bool,
}

impl StepOutcome {
    fn idle(state: MotionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
            branch: MotionBranch::Idle,
            died: false,
        }
    }

    /// Replay the emitted effects into a sink.
    pub fn emit_into(&self, sink: &mut impl EffectSink) {
        for effect in &self.effects {
            sink.emit(*effect);
        }
    }
}

/// Result of a collision check: the next state and the effects it emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionCheck {
    /// The state after the check.
    pub state: MotionState,
    /// Effects emitted by the check.
    pub effects: Vec<MotionEffect>,
}

/// Advance `state` by one fixed step of `dt` seconds.
///
/// A non-positive `dt` is a paused clock: the state is returned unchanged.
pub fn step<P: CollisionProbe>(
    state: &MotionState,
    input: &FrameInput,
    probe: &P,
    config: &DrillConfig,
    dt: f32,
) -> StepOutcome {
    if dt <= 0.0 {
        return StepOutcome::idle(*state);
    }

    let (check, branch) = if state.drilling {
        let check = check_drill_collisions(state, probe, config, dt);
        let mut next = check.state;
        next.velocity = drill_movement(next.velocity, next.grounded, config);
        if !next.grounded {
            next.velocity.y = fall(next.velocity.y, config, dt);
            next.velocity.x = walk(next.velocity.x, false, input.horizontal_axis, config, dt);
        }
        (CollisionCheck { state: next, ..check }, MotionBranch::Drill)
    } else {
        let mut check = check_ground_collisions(state, probe, config);
        let next = &mut check.state;
        if !next.drilling {
            next.velocity.x = walk(
                next.velocity.x,
                next.grounded,
                input.horizontal_axis,
                config,
                dt,
            );
            if next.grounded && input.jump_pressed {
                next.velocity.y = config.jump_velocity();
                check.effects.push(MotionEffect::Jumped);
            }
            next.velocity.y = gravity(next.velocity.y, next.grounded, config, dt);
        }
        (check, MotionBranch::Grounded)
    };

    let CollisionCheck {
        state: mut next,
        mut effects,
    } = check;

    next.track_air_height();
    debug_assert!(
        next.min_air_height <= next.position.y && next.position.y <= next.max_air_height,
        "air-height extrema must bracket the current height"
    );

    let died = probe.overlaps_circle(next.position, config.lava_radius(), CollisionLayer::Lava);

    let walking = !died
        && !next.drilling
        && next.grounded
        && next.velocity.x.abs() > config.walk_speed_threshold;
    if walking != next.walking {
        effects.push(if walking {
            MotionEffect::FootstepsStart
        } else {
            MotionEffect::FootstepsStop
        });
        next.walking = walking;
    }

    // A dead player leaves no effect loop running
    if died {
        if next.drilling {
            stop_drill(&mut next, &mut effects);
        }
        effects.push(MotionEffect::Died);
    }

    StepOutcome {
        state: next,
        effects,
        branch,
        died,
    }
}

/// Contact check used while not drilling.
///
/// Probes `grounded_distance` down and up. Falling far enough onto a floor
/// starts a downward drill (or bounces off bounce terrain); rising into a
/// ceiling shortly after leaving the ground starts an upward drill (or
/// bounces), and rising into it any later stops the ascent.
pub fn check_ground_collisions<P: CollisionProbe>(
    state: &MotionState,
    probe: &P,
    config: &DrillConfig,
) -> CollisionCheck {
    let mut next = *state;
    let mut effects = Vec::new();
    let mut bounced = false;

    let cast = |direction: Vec2, layer| {
        probe.circle_cast(
            state.position,
            config.cast_radius(),
            direction,
            config.grounded_distance,
            layer,
        )
    };

    let ground_hit = cast(Vec2::NEG_Y, CollisionLayer::Ground);
    if let Some(hit) = ground_hit.filter(|_| state.is_airborne()) {
        let fall_depth = state.fall_depth();
        if fall_depth >= config.dig_down_threshold
            && hit.faces_up(config.surface_alignment)
            && next.velocity.y < 0.0
        {
            if cast(Vec2::NEG_Y, CollisionLayer::Bounce).is_some() {
                let speed = config.velocity_from_height(fall_depth - config.bounce_height_loss);
                next.velocity = Vec2::new(0.0, speed);
                next.reset_air_height();
                effects.push(MotionEffect::Bounced);
                bounced = true;
            } else {
                start_drill(&mut next, &mut effects, Vec2::NEG_Y, config);
            }
        }
    }

    let roof_hit = cast(Vec2::Y, CollisionLayer::Ground);
    if let Some(hit) = roof_hit.filter(|_| state.is_airborne()) {
        if next.rise_height() <= config.dig_up_threshold {
            if hit.faces_down(config.surface_alignment) && next.velocity.y > 0.0 {
                if cast(Vec2::Y, CollisionLayer::Bounce).is_some() {
                    next.velocity.y = -next.velocity.y.abs();
                    effects.push(MotionEffect::Bounced);
                    bounced = true;
                } else {
                    start_drill(&mut next, &mut effects, Vec2::Y, config);
                }
            }
        } else {
            next.velocity.y = 0.0;
        }
    }

    // Ceiling contact never grounds the player; only the downward probe does.
    next.grounded = ground_hit.is_some();

    if state.is_airborne() && next.grounded && !bounced && !next.drilling {
        effects.push(MotionEffect::Landed);
    }

    CollisionCheck {
        state: next,
        effects,
    }
}

/// Collision check used while drilling.
///
/// Probes along the velocity for the distance covered this step, against
/// both solid and bounce terrain.
pub fn check_drill_collisions<P: CollisionProbe>(
    state: &MotionState,
    probe: &P,
    config: &DrillConfig,
    dt: f32,
) -> CollisionCheck {
    let mut next = *state;
    let mut effects = Vec::new();

    let direction = state.velocity.normalize_or_zero();
    let distance = state.velocity.length() * dt;
    let cast = |layer| {
        probe.circle_cast(
            state.position,
            config.cast_radius(),
            direction,
            distance,
            layer,
        )
    };
    let ground_hit = cast(CollisionLayer::Ground);
    let bounce_hit = cast(CollisionLayer::Bounce);

    // Airborne drill reaching terrain
    if let Some(hit) = ground_hit.filter(|_| state.is_airborne()) {
        if hit.faces_up(config.surface_alignment) && state.velocity.y < 0.0 {
            if state.fall_depth() >= config.dig_down_threshold {
                if bounce_hit.is_some() {
                    let speed = config
                        .velocity_from_height(state.fall_depth() - config.bounce_height_loss);
                    next.velocity = Vec2::new(0.0, speed);
                    next.reset_air_height();
                    effects.push(MotionEffect::Bounced);
                }
            } else {
                stop_drill(&mut next, &mut effects);
                return CollisionCheck {
                    state: next,
                    effects,
                };
            }
        } else if hit.faces_down(config.surface_alignment) && state.velocity.y > 0.0 {
            if state.rise_height() < config.dig_up_threshold {
                if bounce_hit.is_some() {
                    next.velocity.y = -next.velocity.y.abs();
                    next.reset_air_height();
                    effects.push(MotionEffect::Bounced);
                }
            } else {
                stop_drill(&mut next, &mut effects);
                return CollisionCheck {
                    state: next,
                    effects,
                };
            }
        }
    }

    // Breaking out of the terrain
    if ground_hit.is_none() && state.grounded {
        next.velocity = next.velocity.normalize_or_zero() * config.drill_exit_velocity();
        next.reset_air_height();
    }

    // Bounce terrain buried inside solid ground
    if state.grounded && ground_hit.is_some() {
        if let Some(bounce) = bounce_hit {
            if (-bounce.normal).dot(direction) > 0.0 {
                next.velocity = reflect(next.velocity, bounce.normal);
                next.reset_air_height();
                effects.push(MotionEffect::Bounced);
            }
        }
    }

    next.grounded = ground_hit.is_some();

    CollisionCheck {
        state: next,
        effects,
    }
}

fn start_drill(
    state: &mut MotionState,
    effects: &mut Vec<MotionEffect>,
    direction: Vec2,
    config: &DrillConfig,
) {
    if !state.drilling {
        effects.push(MotionEffect::DrillStart);
    }
    state.drilling = true;
    state.velocity = direction * config.drill_speed;
}

fn stop_drill(state: &mut MotionState, effects: &mut Vec<MotionEffect>) {
    state.drilling = false;
    effects.push(MotionEffect::DrillStop);
}

/// Move `current` towards `target` by at most `max_delta`.
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    current + (target - current).clamp(-max_delta, max_delta)
}

/// Reflect `velocity` off a surface with unit `normal`.
#[inline]
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Horizontal velocity after applying input.
///
/// On the ground the input speed is taken directly; in the air the velocity
/// eases towards it at `move_speed * air_control` per second.
pub fn walk(velocity_x: f32, grounded: bool, axis: f32, config: &DrillConfig, dt: f32) -> f32 {
    let target = axis * config.move_speed;
    if grounded {
        target
    } else {
        move_towards(velocity_x, target, config.move_speed * config.air_control * dt)
    }
}

/// Vertical velocity after gravity while not drilling.
///
/// Resting players are held down by the grounding force; everyone else
/// accelerates towards terminal fall speed.
pub fn gravity(velocity_y: f32, grounded: bool, config: &DrillConfig, dt: f32) -> f32 {
    if grounded && velocity_y <= 0.0 {
        -config.grounding_force
    } else {
        fall(velocity_y, config, dt)
    }
}

/// Vertical velocity accelerating towards terminal fall speed.
#[inline]
pub fn fall(velocity_y: f32, config: &DrillConfig, dt: f32) -> f32 {
    move_towards(velocity_y, -config.max_fall_speed, config.gravity * dt)
}

/// Velocity while drilling.
///
/// Inside terrain the drill goes straight up or down at `drill_speed`;
/// horizontal drift is suppressed. In open air the velocity is left alone.
pub fn drill_movement(velocity: Vec2, grounded: bool, config: &DrillConfig) -> Vec2 {
    if grounded {
        Vec2::new(0.0, velocity.y).normalize_or_zero() * config.drill_speed
    } else {
        velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionData;

    const DT: f32 = 0.02;

    /// Infinitely wide horizontal band of terrain.
    struct Slab {
        top: f32,
        bottom: f32,
        bounce: bool,
    }

    impl Slab {
        fn cast(&self, center: Vec2, radius: f32, direction: Vec2) -> Option<CollisionData> {
            if center.y - radius < self.top && center.y + radius > self.bottom {
                let normal = if center.y > (self.top + self.bottom) * 0.5 {
                    Vec2::Y
                } else {
                    Vec2::NEG_Y
                };
                return Some(CollisionData::new(0.0, normal, center, None));
            }
            let (distance, normal, surface) = if center.y - radius >= self.top {
                if direction.y >= 0.0 {
                    return None;
                }
                ((center.y - radius - self.top) / -direction.y, Vec2::Y, self.top)
            } else {
                if direction.y <= 0.0 {
                    return None;
                }
                ((self.bottom - center.y - radius) / direction.y, Vec2::NEG_Y, self.bottom)
            };
            let point = Vec2::new(center.x + direction.x * distance, surface);
            Some(CollisionData::new(distance, normal, point, None))
        }
    }

    /// Terrain made of horizontal slabs, optionally flooded with lava.
    #[derive(Default)]
    struct Terrain {
        slabs: Vec<Slab>,
        lava: bool,
    }

    impl Terrain {
        fn floor(top: f32, bounce: bool) -> Self {
            Self::default().with_slab(top, top - 100.0, bounce)
        }

        fn ceiling(bottom: f32, bounce: bool) -> Self {
            Self::default().with_slab(bottom + 100.0, bottom, bounce)
        }

        fn with_slab(mut self, top: f32, bottom: f32, bounce: bool) -> Self {
            self.slabs.push(Slab {
                top,
                bottom,
                bounce,
            });
            self
        }

        fn flooded(mut self) -> Self {
            self.lava = true;
            self
        }
    }

    impl CollisionProbe for Terrain {
        fn circle_cast(
            &self,
            center: Vec2,
            radius: f32,
            direction: Vec2,
            max_distance: f32,
            layer: CollisionLayer,
        ) -> Option<CollisionData> {
            self.slabs
                .iter()
                .filter(|slab| match layer {
                    CollisionLayer::Ground => true,
                    CollisionLayer::Bounce => slab.bounce,
                    CollisionLayer::Lava => false,
                })
                .filter_map(|slab| slab.cast(center, radius, direction))
                .filter(|hit| hit.distance <= max_distance)
                .min_by(|a, b| a.distance.total_cmp(&b.distance))
        }

        fn overlaps_circle(&self, _: Vec2, _: f32, layer: CollisionLayer) -> bool {
            self.lava && matches!(layer, CollisionLayer::Lava)
        }
    }

    /// Height at which a body rests on a floor at zero, inside the probe reach.
    fn resting_height(config: &DrillConfig) -> f32 {
        config.cast_radius() + config.grounded_distance * 0.5
    }

    fn falling(config: &DrillConfig, fall_depth: f32, vy: f32) -> MotionState {
        let mut state = MotionState::spawn_at(Vec2::new(0.0, resting_height(config)));
        state.grounded = false;
        state.max_air_height = state.position.y + fall_depth;
        state.velocity = Vec2::new(0.0, vy);
        state
    }

    fn rising_under_ceiling(config: &DrillConfig, rise: f32, vy: f32) -> (MotionState, Terrain) {
        let mut state = MotionState::spawn_at(Vec2::new(0.0, 10.0));
        state.grounded = false;
        state.min_air_height = state.position.y - rise;
        state.velocity = Vec2::new(0.0, vy);
        let bottom = state.position.y + resting_height(config);
        (state, Terrain::ceiling(bottom, false))
    }

    #[test]
    fn move_towards_is_bounded() {
        assert_eq!(move_towards(0.0, 10.0, 1.0), 1.0);
        assert_eq!(move_towards(0.0, -10.0, 1.0), -1.0);
        assert_eq!(move_towards(0.5, 1.0, 1.0), 1.0);
    }

    #[test]
    fn reflect_flips_normal_component() {
        assert_eq!(reflect(Vec2::new(1.0, -2.0), Vec2::Y), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn walk_on_ground_is_immediate() {
        let config = DrillConfig::default();
        assert_eq!(walk(0.0, true, 1.0, &config, DT), 3.0);
        assert_eq!(walk(3.0, true, 0.0, &config, DT), 0.0);
    }

    #[test]
    fn walk_in_air_eases() {
        let config = DrillConfig::default();
        let vx = walk(0.0, false, 1.0, &config, DT);
        assert!((vx - 3.0 * 0.2 * DT).abs() < 1e-6);
    }

    #[test]
    fn fall_is_capped() {
        let config = DrillConfig::default();
        assert_eq!(fall(-5.95, &config, DT), -6.0);
        assert_eq!(fall(-6.0, &config, DT), -6.0);
        assert!((fall(0.0, &config, DT) + 0.2).abs() < 1e-6);
    }

    #[test]
    fn drill_movement_suppresses_drift_underground() {
        let config = DrillConfig::default();
        let v = drill_movement(Vec2::new(2.0, -1.0), true, &config);
        assert_eq!(v, Vec2::new(0.0, -config.drill_speed));

        let free = drill_movement(Vec2::new(2.0, -1.0), false, &config);
        assert_eq!(free, Vec2::new(2.0, -1.0));
    }

    #[test]
    fn zero_dt_is_idle() {
        let config = DrillConfig::default();
        let state = falling(&config, 1.0, -3.0);

        let outcome = step(&state, &FrameInput::jump(), &Terrain::floor(0.0, false), &config, 0.0);
        assert_eq!(outcome.state, state);
        assert!(outcome.effects.is_empty());
        assert_eq!(outcome.branch, MotionBranch::Idle);
    }

    #[test]
    fn walking_on_ground_takes_input_speed() {
        let config = DrillConfig::default();
        let state = MotionState::spawn_at(Vec2::new(0.0, resting_height(&config)));

        let outcome = step(&state, &FrameInput::horizontal(1.0), &Terrain::floor(0.0, false), &config, DT);
        assert_eq!(outcome.branch, MotionBranch::Grounded);
        assert_eq!(outcome.state.velocity.x, 3.0);
        assert!(outcome.state.grounded);
        assert_eq!(outcome.effects, vec![MotionEffect::FootstepsStart]);
    }

    #[test]
    fn landing_emits_landed_and_holds_grounding_force() {
        let config = DrillConfig::default();
        let state = falling(&config, 1.0, -2.0);

        let outcome = step(&state, &FrameInput::default(), &Terrain::floor(0.0, false), &config, DT);
        assert!(outcome.state.grounded);
        assert!(!outcome.state.drilling);
        assert_eq!(outcome.state.velocity.y, -config.grounding_force);
        assert!(outcome.effects.contains(&MotionEffect::Landed));
    }

    #[test]
    fn jump_uses_jump_height() {
        let config = DrillConfig::default();
        let state = MotionState::spawn_at(Vec2::new(0.0, resting_height(&config)));

        let outcome = step(&state, &FrameInput::jump(), &Terrain::floor(0.0, false), &config, DT);
        let expected = config.jump_velocity() - config.gravity * DT;
        assert!((outcome.state.velocity.y - expected).abs() < 1e-4);
        assert_eq!(outcome.effects, vec![MotionEffect::Jumped]);
    }

    #[test]
    fn jump_is_ignored_in_the_air() {
        let config = DrillConfig::default();
        let mut state = MotionState::spawn_at(Vec2::new(0.0, 5.0));
        state.grounded = false;

        let outcome = step(&state, &FrameInput::jump(), &Terrain::floor(0.0, false), &config, DT);
        assert!(!outcome.effects.contains(&MotionEffect::Jumped));
        assert!(outcome.state.velocity.y < 0.0);
    }

    #[test]
    fn deep_fall_onto_floor_starts_drill() {
        let config = DrillConfig::default();
        let state = falling(&config, 3.0, -5.0);

        let outcome = step(&state, &FrameInput::default(), &Terrain::floor(0.0, false), &config, DT);
        assert!(outcome.state.drilling);
        assert_eq!(outcome.state.velocity, Vec2::new(0.0, -config.drill_speed));
        assert_eq!(outcome.effects, vec![MotionEffect::DrillStart]);
    }

    #[test]
    fn shallow_fall_lands_without_drilling() {
        let config = DrillConfig::default();
        let state = falling(&config, 1.5, -5.0);

        let outcome = step(&state, &FrameInput::default(), &Terrain::floor(0.0, false), &config, DT);
        assert!(!outcome.state.drilling);
        assert!(outcome.state.grounded);
    }

    #[test]
    fn deep_fall_onto_bounce_floor_bounces() {
        let config = DrillConfig::default();
        let state = falling(&config, 3.0, -5.0);
        let terrain = Terrain::floor(0.0, true);

        let check = check_ground_collisions(&state, &terrain, &config);
        let expected = (2.0 * (3.0 - 1.0) * config.gravity).sqrt();
        assert!((check.state.velocity.y - expected).abs() < 1e-4);
        assert_eq!(check.state.velocity.x, 0.0);
        assert_eq!(check.state.min_air_height, check.state.position.y);
        assert_eq!(check.state.max_air_height, check.state.position.y);
        assert_eq!(check.effects, vec![MotionEffect::Bounced]);

        let outcome = step(&state, &FrameInput::default(), &terrain, &config, DT);
        assert!(!outcome.state.drilling);
        assert!((outcome.state.velocity.y - (expected - config.gravity * DT)).abs() < 1e-4);
        assert!(!outcome.effects.contains(&MotionEffect::Landed));
    }

    #[test]
    fn rising_into_ceiling_starts_upward_drill() {
        let config = DrillConfig::default();
        let (state, terrain) = rising_under_ceiling(&config, 0.5, 5.0);

        let outcome = step(&state, &FrameInput::default(), &terrain, &config, DT);
        assert!(outcome.state.drilling);
        assert_eq!(outcome.state.velocity, Vec2::new(0.0, config.drill_speed));
        assert_eq!(outcome.effects, vec![MotionEffect::DrillStart]);
    }

    #[test]
    fn late_ceiling_contact_stops_ascent() {
        let config = DrillConfig::default();
        let (state, terrain) = rising_under_ceiling(&config, 2.0, 5.0);

        let check = check_ground_collisions(&state, &terrain, &config);
        assert_eq!(check.state.velocity.y, 0.0);
        assert!(!check.state.drilling);
        assert!(!check.state.grounded);
        assert!(check.effects.is_empty());
    }

    #[test]
    fn bounce_ceiling_flips_vertical_speed() {
        let config = DrillConfig::default();
        let (state, _) = rising_under_ceiling(&config, 0.5, 5.0);
        let terrain = Terrain::ceiling(state.position.y + resting_height(&config), true);

        let check = check_ground_collisions(&state, &terrain, &config);
        assert_eq!(check.state.velocity.y, -5.0);
        assert_eq!(check.state.velocity.length(), state.velocity.length());
        assert_eq!(check.effects, vec![MotionEffect::Bounced]);
    }

    #[test]
    fn drill_exits_terrain_with_exit_speed() {
        let config = DrillConfig::default();
        let mut state = MotionState::spawn_at(Vec2::new(0.0, -3.0));
        state.drilling = true;
        state.velocity = Vec2::new(0.0, -config.drill_speed);
        state.min_air_height = 5.0;
        state.max_air_height = 5.0;
        let terrain = Terrain::default().with_slab(0.0, -2.0, false);

        let check = check_drill_collisions(&state, &terrain, &config, DT);
        let exit = (2.0 * config.drill_exit_height * config.gravity).sqrt();
        assert!((check.state.velocity.length() - exit).abs() < 1e-4);
        assert!(check.state.velocity.y < 0.0);
        assert!(!check.state.grounded);
        assert_eq!(check.state.max_air_height, state.position.y);

        let outcome = step(&state, &FrameInput::default(), &terrain, &config, DT);
        assert_eq!(outcome.branch, MotionBranch::Drill);
        assert!(outcome.state.drilling);
        assert!((outcome.state.velocity.y - (-exit + config.gravity * DT)).abs() < 1e-4);
    }

    #[test]
    fn drill_inside_terrain_keeps_drill_speed() {
        let config = DrillConfig::default();
        let mut state = MotionState::spawn_at(Vec2::new(0.0, -1.0));
        state.drilling = true;
        state.velocity = Vec2::new(0.5, -config.drill_speed);
        let terrain = Terrain::default().with_slab(0.0, -2.0, false);

        let outcome = step(&state, &FrameInput::horizontal(1.0), &terrain, &config, DT);
        assert!(outcome.state.grounded);
        assert_eq!(outcome.state.velocity, Vec2::new(0.0, -config.drill_speed));
        assert!(outcome.effects.is_empty());
    }

    #[test]
    fn airborne_drill_stops_on_shallow_floor() {
        let config = DrillConfig::default();
        let mut state = falling(&config, 1.0, -6.0);
        state.drilling = true;

        let outcome = step(&state, &FrameInput::default(), &Terrain::floor(0.0, false), &config, DT);
        assert!(!outcome.state.drilling);
        assert_eq!(outcome.effects, vec![MotionEffect::DrillStop]);
    }

    #[test]
    fn airborne_drill_bounces_off_deep_bounce_floor() {
        let config = DrillConfig::default();
        let mut state = falling(&config, 4.0, -6.0);
        state.drilling = true;

        let check = check_drill_collisions(&state, &Terrain::floor(0.0, true), &config, DT);
        let expected = config.velocity_from_height(4.0 - config.bounce_height_loss);
        assert!((check.state.velocity.y - expected).abs() < 1e-4);
        assert!(check.state.drilling);
        assert_eq!(check.effects, vec![MotionEffect::Bounced]);
    }

    #[test]
    fn buried_bounce_surface_reflects_drill() {
        let config = DrillConfig::default();
        let mut state = MotionState::spawn_at(Vec2::new(0.0, -1.0));
        state.drilling = true;
        state.velocity = Vec2::new(0.0, -config.drill_speed);
        let pad_top = state.position.y - resting_height(&config);
        let terrain = Terrain::floor(0.0, false).with_slab(pad_top, pad_top - 1.0, true);

        let outcome = step(&state, &FrameInput::default(), &terrain, &config, DT);

        assert_eq!(outcome.state.velocity, Vec2::new(0.0, config.drill_speed));
        assert_eq!(outcome.effects, vec![MotionEffect::Bounced]);
        assert!(outcome.state.drilling);
    }

    #[test]
    fn upward_drill_bounces_off_near_bounce_ceiling() {
        let config = DrillConfig::default();
        let (mut state, _) = rising_under_ceiling(&config, 0.5, config.drill_speed);
        state.drilling = true;
        let terrain = Terrain::ceiling(state.position.y + resting_height(&config), true);

        let check = check_drill_collisions(&state, &terrain, &config, DT);

        assert_eq!(check.state.velocity, Vec2::new(0.0, -config.drill_speed));
        assert_eq!(check.effects, vec![MotionEffect::Bounced]);
        assert_eq!(check.state.min_air_height, state.position.y);
        assert_eq!(check.state.max_air_height, state.position.y);
        assert!(check.state.drilling);
    }

    #[test]
    fn upward_drill_stops_at_far_ceiling() {
        let config = DrillConfig::default();
        let (mut state, terrain) = rising_under_ceiling(&config, 2.0, config.drill_speed);
        state.drilling = true;

        let check = check_drill_collisions(&state, &terrain, &config, DT);

        assert!(!check.state.drilling);
        assert_eq!(check.effects, vec![MotionEffect::DrillStop]);
    }

    #[test]
    fn lava_ends_the_life() {
        let config = DrillConfig::default();
        let state = falling(&config, 5.0, -3.0);
        let terrain = Terrain::default().flooded();

        let outcome = step(&state, &FrameInput::default(), &terrain, &config, DT);

        assert!(outcome.died);
        assert_eq!(outcome.effects, vec![MotionEffect::Died]);
    }

    #[test]
    fn dying_while_walking_stops_footsteps() {
        let config = DrillConfig::default();
        let mut state = MotionState::spawn_at(Vec2::new(0.0, resting_height(&config)));
        state.walking = true;
        state.velocity.x = config.move_speed;
        let terrain = Terrain::floor(0.0, false).flooded();

        let outcome = step(&state, &FrameInput::horizontal(1.0), &terrain, &config, DT);

        assert!(outcome.died);
        assert!(!outcome.state.walking);
        assert_eq!(
            outcome.effects,
            vec![MotionEffect::FootstepsStop, MotionEffect::Died]
        );
    }

    #[test]
    fn dying_on_first_step_never_starts_footsteps() {
        let config = DrillConfig::default();
        let state = MotionState::spawn_at(Vec2::new(0.0, resting_height(&config)));
        let terrain = Terrain::floor(0.0, false).flooded();

        let outcome = step(&state, &FrameInput::horizontal(1.0), &terrain, &config, DT);

        assert!(!outcome.state.walking);
        assert_eq!(outcome.effects, vec![MotionEffect::Died]);
    }

    #[test]
    fn dying_while_drilling_stops_drill() {
        let config = DrillConfig::default();
        let mut state = MotionState::spawn_at(Vec2::new(0.0, -1.0));
        state.drilling = true;
        state.velocity = Vec2::new(0.0, -config.drill_speed);
        let terrain = Terrain::floor(0.0, false).flooded();

        let outcome = step(&state, &FrameInput::default(), &terrain, &config, DT);

        assert!(outcome.died);
        assert!(!outcome.state.drilling);
        assert_eq!(
            outcome.effects,
            vec![MotionEffect::DrillStop, MotionEffect::Died]
        );
    }

    #[test]
    fn exactly_one_branch_runs_per_step() {
        let config = DrillConfig::default();
        let terrain = Terrain::floor(0.0, false);

        let grounded = step(&falling(&config, 0.5, -1.0), &FrameInput::default(), &terrain, &config, DT);
        assert_eq!(grounded.branch, MotionBranch::Grounded);

        let mut drilling = falling(&config, 0.5, -1.0);
        drilling.drilling = true;
        let drilled = step(&drilling, &FrameInput::default(), &terrain, &config, DT);
        assert_eq!(drilled.branch, MotionBranch::Drill);
    }
}
