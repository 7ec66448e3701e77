//! Effect notifications.
//!
//! The controller reports what happened during a step as a list of
//! [`MotionEffect`]s. Audio, animation and particles react to them; the
//! controller never waits on the consumers.

use bevy::prelude::*;

/// Something the controller did this step that presentation may react to.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionEffect {
    /// Touched down on ground after being airborne.
    Landed,
    /// Reflected off a bounce-capable surface.
    Bounced,
    /// Left the ground with a jump.
    Jumped,
    /// Entered drill mode.
    DrillStart,
    /// Left drill mode.
    DrillStop,
    /// Started walking on the ground.
    FootstepsStart,
    /// Stopped walking.
    FootstepsStop,
    /// Touched lava. Terminal for the current life.
    Died,
}

/// Fire-and-forget receiver of [`MotionEffect`]s.
pub trait EffectSink {
    /// Record an effect.
    fn emit(&mut self, effect: MotionEffect);
}

impl EffectSink for Vec<MotionEffect> {
    fn emit(&mut self, effect: MotionEffect) {
        self.push(effect);
    }
}

/// Event carrying a [`MotionEffect`] for a controller entity.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionEffectEvent {
    /// The controller entity.
    pub entity: Entity,
    /// What happened.
    pub effect: MotionEffect,
}

/// Sink that forwards effects as [`MotionEffectEvent`]s for one entity.
pub struct EventSink<'a, 'w> {
    entity: Entity,
    writer: &'a mut EventWriter<'w, MotionEffectEvent>,
}

impl<'a, 'w> EventSink<'a, 'w> {
    /// Create a sink for `entity`.
    pub fn new(entity: Entity, writer: &'a mut EventWriter<'w, MotionEffectEvent>) -> Self {
        Self { entity, writer }
    }
}

impl EffectSink for EventSink<'_, '_> {
    fn emit(&mut self, effect: MotionEffect) {
        self.writer.write(MotionEffectEvent {
            entity: self.entity,
            effect,
        });
    }
}
