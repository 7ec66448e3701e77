//! Simulation phase and level reloads.
//!
//! Stepping is gated on [`SimulationPhase`]. Anything that needs the world to
//! hold still (a room transition, the reload sweep) moves the phase away from
//! [`SimulationPhase::Active`], which also pauses virtual time. The reload
//! itself is an explicit state machine advanced on real time.

use bevy::math::curve::{Curve, EaseFunction};
use bevy::prelude::*;

use crate::intent::MovementIntent;

/// Quadratic ease-in, clamped to `[0, 1]`.
#[inline]
pub fn ease_in_quad(t: f32) -> f32 {
    EaseFunction::QuadraticIn.sample_clamped(t)
}

/// Quadratic ease-out, clamped to `[0, 1]`.
#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    EaseFunction::QuadraticOut.sample_clamped(t)
}

/// Whether the fixed-step simulation may run.
#[derive(Resource, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[reflect(Resource)]
pub enum SimulationPhase {
    /// Controllers are stepped.
    #[default]
    Active,
    /// The camera is moving between rooms.
    Transitioning,
    /// A reload sweep covers the screen.
    Frozen,
}

impl SimulationPhase {
    /// Check if controllers are stepped in this phase.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Run condition: the simulation phase is [`SimulationPhase::Active`].
pub fn simulation_active(phase: Res<SimulationPhase>) -> bool {
    phase.is_active()
}

/// Pause virtual time outside [`SimulationPhase::Active`].
pub fn apply_simulation_phase(phase: Res<SimulationPhase>, mut time: ResMut<Time<Virtual>>) {
    if !phase.is_changed() {
        return;
    }
    match (phase.is_active(), time.is_paused()) {
        (true, true) => time.unpause(),
        (false, false) => time.pause(),
        _ => {}
    }
    debug!("simulation phase is now {:?}", *phase);
}

/// Request to restart the level.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadRequested {
    /// The controller that asked for it.
    pub source: Entity,
}

/// Sent once the level has been rebuilt behind the sweep.
#[derive(Event, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelReloaded;

/// Stage of a [`SceneReload`].
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReloadStage {
    /// No reload in progress.
    #[default]
    Idle,
    /// The sweep is closing over the screen.
    Covering,
    /// The level was rebuilt; the sweep is opening again.
    Revealing,
}

/// Level reload sequencer.
///
/// `Idle → Covering → Revealing → Idle`. Players are respawned on the
/// `Covering → Revealing` edge.
#[derive(Resource, Reflect, Debug, Clone, PartialEq)]
#[reflect(Resource)]
pub struct SceneReload {
    stage: ReloadStage,
    elapsed: f32,
    /// Seconds each half of the sweep takes.
    pub sweep_duration: f32,
    respawn_pending: bool,
}

impl Default for SceneReload {
    fn default() -> Self {
        Self::with_sweep_duration(0.3)
    }
}

impl SceneReload {
    /// Create an idle sequencer.
    pub fn with_sweep_duration(sweep_duration: f32) -> Self {
        Self {
            stage: ReloadStage::Idle,
            elapsed: 0.0,
            sweep_duration: sweep_duration.max(0.0),
            respawn_pending: false,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> ReloadStage {
        self.stage
    }

    /// Check if no reload is running.
    pub fn is_idle(&self) -> bool {
        self.stage == ReloadStage::Idle
    }

    /// Start covering the screen. Returns false if a reload is already running.
    pub fn begin(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.stage = ReloadStage::Covering;
        self.elapsed = 0.0;
        true
    }

    /// Advance by `dt` seconds of real time.
    ///
    /// Makes at most one stage transition per call and returns the stage that
    /// was entered, if any.
    pub fn advance(&mut self, dt: f32) -> Option<ReloadStage> {
        if self.is_idle() {
            return None;
        }
        self.elapsed += dt.max(0.0);
        if self.elapsed < self.sweep_duration {
            return None;
        }

        self.elapsed = 0.0;
        self.stage = match self.stage {
            ReloadStage::Covering => {
                self.respawn_pending = true;
                ReloadStage::Revealing
            }
            ReloadStage::Revealing | ReloadStage::Idle => ReloadStage::Idle,
        };
        Some(self.stage)
    }

    /// How much of the screen the sweep covers, in `[0, 1]`.
    pub fn coverage(&self) -> f32 {
        let t = if self.sweep_duration > 0.0 {
            self.elapsed / self.sweep_duration
        } else {
            1.0
        };
        match self.stage {
            ReloadStage::Idle => 0.0,
            ReloadStage::Covering => ease_in_quad(t),
            ReloadStage::Revealing => 1.0 - ease_out_quad(t),
        }
    }

    /// Take the pending respawn raised when the sweep finished covering.
    pub fn take_respawn(&mut self) -> bool {
        std::mem::take(&mut self.respawn_pending)
    }
}

/// Turn reset inputs into reload requests.
pub fn request_reload_on_reset(
    mut q_intents: Query<(Entity, &mut MovementIntent)>,
    mut reloads: EventWriter<ReloadRequested>,
) {
    for (entity, mut intent) in &mut q_intents {
        // Read first so the intent is only marked changed when a request is taken
        if intent.reset_requested && intent.take_reset_request() {
            debug!("{entity} asked for a level reset");
            reloads.write(ReloadRequested { source: entity });
        }
    }
}

/// Start a reload sweep on request.
pub fn begin_scene_reload(
    mut requests: EventReader<ReloadRequested>,
    mut reload: ResMut<SceneReload>,
    mut phase: ResMut<SimulationPhase>,
) {
    for request in requests.read() {
        if reload.begin() {
            info!("reloading level (requested by {})", request.source);
            *phase = SimulationPhase::Frozen;
        } else {
            debug!("ignoring reload request from {}: reload in progress", request.source);
        }
    }
}

/// Drive the reload sweep on real time.
pub fn advance_scene_reload(
    time: Res<Time<Real>>,
    mut reload: ResMut<SceneReload>,
    mut phase: ResMut<SimulationPhase>,
    mut reloaded: EventWriter<LevelReloaded>,
) {
    if reload.is_idle() {
        return;
    }
    match reload.advance(time.delta_secs()) {
        Some(ReloadStage::Revealing) => {
            info!("level reloaded");
            *phase = SimulationPhase::Active;
            reloaded.write(LevelReloaded);
        }
        Some(ReloadStage::Idle) => debug!("reload sweep finished"),
        _ => {}
    }
}
