//! # `drill_character_controller`
//!
//! A fixed-timestep 2D character controller for a platformer where the
//! player can drill through terrain.
//!
//! This crate provides:
//! - Grounded movement: walking, air control, jumping and a capped fall
//! - Drilling: falling far enough onto a floor, or jumping into a ceiling
//!   right after leaving the ground, tunnels through the terrain
//! - Bounce surfaces that reflect the player instead of letting it drill in
//! - Lava that ends the current life and restarts the level
//! - Checkpoints, a room-by-room camera and the reload sweep around them
//! - A physics backend abstraction (Rapier2D included)
//!
//! ## Architecture
//!
//! The motion logic in [`motion`] is a pure function of the previous
//! [`MotionState`](state::MotionState), the sampled input and the terrain as
//! seen through a [`CollisionProbe`](probe::CollisionProbe). It returns the
//! next state and the effects it emitted; systems copy the velocity to the
//! physics body and forward the effects as events.
//!
//! Time control is explicit: [`SimulationPhase`](lifecycle::SimulationPhase)
//! gates the fixed step, and the room camera and the reload sweep move it
//! away from `Active` while they run.
//!
//! ## Usage
//!
//! ```rust
//! use drill_character_controller::prelude::*;
//!
//! // Tuning lives on the player entity; everything else it needs is required.
//! let config = DrillConfig::default().with_move_speed(4.0);
//! assert!(config.validate().is_ok());
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod checkpoint;
pub mod collision;
pub mod config;
pub mod effects;
pub mod intent;
pub mod lifecycle;
pub mod motion;
pub mod presentation;
pub mod probe;
pub mod rooms;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::DrillPhysicsBackend;
    pub use crate::checkpoint::{ActiveCheckpoint, Checkpoint, CheckpointActivated};
    pub use crate::collision::CollisionData;
    pub use crate::config::{ConfigError, DrillConfig};
    pub use crate::effects::{EffectSink, MotionEffect, MotionEffectEvent};
    pub use crate::intent::{FrameInput, MovementIntent};
    pub use crate::lifecycle::{
        LevelReloaded, ReloadRequested, ReloadStage, SceneReload, SimulationPhase,
    };
    pub use crate::motion::{step, MotionBranch, StepOutcome};
    pub use crate::presentation::{AnimationClip, MotionPresentation};
    pub use crate::probe::{CollisionLayer, CollisionProbe, TerrainLayers};
    pub use crate::rooms::{RoomCamera, RoomGrid};
    pub use crate::state::{
        Airborne, ConfigFault, Drilling, Grounded, Life, MotionState, SpawnOrigin,
    };
    pub use crate::{DrillControllerPlugin, DrillControllerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dDrillerBundle};
}

/// System sets of the drill controller in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrillControllerSet {
    /// Backend step systems. Only runs while the simulation phase is active.
    Simulation,
    /// Marker components are brought in line with the motion state.
    Sync,
}

/// Main plugin for the drill controller.
///
/// This plugin is generic over a physics backend `B` which answers terrain
/// queries and moves the bodies.
///
/// # Panics
///
/// Building the plugin panics if any terrain layer has an empty mask. The
/// controller cannot tell ground, bounce and lava apart without them.
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use drill_character_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(DrillControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct DrillControllerPlugin<B: backend::DrillPhysicsBackend> {
    layers: probe::TerrainLayers,
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::DrillPhysicsBackend> Default for DrillControllerPlugin<B> {
    fn default() -> Self {
        Self::new(probe::TerrainLayers::default())
    }
}

impl<B: backend::DrillPhysicsBackend> DrillControllerPlugin<B> {
    /// Create the plugin with custom terrain layers.
    pub fn new(layers: probe::TerrainLayers) -> Self {
        Self {
            layers,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::DrillPhysicsBackend> Plugin for DrillControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        if let Err(error) = self.layers.validate() {
            panic!("invalid drill controller terrain layers: {error}");
        }

        // Register core types
        app.register_type::<config::DrillConfig>();
        app.register_type::<intent::MovementIntent>();
        app.register_type::<state::MotionState>();
        app.register_type::<state::Life>();
        app.register_type::<state::ConfigFault>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::Drilling>();
        app.register_type::<state::SpawnOrigin>();
        app.register_type::<presentation::MotionPresentation>();
        app.register_type::<probe::TerrainLayers>();
        app.register_type::<checkpoint::Checkpoint>();
        app.register_type::<checkpoint::ActiveCheckpoint>();
        app.register_type::<rooms::RoomGrid>();
        app.register_type::<rooms::RoomCamera>();
        app.register_type::<lifecycle::SimulationPhase>();
        app.register_type::<lifecycle::SceneReload>();

        app.add_event::<effects::MotionEffectEvent>();
        app.add_event::<lifecycle::ReloadRequested>();
        app.add_event::<lifecycle::LevelReloaded>();
        app.add_event::<checkpoint::CheckpointActivated>();

        app.insert_resource(self.layers);
        app.init_resource::<lifecycle::SimulationPhase>();
        app.init_resource::<lifecycle::SceneReload>();
        app.init_resource::<checkpoint::ActiveCheckpoint>();
        app.init_resource::<rooms::RoomGrid>();

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.configure_sets(
            FixedUpdate,
            (
                DrillControllerSet::Simulation.run_if(lifecycle::simulation_active),
                DrillControllerSet::Sync,
            )
                .chain(),
        );

        app.add_systems(PreUpdate, systems::initialize_controllers);
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(DrillControllerSet::Sync),
        );

        // Frame-rate systems: reload sequencing, then things that react to it
        app.add_systems(
            Update,
            (
                lifecycle::request_reload_on_reset,
                lifecycle::begin_scene_reload,
                lifecycle::advance_scene_reload,
                systems::respawn_players::<B>,
                checkpoint::activate_checkpoints,
                checkpoint::sync_checkpoint_flags,
                rooms::follow_rooms,
                presentation::update_presentation,
                lifecycle::apply_simulation_phase,
            )
                .chain(),
        );
    }
}
