//! Movement intent components.
//!
//! Intents represent the desired movement from player input or AI. The game
//! writes them every frame; the controller samples them once per fixed step.

use bevy::prelude::*;

/// Movement intent for a drill controller.
///
/// # Example
///
/// ```rust
/// use drill_character_controller::prelude::*;
///
/// let mut intent = MovementIntent::new();
/// intent.set_horizontal(1.0);
/// intent.set_jump_pressed(true);
/// assert!(intent.has_jump_request());
///
/// let input = intent.sample();
/// assert!(input.jump_pressed);
/// assert_eq!(input.horizontal_axis, 1.0);
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct MovementIntent {
    /// Horizontal movement intent (-1.0 = left, 1.0 = right).
    pub horizontal: f32,
    /// Whether the jump button is currently down.
    ///
    /// Set this every frame with [`MovementIntent::set_jump_pressed`]. A
    /// false→true transition latches a jump request that stays pending until
    /// the end of the next fixed step.
    pub jump_pressed: bool,
    /// Latched jump request.
    pub(crate) jump_queued: bool,
    /// Pending request to restart the level.
    pub(crate) reset_requested: bool,
}

impl MovementIntent {
    /// Create a new empty movement intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the horizontal direction (-1.0 = left, 1.0 = right).
    pub fn set_horizontal(&mut self, direction: f32) {
        self.horizontal = direction.clamp(-1.0, 1.0);
    }

    /// Set the jump button state.
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        if pressed && !self.jump_pressed {
            self.jump_queued = true;
        }
        self.jump_pressed = pressed;
    }

    /// Check if a jump is latched.
    pub fn has_jump_request(&self) -> bool {
        self.jump_queued
    }

    /// Drop the latched jump request.
    pub fn clear_jump_request(&mut self) {
        self.jump_queued = false;
    }

    /// Ask for the level to be restarted.
    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    /// Take the pending restart request, if any.
    pub fn take_reset_request(&mut self) -> bool {
        std::mem::take(&mut self.reset_requested)
    }

    /// Clear all movement intents, including latched requests.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Snapshot the intent for one fixed step.
    pub fn sample(&self) -> FrameInput {
        FrameInput {
            jump_pressed: self.jump_queued,
            jump_held: self.jump_pressed,
            horizontal_axis: self.horizontal,
        }
    }
}

/// Input for a single fixed step.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// A jump was requested since the last step.
    pub jump_pressed: bool,
    /// The jump button is held.
    pub jump_held: bool,
    /// Horizontal axis in `[-1, 1]`.
    pub horizontal_axis: f32,
}

impl FrameInput {
    /// Input with only a horizontal axis.
    pub fn horizontal(axis: f32) -> Self {
        Self {
            horizontal_axis: axis.clamp(-1.0, 1.0),
            ..default()
        }
    }

    /// Input with a fresh jump request.
    pub fn jump() -> Self {
        Self {
            jump_pressed: true,
            jump_held: true,
            ..default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_intent_new() {
        let intent = MovementIntent::new();
        assert_eq!(intent.horizontal, 0.0);
        assert!(!intent.jump_pressed);
        assert!(!intent.has_jump_request());
    }

    #[test]
    fn set_horizontal_clamps() {
        let mut intent = MovementIntent::new();
        intent.set_horizontal(0.5);
        assert_eq!(intent.horizontal, 0.5);

        intent.set_horizontal(5.0);
        assert_eq!(intent.horizontal, 1.0);

        intent.set_horizontal(-5.0);
        assert_eq!(intent.horizontal, -1.0);
    }

    #[test]
    fn jump_latches_on_rising_edge_only() {
        let mut intent = MovementIntent::new();

        intent.set_jump_pressed(true);
        assert!(intent.has_jump_request());

        intent.clear_jump_request();
        // Still held: no new request
        intent.set_jump_pressed(true);
        assert!(!intent.has_jump_request());

        // Released then pressed again
        intent.set_jump_pressed(false);
        intent.set_jump_pressed(true);
        assert!(intent.has_jump_request());
    }

    #[test]
    fn latch_survives_release_until_cleared() {
        let mut intent = MovementIntent::new();
        intent.set_jump_pressed(true);
        intent.set_jump_pressed(false);

        let input = intent.sample();
        assert!(input.jump_pressed);
        assert!(!input.jump_held);
    }

    #[test]
    fn reset_request_is_taken_once() {
        let mut intent = MovementIntent::new();
        intent.request_reset();
        assert!(intent.take_reset_request());
        assert!(!intent.take_reset_request());
    }

    #[test]
    fn clear_drops_everything() {
        let mut intent = MovementIntent::new();
        intent.set_horizontal(1.0);
        intent.set_jump_pressed(true);
        intent.request_reset();

        intent.clear();
        assert_eq!(intent.horizontal, 0.0);
        assert!(!intent.has_jump_request());
        assert!(!intent.take_reset_request());
    }
}
