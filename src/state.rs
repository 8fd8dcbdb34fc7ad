//! Per-character movement state.
//!
//! [`MovementState`] is created once when a character is activated, mutated
//! only by the fixed-tick pipeline and the input drain, and replaced (never
//! reset) on respawn. The marker components mirror parts of it for queries.

use bevy::prelude::*;

use crate::error::SetupError;

/// Vertical speeds at or below this magnitude count as "not moving vertically".
pub(crate) const VERTICAL_EPSILON: f32 = 0.001;

/// Movement state owned by a single character.
///
/// Input events write to it between ticks through [`set_move_axis`],
/// [`press_jump`] and [`release_jump`]; the pipeline reads those latches at
/// the next tick boundary.
///
/// [`set_move_axis`]: MovementState::set_move_axis
/// [`press_jump`]: MovementState::press_jump
/// [`release_jump`]: MovementState::release_jump
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct MovementState {
    /// Linear velocity as of the last pipeline stage that touched it.
    pub velocity: Vec2,
    /// Gravity scale chosen for the current tick.
    pub gravity_scale: f32,

    pub(crate) grounded: bool,
    pub(crate) last_grounded_time: f64,
    pub(crate) jump_queued_at: Option<f64>,
    pub(crate) jump_canceled: bool,
    // Set on launch, cleared by the next probe. Grounded is stale until then.
    pub(crate) launched: bool,
    pub(crate) move_axis: f32,

    // Signal latches
    pub(crate) walking: bool,
    pub(crate) jumped_this_tick: bool,
}

impl Default for MovementState {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            gravity_scale: 1.0,
            grounded: false,
            // No coyote grace before the first contact.
            last_grounded_time: f64::NEG_INFINITY,
            jump_queued_at: None,
            jump_canceled: false,
            launched: false,
            move_axis: 0.0,
            walking: false,
            jumped_this_tick: false,
        }
    }
}

impl MovementState {
    /// Create a fresh state for a newly spawned (or respawned) character.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the most recent ground probe found contact.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Time of the most recent grounded tick (`-inf` before first contact).
    #[inline]
    pub fn last_grounded_time(&self) -> f64 {
        self.last_grounded_time
    }

    /// Whether a jump press is waiting to launch.
    #[inline]
    pub fn is_jump_queued(&self) -> bool {
        self.jump_queued_at.is_some()
    }

    /// Time of the pending jump press, if any.
    #[inline]
    pub fn jump_queued_at(&self) -> Option<f64> {
        self.jump_queued_at
    }

    /// Whether the player released jump early during the current ascent.
    #[inline]
    pub fn is_jump_canceled(&self) -> bool {
        self.jump_canceled
    }

    /// Latest horizontal intent in `[-1, 1]`.
    #[inline]
    pub fn move_axis(&self) -> f32 {
        self.move_axis
    }

    /// Whether the last emitted walking signal was "active".
    #[inline]
    pub fn is_walking(&self) -> bool {
        self.walking
    }

    /// Overwrite the horizontal intent.
    ///
    /// Values are clamped to `[-1, 1]`; non-finite values read as zero.
    pub fn set_move_axis(&mut self, axis: f32) {
        self.move_axis = if axis.is_finite() {
            axis.clamp(-1.0, 1.0)
        } else {
            0.0
        };
    }

    /// Record a jump press at `now`. A newer press replaces an older one.
    pub fn press_jump(&mut self, now: f64) {
        self.jump_queued_at = Some(now);
    }

    /// Record a jump release.
    ///
    /// Only a release while airborne and rising cuts the jump. A character
    /// that launched since the last probe counts as airborne. Cutting clears
    /// any pending press. Returns whether the jump was cut.
    pub fn release_jump(&mut self) -> bool {
        let airborne = !self.grounded || self.launched;
        if airborne && self.velocity.y > 0.0 {
            self.cancel_jump();
            true
        } else {
            false
        }
    }

    /// Classify the state for animation selection.
    ///
    /// Grounded characters moving faster than `run_threshold` are running.
    pub fn locomotion(&self, run_threshold: f32) -> Locomotion {
        if !self.grounded {
            Locomotion::Airborne
        } else if self.velocity.x.abs() > run_threshold {
            Locomotion::Running
        } else {
            Locomotion::Idle
        }
    }

    pub(crate) fn cancel_jump(&mut self) {
        self.jump_canceled = true;
        self.jump_queued_at = None;
    }
}

/// Coarse movement classification for animation selection.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locomotion {
    /// Grounded and (nearly) still.
    Idle,
    /// Grounded and moving.
    Running,
    /// Not touching the ground.
    Airborne,
}

/// Direction the character visually faces.
///
/// Follows the sign of the horizontal intent, not of velocity, and keeps its
/// value while the intent is inside the deadzone.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[reflect(Component)]
pub enum Facing {
    /// Facing left (sprites are flipped).
    Left,
    /// Facing right.
    #[default]
    Right,
}

impl Facing {
    /// Facing for a given axis sign.
    pub fn from_axis(axis: f32) -> Self {
        if axis < 0.0 {
            Facing::Left
        } else {
            Facing::Right
        }
    }

    /// Whether sprites should be drawn mirrored.
    #[inline]
    pub fn is_left(self) -> bool {
        self == Facing::Left
    }
}

/// Raw probe results for the current tick.
///
/// Written by the physics backend's sensor systems, consumed by the ground
/// probe stage.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[reflect(Component)]
pub struct ProbeHits {
    /// Ground found within tolerance below the collider.
    pub ground: bool,
    /// Ground found within tolerance above the collider.
    pub head: bool,
}

impl ProbeHits {
    /// Create a probe result.
    pub fn new(ground: bool, head: bool) -> Self {
        Self { ground, head }
    }
}

/// Marker component indicating the character is grounded.
///
/// Mutually exclusive with [`Airborne`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Activation was refused. The pipeline ignores this entity.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct ActivationFailed(pub SetupError);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_has_no_coyote_grace() {
        let state = MovementState::new();
        assert!(!state.is_grounded());
        assert_eq!(state.last_grounded_time(), f64::NEG_INFINITY);
        assert!(!state.is_jump_queued());
        assert!(!state.is_jump_canceled());
        assert_eq!(state.gravity_scale, 1.0);
    }

    #[test]
    fn move_axis_is_clamped_and_overwritten() {
        let mut state = MovementState::new();
        state.set_move_axis(0.5);
        assert_eq!(state.move_axis(), 0.5);

        state.set_move_axis(3.0);
        assert_eq!(state.move_axis(), 1.0);

        state.set_move_axis(-3.0);
        assert_eq!(state.move_axis(), -1.0);

        state.set_move_axis(f32::NAN);
        assert_eq!(state.move_axis(), 0.0);
    }

    #[test]
    fn press_records_time() {
        let mut state = MovementState::new();
        state.press_jump(1.5);
        assert!(state.is_jump_queued());
        assert_eq!(state.jump_queued_at(), Some(1.5));

        // A later press restarts the window
        state.press_jump(2.0);
        assert_eq!(state.jump_queued_at(), Some(2.0));
    }

    #[test]
    fn release_while_rising_cuts_and_clears_queue() {
        let mut state = MovementState::new();
        state.velocity = Vec2::new(0.0, 5.0);
        state.press_jump(1.0);

        assert!(state.release_jump());
        assert!(state.is_jump_canceled());
        assert!(!state.is_jump_queued());
    }

    #[test]
    fn release_while_falling_is_ignored() {
        let mut state = MovementState::new();
        state.velocity = Vec2::new(0.0, -5.0);
        state.press_jump(1.0);

        assert!(!state.release_jump());
        assert!(!state.is_jump_canceled());
        assert!(state.is_jump_queued());
    }

    #[test]
    fn release_while_grounded_is_ignored() {
        let mut state = MovementState::new();
        state.grounded = true;
        state.velocity = Vec2::new(0.0, 5.0);

        assert!(!state.release_jump());
        assert!(!state.is_jump_canceled());
    }

    #[test]
    fn release_right_after_launch_cuts() {
        let mut state = MovementState::new();
        state.grounded = true;
        state.launched = true;
        state.velocity = Vec2::new(0.0, 14.0);

        assert!(state.release_jump());
        assert!(state.is_jump_canceled());
    }

    #[test]
    fn timestamps_stay_precise_after_long_uptime() {
        let mut state = MovementState::new();
        let day = 86_400.0;
        state.press_jump(day + 1.0 / 64.0);
        let queued = state.jump_queued_at().unwrap_or_default();

        assert_eq!(queued - day, 1.0 / 64.0);
    }

    #[test]
    fn locomotion_thresholds_grounded_speed() {
        let mut state = MovementState::new();
        assert_eq!(state.locomotion(0.1), Locomotion::Airborne);

        state.grounded = true;
        state.velocity.x = 0.05;
        assert_eq!(state.locomotion(0.1), Locomotion::Idle);

        state.velocity.x = -2.0;
        assert_eq!(state.locomotion(0.1), Locomotion::Running);
    }

    #[test]
    fn facing_from_axis() {
        assert_eq!(Facing::from_axis(-0.5), Facing::Left);
        assert_eq!(Facing::from_axis(0.5), Facing::Right);
        assert!(Facing::Left.is_left());
        assert!(!Facing::Right.is_left());
    }
}
