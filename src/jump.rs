//! Jump resolver stage.
//!
//! Buffering and coyote time are one condition: a pending press launches as
//! soon as the character is grounded or inside the coyote window, for as long
//! as the press itself is inside the buffer window.

use bevy::prelude::*;

use crate::config::TuningProfile;
use crate::state::MovementState;

/// Where a character is in the jump state machine.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpPhase {
    /// No press pending.
    Idle,
    /// A press is waiting for ground or coyote contact.
    Queued,
    /// A press launched during the current tick.
    Launched,
}

/// Result of resolving the pending press for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpResolution {
    /// Nothing was pending.
    Idle,
    /// A press is still waiting.
    Pending,
    /// The press launched; the impulse must be applied to the body.
    Launched {
        /// Upward impulse.
        impulse: Vec2,
    },
    /// The press outlived its buffer window and was dropped.
    Expired,
}

impl JumpResolution {
    /// Whether this tick launched a jump.
    #[inline]
    pub fn launched(&self) -> bool {
        matches!(self, JumpResolution::Launched { .. })
    }
}

impl MovementState {
    /// Current jump phase.
    pub fn jump_phase(&self) -> JumpPhase {
        if self.jumped_this_tick {
            JumpPhase::Launched
        } else if self.is_jump_queued() {
            JumpPhase::Queued
        } else {
            JumpPhase::Idle
        }
    }
}

/// Resolve the pending jump press at time `now`.
///
/// On launch the vertical velocity is zeroed, gravity goes back to normal, the
/// press is consumed, any early-release cut is cleared and the coyote window
/// is closed so the same ground contact cannot launch twice.
pub fn resolve_jump(
    state: &mut MovementState,
    profile: &TuningProfile,
    now: f64,
) -> JumpResolution {
    let Some(pressed_at) = state.jump_queued_at else {
        return JumpResolution::Idle;
    };

    let within_buffer = now - pressed_at <= f64::from(profile.jump_buffer_window);
    if !within_buffer {
        state.jump_queued_at = None;
        return JumpResolution::Expired;
    }

    let within_coyote = now - state.last_grounded_time <= f64::from(profile.coyote_time);
    if !(state.grounded || within_coyote) {
        return JumpResolution::Pending;
    }

    state.jump_queued_at = None;
    state.jump_canceled = false;
    state.last_grounded_time = f64::NEG_INFINITY;
    state.launched = true;
    state.velocity.y = 0.0;
    state.gravity_scale = profile.gravity_normal;
    state.jumped_this_tick = true;

    JumpResolution::Launched {
        impulse: Vec2::Y * profile.jump_force,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Binary-exact values keep the window boundaries free of rounding.
    fn profile() -> TuningProfile {
        TuningProfile::snappy()
            .with_jump_buffer_window(0.25)
            .with_coyote_time(0.125)
    }

    fn grounded_at(time: f64) -> MovementState {
        let mut state = MovementState::new();
        state.grounded = true;
        state.last_grounded_time = time;
        state
    }

    #[test]
    fn nothing_pending_is_idle() {
        let mut state = grounded_at(0.0);
        assert_eq!(resolve_jump(&mut state, &profile(), 0.0), JumpResolution::Idle);
        assert_eq!(state.jump_phase(), JumpPhase::Idle);
    }

    #[test]
    fn grounded_press_launches_immediately() {
        let mut state = grounded_at(1.0);
        state.velocity = Vec2::new(2.0, -1.0);
        state.gravity_scale = 3.5;
        state.press_jump(1.0);

        let resolution = resolve_jump(&mut state, &profile(), 1.0);

        assert_eq!(
            resolution,
            JumpResolution::Launched {
                impulse: Vec2::Y * profile().jump_force
            }
        );
        assert_eq!(state.velocity, Vec2::new(2.0, 0.0));
        assert_eq!(state.gravity_scale, profile().gravity_normal);
        assert!(!state.is_jump_queued());
        assert!(state.launched);
        assert_eq!(state.jump_phase(), JumpPhase::Launched);
    }

    #[test]
    fn buffered_press_launches_on_contact_at_window_edge() {
        let mut state = MovementState::new();
        state.press_jump(1.0);

        assert_eq!(resolve_jump(&mut state, &profile(), 1.125), JumpResolution::Pending);
        assert_eq!(state.jump_phase(), JumpPhase::Queued);

        // Contact arrives exactly one buffer window after the press
        state.grounded = true;
        state.last_grounded_time = 1.25;
        assert!(resolve_jump(&mut state, &profile(), 1.25).launched());
    }

    #[test]
    fn buffered_press_past_window_is_dropped() {
        let mut state = MovementState::new();
        state.press_jump(1.0);

        // Contact arrives just after the buffer window
        state.grounded = true;
        state.last_grounded_time = 1.25 + 1.0 / 64.0;

        assert_eq!(
            resolve_jump(&mut state, &profile(), 1.25 + 1.0 / 64.0),
            JumpResolution::Expired
        );
        assert!(!state.is_jump_queued());

        // A stale press must not come back later
        assert_eq!(resolve_jump(&mut state, &profile(), 1.5), JumpResolution::Idle);
    }

    #[test]
    fn coyote_press_launches_inside_window() {
        let mut state = grounded_at(2.0);
        state.grounded = false;
        state.press_jump(2.125);

        assert!(resolve_jump(&mut state, &profile(), 2.125).launched());
    }

    #[test]
    fn coyote_press_after_window_waits() {
        let mut state = grounded_at(2.0);
        state.grounded = false;
        state.press_jump(2.125 + 1.0 / 64.0);

        assert_eq!(
            resolve_jump(&mut state, &profile(), 2.125 + 1.0 / 64.0),
            JumpResolution::Pending
        );
        assert!(state.is_jump_queued());
    }

    #[test]
    fn coyote_window_is_consumed_by_launch() {
        let mut state = grounded_at(2.0);
        state.grounded = false;
        state.press_jump(2.0);
        assert!(resolve_jump(&mut state, &profile(), 2.0).launched());

        state.jumped_this_tick = false;
        state.press_jump(2.0625);
        assert_eq!(resolve_jump(&mut state, &profile(), 2.0625), JumpResolution::Pending);
    }

    #[test]
    fn launch_clears_cut() {
        let mut state = grounded_at(0.0);
        state.jump_canceled = true;
        state.press_jump(0.0);

        assert!(resolve_jump(&mut state, &profile(), 0.0).launched());
        assert!(!state.is_jump_canceled());
    }

    #[test]
    fn zero_buffer_window_still_launches_same_tick() {
        let profile = profile().with_jump_buffer_window(0.0);
        let mut state = grounded_at(3.0);
        state.press_jump(3.0);

        assert!(resolve_jump(&mut state, &profile, 3.0).launched());
    }
}
