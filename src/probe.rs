//! Ground probe stage.
//!
//! Turns the backend's raw shape-cast results ([`ProbeHits`]) into the
//! grounded flag, the coyote timestamp and the head-bump nudge. The probe
//! never touches the pending jump press.

use bevy::prelude::*;

use crate::config::TuningProfile;
use crate::state::{MovementState, ProbeHits, VERTICAL_EPSILON};

/// What the ground probe changed this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProbeOutcome {
    /// The character touched down this tick (airborne → grounded edge).
    pub landed: bool,
    /// The character left the ground this tick (grounded → airborne edge).
    pub took_off: bool,
    /// Horizontal impulse to slide off a ceiling corner.
    pub nudge: Option<Vec2>,
}

/// Apply one tick of probe results to the movement state.
///
/// While grounded, `last_grounded_time` follows `now` so the coyote window
/// opens at the moment contact is lost. Landing restores normal gravity and
/// clears an early-release cut; taking off leaves jump state alone.
///
/// While airborne with vertical motion, a head hit yields a nudge of
/// `nudge_amount` opposite to the horizontal velocity.
pub fn apply_ground_probe(
    state: &mut MovementState,
    profile: &TuningProfile,
    hits: ProbeHits,
    now: f64,
) -> ProbeOutcome {
    let was_grounded = state.grounded;
    state.grounded = hits.ground;
    state.launched = false;

    let mut outcome = ProbeOutcome {
        landed: hits.ground && !was_grounded,
        took_off: !hits.ground && was_grounded,
        nudge: None,
    };

    if state.grounded {
        state.last_grounded_time = now;
        if outcome.landed {
            state.jump_canceled = false;
            state.gravity_scale = profile.gravity_normal;
        }
    } else if hits.head && state.velocity.y.abs() > VERTICAL_EPSILON {
        let direction = if state.velocity.x > 0.0 { -1.0 } else { 1.0 };
        outcome.nudge = Some(Vec2::new(direction * profile.nudge_amount, 0.0));
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> TuningProfile {
        TuningProfile::snappy()
    }

    fn contact(state: &mut MovementState, ground: bool, head: bool, now: f64) -> ProbeOutcome {
        apply_ground_probe(state, &profile(), ProbeHits::new(ground, head), now)
    }

    #[test]
    fn landing_edge_resets_cut_and_gravity() {
        let mut state = MovementState::new();
        state.jump_canceled = true;
        state.gravity_scale = 5.0;

        let outcome = contact(&mut state, true, false, 2.0);

        assert!(outcome.landed);
        assert!(!outcome.took_off);
        assert!(state.is_grounded());
        assert!(!state.is_jump_canceled());
        assert_eq!(state.gravity_scale, profile().gravity_normal);
        assert_eq!(state.last_grounded_time(), 2.0);
    }

    #[test]
    fn staying_grounded_refreshes_timestamp_without_edge() {
        let mut state = MovementState::new();
        contact(&mut state, true, false, 1.0);

        let outcome = contact(&mut state, true, false, 1.5);
        assert!(!outcome.landed);
        assert_eq!(state.last_grounded_time(), 1.5);
    }

    #[test]
    fn take_off_keeps_jump_state() {
        let mut state = MovementState::new();
        contact(&mut state, true, false, 1.0);
        state.press_jump(1.2);
        state.jump_canceled = true;

        let outcome = contact(&mut state, false, false, 1.3);

        assert!(outcome.took_off);
        assert!(!state.is_grounded());
        assert_eq!(state.last_grounded_time(), 1.0);
        assert!(state.is_jump_canceled());
        assert_eq!(state.jump_queued_at(), Some(1.2));
    }

    #[test]
    fn probe_clears_launch_latch() {
        let mut state = MovementState::new();
        contact(&mut state, true, false, 1.0);
        state.launched = true;

        contact(&mut state, false, false, 1.1);
        assert!(!state.launched);
    }

    #[test]
    fn probe_never_touches_pending_press() {
        let mut state = MovementState::new();
        state.press_jump(0.5);

        contact(&mut state, true, false, 0.6);
        assert_eq!(state.jump_queued_at(), Some(0.5));
    }

    #[test]
    fn head_hit_nudges_against_horizontal_velocity() {
        let mut state = MovementState::new();
        state.velocity = Vec2::new(3.0, 4.0);

        let outcome = contact(&mut state, false, true, 1.0);
        assert_eq!(outcome.nudge, Some(Vec2::new(-profile().nudge_amount, 0.0)));

        state.velocity = Vec2::new(-3.0, 4.0);
        let outcome = contact(&mut state, false, true, 1.1);
        assert_eq!(outcome.nudge, Some(Vec2::new(profile().nudge_amount, 0.0)));
    }

    #[test]
    fn head_hit_without_vertical_motion_does_not_nudge() {
        let mut state = MovementState::new();
        state.velocity = Vec2::new(3.0, 0.0);

        let outcome = contact(&mut state, false, true, 1.0);
        assert_eq!(outcome.nudge, None);
    }

    #[test]
    fn head_hit_while_grounded_does_not_nudge() {
        let mut state = MovementState::new();
        state.velocity = Vec2::new(3.0, 2.0);

        let outcome = contact(&mut state, true, true, 1.0);
        assert_eq!(outcome.nudge, None);
    }
}
