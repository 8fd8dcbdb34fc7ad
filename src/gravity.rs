//! Gravity shaper stage.
//!
//! Picks one of three gravity scales from the vertical velocity and the
//! jump-cut flag, then clamps terminal fall speed. Gravity itself is applied
//! by the physics integrator.

use bevy::prelude::*;

use crate::config::TuningProfile;
use crate::state::MovementState;

/// The gravity regime for a tick.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityPhase {
    /// Rising or resting.
    Normal,
    /// Moving down.
    Falling,
    /// Rising after an early jump release.
    JumpCut,
}

impl GravityPhase {
    /// Select the phase, in priority order: falling, jump cut, normal.
    pub fn select(vertical_velocity: f32, jump_canceled: bool) -> Self {
        if vertical_velocity < 0.0 {
            GravityPhase::Falling
        } else if jump_canceled && vertical_velocity > 0.0 {
            GravityPhase::JumpCut
        } else {
            GravityPhase::Normal
        }
    }

    /// Gravity scale for this phase.
    pub fn scale(self, profile: &TuningProfile) -> f32 {
        match self {
            GravityPhase::Normal => profile.gravity_normal,
            GravityPhase::Falling => profile.gravity_fall,
            GravityPhase::JumpCut => profile.gravity_jump_cut,
        }
    }
}

/// Clamp a vertical velocity to the (negative) terminal fall speed.
#[inline]
pub fn clamp_fall_speed(vertical_velocity: f32, max_fall_speed: f32) -> f32 {
    vertical_velocity.max(max_fall_speed)
}

/// Apply the gravity stage to the state and return the chosen phase.
pub fn shape_gravity(state: &mut MovementState, profile: &TuningProfile) -> GravityPhase {
    let phase = GravityPhase::select(state.velocity.y, state.jump_canceled);
    state.gravity_scale = phase.scale(profile);
    state.velocity.y = clamp_fall_speed(state.velocity.y, profile.max_fall_speed);
    phase
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falling_wins_over_cut() {
        assert_eq!(GravityPhase::select(-1.0, true), GravityPhase::Falling);
        assert_eq!(GravityPhase::select(-1.0, false), GravityPhase::Falling);
    }

    #[test]
    fn cut_only_while_rising() {
        assert_eq!(GravityPhase::select(2.0, true), GravityPhase::JumpCut);
        assert_eq!(GravityPhase::select(0.0, true), GravityPhase::Normal);
        assert_eq!(GravityPhase::select(2.0, false), GravityPhase::Normal);
    }

    #[test]
    fn scales_come_from_profile() {
        let profile = TuningProfile::snappy();
        assert_eq!(GravityPhase::Normal.scale(&profile), 1.0);
        assert_eq!(GravityPhase::Falling.scale(&profile), 3.5);
        assert_eq!(GravityPhase::JumpCut.scale(&profile), 5.0);
    }

    #[test]
    fn fall_speed_is_clamped() {
        assert_eq!(clamp_fall_speed(-40.0, -25.0), -25.0);
        assert_eq!(clamp_fall_speed(-10.0, -25.0), -10.0);
        assert_eq!(clamp_fall_speed(12.0, -25.0), 12.0);
    }

    #[test]
    fn shape_gravity_updates_state() {
        let profile = TuningProfile::snappy();
        let mut state = MovementState::new();
        state.velocity = Vec2::new(1.0, -100.0);

        assert_eq!(shape_gravity(&mut state, &profile), GravityPhase::Falling);
        assert_eq!(state.gravity_scale, profile.gravity_fall);
        assert_eq!(state.velocity, Vec2::new(1.0, profile.max_fall_speed));
    }

    #[test]
    fn released_ascent_uses_cut_scale() {
        let profile = TuningProfile::snappy();
        let mut state = MovementState::new();
        state.velocity = Vec2::new(0.0, 6.0);
        assert!(state.release_jump());

        assert_eq!(shape_gravity(&mut state, &profile), GravityPhase::JumpCut);
        assert_eq!(state.gravity_scale, profile.gravity_jump_cut);
    }
}
