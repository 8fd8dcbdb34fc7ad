//! Horizontal mover stage.
//!
//! Velocity approaches its target linearly and never overshoots in a single
//! tick. Ground and air use different rates, input is damped in the air, and
//! grounded characters without input get extra friction.

use crate::config::TuningProfile;
use crate::state::{Facing, MovementState};

/// Move `current` toward `target` by at most `max_delta`.
///
/// Never overshoots. A negative `max_delta` is treated as zero.
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let max_delta = max_delta.max(0.0);
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + diff.signum() * max_delta
    }
}

/// Target horizontal speed for an axis value and contact state.
pub fn target_speed(axis: f32, grounded: bool, profile: &TuningProfile) -> f32 {
    let input = if grounded {
        axis
    } else {
        axis * profile.air_control_multiplier
    };
    input * profile.top_speed(grounded)
}

/// Compute the next horizontal velocity.
pub fn horizontal_step(
    current: f32,
    axis: f32,
    grounded: bool,
    profile: &TuningProfile,
    dt: f32,
) -> f32 {
    let accel = if grounded {
        profile.ground_acceleration
    } else {
        profile.air_acceleration
    };

    let mut next = move_towards(current, target_speed(axis, grounded, profile), accel * dt);

    if grounded && axis.abs() <= profile.input_deadzone {
        next = move_towards(next, 0.0, profile.ground_friction * dt);
    }

    next
}

/// Facing after reading `axis`; unchanged inside the deadzone.
pub fn facing_for(current: Facing, axis: f32, profile: &TuningProfile) -> Facing {
    if axis.abs() > profile.input_deadzone {
        Facing::from_axis(axis)
    } else {
        current
    }
}

/// Apply the horizontal stage to the state.
pub fn apply_horizontal(state: &mut MovementState, profile: &TuningProfile, dt: f32) {
    state.velocity.x = horizontal_step(
        state.velocity.x,
        state.move_axis,
        state.grounded,
        profile,
        dt,
    );
}
