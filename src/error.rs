//! Error types.
//!
//! Configuration mistakes and missing capabilities are reported once, when a
//! character is activated. Nothing in the per-tick pipeline can fail: an
//! expired jump press is unconsumed intent, not an error.

use bevy::prelude::*;
use thiserror::Error;

/// Errors in tuning configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A preset tag outside the closed set of presets.
    #[error("unknown tuning preset `{0}` (expected `snappy` or `relaxed`)")]
    UnknownPreset(String),

    /// A tuning field holds a value the movement pipeline cannot work with.
    #[error("tuning field `{field}` must be {requirement}, got {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable constraint.
        requirement: &'static str,
        /// The rejected value.
        value: f32,
    },
}

/// Errors that abort activation of a character.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    /// The entity has no physics body the backend can drive.
    #[error("character {0} has no physics body")]
    MissingBody(Entity),

    /// The entity has no collider to probe the ground with.
    #[error("character {0} has no collider")]
    MissingCollider(Entity),

    /// Keyboard bindings are attached but an action has no key.
    #[error("character {entity} has no key bound to `{action}`")]
    UnboundInput {
        /// The character entity.
        entity: Entity,
        /// The unbound action.
        action: &'static str,
    },

    /// The character's tuning profile failed validation.
    #[error("character {entity} has an invalid tuning profile: {source}")]
    InvalidProfile {
        /// The character entity.
        entity: Entity,
        /// What was wrong with the profile.
        #[source]
        source: ConfigError,
    },
}
