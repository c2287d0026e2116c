//! Error types

use thiserror::Error;

/// Errors raised while creating or mutating a physics world
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("gravity vector must be finite")]
    InvalidGravity,

    #[error("world body capacity must be non-zero")]
    ZeroCapacity,

    #[error("world is full ({capacity} bodies)")]
    BodyLimit { capacity: usize },

    #[error("line endpoints are too close to form a body")]
    DegenerateLine,

    #[error("circle radius must be positive and finite")]
    InvalidRadius,

    #[error("body handle is stale or belongs to another world")]
    StaleHandle,

    #[error("physics world has been destroyed")]
    WorldDestroyed,

    #[error("failed to start physics stepper: {0}")]
    StepperSpawn(String),
}

/// Errors raised while loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}
