//! Rig error types

use thiserror::Error;

/// Errors raised by weapon rig loading and grip bookkeeping
#[derive(Error, Debug)]
pub enum RigError {
    /// Rig document could not be decoded
    #[error("Invalid weapon rig: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rig decoded but has unusable values
    #[error("Invalid weapon rig {rig}: {reason}")]
    Invalid { rig: String, reason: String },

    /// A grip id that the equipped rig does not define
    #[error("Unknown grip: {0}")]
    UnknownGrip(String),

    /// A bone id that the equipped rig does not define
    #[error("Unknown bone: {0}")]
    UnknownBone(String),
}

/// Result type for rig operations
pub type Result<T> = std::result::Result<T, RigError>;
