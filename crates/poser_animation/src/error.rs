//! Animation error types

use crate::animator::ActorId;
use poser_core::ConfigError;
use poser_rig::RigError;
use thiserror::Error;

/// Errors surfaced by explicit [`Animator`](crate::Animator) calls
///
/// Per-frame processing never fails; these only come back from API calls
/// that name something that does not exist or carry unusable data.
#[derive(Error, Debug)]
pub enum AnimError {
    #[error("Unknown actor: {0:?}")]
    UnknownActor(ActorId),

    #[error("Weapon rig error: {0}")]
    Rig(#[from] RigError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimError>;
