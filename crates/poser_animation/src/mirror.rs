//! Sprite mirroring hook
//!
//! Layer flips mirror named body parts through the host's renderer. The
//! layer stack only asks; the host decides what "mirrored" means.

use crate::animator::ActorId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("mirror failed: {0}")]
pub struct MirrorError(pub String);

/// Host-side mirroring of named body parts
pub trait MirrorHost {
    fn set_mirrored(
        &mut self,
        actor: ActorId,
        parts: &[String],
        mirrored: bool,
    ) -> Result<(), MirrorError>;
}

/// Mirror host that does nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMirror;

impl MirrorHost for NoopMirror {
    fn set_mirrored(&mut self, _: ActorId, _: &[String], _: bool) -> Result<(), MirrorError> {
        Ok(())
    }
}

/// Call the host and log instead of failing
pub(crate) fn set_mirrored_logged(
    host: &mut dyn MirrorHost,
    actor: ActorId,
    parts: &[String],
    mirrored: bool,
) {
    if let Err(err) = host.set_mirrored(actor, parts, mirrored) {
        tracing::warn!(?actor, ?parts, mirrored, "{err}");
    }
}
