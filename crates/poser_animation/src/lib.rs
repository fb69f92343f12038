//! Poser Animation System
//!
//! Procedural gait, pose layers, aiming, breathing, and the per-frame driver
//! that resolves them into live joint angles.
//!
//! # Features
//!
//! - **Gait**: sinusoidal walk cycle with damped amplitude, gated on speed
//! - **Layers**: timed, prioritized, maskable pose overrides with events
//! - **Deferred Pushes**: guarded, cancellable, awaitable layer pushes
//! - **Aiming**: torso/shoulder/hip offsets and head tracking from an aim angle
//! - **Weapons**: rig snapshots from `poser_rig`, updated every frame
//!
//! # Example
//!
//! ```rust
//! use poser_animation::{Animator, ManualClock};
//! use poser_core::{FighterConfig, Joint, Pose};
//! use std::sync::Arc;
//!
//! let clock = ManualClock::new();
//! let mut animator = Animator::new(clock.clone());
//! let fighter = animator.spawn(Arc::new(FighterConfig::default()));
//!
//! animator.push(fighter, Pose::new().with(Joint::Torso, 10.0), 100.0).unwrap();
//! clock.advance(16.0);
//! animator.tick();
//!
//! let pose = animator.actor(fighter).unwrap().state.active_pose();
//! assert_eq!(pose[Joint::Torso], 10.0);
//! ```

pub mod aim;
pub mod animator;
pub mod breathing;
pub mod clock;
pub mod deferred;
pub mod error;
pub mod gait;
pub mod layers;
pub mod mirror;
mod pipeline;

pub use aim::{AimInput, AimState, Facing, HipAim};
pub use animator::{
    Actor, ActorBody, ActorId, AnimationState, Animator, GravityReset, LengthState,
    RagdollTarget, MAX_FRAME_DT,
};
pub use breathing::BreathState;
pub use clock::{Clock, ManualClock, SystemClock};
pub use deferred::{DeferredOptions, PushHandle, SettleReason};
pub use error::{AnimError, Result};
pub use gait::{GaitInput, GaitPose, WalkState};
pub use layers::{Layer, LayerDuration, LayerOptions, LayerSignal, LayerStack, PRIMARY_LAYER};
pub use mirror::{MirrorError, MirrorHost, NoopMirror};
