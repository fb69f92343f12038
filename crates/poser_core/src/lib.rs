//! Poser Core
//!
//! Foundational types shared by the pose pipeline:
//!
//! - **Keys**: canonical joint, anchor, and bone enums with alias parsing
//! - **Poses**: degree-valued joint targets plus bounded extension fields
//! - **Layer events**: time-keyed velocity, impulse, gravity, and grip events
//! - **Math**: angle wrapping, exponential damping, easing
//! - **Configuration**: per-fighter stance, gait, aim, breathing, skeleton
//!
//! # Example
//!
//! ```rust
//! use poser_core::{damp, Joint, Pose};
//!
//! let pose = Pose::new().with(Joint::Torso, 10.0);
//! assert_eq!(pose.get(Joint::Torso), Some(10.0));
//!
//! let next = damp(0.0, 1.0, 10.0, 1.0 / 60.0);
//! assert!(next > 0.0 && next < 1.0);
//! ```

pub mod config;
pub mod error;
pub mod events;
mod lenient;
pub mod joint;
pub mod math;
pub mod pose;

pub use config::{
    AimConfig, BreathKeyframe, BreathingSpec, DampingConfig, FighterConfig, GaitConfig,
    HeadConfig, LayerConfig, SkeletonConfig,
};
pub use error::{ConfigError, Result};
pub use events::{ImpulseFrame, LayerEvent, LayerEventKind};
pub use joint::{canonicalize_limb, Anchor, BoneKey, Joint, JointMap, JointMask, Limb, Side};
pub use math::{clamp_abs, damp, damp_angle, damp_factor, lerp, normalize_angle, smoothstep, Easing, Vec2};
pub use pose::{FlipSpec, FullFlipSpec, LengthMode, LengthOverride, Pose};
