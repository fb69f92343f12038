//! Poser Rig
//!
//! Forward kinematics over the fighter skeleton and the weapon rig solver
//! that hangs weapon bones, grips, and colliders off it.
//!
//! # Example
//!
//! ```rust
//! use poser_core::{DampingConfig, JointMap, SkeletonConfig, Vec2};
//! use poser_rig::{RigBone, RigFrame, SegmentLengths, WeaponRig, WeaponState};
//! use std::sync::Arc;
//!
//! let rig = WeaponRig::new("spear")
//!     .with_bone(RigBone::new("shaft", 60.0).with_haft(0.2, 0.8))
//!     .validated()
//!     .unwrap();
//!
//! let skeleton = SkeletonConfig::default();
//! let lengths = SegmentLengths::from_skeleton(&skeleton);
//! let target = JointMap::splat(0.0);
//! let damping = DampingConfig::default();
//!
//! let mut weapon = WeaponState::new();
//! weapon.equip(Arc::new(rig));
//! let snapshot = weapon
//!     .update(&RigFrame {
//!         position: Vec2::ZERO,
//!         facing_sign: 1.0,
//!         target: &target,
//!         lengths: &lengths,
//!         skeleton: &skeleton,
//!         shoulder_offsets: [Vec2::ZERO; 2],
//!         top_pose: None,
//!         wrist_rotation_deg: None,
//!         damping: &damping,
//!         dt: 1.0 / 60.0,
//!     })
//!     .unwrap();
//! assert_eq!(snapshot.bones.len(), 1);
//! ```

pub mod error;
pub mod ik;
pub mod kinematics;
pub mod rig;
pub mod solver;

pub use error::{Result, RigError};
pub use ik::{solve_two_bone, TwoBoneSolution};
pub use kinematics::{compute_pose_basis, AnchorPose, BasisInput, PoseBasis, SegmentLengths};
pub use rig::{AnchorRef, ColliderDef, ColliderShape, GripDef, RigBone, WeaponRig};
pub use solver::{
    Attachment, PlacedBone, PlacedCollider, PlacedGrip, RigFrame, RigSnapshot, WeaponState,
};
