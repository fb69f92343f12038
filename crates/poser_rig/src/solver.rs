//! Weapon rig solver
//!
//! Places an equipped rig's bones, grips, and colliders against the skeleton
//! once per frame. The only state carried between frames is the damped
//! grip/joint percentages and a short-lag copy of the arm joints; every
//! placement is rebuilt from scratch into a fresh [`RigSnapshot`].

use crate::error::{Result, RigError};
use crate::kinematics::{compute_pose_basis, BasisInput, PoseBasis, SegmentLengths};
use crate::rig::{AnchorRef, ColliderShape, RigBone, WeaponRig};
use poser_core::{
    damp, damp_angle, Anchor, DampingConfig, Joint, JointMap, Limb, Pose, Side, SkeletonConfig,
    Vec2,
};
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;

/// A hand holding a grip
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub grip: String,
    pub bone: String,
}

/// One placed weapon bone, world space
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlacedBone {
    pub id: String,
    pub anchor: Anchor,
    pub start: Vec2,
    pub end: Vec2,
    pub pivot: Vec2,
    /// World direction from start to end
    pub angle: f32,
    pub length: f32,
    /// Pivot position along the bone after haft mapping, `0..=1`
    pub pivot_percent: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlacedGrip {
    pub id: String,
    pub bone: String,
    pub pos: Vec2,
    pub percent: f32,
    pub held_by: Option<Limb>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlacedCollider {
    pub id: String,
    pub bone: String,
    pub from: Vec2,
    pub to: Vec2,
    pub shape: ColliderShape,
}

/// Read-only result of one solver pass
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RigSnapshot {
    pub weapon_key: String,
    pub bones: Vec<PlacedBone>,
    pub grips: Vec<PlacedGrip>,
    pub colliders: Vec<PlacedCollider>,
    pub grip_percents: FxHashMap<String, f32>,
    pub joint_percents: FxHashMap<String, f32>,
    pub attachments: SmallVec<[(Limb, Attachment); 2]>,
}

impl RigSnapshot {
    pub fn bone(&self, id: &str) -> Option<&PlacedBone> {
        self.bones.iter().find(|b| b.id == id)
    }

    pub fn grip(&self, id: &str) -> Option<&PlacedGrip> {
        self.grips.iter().find(|g| g.id == id)
    }
}

/// Per-frame inputs for [`WeaponState::update`]
#[derive(Clone, Copy, Debug)]
pub struct RigFrame<'a> {
    pub position: Vec2,
    pub facing_sign: f32,
    /// Resolved target angles in radians
    pub target: &'a JointMap<f32>,
    pub lengths: &'a SegmentLengths,
    pub skeleton: &'a SkeletonConfig,
    pub shoulder_offsets: [Vec2; 2],
    /// Highest-priority active pose, source of percent targets
    pub top_pose: Option<&'a Pose>,
    /// Resolved wrist rotation in degrees
    pub wrist_rotation_deg: Option<f32>,
    pub damping: &'a DampingConfig,
    /// Seconds
    pub dt: f32,
}

/// Weapon state owned by one actor
#[derive(Debug, Default)]
pub struct WeaponState {
    rig: Option<Arc<WeaponRig>>,
    grip_percents: FxHashMap<String, f32>,
    joint_percents: FxHashMap<String, f32>,
    grip_targets: FxHashMap<String, f32>,
    joint_targets: FxHashMap<String, f32>,
    attachments: SmallVec<[(Limb, Attachment); 2]>,
    arm_lag: Option<JointMap<f32>>,
    snapshot: Option<RigSnapshot>,
}

fn clamp_percent(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

impl WeaponState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equip a rig, seeding percentages from its authored defaults
    pub fn equip(&mut self, rig: Arc<WeaponRig>) {
        tracing::debug!("equipping weapon rig {}", rig.key);
        self.unequip();
        for bone in &rig.bones {
            self.joint_percents
                .insert(bone.id.clone(), bone.default_joint_percent);
            for grip in &bone.grips {
                self.grip_percents.insert(grip.id.clone(), grip.percent);
            }
        }
        self.rig = Some(rig);
    }

    /// Drop the rig and every piece of state derived from it
    pub fn unequip(&mut self) {
        if let Some(rig) = self.rig.take() {
            tracing::debug!("unequipping weapon rig {}", rig.key);
        }
        self.grip_percents.clear();
        self.joint_percents.clear();
        self.grip_targets.clear();
        self.joint_targets.clear();
        self.attachments.clear();
        self.arm_lag = None;
        self.snapshot = None;
    }

    pub fn rig(&self) -> Option<&Arc<WeaponRig>> {
        self.rig.as_ref()
    }

    /// Last snapshot, `None` when nothing usable is equipped
    pub fn snapshot(&self) -> Option<&RigSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn joint_percent(&self, bone_id: &str) -> Option<f32> {
        self.joint_percents.get(bone_id).copied()
    }

    pub fn grip_percent(&self, grip_id: &str) -> Option<f32> {
        self.grip_percents.get(grip_id).copied()
    }

    pub fn attachment(&self, limb: Limb) -> Option<&Attachment> {
        self.attachments
            .iter()
            .find(|(l, _)| *l == limb)
            .map(|(_, a)| a)
    }

    pub fn set_joint_percent_target(&mut self, bone_id: &str, percent: f32) -> Result<()> {
        let rig = self.rig.as_ref().ok_or_else(|| RigError::UnknownBone(bone_id.to_string()))?;
        let bone = rig
            .bone(bone_id)
            .ok_or_else(|| RigError::UnknownBone(bone_id.to_string()))?;
        let value = clamp_percent(percent, bone.default_joint_percent);
        self.joint_targets.insert(bone_id.to_string(), value);
        Ok(())
    }

    pub fn set_grip_percent_target(&mut self, grip_id: &str, percent: f32) -> Result<()> {
        let rig = self.rig.as_ref().ok_or_else(|| RigError::UnknownGrip(grip_id.to_string()))?;
        let default = rig
            .grip_owner(grip_id)
            .and_then(|b| b.grips.iter().find(|g| g.id == grip_id))
            .map(|g| g.percent)
            .ok_or_else(|| RigError::UnknownGrip(grip_id.to_string()))?;
        self.grip_targets
            .insert(grip_id.to_string(), clamp_percent(percent, default));
        Ok(())
    }

    /// Put a hand on a grip, replacing whatever that hand held
    pub fn attach(&mut self, limb: Limb, grip_id: &str, bone_id: Option<&str>) -> Result<()> {
        let rig = self.rig.as_ref().ok_or_else(|| RigError::UnknownGrip(grip_id.to_string()))?;
        let bone = match bone_id {
            Some(id) => {
                let bone = rig
                    .bone(id)
                    .ok_or_else(|| RigError::UnknownBone(id.to_string()))?;
                if !bone.grips.iter().any(|g| g.id == grip_id) {
                    return Err(RigError::UnknownGrip(grip_id.to_string()));
                }
                bone
            }
            None => rig
                .grip_owner(grip_id)
                .ok_or_else(|| RigError::UnknownGrip(grip_id.to_string()))?,
        };
        let attachment = Attachment {
            grip: grip_id.to_string(),
            bone: bone.id.clone(),
        };
        self.attachments.retain(|(l, _)| *l != limb);
        self.attachments.push((limb, attachment));
        Ok(())
    }

    /// Release a hand; returns whether it held anything
    pub fn detach(&mut self, limb: Limb) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|(l, _)| *l != limb);
        before != self.attachments.len()
    }

    pub fn detach_all(&mut self) {
        self.attachments.clear();
    }

    /// Hand a bone hangs from when its anchor is `auto`
    pub fn active_hand(&self, bone_id: &str) -> Side {
        if let Some((limb, _)) = self.attachments.iter().find(|(_, a)| a.bone == bone_id) {
            return *limb;
        }
        if self.attachments.is_empty() || self.attachments.iter().any(|(l, _)| *l == Side::Right) {
            Side::Right
        } else {
            Side::Left
        }
    }

    /// Advance damping and rebuild the snapshot
    pub fn update(&mut self, frame: &RigFrame<'_>) -> Option<&RigSnapshot> {
        let rig = match &self.rig {
            Some(rig) if !rig.bones.is_empty() => Arc::clone(rig),
            _ => {
                self.snapshot = None;
                return None;
            }
        };

        let angles = self.lagged_arm_angles(frame);
        let basis = compute_pose_basis(&BasisInput {
            position: frame.position,
            facing_sign: frame.facing_sign,
            angles: &angles,
            lengths: frame.lengths,
            skeleton: frame.skeleton,
            shoulder_offsets: frame.shoulder_offsets,
        });

        self.damp_percents(&rig, frame);

        let mut snapshot = RigSnapshot {
            weapon_key: rig.key.clone(),
            bones: Vec::with_capacity(rig.bones.len()),
            grips: Vec::new(),
            colliders: Vec::new(),
            grip_percents: self.grip_percents.clone(),
            joint_percents: self.joint_percents.clone(),
            attachments: self.attachments.clone(),
        };
        for bone in &rig.bones {
            self.place_bone(bone, &basis, angles[Joint::Weapon], frame, &mut snapshot);
        }

        self.snapshot = Some(snapshot);
        self.snapshot.as_ref()
    }

    fn lagged_arm_angles(&mut self, frame: &RigFrame<'_>) -> JointMap<f32> {
        let lag = self.arm_lag.get_or_insert(*frame.target);
        for joint in Joint::ARM {
            lag[joint] = damp_angle(lag[joint], frame.target[joint], frame.damping.arm_lag, frame.dt);
        }
        let mut angles = *frame.target;
        for joint in Joint::ARM {
            angles[joint] = lag[joint];
        }
        angles
    }

    fn damp_percents(&mut self, rig: &WeaponRig, frame: &RigFrame<'_>) {
        let lambda = frame.damping.percent;
        for bone in &rig.bones {
            let target = frame
                .top_pose
                .and_then(|p| p.weapon_joint_percents.get(&bone.id))
                .or_else(|| self.joint_targets.get(&bone.id))
                .copied()
                .unwrap_or(bone.default_joint_percent);
            let current = self
                .joint_percents
                .entry(bone.id.clone())
                .or_insert(bone.default_joint_percent);
            *current = damp(*current, target, lambda, frame.dt).clamp(0.0, 1.0);

            for grip in &bone.grips {
                let target = frame
                    .top_pose
                    .and_then(|p| p.weapon_grip_percents.get(&grip.id))
                    .or_else(|| self.grip_targets.get(&grip.id))
                    .copied()
                    .unwrap_or(grip.percent);
                let current = self
                    .grip_percents
                    .entry(grip.id.clone())
                    .or_insert(grip.percent);
                *current = damp(*current, target, lambda, frame.dt).clamp(0.0, 1.0);
            }
        }
    }

    fn place_bone(
        &self,
        bone: &RigBone,
        basis: &PoseBasis,
        weapon_angle: f32,
        frame: &RigFrame<'_>,
        out: &mut RigSnapshot,
    ) {
        let anchor_key = match bone.anchor {
            AnchorRef::Named(anchor) => anchor,
            AnchorRef::Auto => Anchor::wrist(self.active_hand(&bone.id)),
        };
        let wrist = match anchor_key {
            Anchor::LWrist | Anchor::RWrist => frame.wrist_rotation_deg.unwrap_or(0.0),
            _ => 0.0,
        };
        let anchor = basis.anchor(anchor_key);
        let sign = basis.facing_sign;

        let local_angle = anchor.local_angle + (bone.angle_offset_deg + wrist).to_radians() + weapon_angle;
        let dir = Vec2::from_angle(local_angle).mirrored(sign);
        let pivot = anchor.pos + bone.base_offset.rotated(anchor.local_angle).mirrored(sign);

        let joint_percent = self
            .joint_percents
            .get(&bone.id)
            .copied()
            .unwrap_or(bone.default_joint_percent);
        let pivot_percent = bone.pivot_percent(joint_percent);
        let start = pivot - dir * (pivot_percent * bone.length);
        let end = start + dir * bone.length;
        let along = |percent: f32| start + dir * (percent * bone.length);

        for grip in &bone.grips {
            let percent = self.grip_percents.get(&grip.id).copied().unwrap_or(grip.percent);
            let held_by = self
                .attachments
                .iter()
                .find(|(_, a)| a.grip == grip.id && a.bone == bone.id)
                .map(|(l, _)| *l);
            out.grips.push(PlacedGrip {
                id: grip.id.clone(),
                bone: bone.id.clone(),
                pos: along(percent) + grip.offset.rotated(local_angle).mirrored(sign),
                percent,
                held_by,
            });
        }
        for collider in &bone.colliders {
            out.colliders.push(PlacedCollider {
                id: collider.id.clone(),
                bone: bone.id.clone(),
                from: along(collider.range[0]),
                to: along(collider.range[1]),
                shape: collider.shape,
            });
        }

        out.bones.push(PlacedBone {
            id: bone.id.clone(),
            anchor: anchor_key,
            start,
            end,
            pivot,
            angle: dir.angle(),
            length: bone.length,
            pivot_percent,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sword() -> Arc<WeaponRig> {
        Arc::new(
            WeaponRig::new("sword")
                .with_bone(
                    RigBone::new("blade", 40.0)
                        .with_grip("hilt", 0.1)
                        .with_grip("pommel", 0.0)
                        .with_collider("edge", 0.3, 1.0),
                )
                .validated()
                .unwrap(),
        )
    }

    struct Fixture {
        target: JointMap<f32>,
        lengths: SegmentLengths,
        skeleton: SkeletonConfig,
        damping: DampingConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let skeleton = SkeletonConfig::default();
            Self {
                target: JointMap::splat(0.0),
                lengths: SegmentLengths::from_skeleton(&skeleton),
                skeleton,
                damping: DampingConfig::default(),
            }
        }

        fn frame<'a>(&'a self, facing_sign: f32, top_pose: Option<&'a Pose>) -> RigFrame<'a> {
            RigFrame {
                position: Vec2::ZERO,
                facing_sign,
                target: &self.target,
                lengths: &self.lengths,
                skeleton: &self.skeleton,
                shoulder_offsets: [Vec2::ZERO; 2],
                top_pose,
                wrist_rotation_deg: None,
                damping: &self.damping,
                dt: 1.0 / 60.0,
            }
        }
    }

    #[test]
    fn test_nothing_equipped_clears_snapshot() {
        let fx = Fixture::new();
        let mut state = WeaponState::new();
        assert!(state.update(&fx.frame(1.0, None)).is_none());

        state.equip(Arc::new(WeaponRig::new("empty")));
        assert!(state.update(&fx.frame(1.0, None)).is_none());
        assert!(state.snapshot().is_none());
    }

    #[test]
    fn test_bone_hangs_from_right_wrist_by_default() {
        let fx = Fixture::new();
        let mut state = WeaponState::new();
        state.equip(sword());
        let snap = state.update(&fx.frame(1.0, None)).unwrap().clone();
        let blade = snap.bone("blade").unwrap();
        assert_eq!(blade.anchor, Anchor::RWrist);
        assert!(((blade.end - blade.start).length() - 40.0).abs() < 1e-3);
        // Default joint percent 0.5 puts the pivot mid-bone
        assert!(((blade.pivot - blade.start).length() - 20.0).abs() < 1e-3);
        assert_eq!(snap.colliders.len(), 1);
        assert_eq!(snap.grips.len(), 2);
    }

    #[test]
    fn test_attach_selects_active_hand() {
        let fx = Fixture::new();
        let mut state = WeaponState::new();
        state.equip(sword());
        state.attach(Side::Left, "hilt", None).unwrap();
        assert_eq!(state.active_hand("blade"), Side::Left);
        let snap = state.update(&fx.frame(1.0, None)).unwrap();
        assert_eq!(snap.bone("blade").unwrap().anchor, Anchor::LWrist);
        assert_eq!(snap.grip("hilt").unwrap().held_by, Some(Side::Left));

        assert!(state.detach(Side::Left));
        assert!(!state.detach(Side::Left));
        assert_eq!(state.active_hand("blade"), Side::Right);
    }

    #[test]
    fn test_attach_unknown_grip_fails() {
        let mut state = WeaponState::new();
        assert!(matches!(
            state.attach(Side::Right, "hilt", None),
            Err(RigError::UnknownGrip(_))
        ));
        state.equip(sword());
        assert!(matches!(
            state.attach(Side::Right, "nope", None),
            Err(RigError::UnknownGrip(_))
        ));
        assert!(matches!(
            state.attach(Side::Right, "hilt", Some("shaft")),
            Err(RigError::UnknownBone(_))
        ));
    }

    #[test]
    fn test_pose_percent_beats_explicit_target() {
        let fx = Fixture::new();
        let mut state = WeaponState::new();
        state.equip(sword());
        state.set_joint_percent_target("blade", 0.9).unwrap();
        let pose = Pose::new().with_joint_percent("blade", 0.1);
        for _ in 0..240 {
            state.update(&fx.frame(1.0, Some(&pose)));
        }
        let p = state.joint_percent("blade").unwrap();
        assert!((p - 0.1).abs() < 1e-3, "got {p}");
    }

    #[test]
    fn test_facing_left_mirrors_bone() {
        let mut fx = Fixture::new();
        fx.target[Joint::RShoulder] = -1.2;
        let mut right = WeaponState::new();
        let mut left = WeaponState::new();
        right.equip(sword());
        left.equip(sword());
        let r = right.update(&fx.frame(1.0, None)).unwrap().clone();
        let l = left.update(&fx.frame(-1.0, None)).unwrap().clone();
        let (rb, lb) = (r.bone("blade").unwrap(), l.bone("blade").unwrap());
        assert!((rb.end.x + lb.end.x).abs() < 1e-3);
        assert!((rb.end.y - lb.end.y).abs() < 1e-3);
    }

    #[test]
    fn test_unequip_resets_state() {
        let fx = Fixture::new();
        let mut state = WeaponState::new();
        state.equip(sword());
        state.attach(Side::Right, "hilt", None).unwrap();
        state.update(&fx.frame(1.0, None));
        state.unequip();
        assert!(state.rig().is_none());
        assert!(state.snapshot().is_none());
        assert!(state.attachment(Side::Right).is_none());
        assert!(state.joint_percent("blade").is_none());
    }
}
