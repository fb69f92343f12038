//! Integration tests for the weapon rig solver
//!
//! These tests verify that:
//! - Joint percents damp toward their targets and settle
//! - The pivot always lands inside the authored haft range
//! - Wrist rotation turns hand-anchored bones only

use poser_core::{Anchor, DampingConfig, Joint, JointMap, Pose, SkeletonConfig, Vec2};
use poser_rig::{RigBone, RigFrame, SegmentLengths, WeaponRig, WeaponState};
use std::sync::Arc;

struct Body {
    target: JointMap<f32>,
    lengths: SegmentLengths,
    skeleton: SkeletonConfig,
    damping: DampingConfig,
}

impl Body {
    fn new() -> Self {
        let skeleton = SkeletonConfig::default();
        let mut target = JointMap::splat(0.0);
        target[Joint::RShoulder] = (-30.0f32).to_radians();
        target[Joint::RElbow] = (-45.0f32).to_radians();
        Self {
            target,
            lengths: SegmentLengths::from_skeleton(&skeleton),
            skeleton,
            damping: DampingConfig::default(),
        }
    }

    fn frame<'a>(&'a self, top_pose: Option<&'a Pose>, wrist: Option<f32>) -> RigFrame<'a> {
        RigFrame {
            position: Vec2::new(320.0, 200.0),
            facing_sign: 1.0,
            target: &self.target,
            lengths: &self.lengths,
            skeleton: &self.skeleton,
            shoulder_offsets: [Vec2::ZERO; 2],
            top_pose,
            wrist_rotation_deg: wrist,
            damping: &self.damping,
            dt: 1.0 / 60.0,
        }
    }
}

/// Equip a one-bone rig, target 0.25, and let it settle
#[test]
fn test_joint_percent_converges_to_target() {
    let body = Body::new();
    let rig = WeaponRig::new("staff")
        .with_bone(RigBone::new("pole", 40.0).with_haft(0.0, 1.0))
        .validated()
        .unwrap();

    let mut weapon = WeaponState::new();
    weapon.equip(Arc::new(rig));
    weapon.set_joint_percent_target("pole", 0.25).unwrap();

    let mut last_gap = f32::INFINITY;
    for _ in 0..180 {
        weapon.update(&body.frame(None, None));
        let gap = (weapon.joint_percent("pole").unwrap() - 0.25).abs();
        assert!(gap <= last_gap);
        last_gap = gap;
    }
    assert!(last_gap < 1e-4, "joint percent still {last_gap} away");

    let pole = weapon.snapshot().unwrap().bone("pole").unwrap();
    let from_start = (pole.pivot - pole.start).length();
    assert!((from_start - 10.0).abs() < 0.01, "pivot {from_start} from start");
    assert!((pole.pivot_percent - 0.25).abs() < 1e-4);
}

#[test]
fn test_pivot_stays_inside_haft_for_any_percent() {
    let body = Body::new();
    let hafts = [(0.0, 1.0), (0.2, 0.6), (0.5, 0.5), (0.75, 0.9)];
    for (s, e) in hafts {
        let rig = WeaponRig::new("probe")
            .with_bone(RigBone::new("b", 50.0).with_haft(s, e))
            .validated()
            .unwrap();
        let rig = Arc::new(rig);
        for step in 0..=10 {
            let p = step as f32 / 10.0;
            let pose = Pose::new().with_joint_percent("b", p);
            let mut weapon = WeaponState::new();
            weapon.equip(Arc::clone(&rig));
            for _ in 0..120 {
                weapon.update(&body.frame(Some(&pose), None));
            }
            let bone = weapon.snapshot().unwrap().bone("b").unwrap().clone();
            assert!(
                bone.pivot_percent >= s - 1e-6 && bone.pivot_percent <= e + 1e-6,
                "haft [{s}, {e}] percent {p} gave pivot {}",
                bone.pivot_percent
            );
            let along = (bone.pivot - bone.start).length() / 50.0;
            assert!(along >= s - 1e-3 && along <= e + 1e-3);
        }
    }
}

#[test]
fn test_wrist_rotation_only_turns_hand_bones() {
    let body = Body::new();
    let rig = Arc::new(
        WeaponRig::new("pair")
            .with_bone(RigBone::new("blade", 30.0))
            .with_bone(RigBone::new("sheath", 20.0).with_anchor(Anchor::Hip))
            .validated()
            .unwrap(),
    );

    let mut plain = WeaponState::new();
    let mut turned = WeaponState::new();
    plain.equip(Arc::clone(&rig));
    turned.equip(rig);
    let a = plain.update(&body.frame(None, None)).unwrap().clone();
    let b = turned.update(&body.frame(None, Some(90.0))).unwrap().clone();

    let blade_turn = b.bone("blade").unwrap().angle - a.bone("blade").unwrap().angle;
    let blade_turn = poser_core::normalize_angle(blade_turn);
    assert!((blade_turn - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    assert_eq!(b.bone("sheath").unwrap(), a.bone("sheath").unwrap());
}

#[test]
fn test_arm_lag_trails_target_changes() {
    let mut body = Body::new();
    let rig = Arc::new(
        WeaponRig::new("sword")
            .with_bone(RigBone::new("blade", 40.0))
            .validated()
            .unwrap(),
    );
    let mut weapon = WeaponState::new();
    weapon.equip(rig);
    let before = weapon.update(&body.frame(None, None)).unwrap().clone();

    body.target[Joint::RShoulder] = (-120.0f32).to_radians();
    let first = weapon.update(&body.frame(None, None)).unwrap().clone();
    for _ in 0..240 {
        weapon.update(&body.frame(None, None));
    }
    let settled = weapon.snapshot().unwrap().clone();

    let moved = (first.bone("blade").unwrap().end - before.bone("blade").unwrap().end).length();
    let total = (settled.bone("blade").unwrap().end - before.bone("blade").unwrap().end).length();
    assert!(moved > 0.0);
    assert!(moved < total * 0.9, "weapon should lag the hand");
}
