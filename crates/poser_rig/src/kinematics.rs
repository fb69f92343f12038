//! Forward kinematics
//!
//! Joint angles are local rotations authored for a right-facing fighter
//! (radians, clockwise on a y-down screen). The chain is walked in that local
//! frame from the hip point, and every resulting point is mirrored by the
//! facing sign on the way out to world space.

use poser_core::{Anchor, BoneKey, Joint, JointMap, LengthOverride, SkeletonConfig, Vec2};

const UP: Vec2 = Vec2::new(0.0, -1.0);
const DOWN: Vec2 = Vec2::new(0.0, 1.0);

/// Effective segment lengths for one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentLengths([f32; BoneKey::COUNT]);

impl SegmentLengths {
    /// Authored lengths with no overrides
    pub fn from_skeleton(skeleton: &SkeletonConfig) -> Self {
        Self(BoneKey::ALL.map(|bone| skeleton.length(bone)))
    }

    /// Authored lengths with the aggregated overrides applied
    pub fn resolve<'a>(
        skeleton: &SkeletonConfig,
        overrides: impl IntoIterator<Item = &'a (BoneKey, LengthOverride)>,
    ) -> Self {
        let mut lengths = Self::from_skeleton(skeleton);
        for (bone, value) in overrides {
            lengths.0[bone.index()] = value.apply(skeleton.length(*bone));
        }
        lengths
    }

    pub fn get(&self, bone: BoneKey) -> f32 {
        self.0[bone.index()]
    }
}

/// Position and direction of one attachment point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnchorPose {
    /// World position
    pub pos: Vec2,
    /// World direction of the segment leaving this point (aim convention)
    pub angle: f32,
    /// Same direction before facing mirroring
    pub local_angle: f32,
}

/// Everything the chain walk needs for one frame
#[derive(Clone, Copy, Debug)]
pub struct BasisInput<'a> {
    /// Actor position (hit-box center)
    pub position: Vec2,
    /// `1.0` facing right, `-1.0` facing left
    pub facing_sign: f32,
    /// Joint angles in radians
    pub angles: &'a JointMap<f32>,
    pub lengths: &'a SegmentLengths,
    pub skeleton: &'a SkeletonConfig,
    /// Breathing shoulder offsets `[left, right]`, local frame
    pub shoulder_offsets: [Vec2; 2],
}

/// World-space anchors for every attachment point
#[derive(Clone, Debug, PartialEq)]
pub struct PoseBasis {
    anchors: [AnchorPose; Anchor::COUNT],
    pub facing_sign: f32,
}

impl PoseBasis {
    pub fn anchor(&self, anchor: Anchor) -> AnchorPose {
        self.anchors[anchor.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Anchor, AnchorPose)> + '_ {
        Anchor::ALL.iter().map(|a| (*a, self.anchors[a.index()]))
    }
}

fn facing_sign_of(sign: f32) -> f32 {
    if sign < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Walk the skeleton chain and produce world anchors
pub fn compute_pose_basis(input: &BasisInput<'_>) -> PoseBasis {
    let sign = facing_sign_of(input.facing_sign);
    let a = input.angles;
    let len = |bone| input.lengths.get(bone);
    let skel = input.skeleton;

    let root = input.position + skel.torso_attach.mirrored(sign);
    let mut anchors = [AnchorPose::default(); Anchor::COUNT];
    let mut put = |anchor: Anchor, local_pos: Vec2, dir: Vec2| {
        let local_angle = dir.angle();
        anchors[anchor.index()] = AnchorPose {
            pos: root + local_pos.mirrored(sign),
            angle: dir.mirrored(sign).angle(),
            local_angle,
        };
    };

    let torso = a[Joint::Torso];
    let torso_up = UP.rotated(torso);
    let hip = Vec2::ZERO;
    let neck = hip + torso_up * len(BoneKey::Torso);
    let head_base = neck + torso_up * len(BoneKey::Neck);
    let head_dir = UP.rotated(torso + a[Joint::Head]);
    let head = head_base + head_dir * (len(BoneKey::Head) * 0.5);

    put(Anchor::Hip, hip, torso_up);
    put(Anchor::Torso, hip.lerp(neck, 0.5), torso_up);
    put(Anchor::Neck, neck, torso_up);
    put(Anchor::Head, head, head_dir);

    let arms = [
        (
            Joint::LShoulder,
            Joint::LElbow,
            skel.l_shoulder_offset + input.shoulder_offsets[0],
            [Anchor::LShoulder, Anchor::LElbow, Anchor::LWrist],
            [BoneKey::LUpperArm, BoneKey::LForearm],
        ),
        (
            Joint::RShoulder,
            Joint::RElbow,
            skel.r_shoulder_offset + input.shoulder_offsets[1],
            [Anchor::RShoulder, Anchor::RElbow, Anchor::RWrist],
            [BoneKey::RUpperArm, BoneKey::RForearm],
        ),
    ];
    for (shoulder_joint, elbow_joint, offset, keys, bones) in arms {
        let shoulder_rot = torso + a[shoulder_joint];
        let elbow_rot = shoulder_rot + a[elbow_joint];
        let upper_dir = DOWN.rotated(shoulder_rot);
        let fore_dir = DOWN.rotated(elbow_rot);
        let shoulder = neck + offset.rotated(torso);
        let elbow = shoulder + upper_dir * len(bones[0]);
        let wrist = elbow + fore_dir * len(bones[1]);
        put(keys[0], shoulder, upper_dir);
        put(keys[1], elbow, fore_dir);
        put(keys[2], wrist, fore_dir);
    }

    let legs = [
        (
            Joint::LHip,
            Joint::LKnee,
            skel.l_hip_offset,
            [Anchor::LHip, Anchor::LKnee, Anchor::LFoot],
            [BoneKey::LThigh, BoneKey::LShin],
        ),
        (
            Joint::RHip,
            Joint::RKnee,
            skel.r_hip_offset,
            [Anchor::RHip, Anchor::RKnee, Anchor::RFoot],
            [BoneKey::RThigh, BoneKey::RShin],
        ),
    ];
    for (hip_joint, knee_joint, offset, keys, bones) in legs {
        let thigh_dir = DOWN.rotated(a[hip_joint]);
        let shin_dir = DOWN.rotated(a[hip_joint] + a[knee_joint]);
        let pivot = hip + offset;
        let knee = pivot + thigh_dir * len(bones[0]);
        let foot = knee + shin_dir * len(bones[1]);
        put(keys[0], pivot, thigh_dir);
        put(keys[1], knee, shin_dir);
        put(keys[2], foot, shin_dir);
    }

    PoseBasis {
        anchors,
        facing_sign: sign,
    }
}
