//! Joint, anchor, and bone keys
//!
//! Pose and rig data arrive keyed by loosely spelled strings (`"lShoulder"`,
//! `"left_shoulder"`, `"shoulder_left"`, ...). Every such key is canonicalized
//! once at the boundary into one of the enums here, so the rest of the
//! pipeline only ever matches on enum values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Lowercase and strip separators so aliases compare on letters only
pub(crate) fn fold_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' ' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split a folded key into (side, rest): `l`/`left` prefix or `left`/`l` suffix
fn split_side(folded: &str) -> Option<(Side, &str)> {
    for (prefix, side) in [("left", Side::Left), ("right", Side::Right)] {
        if let Some(rest) = folded.strip_prefix(prefix) {
            return Some((side, rest));
        }
        if let Some(rest) = folded.strip_suffix(prefix) {
            return Some((side, rest));
        }
    }
    for (prefix, side) in [("l", Side::Left), ("r", Side::Right)] {
        if let Some(rest) = folded.strip_prefix(prefix) {
            return Some((side, rest));
        }
    }
    None
}

/// Body side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Joints
// ─────────────────────────────────────────────────────────────────────────────

/// Animated joint key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Joint {
    Torso,
    Head,
    LShoulder,
    LElbow,
    RShoulder,
    RElbow,
    LHip,
    LKnee,
    RHip,
    RKnee,
    Weapon,
}

impl Joint {
    pub const COUNT: usize = 11;

    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::Torso,
        Joint::Head,
        Joint::LShoulder,
        Joint::LElbow,
        Joint::RShoulder,
        Joint::RElbow,
        Joint::LHip,
        Joint::LKnee,
        Joint::RHip,
        Joint::RKnee,
        Joint::Weapon,
    ];

    /// Joints the held weapon follows closely
    pub const ARM: [Joint; 5] = [
        Joint::LShoulder,
        Joint::LElbow,
        Joint::RShoulder,
        Joint::RElbow,
        Joint::Weapon,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Canonical camelCase key
    pub const fn key(self) -> &'static str {
        match self {
            Joint::Torso => "torso",
            Joint::Head => "head",
            Joint::LShoulder => "lShoulder",
            Joint::LElbow => "lElbow",
            Joint::RShoulder => "rShoulder",
            Joint::RElbow => "rElbow",
            Joint::LHip => "lHip",
            Joint::LKnee => "lKnee",
            Joint::RHip => "rHip",
            Joint::RKnee => "rKnee",
            Joint::Weapon => "weapon",
        }
    }

    /// Map any accepted spelling onto a joint; unknown keys yield `None`
    pub fn canonicalize(raw: &str) -> Option<Joint> {
        let folded = fold_key(raw);
        match folded.as_str() {
            "torso" | "body" | "spine" | "chest" => return Some(Joint::Torso),
            "head" | "neck" => return Some(Joint::Head),
            "weapon" | "weaponangle" | "gun" => return Some(Joint::Weapon),
            _ => {}
        }
        let (side, rest) = split_side(&folded)?;
        let joint = match (side, rest) {
            (Side::Left, "shoulder" | "arm" | "upperarm") => Joint::LShoulder,
            (Side::Left, "elbow" | "forearm" | "lowerarm") => Joint::LElbow,
            (Side::Right, "shoulder" | "arm" | "upperarm") => Joint::RShoulder,
            (Side::Right, "elbow" | "forearm" | "lowerarm") => Joint::RElbow,
            (Side::Left, "hip" | "thigh" | "leg" | "upperleg") => Joint::LHip,
            (Side::Left, "knee" | "shin" | "lowerleg") => Joint::LKnee,
            (Side::Right, "hip" | "thigh" | "leg" | "upperleg") => Joint::RHip,
            (Side::Right, "knee" | "shin" | "lowerleg") => Joint::RKnee,
            _ => return None,
        };
        Some(joint)
    }

    /// The same joint on the other side of the body
    pub fn mirrored(self) -> Joint {
        match self {
            Joint::LShoulder => Joint::RShoulder,
            Joint::RShoulder => Joint::LShoulder,
            Joint::LElbow => Joint::RElbow,
            Joint::RElbow => Joint::LElbow,
            Joint::LHip => Joint::RHip,
            Joint::RHip => Joint::LHip,
            Joint::LKnee => Joint::RKnee,
            Joint::RKnee => Joint::LKnee,
            other => other,
        }
    }
}

impl Serialize for Joint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Fixed-size map with one slot per [`Joint`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointMap<T>([T; Joint::COUNT]);

impl<T: Copy> JointMap<T> {
    pub const fn splat(value: T) -> Self {
        Self([value; Joint::COUNT])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, T)> + '_ {
        Joint::ALL.iter().map(move |&j| (j, self.0[j.index()]))
    }

    pub fn map<U: Copy>(&self, mut f: impl FnMut(Joint, T) -> U) -> JointMap<U> {
        JointMap(std::array::from_fn(|i| f(Joint::ALL[i], self.0[i])))
    }
}

impl<T: Copy + Default> Default for JointMap<T> {
    fn default() -> Self {
        Self::splat(T::default())
    }
}

impl<T> Index<Joint> for JointMap<T> {
    type Output = T;
    fn index(&self, joint: Joint) -> &T {
        &self.0[joint.index()]
    }
}

impl<T> IndexMut<Joint> for JointMap<T> {
    fn index_mut(&mut self, joint: Joint) -> &mut T {
        &mut self.0[joint.index()]
    }
}

/// Set of joints a layer is allowed to write
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct JointMask(u16);

impl JointMask {
    pub const NONE: JointMask = JointMask(0);
    /// Sentinel covering every known joint key
    pub const ALL: JointMask = JointMask((1 << Joint::COUNT) - 1);

    pub fn from_joints(joints: impl IntoIterator<Item = Joint>) -> Self {
        let mut mask = JointMask::NONE;
        for joint in joints {
            mask.insert(joint);
        }
        mask
    }

    /// Build a mask from raw keys, silently skipping unknown ones
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut mask = JointMask::NONE;
        for key in keys {
            if key.eq_ignore_ascii_case("all") || key == "*" {
                return JointMask::ALL;
            }
            if let Some(joint) = Joint::canonicalize(key) {
                mask.insert(joint);
            }
        }
        mask
    }

    pub fn insert(&mut self, joint: Joint) {
        self.0 |= 1 << joint.index();
    }

    pub fn contains(self, joint: Joint) -> bool {
        self.0 & (1 << joint.index()) != 0
    }

    pub fn is_all(self) -> bool {
        self == JointMask::ALL
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn joints(self) -> impl Iterator<Item = Joint> {
        Joint::ALL.into_iter().filter(move |j| self.contains(*j))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Anchors
// ─────────────────────────────────────────────────────────────────────────────

/// Named attachment point produced by forward kinematics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Anchor {
    Torso,
    Hip,
    Neck,
    Head,
    LShoulder,
    LElbow,
    LWrist,
    RShoulder,
    RElbow,
    RWrist,
    LHip,
    LKnee,
    LFoot,
    RHip,
    RKnee,
    RFoot,
}

impl Anchor {
    pub const COUNT: usize = 16;

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const ALL: [Anchor; Anchor::COUNT] = [
        Anchor::Torso,
        Anchor::Hip,
        Anchor::Neck,
        Anchor::Head,
        Anchor::LShoulder,
        Anchor::LElbow,
        Anchor::LWrist,
        Anchor::RShoulder,
        Anchor::RElbow,
        Anchor::RWrist,
        Anchor::LHip,
        Anchor::LKnee,
        Anchor::LFoot,
        Anchor::RHip,
        Anchor::RKnee,
        Anchor::RFoot,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Anchor::Torso => "torso",
            Anchor::Hip => "hip",
            Anchor::Neck => "neck",
            Anchor::Head => "head",
            Anchor::LShoulder => "lShoulder",
            Anchor::LElbow => "lElbow",
            Anchor::LWrist => "lWrist",
            Anchor::RShoulder => "rShoulder",
            Anchor::RElbow => "rElbow",
            Anchor::RWrist => "rWrist",
            Anchor::LHip => "lHip",
            Anchor::LKnee => "lKnee",
            Anchor::LFoot => "lFoot",
            Anchor::RHip => "rHip",
            Anchor::RKnee => "rKnee",
            Anchor::RFoot => "rFoot",
        }
    }

    pub fn canonicalize(raw: &str) -> Option<Anchor> {
        let folded = fold_key(raw);
        match folded.as_str() {
            "torso" | "body" | "chest" => return Some(Anchor::Torso),
            "hip" | "hips" | "pelvis" | "root" => return Some(Anchor::Hip),
            "neck" | "torsotop" => return Some(Anchor::Neck),
            "head" => return Some(Anchor::Head),
            _ => {}
        }
        // "hand_left" and "lhand" both fold into a side + part
        let (side, rest) = split_side(&folded)?;
        let anchor = match (side, rest) {
            (Side::Left, "shoulder") => Anchor::LShoulder,
            (Side::Left, "elbow") => Anchor::LElbow,
            (Side::Left, "wrist" | "hand") => Anchor::LWrist,
            (Side::Right, "shoulder") => Anchor::RShoulder,
            (Side::Right, "elbow") => Anchor::RElbow,
            (Side::Right, "wrist" | "hand") => Anchor::RWrist,
            (Side::Left, "hip") => Anchor::LHip,
            (Side::Left, "knee") => Anchor::LKnee,
            (Side::Left, "foot" | "ankle") => Anchor::LFoot,
            (Side::Right, "hip") => Anchor::RHip,
            (Side::Right, "knee") => Anchor::RKnee,
            (Side::Right, "foot" | "ankle") => Anchor::RFoot,
            _ => return None,
        };
        Some(anchor)
    }

    /// Wrist anchor of a hand
    pub fn wrist(side: Side) -> Anchor {
        match side {
            Side::Left => Anchor::LWrist,
            Side::Right => Anchor::RWrist,
        }
    }
}

impl Serialize for Anchor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bone keys
// ─────────────────────────────────────────────────────────────────────────────

/// Skeleton segment whose length can be overridden
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoneKey {
    Torso,
    Neck,
    Head,
    LUpperArm,
    LForearm,
    RUpperArm,
    RForearm,
    LThigh,
    LShin,
    RThigh,
    RShin,
}

impl BoneKey {
    pub const COUNT: usize = 11;

    pub const ALL: [BoneKey; BoneKey::COUNT] = [
        BoneKey::Torso,
        BoneKey::Neck,
        BoneKey::Head,
        BoneKey::LUpperArm,
        BoneKey::LForearm,
        BoneKey::RUpperArm,
        BoneKey::RForearm,
        BoneKey::LThigh,
        BoneKey::LShin,
        BoneKey::RThigh,
        BoneKey::RShin,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn canonicalize(raw: &str) -> Option<BoneKey> {
        let folded = fold_key(raw);
        match folded.as_str() {
            "torso" | "body" | "spine" => return Some(BoneKey::Torso),
            "neck" => return Some(BoneKey::Neck),
            "head" | "skull" => return Some(BoneKey::Head),
            _ => {}
        }
        let (side, rest) = split_side(&folded)?;
        let bone = match (side, rest) {
            (Side::Left, "upperarm" | "arm" | "armupper" | "shoulder") => BoneKey::LUpperArm,
            (Side::Left, "forearm" | "lowerarm" | "armlower" | "elbow") => BoneKey::LForearm,
            (Side::Right, "upperarm" | "arm" | "armupper" | "shoulder") => BoneKey::RUpperArm,
            (Side::Right, "forearm" | "lowerarm" | "armlower" | "elbow") => BoneKey::RForearm,
            (Side::Left, "thigh" | "upperleg" | "legupper" | "hip") => BoneKey::LThigh,
            (Side::Left, "shin" | "lowerleg" | "leglower" | "knee") => BoneKey::LShin,
            (Side::Right, "thigh" | "upperleg" | "legupper" | "hip") => BoneKey::RThigh,
            (Side::Right, "shin" | "lowerleg" | "leglower" | "knee") => BoneKey::RShin,
            _ => return None,
        };
        Some(bone)
    }
}

/// Hand that can hold a grip
pub type Limb = Side;

/// Parse a limb name (`"left"`, `"lHand"`, `"hand_right"`, ...)
pub fn canonicalize_limb(raw: &str) -> Option<Limb> {
    let folded = fold_key(raw);
    match folded.as_str() {
        "left" | "l" => return Some(Side::Left),
        "right" | "r" => return Some(Side::Right),
        _ => {}
    }
    match split_side(&folded)? {
        (side, "hand" | "wrist" | "arm") => Some(side),
        _ => None,
    }
}
