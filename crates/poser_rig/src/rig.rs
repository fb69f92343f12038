//! Weapon rig definitions
//!
//! A rig is static, read-only data: an ordered list of bones, each anchored
//! to a skeleton attachment point, carrying named grips and colliders placed
//! as percentages along the bone.

use crate::error::{Result, RigError};
use poser_core::{Anchor, Vec2};
use serde::{Deserialize, Deserializer, Serialize};

/// Where a rig bone hangs from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnchorRef {
    /// The active hand's wrist
    #[default]
    Auto,
    Named(Anchor),
}

impl<'de> Deserialize<'de> for AnchorRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().eq_ignore_ascii_case("auto") || raw.trim().is_empty() {
            return Ok(AnchorRef::Auto);
        }
        Anchor::canonicalize(&raw)
            .map(AnchorRef::Named)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown anchor {raw:?}")))
    }
}

/// Collider cross-section
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColliderShape {
    Capsule { radius: f32 },
    Box { width: f32 },
    Line,
}

impl Default for ColliderShape {
    fn default() -> Self {
        ColliderShape::Capsule { radius: 3.0 }
    }
}

/// Named grip point on a bone
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GripDef {
    pub id: String,
    /// Default position along the bone, `0..=1`
    #[serde(default = "default_percent")]
    pub percent: f32,
    /// Offset in the bone's frame (x along the bone)
    #[serde(default)]
    pub offset: Vec2,
}

/// Named collider spanning a percent range of a bone
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ColliderDef {
    pub id: String,
    #[serde(default = "full_range")]
    pub range: [f32; 2],
    #[serde(default)]
    pub shape: ColliderShape,
}

/// One bone of a weapon rig
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RigBone {
    pub id: String,
    #[serde(default)]
    pub anchor: AnchorRef,
    pub length: f32,
    #[serde(default)]
    pub angle_offset_deg: f32,
    /// Pivot offset from the anchor, in the anchor's frame
    #[serde(default)]
    pub base_offset: Vec2,
    /// Fraction of the length the pivot may slide over
    #[serde(default = "full_range")]
    pub haft: [f32; 2],
    #[serde(default = "default_percent")]
    pub default_joint_percent: f32,
    #[serde(default)]
    pub grips: Vec<GripDef>,
    #[serde(default)]
    pub colliders: Vec<ColliderDef>,
}

fn default_percent() -> f32 {
    0.5
}

fn full_range() -> [f32; 2] {
    [0.0, 1.0]
}

impl RigBone {
    pub fn new(id: impl Into<String>, length: f32) -> Self {
        Self {
            id: id.into(),
            anchor: AnchorRef::Auto,
            length,
            angle_offset_deg: 0.0,
            base_offset: Vec2::ZERO,
            haft: full_range(),
            default_joint_percent: default_percent(),
            grips: Vec::new(),
            colliders: Vec::new(),
        }
    }

    pub fn with_haft(mut self, start: f32, end: f32) -> Self {
        self.haft = [start, end];
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = AnchorRef::Named(anchor);
        self
    }

    pub fn with_angle_offset(mut self, degrees: f32) -> Self {
        self.angle_offset_deg = degrees;
        self
    }

    pub fn with_grip(mut self, id: impl Into<String>, percent: f32) -> Self {
        self.grips.push(GripDef {
            id: id.into(),
            percent,
            offset: Vec2::ZERO,
        });
        self
    }

    pub fn with_collider(mut self, id: impl Into<String>, from: f32, to: f32) -> Self {
        self.colliders.push(ColliderDef {
            id: id.into(),
            range: [from, to],
            shape: ColliderShape::default(),
        });
        self
    }

    /// Map a joint percent into the haft range; result always lies in `[start, end]`
    pub fn pivot_percent(&self, joint_percent: f32) -> f32 {
        let [start, end] = self.haft;
        let p = if joint_percent.is_finite() {
            joint_percent.clamp(0.0, 1.0)
        } else {
            self.default_joint_percent
        };
        (start + (end - start) * p).clamp(start.min(end), start.max(end))
    }

    fn normalize(&mut self) {
        let clamp01 = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        let [s, e] = self.haft;
        let (s, e) = (clamp01(s), clamp01(e));
        self.haft = if s <= e { [s, e] } else { [e, s] };
        self.default_joint_percent = clamp01(self.default_joint_percent);
        for grip in &mut self.grips {
            grip.percent = clamp01(grip.percent);
        }
        for collider in &mut self.colliders {
            let [a, b] = collider.range;
            collider.range = [clamp01(a), clamp01(b)];
        }
    }
}

/// A weapon's authored bone, grip, and collider layout
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WeaponRig {
    pub key: String,
    #[serde(default)]
    pub bones: Vec<RigBone>,
    /// Wrist rotation used when no pose provides one (degrees)
    #[serde(default)]
    pub wrist_rotation_deg: Option<f32>,
}

impl WeaponRig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            bones: Vec::new(),
            wrist_rotation_deg: None,
        }
    }

    pub fn with_bone(mut self, bone: RigBone) -> Self {
        self.bones.push(bone);
        self
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let rig: WeaponRig = serde_json::from_str(source)?;
        rig.validated()
    }

    /// Clamp percent fields into range and reject non-finite lengths
    pub fn validated(mut self) -> Result<Self> {
        for bone in &mut self.bones {
            if !bone.length.is_finite() || bone.length < 0.0 {
                return Err(RigError::Invalid {
                    rig: self.key.clone(),
                    reason: format!("bone {} has invalid length {}", bone.id, bone.length),
                });
            }
            bone.normalize();
        }
        Ok(self)
    }

    pub fn bone(&self, id: &str) -> Option<&RigBone> {
        self.bones.iter().find(|b| b.id == id)
    }

    /// Bone that owns a grip id
    pub fn grip_owner(&self, grip_id: &str) -> Option<&RigBone> {
        self.bones
            .iter()
            .find(|b| b.grips.iter().any(|g| g.id == grip_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rig_from_json() {
        let rig = WeaponRig::from_json_str(
            r#"{
                "key": "spear",
                "bones": [{
                    "id": "shaft",
                    "anchor": "hand_right",
                    "length": 80,
                    "haft": [0.9, 0.2],
                    "grips": [{ "id": "rear", "percent": 0.1 }],
                    "colliders": [{ "id": "tip", "range": [0.85, 1.0], "shape": { "type": "capsule", "radius": 2 } }]
                }]
            }"#,
        )
        .unwrap();
        let shaft = rig.bone("shaft").unwrap();
        assert_eq!(shaft.anchor, AnchorRef::Named(Anchor::RWrist));
        // Reversed haft ranges are reordered
        assert_eq!(shaft.haft, [0.2, 0.9]);
        assert_eq!(rig.grip_owner("rear").unwrap().id, "shaft");
        assert_eq!(
            shaft.colliders[0].shape,
            ColliderShape::Capsule { radius: 2.0 }
        );
    }

    #[test]
    fn test_unknown_anchor_is_rejected() {
        let err = WeaponRig::from_json_str(
            r#"{ "key": "x", "bones": [{ "id": "b", "anchor": "tail", "length": 3 }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, RigError::Parse(_)));
    }

    #[test]
    fn test_negative_length_is_invalid() {
        let rig = WeaponRig::new("bad").with_bone(RigBone::new("b", -1.0));
        assert!(matches!(rig.validated(), Err(RigError::Invalid { .. })));
    }

    #[test]
    fn test_pivot_percent_stays_in_haft() {
        let bone = RigBone::new("b", 40.0).with_haft(0.3, 0.6);
        for i in 0..=20 {
            let p = i as f32 / 20.0;
            let pivot = bone.pivot_percent(p);
            assert!((0.3..=0.6).contains(&pivot), "pivot {pivot} out of haft");
        }
        assert_eq!(bone.pivot_percent(2.0), 0.6);
        assert_eq!(bone.pivot_percent(-1.0), 0.3);
    }

    #[test]
    fn test_zero_length_haft_degenerates_to_start() {
        let bone = RigBone::new("b", 40.0).with_haft(0.4, 0.4);
        assert_eq!(bone.pivot_percent(0.0), 0.4);
        assert_eq!(bone.pivot_percent(1.0), 0.4);
    }
}
