//! Pose records
//!
//! A [`Pose`] is a set of target joint angles in degrees plus a bounded set of
//! optional extensions (flip transitions, events, bone lengths, weapon
//! percentages). Poses built in code use the `with_*` builders; poses coming
//! from data go through [`Pose::from_json`], which never fails: unknown keys
//! are dropped and bad numbers read as absent.

use crate::config::BreathingSpec;
use crate::events::{sort_events, LayerEvent};
use crate::joint::{BoneKey, Joint, JointMap, JointMask};
use crate::lenient::{self, Fields};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use smallvec::SmallVec;

/// How a bone-length override combines with the authored length
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthMode {
    Scale,
    Absolute,
}

/// Non-uniform bone-length modifier
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LengthOverride {
    pub mode: LengthMode,
    pub value: f32,
}

impl LengthOverride {
    pub fn scale(value: f32) -> Self {
        Self {
            mode: LengthMode::Scale,
            value,
        }
    }

    pub fn absolute(value: f32) -> Self {
        Self {
            mode: LengthMode::Absolute,
            value,
        }
    }

    /// Resolve against the authored segment length
    pub fn apply(&self, base: f32) -> f32 {
        let resolved = match self.mode {
            LengthMode::Scale => base * self.value,
            LengthMode::Absolute => self.value,
        };
        if resolved.is_finite() {
            resolved.max(0.0)
        } else {
            base
        }
    }

    /// Accepts a bare number (scale), `{mode, value}`, or string shorthand
    /// (`"1.2x"`, `"x1.2"`, `"*1.2"`, `"40px"`, `"=40"`)
    pub fn from_json(value: &Value) -> Option<LengthOverride> {
        match value {
            Value::Number(_) => lenient::number(value).map(LengthOverride::scale),
            Value::String(s) => Self::parse_shorthand(s),
            Value::Object(object) => {
                let f = Fields::new(object);
                let amount = f.number(&["value", "amount", "length", "scale", "factor"])?;
                let mode = match f.string(&["mode", "type", "kind"]) {
                    Some(m) => parse_mode(m)?,
                    None if f.get(&["length"]).is_some() => LengthMode::Absolute,
                    None => LengthMode::Scale,
                };
                Some(LengthOverride {
                    mode,
                    value: amount,
                })
            }
            _ => None,
        }
    }

    fn parse_shorthand(raw: &str) -> Option<LengthOverride> {
        let s = raw.trim();
        let parse = |t: &str| t.trim().parse::<f32>().ok().filter(|v| v.is_finite());
        if let Some(rest) = s.strip_suffix("px").or_else(|| s.strip_prefix('=')) {
            return parse(rest).map(LengthOverride::absolute);
        }
        if let Some(rest) = s
            .strip_suffix('x')
            .or_else(|| s.strip_prefix('x'))
            .or_else(|| s.strip_prefix('*'))
        {
            return parse(rest).map(LengthOverride::scale);
        }
        parse(s).map(LengthOverride::scale)
    }
}

fn parse_mode(raw: &str) -> Option<LengthMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "scale" | "mul" | "multiply" | "factor" | "ratio" | "relative" => Some(LengthMode::Scale),
        "absolute" | "abs" | "set" | "length" | "px" | "fixed" => Some(LengthMode::Absolute),
        _ => None,
    }
}

/// Mirror named body parts once the layer reaches `at`
#[derive(Clone, Debug, PartialEq)]
pub struct FlipSpec {
    pub at: f32,
    pub parts: SmallVec<[String; 4]>,
}

/// Turn the actor around (facing += PI) once the layer reaches `at`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FullFlipSpec {
    pub at: f32,
}

/// Target joint angles (degrees) plus optional extension fields
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    pub angles: JointMap<Option<f32>>,
    pub mask: Option<JointMask>,
    /// `Some(false)` disables aiming offsets while this pose is on top
    pub allow_aiming: Option<bool>,
    pub aim_legs: bool,
    pub aim_right_leg_only: bool,
    pub flip: Option<FlipSpec>,
    pub full_flip: Option<FullFlipSpec>,
    pub events: Vec<LayerEvent>,
    pub length_overrides: SmallVec<[(BoneKey, LengthOverride); 2]>,
    pub weapon_grip_percents: FxHashMap<String, f32>,
    pub weapon_joint_percents: FxHashMap<String, f32>,
    /// Extra wrist rotation (degrees) for weapon bones anchored to a hand
    pub wrist_rotation: Option<f32>,
    pub breathing: Option<BreathingSpec>,
}

impl Pose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set one joint angle (degrees)
    pub fn with(mut self, joint: Joint, degrees: f32) -> Self {
        self.set(joint, degrees);
        self
    }

    /// Set a joint angle; non-finite values are ignored
    pub fn set(&mut self, joint: Joint, degrees: f32) {
        if degrees.is_finite() {
            self.angles[joint] = Some(degrees);
        }
    }

    pub fn get(&self, joint: Joint) -> Option<f32> {
        self.angles[joint]
    }

    pub fn with_mask(mut self, mask: JointMask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_event(mut self, event: LayerEvent) -> Self {
        self.events.push(event);
        sort_events(&mut self.events);
        self
    }

    pub fn with_flip(mut self, at: f32, parts: impl IntoIterator<Item = String>) -> Self {
        self.flip = Some(FlipSpec {
            at: at.clamp(0.0, 1.0),
            parts: parts.into_iter().collect(),
        });
        self
    }

    pub fn with_full_flip(mut self, at: f32) -> Self {
        self.full_flip = Some(FullFlipSpec {
            at: at.clamp(0.0, 1.0),
        });
        self
    }

    pub fn with_length(mut self, bone: BoneKey, value: LengthOverride) -> Self {
        self.length_overrides.retain(|(b, _)| *b != bone);
        self.length_overrides.push((bone, value));
        self
    }

    pub fn with_joint_percent(mut self, bone_id: impl Into<String>, percent: f32) -> Self {
        self.weapon_joint_percents
            .insert(bone_id.into(), percent.clamp(0.0, 1.0));
        self
    }

    pub fn with_grip_percent(mut self, grip_id: impl Into<String>, percent: f32) -> Self {
        self.weapon_grip_percents
            .insert(grip_id.into(), percent.clamp(0.0, 1.0));
        self
    }

    pub fn with_allow_aiming(mut self, allow: bool) -> Self {
        self.allow_aiming = Some(allow);
        self
    }

    pub fn with_wrist_rotation(mut self, degrees: f32) -> Self {
        self.wrist_rotation = degrees.is_finite().then_some(degrees);
        self
    }

    /// Joints this pose actually defines
    pub fn defined_joints(&self) -> JointMask {
        JointMask::from_joints(self.angles.iter().filter(|(_, v)| v.is_some()).map(|(j, _)| j))
    }

    /// Lenient parse from an already-decoded JSON object
    pub fn from_json(value: &Value) -> Pose {
        let mut pose = Pose::default();
        let Some(object) = value.as_object() else {
            tracing::trace!("pose is not an object; using empty pose");
            return pose;
        };
        let f = Fields::new(object);

        for (raw, folded, v) in f.iter() {
            match folded {
                "mask" | "joints" => pose.mask = parse_mask(v),
                "allowaiming" | "aim" => pose.allow_aiming = lenient::flag(v),
                "aimlegs" => pose.aim_legs = lenient::flag(v).unwrap_or(false),
                "aimrightlegonly" => pose.aim_right_leg_only = lenient::flag(v).unwrap_or(false),
                "animevents" | "events" => pose.events.extend(LayerEvent::list_from_json(v)),
                "lengths" | "bonelengths" | "lengthoverrides" | "length" => {
                    pose.length_overrides = parse_lengths(v)
                }
                "weapongrippercents" | "grippercents" => {
                    pose.weapon_grip_percents = lenient::percent_map(v)
                }
                "weaponjointpercents" | "jointpercents" => {
                    pose.weapon_joint_percents = lenient::percent_map(v)
                }
                "wristrotation" | "weaponwristrotation" => {
                    pose.wrist_rotation = lenient::number(v)
                }
                "breathing" | "breath" => {
                    pose.breathing = serde_json::from_value(v.clone())
                        .map_err(|e| tracing::trace!("ignoring breathing override: {e}"))
                        .ok()
                }
                "flip" | "flipat" | "flipparts" | "fullflipfacing" | "fullflipat" => {}
                _ => match (Joint::canonicalize(raw), lenient::number(v)) {
                    (Some(joint), Some(deg)) => pose.angles[joint] = Some(deg),
                    _ => tracing::trace!("ignoring pose key {raw:?}"),
                },
            }
        }
        sort_events(&mut pose.events);

        if f.flag(&["flip"]) == Some(true) {
            let parts = f
                .get(&["flipparts"])
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .filter_map(|p| p.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            pose.flip = Some(FlipSpec {
                at: f.number(&["flipat"]).unwrap_or(0.0).clamp(0.0, 1.0),
                parts,
            });
        }
        if f.flag(&["fullflipfacing"]) == Some(true) {
            pose.full_flip = Some(FullFlipSpec {
                at: f.number(&["fullflipat"]).unwrap_or(0.0).clamp(0.0, 1.0),
            });
        }
        pose
    }
}

impl<'de> Deserialize<'de> for Pose {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Pose::from_json(&value))
    }
}

fn parse_mask(value: &Value) -> Option<JointMask> {
    match value {
        Value::String(s) => Some(JointMask::from_keys([s.as_str()])),
        Value::Array(items) => Some(JointMask::from_keys(items.iter().filter_map(Value::as_str))),
        _ => None,
    }
}

fn parse_lengths(value: &Value) -> SmallVec<[(BoneKey, LengthOverride); 2]> {
    let Some(object) = value.as_object() else {
        return SmallVec::new();
    };
    object
        .iter()
        .filter_map(|(key, v)| {
            let bone = BoneKey::canonicalize(key)?;
            let length = LengthOverride::from_json(v)?;
            Some((bone, length))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pose_from_json_ignores_unknown_keys() {
        let pose = Pose::from_json(&json!({
            "torso": 10,
            "left_elbow": -30.5,
            "tail": 99,
            "head": "not a number"
        }));
        assert_eq!(pose.get(Joint::Torso), Some(10.0));
        assert_eq!(pose.get(Joint::LElbow), Some(-30.5));
        assert_eq!(pose.get(Joint::Head), None);
        assert_eq!(pose.defined_joints().joints().count(), 2);
    }

    #[test]
    fn test_pose_flags_and_extensions() {
        let pose = Pose::from_json(&json!({
            "rShoulder": 45,
            "mask": ["rShoulder", "rElbow"],
            "allowAiming": false,
            "flip": true,
            "flipAt": 0.5,
            "flipParts": ["torso", "head"],
            "fullFlipFacing": true,
            "fullFlipAt": 0.75,
            "weaponJointPercents": { "blade": 1.4 },
            "lengths": { "lForearm": "1.5x", "rForearm": { "mode": "abs", "value": 30 } },
            "anim_events": [{ "time": 0.2, "velocityX": 10 }]
        }));
        let mask = pose.mask.unwrap();
        assert!(mask.contains(Joint::RElbow));
        assert!(!mask.contains(Joint::Torso));
        assert_eq!(pose.allow_aiming, Some(false));
        let flip = pose.flip.unwrap();
        assert_eq!(flip.at, 0.5);
        assert_eq!(flip.parts.len(), 2);
        assert_eq!(pose.full_flip.unwrap().at, 0.75);
        assert_eq!(pose.weapon_joint_percents["blade"], 1.0);
        assert_eq!(pose.length_overrides.len(), 2);
        assert_eq!(pose.events.len(), 1);
    }

    #[test]
    fn test_length_override_syntax() {
        assert_eq!(
            LengthOverride::from_json(&json!(1.2)),
            Some(LengthOverride::scale(1.2))
        );
        assert_eq!(
            LengthOverride::from_json(&json!("40px")),
            Some(LengthOverride::absolute(40.0))
        );
        assert_eq!(
            LengthOverride::from_json(&json!("=12")),
            Some(LengthOverride::absolute(12.0))
        );
        assert_eq!(
            LengthOverride::from_json(&json!("x0.5")),
            Some(LengthOverride::scale(0.5))
        );
        assert_eq!(
            LengthOverride::from_json(&json!({ "mode": "multiply", "value": 2 })),
            Some(LengthOverride::scale(2.0))
        );
        assert_eq!(LengthOverride::from_json(&json!({ "mode": "warp", "value": 2 })), None);
        assert_eq!(LengthOverride::scale(2.0).apply(10.0), 20.0);
        assert_eq!(LengthOverride::absolute(-3.0).apply(10.0), 0.0);
    }

    #[test]
    fn test_pose_deserialize_via_serde() {
        let pose: Pose = serde_json::from_str(r#"{ "weapon": 15, "rKnee": 5 }"#).unwrap();
        assert_eq!(pose.get(Joint::Weapon), Some(15.0));
        assert_eq!(pose.get(Joint::RKnee), Some(5.0));
    }
}
