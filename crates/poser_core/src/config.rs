//! Fighter configuration
//!
//! Everything the pose pipeline reads but never mutates: base stance, gait
//! keyframes, aim and head limits, breathing, skeleton proportions, and
//! damping rates. Every section has a working default, so an empty document
//! yields a usable fighter.

use crate::error::{ConfigError, Result};
use crate::joint::{BoneKey, Joint};
use crate::math::{Easing, Vec2};
use crate::pose::Pose;
use serde::{Deserialize, Serialize};

/// Top-level per-fighter configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FighterConfig {
    /// Idle stance (degrees)
    pub base_pose: Pose,
    /// Always-on offsets added after layers (degrees)
    pub base_offsets: Pose,
    pub gait: GaitConfig,
    pub aim: AimConfig,
    pub head: HeadConfig,
    pub breathing: BreathingSpec,
    pub skeleton: SkeletonConfig,
    pub damping: DampingConfig,
    pub layers: LayerConfig,
}

impl Default for FighterConfig {
    fn default() -> Self {
        Self {
            base_pose: default_stance(),
            base_offsets: Pose::default(),
            gait: GaitConfig::default(),
            aim: AimConfig::default(),
            head: HeadConfig::default(),
            breathing: BreathingSpec::default(),
            skeleton: SkeletonConfig::default(),
            damping: DampingConfig::default(),
            layers: LayerConfig::default(),
        }
    }
}

impl FighterConfig {
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: FighterConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: FighterConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the solver produce non-finite output
    pub fn validate(&self) -> Result<()> {
        let s = &self.skeleton;
        let lengths = [
            ("torso", s.torso_length),
            ("neck", s.neck_length),
            ("head", s.head_length),
            ("upper_arm", s.upper_arm_length),
            ("forearm", s.forearm_length),
            ("thigh", s.thigh_length),
            ("shin", s.shin_length),
        ];
        for (name, len) in lengths {
            if !len.is_finite() || len < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "skeleton.{name}_length must be a finite non-negative number, got {len}"
                )));
            }
        }
        if !(self.breathing.cycle_ms.is_finite() && self.breathing.cycle_ms > 0.0) {
            return Err(ConfigError::Invalid(
                "breathing.cycle_ms must be positive".to_string(),
            ));
        }
        if self.head.min_relative_deg > self.head.max_relative_deg {
            return Err(ConfigError::Invalid(
                "head.min_relative_deg exceeds head.max_relative_deg".to_string(),
            ));
        }
        if self.gait.max_speed.is_nan() || self.gait.max_speed <= 0.0 {
            return Err(ConfigError::Invalid(
                "gait.max_speed must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Base stance angle for a joint, 0 when the stance leaves it unset
    pub fn stance(&self, joint: Joint) -> f32 {
        self.base_pose.get(joint).unwrap_or(0.0)
    }
}

fn default_stance() -> Pose {
    Pose::new()
        .with(Joint::Torso, 0.0)
        .with(Joint::Head, 0.0)
        .with(Joint::LShoulder, 15.0)
        .with(Joint::LElbow, -20.0)
        .with(Joint::RShoulder, -10.0)
        .with(Joint::RElbow, -25.0)
        .with(Joint::LHip, 6.0)
        .with(Joint::LKnee, 0.0)
        .with(Joint::RHip, -6.0)
        .with(Joint::RKnee, 0.0)
        .with(Joint::Weapon, 0.0)
}

/// Procedural walk cycle
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GaitConfig {
    /// Stride cycles per second at the reference speed
    pub base_frequency: f32,
    /// Speed at which the frequency multiplier reaches 1.5
    pub max_speed: f32,
    /// Below this horizontal speed the gait fades out
    pub min_speed: f32,
    pub amplitude: f32,
    pub amplitude_lambda: f32,
    /// Upper bound on the speed-driven frequency multiplier
    pub max_frequency_scale: f32,
    pub keyframe_a: Pose,
    pub keyframe_b: Pose,
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            base_frequency: 1.6,
            max_speed: 320.0,
            min_speed: 20.0,
            amplitude: 1.0,
            amplitude_lambda: 8.0,
            max_frequency_scale: 3.0,
            keyframe_a: Pose::new()
                .with(Joint::LHip, 28.0)
                .with(Joint::LKnee, 6.0)
                .with(Joint::RHip, -24.0)
                .with(Joint::RKnee, 38.0)
                .with(Joint::Torso, 4.0),
            keyframe_b: Pose::new()
                .with(Joint::LHip, -24.0)
                .with(Joint::LKnee, 38.0)
                .with(Joint::RHip, 28.0)
                .with(Joint::RKnee, 6.0)
                .with(Joint::Torso, 4.0),
        }
    }
}

/// Aim offsets and smoothing
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    /// Exponential rate for player aim smoothing
    pub smoothing: f32,
    pub torso_factor: f32,
    pub shoulder_factor: f32,
    pub hip_factor: f32,
    pub max_torso_deg: f32,
    pub max_shoulder_deg: f32,
    pub max_hip_deg: f32,
    /// Pointer must be this far past the midline before facing flips
    pub facing_deadzone: f32,
    /// Minimum stick deflection that counts as a facing request
    pub stick_deadzone: f32,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            smoothing: 14.0,
            torso_factor: 0.5,
            shoulder_factor: 0.7,
            hip_factor: 0.3,
            max_torso_deg: 25.0,
            max_shoulder_deg: 70.0,
            max_hip_deg: 12.0,
            facing_deadzone: 4.0,
            stick_deadzone: 0.25,
        }
    }
}

/// Head-tracking limits relative to the torso
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HeadConfig {
    pub min_relative_deg: f32,
    pub max_relative_deg: f32,
    pub offset_deg: f32,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            min_relative_deg: -45.0,
            max_relative_deg: 35.0,
            offset_deg: 0.0,
        }
    }
}

/// One breathing extreme
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathKeyframe {
    pub torso_scale_x: f32,
    pub torso_scale_y: f32,
    pub l_shoulder: Vec2,
    pub r_shoulder: Vec2,
}

impl Default for BreathKeyframe {
    fn default() -> Self {
        Self {
            torso_scale_x: 1.0,
            torso_scale_y: 1.0,
            l_shoulder: Vec2::ZERO,
            r_shoulder: Vec2::ZERO,
        }
    }
}

/// Breathing oscillator shape
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathingSpec {
    pub enabled: bool,
    pub exhale: BreathKeyframe,
    pub inhale: BreathKeyframe,
    /// Full inhale + exhale duration at speed 1
    pub cycle_ms: f32,
    /// Speed multiplier at full stamina (first) and empty stamina (second)
    pub speed_range: [f32; 2],
    pub easing: Easing,
}

impl Default for BreathingSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            exhale: BreathKeyframe::default(),
            inhale: BreathKeyframe {
                torso_scale_x: 1.02,
                torso_scale_y: 1.015,
                l_shoulder: Vec2::new(0.0, -1.2),
                r_shoulder: Vec2::new(0.0, -1.2),
            },
            cycle_ms: 3200.0,
            speed_range: [1.0, 2.4],
            easing: Easing::Sine,
        }
    }
}

/// Skeleton proportions and local joint offsets (pixels, facing right)
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SkeletonConfig {
    pub hitbox_width: f32,
    pub hitbox_height: f32,
    /// Hip point relative to the actor position (hit-box center)
    pub torso_attach: Vec2,
    pub torso_length: f32,
    pub neck_length: f32,
    pub head_length: f32,
    pub upper_arm_length: f32,
    pub forearm_length: f32,
    pub thigh_length: f32,
    pub shin_length: f32,
    /// Shoulder pivots relative to the torso top, in the torso frame
    pub l_shoulder_offset: Vec2,
    pub r_shoulder_offset: Vec2,
    /// Hip pivots relative to the hip point
    pub l_hip_offset: Vec2,
    pub r_hip_offset: Vec2,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            hitbox_width: 40.0,
            hitbox_height: 96.0,
            torso_attach: Vec2::new(0.0, 8.0),
            torso_length: 34.0,
            neck_length: 6.0,
            head_length: 14.0,
            upper_arm_length: 18.0,
            forearm_length: 16.0,
            thigh_length: 21.0,
            shin_length: 20.0,
            l_shoulder_offset: Vec2::new(-5.0, 2.0),
            r_shoulder_offset: Vec2::new(5.0, 2.0),
            l_hip_offset: Vec2::new(-4.0, 0.0),
            r_hip_offset: Vec2::new(4.0, 0.0),
        }
    }
}

impl SkeletonConfig {
    /// Authored length of an overridable segment
    pub fn length(&self, bone: BoneKey) -> f32 {
        match bone {
            BoneKey::Torso => self.torso_length,
            BoneKey::Neck => self.neck_length,
            BoneKey::Head => self.head_length,
            BoneKey::LUpperArm | BoneKey::RUpperArm => self.upper_arm_length,
            BoneKey::LForearm | BoneKey::RForearm => self.forearm_length,
            BoneKey::LThigh | BoneKey::RThigh => self.thigh_length,
            BoneKey::LShin | BoneKey::RShin => self.shin_length,
        }
    }
}

/// Exponential rates (per second)
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DampingConfig {
    /// Live joint angles toward the resolved target
    pub body: f32,
    /// Short-lag arm copy the weapon rig samples
    pub arm_lag: f32,
    /// Weapon grip/joint percentages
    pub percent: f32,
}

impl Default for DampingConfig {
    fn default() -> Self {
        Self {
            body: 10.0,
            arm_lag: 24.0,
            percent: 16.0,
        }
    }
}

/// Layer stack defaults
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub default_duration_ms: f64,
    pub primary_priority: i32,
    pub overlay_priority: i32,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 300.0,
            primary_priority: 100,
            overlay_priority: 200,
        }
    }
}
