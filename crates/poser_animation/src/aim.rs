//! Aiming and facing
//!
//! Aim angles arrive in world space (`atan2` convention, 0 = +x, clockwise on
//! a y-down screen). Joint offsets are computed in the fighter's local frame,
//! which is authored facing right, so a left-facing fighter mirrors the aim
//! across the vertical axis before deriving anything from it.

use poser_core::{
    clamp_abs, damp_angle, normalize_angle, AimConfig, HeadConfig, Joint, JointMap, Pose, Vec2,
};
use std::f32::consts::{FRAC_PI_2, PI};

/// Cosine magnitude below which a facing angle is treated as vertical
const FACING_COS_EPSILON: f32 = 1e-3;

/// External aim request
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum AimInput {
    #[default]
    None,
    /// World-space point, e.g. a mouse cursor
    Pointer(Vec2),
    /// Directional input, each axis in `-1..=1`
    Stick(Vec2),
    /// World angle in radians
    Angle(f32),
}

/// Which way the fighter faces
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Facing {
    /// World angle of "forward"
    pub rad: f32,
    /// `1.0` right, `-1.0` left
    pub sign: f32,
}

impl Default for Facing {
    fn default() -> Self {
        Self::right()
    }
}

impl Facing {
    pub fn right() -> Self {
        Self { rad: 0.0, sign: 1.0 }
    }

    pub fn left() -> Self {
        Self { rad: PI, sign: -1.0 }
    }

    pub fn from_sign(sign: f32) -> Self {
        if sign < 0.0 {
            Self::left()
        } else {
            Self::right()
        }
    }

    /// Face `sign`; returns whether anything changed
    pub fn turn_to(&mut self, sign: f32) -> bool {
        let next = Self::from_sign(sign);
        if next.sign == self.sign {
            return false;
        }
        *self = next;
        true
    }

    /// Rotate facing by PI
    pub fn full_flip(&mut self) {
        self.rad = normalize_angle(self.rad + PI);
        let c = self.rad.cos();
        self.sign = if c.abs() > FACING_COS_EPSILON {
            c.signum()
        } else {
            -self.sign
        };
    }

    /// World angle to local (mirrored when facing left); its own inverse
    pub fn to_local(&self, angle: f32) -> f32 {
        normalize_angle(angle.sin().atan2(angle.cos() * self.sign))
    }

    pub fn to_world(&self, local: f32) -> f32 {
        self.to_local(local)
    }
}

/// Which hips follow the aim
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HipAim {
    #[default]
    None,
    Both,
    RightOnly,
}

/// Aim state owned by one actor (offsets in degrees)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AimState {
    pub target_angle: f32,
    pub current_angle: f32,
    pub torso_offset: f32,
    pub shoulder_offset: f32,
    pub hip_offset: f32,
    pub hips: HipAim,
    pub active: bool,
    /// Local head-convention angle the head should track
    pub head_world_target: Option<f32>,
    pub orientation_sign: f32,
}

/// Per-frame inputs for [`AimState::update`]
#[derive(Clone, Copy, Debug)]
pub struct AimContext<'a> {
    pub config: &'a AimConfig,
    pub is_player: bool,
    pub dashing: bool,
    pub input: AimInput,
    /// World point aim is measured from
    pub origin: Vec2,
    /// Top active pose, if any
    pub pose: Option<&'a Pose>,
    /// Seconds
    pub dt: f32,
}

impl AimState {
    pub fn update(&mut self, facing: &mut Facing, ctx: &AimContext<'_>) {
        let was_active = self.active;
        let requested = self.requested_angle(facing, ctx);

        match requested {
            Some(angle) => {
                self.target_angle = angle;
                self.current_angle = if ctx.is_player && was_active {
                    damp_angle(self.current_angle, angle, ctx.config.smoothing, ctx.dt)
                } else {
                    angle
                };
                self.active = true;
            }
            None => self.active = false,
        }

        self.orientation_sign = facing.sign;
        self.derive_offsets(facing, ctx);
    }

    /// Aim angle asked for this frame; flips facing for players
    fn requested_angle(&self, facing: &mut Facing, ctx: &AimContext<'_>) -> Option<f32> {
        let cfg = ctx.config;
        let can_turn = ctx.is_player && !ctx.dashing;
        match ctx.input {
            AimInput::None => None,
            AimInput::Pointer(point) => {
                let delta = point - ctx.origin;
                if !delta.is_finite() || delta.length() < 1e-3 {
                    return None;
                }
                if can_turn && delta.x.abs() > cfg.facing_deadzone {
                    facing.turn_to(delta.x);
                }
                Some(delta.angle())
            }
            AimInput::Stick(stick) => {
                if !stick.is_finite() || stick.length() < cfg.stick_deadzone {
                    return None;
                }
                if can_turn && stick.x.abs() >= cfg.stick_deadzone {
                    facing.turn_to(stick.x);
                }
                Some(stick.angle())
            }
            AimInput::Angle(angle) => {
                if !angle.is_finite() {
                    return None;
                }
                let c = angle.cos();
                if can_turn && c.abs() > FACING_COS_EPSILON {
                    facing.turn_to(c);
                }
                Some(normalize_angle(angle))
            }
        }
    }

    fn derive_offsets(&mut self, facing: &Facing, ctx: &AimContext<'_>) {
        let allowed = ctx.pose.and_then(|p| p.allow_aiming) != Some(false);
        if !self.active || !allowed {
            self.torso_offset = 0.0;
            self.shoulder_offset = 0.0;
            self.hip_offset = 0.0;
            self.hips = HipAim::None;
            self.head_world_target = None;
            return;
        }

        let cfg = ctx.config;
        let local = facing.to_local(self.current_angle);
        let aim_deg = local.to_degrees();
        self.torso_offset = clamp_abs(aim_deg * cfg.torso_factor, cfg.max_torso_deg);
        self.shoulder_offset = clamp_abs(aim_deg * cfg.shoulder_factor, cfg.max_shoulder_deg);
        self.hips = match ctx.pose {
            Some(p) if p.aim_right_leg_only => HipAim::RightOnly,
            Some(p) if p.aim_legs => HipAim::Both,
            _ => HipAim::None,
        };
        self.hip_offset = if self.hips == HipAim::None {
            0.0
        } else {
            clamp_abs(aim_deg * cfg.hip_factor, cfg.max_hip_deg)
        };
        self.head_world_target = Some(normalize_angle(local + FRAC_PI_2));
    }

    /// Add the aim offsets onto a target pose (degrees)
    pub fn apply_offsets(&self, target: &mut JointMap<f32>) {
        target[Joint::Torso] += self.torso_offset;
        target[Joint::LShoulder] += self.shoulder_offset;
        target[Joint::RShoulder] += self.shoulder_offset;
        match self.hips {
            HipAim::None => {}
            HipAim::Both => {
                target[Joint::LHip] += self.hip_offset;
                target[Joint::RHip] += self.hip_offset;
            }
            HipAim::RightOnly => target[Joint::RHip] += self.hip_offset,
        }
    }
}

/// Head-convention target for a world face-lock angle
pub fn face_lock_target(facing: &Facing, world_angle: f32) -> Option<f32> {
    world_angle
        .is_finite()
        .then(|| normalize_angle(facing.to_local(world_angle) + FRAC_PI_2))
}

/// Point the head at `head_target` relative to the torso, within limits
///
/// `head_target` is in the head convention: the local aim angle turned a
/// quarter turn (`aim + PI/2`), so aiming straight ahead asks for 90 degrees
/// and lands on `max_relative_deg`. Leaves `target.head` untouched when there
/// is nothing to track.
pub fn apply_head_constraint(target: &mut JointMap<f32>, head_target: Option<f32>, config: &HeadConfig) {
    let Some(head_target) = head_target else {
        return;
    };
    let torso = target[Joint::Torso].to_radians();
    let relative = normalize_angle(head_target - torso).to_degrees();
    let (lo, hi) = if config.min_relative_deg <= config.max_relative_deg {
        (config.min_relative_deg, config.max_relative_deg)
    } else {
        (config.max_relative_deg, config.min_relative_deg)
    };
    target[Joint::Head] = relative.clamp(lo, hi) + config.offset_deg;
}
