//! Angle math, damping, and easing
//!
//! Every smoothed quantity in the pose pipeline goes through [`damp`]: an
//! exponential (critically damped) approach that is frame-rate independent
//! and can never overshoot its target.

use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// 2D vector in screen space (y grows downward)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector for an angle in the aim convention (0 = +x, clockwise on screen)
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Angle of this vector in the aim convention
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Rotate by `angle` radians
    pub fn rotated(self, angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    /// Mirror the x component by a facing sign
    pub fn mirrored(self, facing_sign: f32) -> Self {
        Self::new(self.x * facing_sign, self.y)
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Self {
        Self::new(lerp(self.x, other.x, t), lerp(self.y, other.y, t))
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Wrap an angle into `[-PI, PI]`
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut a = (angle + PI).rem_euclid(TAU) - PI;
    if a < -PI {
        a += TAU;
    }
    a
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp `value` into `[-limit, limit]`
#[inline]
pub fn clamp_abs(value: f32, limit: f32) -> f32 {
    let limit = limit.abs();
    value.clamp(-limit, limit)
}

/// Cubic smoothstep on `[0, 1]`
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Exponential approach factor for rate `lambda` over `dt` seconds
#[inline]
pub fn damp_factor(lambda: f32, dt: f32) -> f32 {
    if dt <= 0.0 || lambda <= 0.0 || !dt.is_finite() || !lambda.is_finite() {
        return 0.0;
    }
    1.0 - (-lambda * dt).exp()
}

/// Critically damped approach of `current` toward `target`.
///
/// `next = current + (target - current) * (1 - e^(-lambda * dt))`. A
/// non-finite `current` is treated as 0 and a non-finite result collapses
/// to 0 so a bad frame can never poison the live pose.
pub fn damp(current: f32, target: f32, lambda: f32, dt: f32) -> f32 {
    let current = if current.is_finite() { current } else { 0.0 };
    if !target.is_finite() {
        return current;
    }
    let next = current + (target - current) * damp_factor(lambda, dt);
    if next.is_nan() {
        0.0
    } else {
        next
    }
}

/// [`damp`] on the shortest angular difference, result wrapped into `[-PI, PI]`
pub fn damp_angle(current: f32, target: f32, lambda: f32, dt: f32) -> f32 {
    let current = if current.is_finite() { current } else { 0.0 };
    if !target.is_finite() {
        return current;
    }
    let diff = normalize_angle(target - current);
    normalize_angle(current + diff * damp_factor(lambda, dt))
}

/// Easing curve applied to keyframe interpolation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    #[default]
    Smoothstep,
    EaseInOutQuad,
    EaseInOutCubic,
    /// Half-cosine, smooth at both ends like a breath
    Sine,
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Smoothstep => smoothstep(t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::Sine => 0.5 - 0.5 * (PI * t).cos(),
        }
    }
}
