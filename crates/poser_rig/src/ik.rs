//! Analytic two-bone IK
//!
//! Not used by the weapon build path, which samples forward kinematics
//! instead. Kept for hosts that want to pin a hand to a world point.

use poser_core::{normalize_angle, Vec2};

/// Shoulder and elbow rotations that reach a target
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TwoBoneSolution {
    /// Direction of the upper segment (aim convention)
    pub upper_angle: f32,
    /// Elbow bend relative to the upper segment
    pub bend: f32,
    /// False when the target was out of reach and the chain was stretched toward it
    pub reached: bool,
}

/// Solve a planar two-segment chain rooted at `root`
///
/// `bend_sign` picks the elbow side (`1.0` bends clockwise on screen).
pub fn solve_two_bone(
    root: Vec2,
    target: Vec2,
    upper: f32,
    lower: f32,
    bend_sign: f32,
) -> Option<TwoBoneSolution> {
    if !(root.is_finite() && target.is_finite()) || upper <= 0.0 || lower <= 0.0 {
        return None;
    }
    let to_target = target - root;
    let max_reach = upper + lower;
    let min_reach = (upper - lower).abs();
    let raw = to_target.length();
    let dist = raw.clamp(min_reach.max(1e-4), max_reach);
    let reached = (raw - dist).abs() < 1e-3;

    let base = to_target.angle();
    let cos_inner = ((upper * upper + dist * dist - lower * lower) / (2.0 * upper * dist)).clamp(-1.0, 1.0);
    let cos_elbow = ((upper * upper + lower * lower - dist * dist) / (2.0 * upper * lower)).clamp(-1.0, 1.0);
    let sign = if bend_sign < 0.0 { -1.0 } else { 1.0 };

    Some(TwoBoneSolution {
        upper_angle: normalize_angle(base - sign * cos_inner.acos()),
        bend: sign * (std::f32::consts::PI - cos_elbow.acos()),
        reached,
    })
}

/// End point of a solved chain
pub fn end_effector(root: Vec2, solution: &TwoBoneSolution, upper: f32, lower: f32) -> Vec2 {
    let elbow = root + Vec2::from_angle(solution.upper_angle) * upper;
    elbow + Vec2::from_angle(solution.upper_angle + solution.bend) * lower
}
