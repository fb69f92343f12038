//! Procedural walk cycle
//!
//! A sinusoidal phase is eased through a smoothstep and used to blend two
//! keyframe poses for the legs and torso. Amplitude is damped toward zero or
//! the configured amplitude, so starting and stopping never pop, and the
//! phase keeps running until the amplitude has faded out.

use poser_core::{damp, lerp, smoothstep, GaitConfig, Joint, JointMap};
use std::f32::consts::TAU;

/// Amplitude below which the gait counts as stopped
pub const AMP_EPSILON: f32 = 1e-3;

/// Joints driven by the walk keyframes; everything else stays at the stance
pub const GAIT_JOINTS: [Joint; 5] = [Joint::Torso, Joint::LHip, Joint::LKnee, Joint::RHip, Joint::RKnee];

/// Per-frame inputs
#[derive(Clone, Copy, Debug, Default)]
pub struct GaitInput {
    /// Horizontal speed, pixels per second
    pub speed: f32,
    pub grounded: bool,
    /// A layer is suppressing the walk this frame
    pub suppressed: bool,
    /// Seconds
    pub dt: f32,
}

/// Candidate walk pose in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaitPose {
    pub angles: JointMap<f32>,
    pub active: bool,
}

/// Walk oscillator owned by one actor
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WalkState {
    /// Radians, wrapped into `[0, TAU)`
    pub phase: f32,
    /// Smoothed amplitude, `0..=1` of the configured amplitude
    pub amp: f32,
}

impl WalkState {
    /// Stride frequency in Hz for a given speed
    pub fn frequency(config: &GaitConfig, speed: f32) -> f32 {
        let max_speed = if config.max_speed > 0.0 { config.max_speed } else { 1.0 };
        let scale = (0.5 + speed.abs() / max_speed).min(config.max_frequency_scale.max(0.5));
        config.base_frequency * scale
    }

    /// Advance the oscillator and build the walk pose over `stance`
    pub fn advance(&mut self, config: &GaitConfig, stance: &JointMap<f32>, input: GaitInput) -> GaitPose {
        let speed = if input.speed.is_finite() { input.speed.abs() } else { 0.0 };
        let dt = if input.dt.is_finite() { input.dt.max(0.0) } else { 0.0 };

        let gate_open = input.grounded && speed >= config.min_speed;
        let target_amp = if gate_open { config.amplitude.max(0.0) } else { 0.0 };
        self.amp = damp(self.amp, target_amp, config.amplitude_lambda, dt);

        if !input.suppressed || self.amp > AMP_EPSILON {
            let freq = Self::frequency(config, speed);
            self.phase = (self.phase + TAU * freq * dt).rem_euclid(TAU);
        }

        let eased = smoothstep(0.5 + 0.5 * self.phase.sin());
        let mut angles = *stance;
        for joint in GAIT_JOINTS {
            let base = stance[joint];
            let a = config.keyframe_a.get(joint).unwrap_or(base);
            let b = config.keyframe_b.get(joint).unwrap_or(base);
            angles[joint] = base + (lerp(a, b, eased) - base) * self.amp;
        }

        GaitPose {
            angles,
            active: self.amp > AMP_EPSILON,
        }
    }
}
