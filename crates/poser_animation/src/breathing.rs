//! Breathing oscillator
//!
//! A ping-pong phase runs between the exhale and inhale keyframes. Low
//! stamina speeds it up. The oscillator is independent of the layer stack;
//! its shoulder offsets feed the next frame's kinematics and its torso scale
//! is left for the renderer.

use poser_core::{lerp, BreathKeyframe, BreathingSpec, Vec2};

/// Breathing state owned by one actor
#[derive(Clone, Debug, PartialEq)]
pub struct BreathState {
    /// `0` = exhale, `1` = inhale
    pub phase: f32,
    /// `1.0` while inhaling, `-1.0` while exhaling
    pub direction: f32,
    /// Set through the driver; wins over any pose-provided style
    pub style_override: Option<BreathingSpec>,
    /// `[left, right]` in the local frame
    pub shoulder_offsets: [Vec2; 2],
    pub torso_scale: Vec2,
    pub active: bool,
}

impl Default for BreathState {
    fn default() -> Self {
        Self {
            phase: 0.0,
            direction: 1.0,
            style_override: None,
            shoulder_offsets: [Vec2::ZERO; 2],
            torso_scale: Vec2::new(1.0, 1.0),
            active: false,
        }
    }
}

impl BreathState {
    /// Advance by `dt` seconds
    ///
    /// `pose_style` is the breathing override carried by the top active
    /// layer, if any; `config` is the fighter's default.
    pub fn update(
        &mut self,
        config: &BreathingSpec,
        pose_style: Option<&BreathingSpec>,
        stamina_ratio: f32,
        dt: f32,
    ) {
        let spec = self.style_override.as_ref().or(pose_style).unwrap_or(config);

        if !spec.enabled || !(spec.cycle_ms.is_finite() && spec.cycle_ms > 0.0) {
            self.active = false;
            self.shoulder_offsets = [Vec2::ZERO; 2];
            self.torso_scale = Vec2::new(1.0, 1.0);
            return;
        }
        self.active = true;

        let stamina = if stamina_ratio.is_finite() {
            stamina_ratio.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let speed = lerp(spec.speed_range[0], spec.speed_range[1], 1.0 - stamina).max(0.0);
        let half_cycle_s = spec.cycle_ms * 0.5 / 1000.0;
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        // Unfold onto a 0..2 sawtooth, step, fold back
        let step = speed * dt / half_cycle_s;
        if step.is_finite() {
            let unfolded = if self.direction >= 0.0 {
                self.phase
            } else {
                2.0 - self.phase
            };
            let next = (unfolded + step).rem_euclid(2.0);
            if next < 1.0 {
                self.phase = next;
                self.direction = 1.0;
            } else {
                self.phase = 2.0 - next;
                self.direction = -1.0;
            }
        }

        let t = spec.easing.apply(self.phase);
        let frame = blend(&spec.exhale, &spec.inhale, t);
        self.shoulder_offsets = [frame.l_shoulder, frame.r_shoulder];
        self.torso_scale = Vec2::new(frame.torso_scale_x, frame.torso_scale_y);
    }
}

fn blend(a: &BreathKeyframe, b: &BreathKeyframe, t: f32) -> BreathKeyframe {
    BreathKeyframe {
        torso_scale_x: lerp(a.torso_scale_x, b.torso_scale_x, t),
        torso_scale_y: lerp(a.torso_scale_y, b.torso_scale_y, t),
        l_shoulder: a.l_shoulder.lerp(b.l_shoulder, t),
        r_shoulder: a.r_shoulder.lerp(b.r_shoulder, t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poser_core::Easing;

    fn linear_spec() -> BreathingSpec {
        BreathingSpec {
            easing: Easing::Linear,
            cycle_ms: 2000.0,
            speed_range: [1.0, 2.0],
            ..BreathingSpec::default()
        }
    }

    #[test]
    fn test_ping_pong_turns_around() {
        let spec = linear_spec();
        let mut breath = BreathState::default();
        // Half cycle is 1s at full stamina
        breath.update(&spec, None, 1.0, 0.75);
        assert!((breath.phase - 0.75).abs() < 1e-5);
        breath.update(&spec, None, 1.0, 0.5);
        assert!((breath.phase - 0.75).abs() < 1e-5);
        assert_eq!(breath.direction, -1.0);
        breath.update(&spec, None, 1.0, 1.0);
        assert!((breath.phase - 0.25).abs() < 1e-5);
        assert_eq!(breath.direction, 1.0);
    }

    #[test]
    fn test_low_stamina_breathes_faster() {
        let spec = linear_spec();
        let mut rested = BreathState::default();
        let mut tired = BreathState::default();
        rested.update(&spec, None, 1.0, 0.2);
        tired.update(&spec, None, 0.0, 0.2);
        assert!((tired.phase - 2.0 * rested.phase).abs() < 1e-5);
    }

    #[test]
    fn test_offsets_follow_keyframes() {
        let spec = linear_spec();
        let mut breath = BreathState::default();
        breath.update(&spec, None, 1.0, 0.5);
        assert!(breath.active);
        let expected = spec.inhale.l_shoulder * 0.5;
        assert!((breath.shoulder_offsets[0] - expected).length() < 1e-5);
        assert!(breath.torso_scale.x > 1.0);
    }

    #[test]
    fn test_override_precedence_and_disable() {
        let config = linear_spec();
        let disabled = BreathingSpec {
            enabled: false,
            ..linear_spec()
        };
        let mut breath = BreathState::default();
        breath.update(&config, Some(&disabled), 1.0, 0.5);
        assert!(!breath.active);
        assert_eq!(breath.shoulder_offsets, [Vec2::ZERO; 2]);

        breath.style_override = Some(config.clone());
        breath.update(&config, Some(&disabled), 1.0, 0.5);
        assert!(breath.active);
    }
}
