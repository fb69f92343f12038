//! Headless simulation
//!
//! Steps one fighter through a fixed number of frames on a manual clock,
//! replaying scripted layer pushes and recording the live pose each frame.

use crate::config::Script;
use anyhow::Result;
use poser_animation::{AimInput, Animator, ManualClock};
use poser_core::{FighterConfig, Joint, Vec2};
use poser_rig::{RigSnapshot, WeaponRig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Inputs for [`run`]
#[derive(Debug)]
pub struct Simulation {
    pub fighter: FighterConfig,
    pub weapon: Option<WeaponRig>,
    pub script: Script,
    pub frames: u32,
    pub dt_ms: f64,
    /// Horizontal speed, pixels per second
    pub speed: f32,
    /// World aim angle in degrees
    pub aim_deg: Option<f32>,
}

/// What the fighter looked like after one frame
#[derive(Debug, Serialize)]
pub struct FrameReport {
    pub frame: u32,
    pub time_ms: f64,
    /// Live joint angles in degrees
    pub joints: BTreeMap<Joint, f32>,
    pub layers: Vec<String>,
    pub facing_sign: f32,
    pub weapon: Option<RigSnapshot>,
}

pub fn run(sim: Simulation) -> Result<Vec<FrameReport>> {
    let dt_ms = if sim.dt_ms.is_finite() && sim.dt_ms > 0.0 {
        sim.dt_ms
    } else {
        anyhow::bail!("--dt-ms must be a positive number, got {}", sim.dt_ms);
    };

    let clock = ManualClock::new();
    let mut animator = Animator::new(clock.clone());
    let id = animator.spawn(Arc::new(sim.fighter));
    if let Some(rig) = sim.weapon {
        animator.equip_weapon(id, Arc::new(rig))?;
    }
    if let Some(actor) = animator.actor_mut(id) {
        actor.body.velocity = Vec2::new(sim.speed, 0.0);
        actor.body.aim = sim
            .aim_deg
            .map_or(AimInput::None, |deg| AimInput::Angle(deg.to_radians()));
    }

    let mut pending = sim.script.pushes.into_iter().peekable();
    let mut reports = Vec::with_capacity(sim.frames as usize);
    for frame in 0..sim.frames {
        let now_ms = f64::from(frame) * dt_ms;
        clock.set(now_ms);

        while let Some(push) = pending.next_if(|p| p.at_ms <= now_ms) {
            tracing::debug!(layer = %push.layer, at_ms = push.at_ms, "scripted push");
            let options = push.layer_options();
            animator.push_layer(id, &push.layer, push.pose, options)?;
        }

        if let Some(actor) = animator.actor_mut(id) {
            actor.body.position.x += sim.speed * (dt_ms / 1000.0) as f32;
        }
        animator.tick();

        let Some(actor) = animator.actor(id) else {
            break;
        };
        reports.push(FrameReport {
            frame,
            time_ms: now_ms,
            joints: Joint::ALL
                .iter()
                .map(|&joint| (joint, actor.joint_angle(joint).to_degrees()))
                .collect(),
            layers: actor.state.active_layers().map(|(l, _)| l.to_string()).collect(),
            facing_sign: actor.state.facing.sign,
            weapon: actor.state.weapon_snapshot().cloned(),
        });
    }
    Ok(reports)
}

/// One human-readable line per frame
pub fn format_report(report: &FrameReport) -> String {
    let joints: Vec<String> = report
        .joints
        .iter()
        .map(|(joint, deg)| format!("{joint}={deg:.1}"))
        .collect();
    let mut line = format!(
        "#{:<4} {:>8.1}ms  {}",
        report.frame,
        report.time_ms,
        joints.join(" ")
    );
    if !report.layers.is_empty() {
        line.push_str(&format!("  layers=[{}]", report.layers.join(",")));
    }
    if let Some(weapon) = &report.weapon {
        line.push_str(&format!("  {}:{} bones", weapon.weapon_key, weapon.bones.len()));
    }
    line
}
