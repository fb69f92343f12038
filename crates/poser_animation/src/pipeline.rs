//! Per-actor pose resolution
//!
//! One call per actor per frame:
//!
//! 1. fire due deferred pushes (guard re-checked against the actor now)
//! 2. expire layers (flushing what they had left), advance the survivors,
//!    and apply the events both produced
//! 3. run the gait and seed the target pose from it or the stance
//! 4. apply layers in ascending priority, aggregate length overrides
//! 5. aim, base offsets, aim offsets, head tracking
//! 6. weapon rig on the radian target
//! 7. ragdoll blend and damping of the live joint angles
//! 8. breathing, gravity restore
//!
//! Nothing in here returns an error. Bad inputs are logged and skipped.

use crate::aim::{apply_head_constraint, face_lock_target, AimContext};
use crate::animator::{Actor, ActorBody, ActorId, GravityReset};
use crate::deferred::SettleReason;
use crate::gait::GaitInput;
use crate::layers::{Layer, LayerSignal};
use crate::mirror::MirrorHost;
use poser_core::{
    damp, lerp, normalize_angle, FighterConfig, ImpulseFrame, Joint, JointMap, LayerEventKind, Vec2,
};
use poser_rig::{RigFrame, SegmentLengths};
use std::f32::consts::PI;
use std::sync::Arc;

pub(crate) fn resolve_actor(
    id: ActorId,
    actor: &mut Actor,
    now_ms: f64,
    dt: f32,
    mirror: &mut dyn MirrorHost,
) {
    fire_deferred(id, actor, now_ms, mirror);

    let mut signals = actor.state.layers.expire(id, now_ms, mirror);
    signals.extend(actor.state.layers.advance(id, now_ms, mirror));
    for signal in signals {
        apply_signal(id, actor, signal, now_ms);
    }

    let config = Arc::clone(&actor.config);
    let body = &mut actor.body;
    let state = &mut actor.state;
    let stance = base_deg(&config, state.layers.iter().filter(|l| l.use_as_base()));

    // Gait
    let speed = horizontal_speed(body, state.last_position, dt);
    state.last_position = Some(body.position);
    let suppressed = state.layers.suppresses_walk();
    let gait = state.walk.advance(
        &config.gait,
        &stance,
        GaitInput {
            speed,
            grounded: body.grounded,
            suppressed,
            dt,
        },
    );

    // Layers
    let mut target = if gait.active && !suppressed {
        gait.angles
    } else {
        stance
    };
    for layer in state.layers.iter() {
        layer.apply_to(&mut target);
    }

    state.length.overrides.clear();
    for layer in state.layers.iter() {
        for (bone, value) in &layer.pose().length_overrides {
            match state.length.overrides.iter_mut().find(|(b, _)| b == bone) {
                Some(slot) => slot.1 = *value,
                None => state.length.overrides.push((*bone, *value)),
            }
        }
    }
    state.length.active = SegmentLengths::resolve(&config.skeleton, state.length.overrides.iter());

    // Aim and head
    let top_pose = state.layers.top().map(Layer::pose);
    let origin = aim_origin(body.position, state.facing.sign, &config);
    state.aim.update(
        &mut state.facing,
        &AimContext {
            config: &config.aim,
            is_player: body.is_player,
            dashing: body.dashing,
            input: body.aim,
            origin,
            pose: top_pose,
            dt,
        },
    );
    for joint in Joint::ALL {
        if let Some(offset) = config.base_offsets.get(joint) {
            target[joint] += offset;
        }
    }
    state.aim.apply_offsets(&mut target);

    let head_target = body
        .face_lock
        .and_then(|angle| face_lock_target(&state.facing, angle))
        .or(state.aim.head_world_target);
    apply_head_constraint(&mut target, head_target, &config.head);
    state.target_deg = target;

    // Weapon
    let target_rad = target.map(|_, deg| deg.to_radians());
    let wrist_rotation_deg = state
        .layers
        .iter()
        .rev()
        .find_map(|l| l.pose().wrist_rotation)
        .or_else(|| state.weapon.rig().and_then(|rig| rig.wrist_rotation_deg));
    state.weapon.update(&RigFrame {
        position: body.position,
        facing_sign: state.facing.sign,
        target: &target_rad,
        lengths: &state.length.active,
        skeleton: &config.skeleton,
        shoulder_offsets: state.breath.shoulder_offsets,
        top_pose,
        wrist_rotation_deg,
        damping: &config.damping,
        dt,
    });

    // Live pose
    for joint in Joint::ALL {
        let blended = ragdoll_blend(body, joint, target_rad[joint]);
        state.joint_angles[joint] = damp(state.joint_angles[joint], blended, config.damping.body, dt);
    }

    state.breath.update(
        &config.breathing,
        top_pose.and_then(|p| p.breathing.as_ref()),
        body.stamina_ratio,
        dt,
    );

    if let Some(reset) = state.gravity_reset {
        if now_ms >= reset.reset_at_ms {
            tracing::debug!(?id, scale = reset.previous, "gravity scale restored");
            body.gravity_scale = reset.previous;
            state.gravity_reset = None;
        }
    }
}

/// Rotate the actor's facing by PI along with everything tied to it
pub(crate) fn full_flip(actor: &mut Actor) {
    actor.state.facing.full_flip();
    actor.body.face_lock = actor.body.face_lock.map(|a| normalize_angle(PI - a));
    actor.body.attack_sign = -actor.body.attack_sign;
}

fn fire_deferred(id: ActorId, actor: &mut Actor, now_ms: f64, mirror: &mut dyn MirrorHost) {
    for mut due in actor.state.deferred.take_due(now_ms) {
        if !due.claim() {
            continue;
        }
        let allowed = match due.guard.take() {
            None => true,
            Some(guard) => match guard(&*actor) {
                Ok(allowed) => allowed,
                Err(err) => {
                    tracing::warn!(?id, layer = %due.layer_id, "deferred push guard failed: {err:#}");
                    false
                }
            },
        };
        if !allowed {
            due.settle(SettleReason::Skipped);
            continue;
        }

        let pose = std::mem::take(&mut due.pose);
        actor.state.layers.push(
            id,
            &due.layer_id,
            pose,
            due.options,
            now_ms,
            &actor.config.layers,
            mirror,
        );
        due.settle(SettleReason::Applied);
    }
}

fn apply_signal(id: ActorId, actor: &mut Actor, signal: LayerSignal, now_ms: f64) {
    match signal {
        LayerSignal::FullFlip { layer } => {
            tracing::debug!(?id, layer = %layer, "full facing flip");
            full_flip(actor);
        }
        LayerSignal::Event { layer, kind } => apply_event(id, actor, &layer, kind, now_ms),
    }
}

fn apply_event(id: ActorId, actor: &mut Actor, layer: &str, kind: LayerEventKind, now_ms: f64) {
    let body = &mut actor.body;
    let state = &mut actor.state;
    match kind {
        LayerEventKind::SetVelocity { x, y } => {
            if let Some(x) = x.filter(|v| v.is_finite()) {
                body.velocity.x = x;
            }
            if let Some(y) = y.filter(|v| v.is_finite()) {
                body.velocity.y = y;
            }
        }
        LayerEventKind::Impulse {
            magnitude,
            direction_deg,
            frame,
            local,
        } => {
            if !(magnitude.is_finite() && direction_deg.is_finite()) {
                tracing::warn!(?id, layer, "skipping impulse with non-finite values");
                return;
            }
            let direction = direction_deg.to_radians();
            let angle = match frame {
                ImpulseFrame::World => direction,
                ImpulseFrame::Aim => state.aim.current_angle + direction,
                ImpulseFrame::Facing => state.facing.to_world(direction),
            };
            let mut impulse = Vec2::from_angle(angle) * magnitude;
            if local && frame != ImpulseFrame::Facing {
                impulse.x *= state.facing.sign;
            }
            body.velocity += impulse;
        }
        LayerEventKind::GravityScale {
            scale,
            reset_after_ms,
        } => {
            if !scale.is_finite() {
                tracing::warn!(?id, layer, "skipping non-finite gravity scale");
                return;
            }
            let previous = state
                .gravity_reset
                .map_or(body.gravity_scale, |pending| pending.previous);
            body.gravity_scale = scale;
            state.gravity_reset = reset_after_ms.map(|ms| GravityReset {
                previous,
                reset_at_ms: now_ms + ms,
            });
        }
        LayerEventKind::GripAttach { limb, grip, bone } => {
            if let Err(err) = state.weapon.attach(limb, &grip, bone.as_deref()) {
                tracing::warn!(?id, layer, "grip attach failed: {err}");
            }
        }
        LayerEventKind::GripDetach { limb } => {
            state.weapon.detach(limb);
        }
        LayerEventKind::GripDetachAll => state.weapon.detach_all(),
    }
}

fn stance_deg(config: &FighterConfig) -> JointMap<f32> {
    JointMap::splat(0.0).map(|joint, _| config.stance(joint))
}

/// Stance with every `use_as_base` layer's defined joints laid over it, ignoring masks
fn base_deg<'a>(
    config: &FighterConfig,
    base_layers: impl Iterator<Item = &'a Layer>,
) -> JointMap<f32> {
    let mut base = stance_deg(config);
    for layer in base_layers {
        for joint in Joint::ALL {
            if let Some(deg) = layer.pose().get(joint).filter(|d| d.is_finite()) {
                base[joint] = deg;
            }
        }
    }
    base
}

fn horizontal_speed(body: &ActorBody, last_position: Option<Vec2>, dt: f32) -> f32 {
    let speed = if body.velocity_authoritative {
        body.velocity.x.abs()
    } else {
        match last_position {
            Some(last) if dt > 0.0 => (body.position.x - last.x).abs() / dt,
            _ => 0.0,
        }
    };
    if speed.is_finite() {
        speed
    } else {
        0.0
    }
}

/// Top of the torso, where aim is measured from
fn aim_origin(position: Vec2, facing_sign: f32, config: &FighterConfig) -> Vec2 {
    let skeleton = &config.skeleton;
    position + skeleton.torso_attach.mirrored(facing_sign) + Vec2::new(0.0, -skeleton.torso_length)
}

fn ragdoll_blend(body: &ActorBody, joint: Joint, animated: f32) -> f32 {
    let Some(ragdoll) = &body.ragdoll else {
        return animated;
    };
    match ragdoll.angles[joint] {
        Some(physics) if physics.is_finite() => {
            let blend = if ragdoll.blend.is_finite() {
                ragdoll.blend.clamp(0.0, 1.0)
            } else {
                0.0
            };
            lerp(animated, physics, blend)
        }
        _ => animated,
    }
}
