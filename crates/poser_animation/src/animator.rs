//! Animation driver
//!
//! Owns every registered actor and runs the pose pipeline for each of them
//! once per frame.

use crate::aim::{AimInput, AimState, Facing};
use crate::breathing::BreathState;
use crate::clock::{Clock, SystemClock};
use crate::deferred::{DeferredOptions, DeferredQueue, PushHandle};
use crate::error::{AnimError, Result};
use crate::gait::WalkState;
use crate::layers::{LayerOptions, LayerStack, PRIMARY_LAYER};
use crate::mirror::{MirrorHost, NoopMirror};
use crate::pipeline;
use poser_core::{BoneKey, BreathingSpec, FighterConfig, Joint, JointMap, LengthOverride, Pose, Vec2};
use poser_rig::{RigSnapshot, SegmentLengths, WeaponRig, WeaponState};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::sync::Arc;

new_key_type! {
    pub struct ActorId;
}

/// Longest frame step fed to damping and gait (seconds)
pub const MAX_FRAME_DT: f32 = 0.25;

/// External physics target blended over the animation
#[derive(Clone, Debug, PartialEq)]
pub struct RagdollTarget {
    /// `0` = pure animation, `1` = pure ragdoll
    pub blend: f32,
    /// Radians; joints left `None` follow the animation
    pub angles: JointMap<Option<f32>>,
}

/// Live fields owned by the host's other systems
#[derive(Clone, Debug, PartialEq)]
pub struct ActorBody {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Derive gait speed from `velocity` instead of the position delta
    pub velocity_authoritative: bool,
    pub grounded: bool,
    pub dashing: bool,
    /// `0..=1`
    pub stamina_ratio: f32,
    pub gravity_scale: f32,
    pub ragdoll: Option<RagdollTarget>,
    /// World angle the head should look toward
    pub face_lock: Option<f32>,
    pub aim: AimInput,
    /// Direction of an in-progress attack
    pub attack_sign: f32,
    pub is_player: bool,
}

impl Default for ActorBody {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            velocity_authoritative: false,
            grounded: true,
            dashing: false,
            stamina_ratio: 1.0,
            gravity_scale: 1.0,
            ragdoll: None,
            face_lock: None,
            aim: AimInput::None,
            attack_sign: 1.0,
            is_player: false,
        }
    }
}

/// Aggregated bone-length overrides
#[derive(Clone, Debug)]
pub struct LengthState {
    pub overrides: SmallVec<[(BoneKey, LengthOverride); 4]>,
    /// Lengths in effect this frame
    pub active: SegmentLengths,
}

/// Pending gravity-scale restore
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GravityReset {
    pub previous: f32,
    pub reset_at_ms: f64,
}

/// Per-actor animation state, owned one-to-one by its actor
#[derive(Debug)]
pub struct AnimationState {
    /// Live damped joint angles (radians), read by the renderer
    pub joint_angles: JointMap<f32>,
    pub walk: WalkState,
    pub layers: LayerStack,
    pub deferred: DeferredQueue,
    pub breath: BreathState,
    pub weapon: WeaponState,
    pub length: LengthState,
    pub aim: AimState,
    pub facing: Facing,
    pub(crate) target_deg: JointMap<f32>,
    pub(crate) last_position: Option<Vec2>,
    pub(crate) gravity_reset: Option<GravityReset>,
}

impl AnimationState {
    fn new(config: &FighterConfig) -> Self {
        let stance = JointMap::splat(0.0).map(|joint, _| config.stance(joint));
        Self {
            joint_angles: stance.map(|_, deg| deg.to_radians()),
            walk: WalkState::default(),
            layers: LayerStack::new(),
            deferred: DeferredQueue::new(),
            breath: BreathState::default(),
            weapon: WeaponState::new(),
            length: LengthState {
                overrides: SmallVec::new(),
                active: SegmentLengths::from_skeleton(&config.skeleton),
            },
            aim: AimState::default(),
            facing: Facing::default(),
            target_deg: stance,
            last_position: None,
            gravity_reset: None,
        }
    }

    /// Resolved target pose of the last tick (degrees, before damping)
    pub fn active_pose(&self) -> &JointMap<f32> {
        &self.target_deg
    }

    /// `(id, priority)` of each active layer, lowest priority first
    pub fn active_layers(&self) -> impl Iterator<Item = (&str, i32)> + '_ {
        self.layers.iter().map(|l| (l.id(), l.priority()))
    }

    pub fn weapon_snapshot(&self) -> Option<&RigSnapshot> {
        self.weapon.snapshot()
    }

    pub fn gravity_reset(&self) -> Option<GravityReset> {
        self.gravity_reset
    }
}

/// One animated fighter
#[derive(Debug)]
pub struct Actor {
    pub(crate) config: Arc<FighterConfig>,
    pub body: ActorBody,
    pub state: AnimationState,
}

impl Actor {
    fn new(config: Arc<FighterConfig>) -> Self {
        let state = AnimationState::new(&config);
        Self {
            config,
            body: ActorBody::default(),
            state,
        }
    }

    pub fn config(&self) -> &FighterConfig {
        &self.config
    }

    /// Live angle of one joint (radians)
    pub fn joint_angle(&self, joint: Joint) -> f32 {
        self.state.joint_angles[joint]
    }
}

/// The driver that ticks every actor
pub struct Animator {
    actors: SlotMap<ActorId, Actor>,
    clock: Box<dyn Clock>,
    mirror: Box<dyn MirrorHost>,
    last_tick_ms: Option<f64>,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(SystemClock::new())
    }
}

impl Animator {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            actors: SlotMap::with_key(),
            clock: Box::new(clock),
            mirror: Box::new(NoopMirror),
            last_tick_ms: None,
        }
    }

    /// Route layer flips to `mirror`
    pub fn with_mirror(mut self, mirror: impl MirrorHost + 'static) -> Self {
        self.mirror = Box::new(mirror);
        self
    }

    /// Current time on the driver's clock
    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn spawn(&mut self, config: Arc<FighterConfig>) -> ActorId {
        let id = self.actors.insert(Actor::new(config));
        tracing::debug!(?id, "actor spawned");
        id
    }

    /// Remove an actor, reverting its flips; pending deferrals settle `Missing`
    pub fn despawn(&mut self, id: ActorId) -> bool {
        let Some(mut actor) = self.actors.remove(id) else {
            return false;
        };
        actor.state.layers.clear_all(id, self.mirror.as_mut());
        tracing::debug!(?id, "actor despawned");
        true
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    pub fn actors(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.actors.iter()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    fn get_mut(&mut self, id: ActorId) -> Result<&mut Actor> {
        self.actors.get_mut(id).ok_or(AnimError::UnknownActor(id))
    }

    /// Push the actor's primary layer
    ///
    /// `options` accepts a bare duration in milliseconds or full
    /// [`LayerOptions`].
    pub fn push(&mut self, id: ActorId, pose: Pose, options: impl Into<LayerOptions>) -> Result<()> {
        self.push_layer(id, PRIMARY_LAYER, pose, options)
    }

    /// Push (or atomically replace) a named layer
    pub fn push_layer(
        &mut self,
        id: ActorId,
        layer_id: &str,
        pose: Pose,
        options: impl Into<LayerOptions>,
    ) -> Result<()> {
        let now_ms = self.clock.now_ms();
        let actor = self.actors.get_mut(id).ok_or(AnimError::UnknownActor(id))?;
        actor.state.layers.push(
            id,
            layer_id,
            pose,
            options.into(),
            now_ms,
            &actor.config.layers,
            self.mirror.as_mut(),
        );
        Ok(())
    }

    /// Schedule a push after `options.delay_ms`, re-checking the guard then
    pub fn push_deferred(
        &mut self,
        id: ActorId,
        layer_id: &str,
        pose: Pose,
        options: DeferredOptions,
    ) -> Result<PushHandle> {
        let now_ms = self.clock.now_ms();
        let actor = self.get_mut(id)?;
        Ok(actor.state.deferred.schedule(layer_id, pose, options, now_ms))
    }

    /// Remove a layer; returns whether one was present
    pub fn clear_layer(&mut self, id: ActorId, layer_id: &str) -> Result<bool> {
        let actor = self.actors.get_mut(id).ok_or(AnimError::UnknownActor(id))?;
        Ok(actor.state.layers.clear(id, layer_id, self.mirror.as_mut()))
    }

    pub fn equip_weapon(&mut self, id: ActorId, rig: Arc<WeaponRig>) -> Result<()> {
        self.get_mut(id)?.state.weapon.equip(rig);
        Ok(())
    }

    pub fn unequip_weapon(&mut self, id: ActorId) -> Result<()> {
        self.get_mut(id)?.state.weapon.unequip();
        Ok(())
    }

    pub fn set_joint_percent_target(&mut self, id: ActorId, bone_id: &str, percent: f32) -> Result<()> {
        self.get_mut(id)?
            .state
            .weapon
            .set_joint_percent_target(bone_id, percent)?;
        Ok(())
    }

    pub fn set_grip_percent_target(&mut self, id: ActorId, grip_id: &str, percent: f32) -> Result<()> {
        self.get_mut(id)?
            .state
            .weapon
            .set_grip_percent_target(grip_id, percent)?;
        Ok(())
    }

    /// Override the breathing style; `None` restores pose/config styles
    pub fn set_breathing_style(&mut self, id: ActorId, style: Option<BreathingSpec>) -> Result<()> {
        self.get_mut(id)?.state.breath.style_override = style;
        Ok(())
    }

    /// Turn the actor around by PI
    pub fn full_flip(&mut self, id: ActorId) -> Result<()> {
        pipeline::full_flip(self.get_mut(id)?);
        Ok(())
    }

    /// Run one frame at the clock's current time
    pub fn tick(&mut self) {
        let now_ms = self.clock.now_ms();
        self.tick_at(now_ms);
    }

    /// Run one frame at `now_ms`, which must share the clock's timeline
    pub fn tick_at(&mut self, now_ms: f64) {
        if !now_ms.is_finite() {
            tracing::warn!(now_ms, "ignoring tick with non-finite time");
            return;
        }
        let dt = match self.last_tick_ms {
            Some(last) => (((now_ms - last) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT),
            None => 0.0,
        };
        self.last_tick_ms = Some(now_ms);

        for (id, actor) in self.actors.iter_mut() {
            pipeline::resolve_actor(id, actor, now_ms, dt, self.mirror.as_mut());
        }
    }
}

impl std::fmt::Debug for Animator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator")
            .field("actors", &self.actors.len())
            .field("last_tick_ms", &self.last_tick_ms)
            .finish()
    }
}
