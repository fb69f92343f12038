//! Pose layer stack
//!
//! Each actor carries an ordered set of timed, prioritized, maskable pose
//! overrides. The stack is kept sorted by ascending priority so that applying
//! layers front to back lets the highest priority win per joint. Ties keep
//! push order, so the newest of two equal-priority layers wins.

use crate::animator::ActorId;
use crate::mirror::{set_mirrored_logged, MirrorHost};
use poser_core::{JointMap, JointMask, LayerConfig, LayerEventKind, Pose};
use serde_json::Value;
use smallvec::SmallVec;
use std::mem;

/// Id of the layer that plays the actor's main action
pub const PRIMARY_LAYER: &str = "primary";

/// Fallback when configuration carries no usable default duration
pub const DEFAULT_DURATION_MS: f64 = 300.0;

/// How long a pushed layer lives
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LayerDuration {
    /// Configured default (300ms unless overridden)
    #[default]
    Default,
    /// Milliseconds from push; `0` expires on the next tick, negative or
    /// non-finite values fall back to the default
    Millis(f64),
    /// Lives until replaced or cleared. Progress stays at 0, so only events
    /// and flips timed at 0 ever fire on such a layer.
    Infinite,
}

impl LayerDuration {
    fn until(self, now_ms: f64, default_ms: f64) -> Option<f64> {
        match self {
            LayerDuration::Infinite => None,
            LayerDuration::Millis(ms) if ms.is_finite() && ms >= 0.0 => Some(now_ms + ms),
            LayerDuration::Millis(_) | LayerDuration::Default => Some(now_ms + default_ms),
        }
    }
}

/// Options for [`LayerStack::push`]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayerOptions {
    pub duration: LayerDuration,
    /// Takes precedence over a mask declared by the pose itself
    pub mask: Option<JointMask>,
    pub priority: Option<i32>,
    pub suppress_walk: Option<bool>,
    /// The pose's joints also replace the stance the gait and target are seeded from
    pub use_as_base: bool,
}

impl LayerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration_ms(mut self, ms: f64) -> Self {
        self.duration = LayerDuration::Millis(ms);
        self
    }

    pub fn infinite(mut self) -> Self {
        self.duration = LayerDuration::Infinite;
        self
    }

    pub fn with_mask(mut self, mask: JointMask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_suppress_walk(mut self, suppress: bool) -> Self {
        self.suppress_walk = Some(suppress);
        self
    }

    pub fn with_use_as_base(mut self, use_as_base: bool) -> Self {
        self.use_as_base = use_as_base;
        self
    }

    /// Accepts a bare duration number or an options object
    pub fn from_json(value: &Value) -> Self {
        let mut options = Self::default();
        match value {
            Value::Number(n) => {
                if let Some(ms) = n.as_f64() {
                    options.duration = LayerDuration::Millis(ms);
                }
            }
            Value::Object(object) => {
                let get = |names: &[&str]| names.iter().find_map(|n| object.get(*n));
                options.duration = match get(&["durationMs", "duration_ms", "duration"]) {
                    Some(Value::Number(n)) => n
                        .as_f64()
                        .map(LayerDuration::Millis)
                        .unwrap_or_default(),
                    Some(Value::String(s))
                        if s.eq_ignore_ascii_case("infinite") || s.eq_ignore_ascii_case("inf") =>
                    {
                        LayerDuration::Infinite
                    }
                    _ => LayerDuration::Default,
                };
                options.mask = get(&["mask", "joints"]).and_then(|m| match m {
                    Value::Array(items) => Some(JointMask::from_keys(
                        items.iter().filter_map(Value::as_str),
                    )),
                    Value::String(s) => Some(JointMask::from_keys([s.as_str()])),
                    _ => None,
                });
                options.priority = get(&["priority"])
                    .and_then(Value::as_f64)
                    .filter(|p| p.is_finite())
                    .map(|p| p as i32);
                options.suppress_walk = get(&["suppressWalk", "suppress_walk"]).and_then(Value::as_bool);
                options.use_as_base = get(&["useAsBase", "use_as_base"])
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
            }
            _ => {}
        }
        options
    }
}

impl From<f64> for LayerOptions {
    fn from(duration_ms: f64) -> Self {
        Self::new().with_duration_ms(duration_ms)
    }
}

impl From<LayerDuration> for LayerOptions {
    fn from(duration: LayerDuration) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }
}

/// One override record
#[derive(Clone, Debug)]
pub struct Layer {
    id: String,
    pose: Pose,
    mask: JointMask,
    priority: i32,
    suppress_walk: bool,
    use_as_base: bool,
    start_ms: f64,
    until_ms: Option<f64>,
    progress: f32,
    next_event: usize,
    flip_applied: bool,
    full_flip_applied: bool,
}

impl Layer {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn mask(&self) -> JointMask {
        self.mask
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn suppress_walk(&self) -> bool {
        self.suppress_walk
    }

    pub fn use_as_base(&self) -> bool {
        self.use_as_base
    }

    /// Absolute expiry time, `None` for infinite layers
    pub fn until_ms(&self) -> Option<f64> {
        self.until_ms
    }

    /// Normalized progress as of the last tick
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn flip_applied(&self) -> bool {
        self.flip_applied
    }

    fn is_expired(&self, now_ms: f64) -> bool {
        self.until_ms.is_some_and(|until| now_ms >= until)
    }

    fn progress_at(&self, now_ms: f64) -> f32 {
        let Some(until) = self.until_ms else {
            return 0.0;
        };
        let span = until - self.start_ms;
        if span <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / span).clamp(0.0, 1.0) as f32
    }

    /// Write the masked joints this pose defines onto `target`
    pub fn apply_to(&self, target: &mut JointMap<f32>) {
        for joint in self.mask.joints() {
            if let Some(degrees) = self.pose.get(joint) {
                target[joint] = degrees;
            }
        }
    }
}

/// Something a layer asked for while advancing
#[derive(Clone, Debug, PartialEq)]
pub enum LayerSignal {
    Event { layer: String, kind: LayerEventKind },
    FullFlip { layer: String },
}

/// Ordered set of layers, unique by id
#[derive(Debug, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a layer, atomically replacing any layer with the same id
    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        actor: ActorId,
        id: &str,
        pose: Pose,
        options: LayerOptions,
        now_ms: f64,
        config: &LayerConfig,
        mirror: &mut dyn MirrorHost,
    ) {
        if let Some(old) = self.take(id) {
            tracing::debug!(?actor, layer = id, "replacing layer");
            release(actor, &old, mirror);
        }

        let is_primary = id == PRIMARY_LAYER;
        let explicit_mask = options.mask.or(pose.mask);
        let unmasked = explicit_mask.map_or(true, JointMask::is_all);
        let priority = options.priority.unwrap_or(if is_primary {
            config.primary_priority
        } else {
            config.overlay_priority
        });
        let default_ms = if config.default_duration_ms.is_finite() && config.default_duration_ms >= 0.0 {
            config.default_duration_ms
        } else {
            DEFAULT_DURATION_MS
        };
        let until_ms = options.duration.until(now_ms, default_ms);
        if until_ms.is_none() && has_timed_transitions(&pose) {
            tracing::warn!(
                ?actor,
                layer = id,
                "infinite layer never progresses; events and flips after 0 will not fire"
            );
        }

        tracing::debug!(?actor, layer = id, priority, ?until_ms, "pushing layer");
        self.layers.push(Layer {
            id: id.to_string(),
            mask: explicit_mask.unwrap_or(JointMask::ALL),
            priority,
            suppress_walk: options.suppress_walk.unwrap_or(is_primary && unmasked),
            use_as_base: options.use_as_base,
            start_ms: now_ms,
            until_ms,
            progress: 0.0,
            next_event: 0,
            flip_applied: false,
            full_flip_applied: false,
            pose,
        });
        self.layers.sort_by_key(|l| l.priority);
    }

    /// Remove a layer, reverting anything it mirrored
    pub fn clear(&mut self, actor: ActorId, id: &str, mirror: &mut dyn MirrorHost) -> bool {
        match self.take(id) {
            Some(layer) => {
                tracing::debug!(?actor, layer = id, "clearing layer");
                release(actor, &layer, mirror);
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self, actor: ActorId, mirror: &mut dyn MirrorHost) {
        for layer in mem::take(&mut self.layers) {
            release(actor, &layer, mirror);
        }
    }

    /// Drop layers whose expiry has passed.
    ///
    /// An expiring layer first runs at full progress, so events and flips it
    /// has not reached yet still fire before its mirror state is released.
    /// Returns those final signals.
    pub fn expire(
        &mut self,
        actor: ActorId,
        now_ms: f64,
        mirror: &mut dyn MirrorHost,
    ) -> SmallVec<[LayerSignal; 4]> {
        let mut signals = SmallVec::new();
        let (expired, live): (Vec<Layer>, Vec<Layer>) = mem::take(&mut self.layers)
            .into_iter()
            .partition(|l| l.is_expired(now_ms));
        self.layers = live;
        for mut layer in expired {
            step(&mut layer, actor, 1.0, mirror, &mut signals);
            tracing::debug!(?actor, layer = %layer.id, "layer expired");
            release(actor, &layer, mirror);
        }
        signals
    }

    /// Update progress, fire due events, and apply flips
    pub fn advance(
        &mut self,
        actor: ActorId,
        now_ms: f64,
        mirror: &mut dyn MirrorHost,
    ) -> SmallVec<[LayerSignal; 4]> {
        let mut signals = SmallVec::new();
        for layer in &mut self.layers {
            let k = layer.progress_at(now_ms);
            step(layer, actor, k, mirror, &mut signals);
        }
        signals
    }

    /// Layers in ascending priority order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Layer> + '_ {
        self.layers.iter()
    }

    /// Highest-priority layer
    pub fn top(&self) -> Option<&Layer> {
        self.layers.last()
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn suppresses_walk(&self) -> bool {
        self.layers.iter().any(Layer::suppress_walk)
    }

    fn take(&mut self, id: &str) -> Option<Layer> {
        let index = self.layers.iter().position(|l| l.id == id)?;
        Some(self.layers.remove(index))
    }
}

fn has_timed_transitions(pose: &Pose) -> bool {
    pose.events.iter().any(|e| e.time > 0.0)
        || pose.flip.as_ref().is_some_and(|f| f.at > 0.0)
        || pose.full_flip.is_some_and(|f| f.at > 0.0)
}

/// Move a layer to progress `k`, collecting every event and transition it crosses
fn step(
    layer: &mut Layer,
    actor: ActorId,
    k: f32,
    mirror: &mut dyn MirrorHost,
    signals: &mut SmallVec<[LayerSignal; 4]>,
) {
    layer.progress = k;

    while let Some(event) = layer.pose.events.get(layer.next_event) {
        if event.time > k {
            break;
        }
        signals.push(LayerSignal::Event {
            layer: layer.id.clone(),
            kind: event.kind.clone(),
        });
        layer.next_event += 1;
    }

    if let Some(flip) = &layer.pose.flip {
        if !layer.flip_applied && k >= flip.at {
            set_mirrored_logged(mirror, actor, &flip.parts, true);
            layer.flip_applied = true;
        }
    }
    if let Some(full_flip) = layer.pose.full_flip {
        if !layer.full_flip_applied && k >= full_flip.at {
            layer.full_flip_applied = true;
            signals.push(LayerSignal::FullFlip {
                layer: layer.id.clone(),
            });
        }
    }
}

fn release(actor: ActorId, layer: &Layer, mirror: &mut dyn MirrorHost) {
    if let (true, Some(flip)) = (layer.flip_applied, &layer.pose.flip) {
        set_mirrored_logged(mirror, actor, &flip.parts, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::MirrorError;
    use poser_core::{Joint, LayerEvent};

    #[derive(Default)]
    struct RecordingMirror {
        calls: Vec<(Vec<String>, bool)>,
        fail: bool,
    }

    impl MirrorHost for RecordingMirror {
        fn set_mirrored(
            &mut self,
            _: ActorId,
            parts: &[String],
            mirrored: bool,
        ) -> Result<(), MirrorError> {
            self.calls.push((parts.to_vec(), mirrored));
            if self.fail {
                Err(MirrorError("sprite missing".into()))
            } else {
                Ok(())
            }
        }
    }

    fn actor() -> ActorId {
        ActorId::default()
    }

    fn push(stack: &mut LayerStack, id: &str, pose: Pose, options: LayerOptions, now: f64) {
        let mut mirror = RecordingMirror::default();
        stack.push(actor(), id, pose, options, now, &LayerConfig::default(), &mut mirror);
    }

    #[test]
    fn test_push_same_id_replaces() {
        let mut stack = LayerStack::new();
        push(&mut stack, PRIMARY_LAYER, Pose::new().with(Joint::Torso, 5.0), LayerOptions::from(100.0), 0.0);
        push(&mut stack, PRIMARY_LAYER, Pose::new().with(Joint::Torso, 9.0), LayerOptions::from(100.0), 0.0);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.top().unwrap().pose().get(Joint::Torso), Some(9.0));
    }

    #[test]
    fn test_priority_defaults_and_order() {
        let mut stack = LayerStack::new();
        push(&mut stack, "overlay", Pose::new().with(Joint::Torso, 20.0), LayerOptions::from(100.0), 0.0);
        push(&mut stack, PRIMARY_LAYER, Pose::new().with(Joint::Torso, 10.0), LayerOptions::from(100.0), 0.0);

        let order: Vec<(&str, i32)> = stack.iter().map(|l| (l.id(), l.priority())).collect();
        assert_eq!(order, vec![(PRIMARY_LAYER, 100), ("overlay", 200)]);

        let mut target = JointMap::splat(0.0);
        for layer in stack.iter() {
            layer.apply_to(&mut target);
        }
        assert_eq!(target[Joint::Torso], 20.0);
    }

    #[test]
    fn test_mask_limits_applied_joints() {
        let mut stack = LayerStack::new();
        let pose = Pose::new().with(Joint::Torso, 30.0).with(Joint::Head, 12.0);
        let options = LayerOptions::new().with_mask(JointMask::from_joints([Joint::Head]));
        push(&mut stack, "look", pose, options, 0.0);

        let mut target = JointMap::splat(1.0);
        stack.top().unwrap().apply_to(&mut target);
        assert_eq!(target[Joint::Torso], 1.0);
        assert_eq!(target[Joint::Head], 12.0);
    }

    #[test]
    fn test_suppress_walk_defaults() {
        let mut stack = LayerStack::new();
        push(&mut stack, PRIMARY_LAYER, Pose::new(), LayerOptions::new(), 0.0);
        assert!(stack.get(PRIMARY_LAYER).unwrap().suppress_walk());

        let masked = Pose::new().with_mask(JointMask::from_joints([Joint::RShoulder]));
        push(&mut stack, PRIMARY_LAYER, masked, LayerOptions::new(), 0.0);
        assert!(!stack.get(PRIMARY_LAYER).unwrap().suppress_walk());

        push(&mut stack, "overlay", Pose::new(), LayerOptions::new(), 0.0);
        assert!(!stack.get("overlay").unwrap().suppress_walk());
    }

    #[test]
    fn test_duration_rules() {
        let mut stack = LayerStack::new();
        let mut mirror = RecordingMirror::default();
        push(&mut stack, "zero", Pose::new(), LayerOptions::from(0.0), 1000.0);
        push(&mut stack, "negative", Pose::new(), LayerOptions::from(-5.0), 1000.0);
        push(&mut stack, "nan", Pose::new(), LayerOptions::from(f64::NAN), 1000.0);
        push(&mut stack, "forever", Pose::new(), LayerOptions::new().infinite(), 1000.0);

        assert_eq!(stack.get("zero").unwrap().until_ms(), Some(1000.0));
        assert_eq!(stack.get("negative").unwrap().until_ms(), Some(1300.0));
        assert_eq!(stack.get("nan").unwrap().until_ms(), Some(1300.0));
        assert_eq!(stack.get("forever").unwrap().until_ms(), None);

        stack.expire(actor(), 1000.0, &mut mirror);
        assert!(stack.get("zero").is_none());
        assert_eq!(stack.len(), 3);
        stack.expire(actor(), 1299.0, &mut mirror);
        assert_eq!(stack.len(), 3);
        stack.expire(actor(), 1300.0, &mut mirror);
        assert_eq!(stack.len(), 1);
        stack.expire(actor(), 1e9, &mut mirror);
        assert!(stack.get("forever").is_some());
    }

    #[test]
    fn test_events_fire_once_in_order() {
        let mut stack = LayerStack::new();
        let mut mirror = RecordingMirror::default();
        let pose = Pose::new()
            .with_event(LayerEvent::new(0.5, LayerEventKind::GripDetachAll))
            .with_event(LayerEvent::new(
                0.0,
                LayerEventKind::SetVelocity {
                    x: Some(1.0),
                    y: None,
                },
            ));
        push(&mut stack, "attack", pose, LayerOptions::from(100.0), 0.0);

        let first = stack.advance(actor(), 10.0, &mut mirror);
        assert_eq!(first.len(), 1);
        assert!(stack.advance(actor(), 20.0, &mut mirror).is_empty());

        let second = stack.advance(actor(), 60.0, &mut mirror);
        assert_eq!(
            second.as_slice(),
            &[LayerSignal::Event {
                layer: "attack".into(),
                kind: LayerEventKind::GripDetachAll
            }]
        );
        assert!(stack.advance(actor(), 99.0, &mut mirror).is_empty());
        assert!((stack.get("attack").unwrap().progress() - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_expiry_flushes_unreached_events() {
        let mut stack = LayerStack::new();
        let mut mirror = RecordingMirror::default();
        let config = LayerConfig::default();
        let pose = Pose::new()
            .with_event(LayerEvent::new(0.9, LayerEventKind::GripDetachAll))
            .with_event(LayerEvent::new(
                1.0,
                LayerEventKind::SetVelocity {
                    x: Some(99.0),
                    y: None,
                },
            ))
            .with_flip(1.0, ["weapon".to_string()])
            .with_full_flip(1.0);
        stack.push(actor(), "finisher", pose, LayerOptions::from(100.0), 0.0, &config, &mut mirror);

        assert!(stack.advance(actor(), 80.0, &mut mirror).is_empty());
        let signals = stack.expire(actor(), 112.0, &mut mirror);
        assert!(stack.is_empty());
        assert_eq!(
            signals.as_slice(),
            &[
                LayerSignal::Event {
                    layer: "finisher".into(),
                    kind: LayerEventKind::GripDetachAll
                },
                LayerSignal::Event {
                    layer: "finisher".into(),
                    kind: LayerEventKind::SetVelocity {
                        x: Some(99.0),
                        y: None
                    }
                },
                LayerSignal::FullFlip {
                    layer: "finisher".into()
                },
            ]
        );
        assert_eq!(
            mirror.calls,
            vec![
                (vec!["weapon".to_string()], true),
                (vec!["weapon".to_string()], false)
            ]
        );
    }

    #[test]
    fn test_expiry_does_not_refire_events() {
        let mut stack = LayerStack::new();
        let mut mirror = RecordingMirror::default();
        let pose = Pose::new().with_event(LayerEvent::new(0.5, LayerEventKind::GripDetachAll));
        push(&mut stack, "jab", pose, LayerOptions::from(100.0), 0.0);

        assert_eq!(stack.advance(actor(), 60.0, &mut mirror).len(), 1);
        assert!(stack.expire(actor(), 100.0, &mut mirror).is_empty());
        assert!(stack.is_empty());
    }

    #[test]
    fn test_flip_applies_and_reverts_on_replace() {
        let mut stack = LayerStack::new();
        let mut mirror = RecordingMirror::default();
        let config = LayerConfig::default();
        let pose = Pose::new().with_flip(0.5, ["weapon".to_string()]);
        stack.push(actor(), "spin", pose, LayerOptions::from(100.0), 0.0, &config, &mut mirror);

        stack.advance(actor(), 40.0, &mut mirror);
        assert!(mirror.calls.is_empty());
        stack.advance(actor(), 50.0, &mut mirror);
        assert_eq!(mirror.calls, vec![(vec!["weapon".to_string()], true)]);

        stack.push(actor(), "spin", Pose::new(), LayerOptions::from(100.0), 60.0, &config, &mut mirror);
        assert_eq!(mirror.calls.last(), Some(&(vec!["weapon".to_string()], false)));
        assert_eq!(mirror.calls.len(), 2);
    }

    #[test]
    fn test_mirror_failure_does_not_block_cleanup() {
        let mut stack = LayerStack::new();
        let mut mirror = RecordingMirror {
            fail: true,
            ..Default::default()
        };
        let config = LayerConfig::default();
        let pose = Pose::new().with_flip(0.0, ["torso".to_string()]);
        stack.push(actor(), "spin", pose, LayerOptions::from(50.0), 0.0, &config, &mut mirror);
        stack.advance(actor(), 1.0, &mut mirror);
        assert!(stack.get("spin").unwrap().flip_applied());

        assert!(stack.expire(actor(), 50.0, &mut mirror).is_empty());
        assert!(stack.is_empty());
        assert_eq!(mirror.calls.len(), 2);
    }

    #[test]
    fn test_full_flip_signals_once() {
        let mut stack = LayerStack::new();
        let mut mirror = RecordingMirror::default();
        push(&mut stack, "turn", Pose::new().with_full_flip(0.25), LayerOptions::from(100.0), 0.0);
        assert!(stack.advance(actor(), 10.0, &mut mirror).is_empty());
        let signals = stack.advance(actor(), 30.0, &mut mirror);
        assert_eq!(
            signals.as_slice(),
            &[LayerSignal::FullFlip {
                layer: "turn".into()
            }]
        );
        assert!(stack.advance(actor(), 90.0, &mut mirror).is_empty());
    }

    #[test]
    fn test_infinite_layer_only_fires_time_zero() {
        let mut stack = LayerStack::new();
        let mut mirror = RecordingMirror::default();
        let pose = Pose::new()
            .with_event(LayerEvent::new(0.0, LayerEventKind::GripDetachAll))
            .with_event(LayerEvent::new(
                0.5,
                LayerEventKind::SetVelocity {
                    x: Some(1.0),
                    y: None,
                },
            ));
        assert!(has_timed_transitions(&pose));
        push(&mut stack, "hold", pose, LayerOptions::new().infinite(), 0.0);

        assert_eq!(stack.advance(actor(), 10.0, &mut mirror).len(), 1);
        assert!(stack.advance(actor(), 1e6, &mut mirror).is_empty());
        assert_eq!(stack.get("hold").unwrap().progress(), 0.0);
        assert!(!has_timed_transitions(&Pose::new().with_full_flip(0.0)));
    }

    #[test]
    fn test_options_from_json() {
        use serde_json::json;
        let options = LayerOptions::from_json(&json!({
            "durationMs": 250,
            "mask": ["rShoulder", "rElbow"],
            "priority": 150,
            "suppressWalk": true
        }));
        assert_eq!(options.duration, LayerDuration::Millis(250.0));
        assert!(options.mask.unwrap().contains(Joint::RElbow));
        assert_eq!(options.priority, Some(150));
        assert_eq!(options.suppress_walk, Some(true));

        assert_eq!(LayerOptions::from_json(&json!(80)).duration, LayerDuration::Millis(80.0));
        assert_eq!(
            LayerOptions::from_json(&json!({ "durationMs": null })).duration,
            LayerDuration::Default
        );
        assert_eq!(
            LayerOptions::from_json(&json!({ "duration": "infinite" })).duration,
            LayerDuration::Infinite
        );
    }
}
