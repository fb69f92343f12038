//! Deferred layer pushes
//!
//! A deferred push is a timer entry in the owning actor's queue. When it
//! comes due, the driver re-checks the optional guard against the actor as
//! it is *then* and applies the push or skips it. Every entry settles
//! exactly once, through whichever path gets there first: firing, the
//! handle's `cancel()`, a newer deferral for the same layer id, or the actor
//! going away.

use crate::animator::Actor;
use crate::layers::LayerOptions;
use poser_core::Pose;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

new_key_type! {
    /// Slot of a pending deferred push inside one actor's queue
    pub struct DeferredId;
}

/// Re-evaluated at fire time; an error counts as "skip"
pub type Guard = Box<dyn FnOnce(&Actor) -> anyhow::Result<bool> + Send>;

/// Called once with the final outcome
pub type SettleCallback = Box<dyn FnOnce(SettleReason) + Send>;

/// How a deferred push ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettleReason {
    /// The layer was pushed
    Applied,
    /// Canceled by the handle or superseded by a newer deferral
    Canceled,
    /// The guard declined or failed
    Skipped,
    /// The actor no longer exists
    Missing,
}

/// Options for a deferred push
pub struct DeferredOptions {
    pub delay_ms: f64,
    pub layer: LayerOptions,
    pub guard: Option<Guard>,
}

impl DeferredOptions {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms,
            layer: LayerOptions::default(),
            guard: None,
        }
    }

    pub fn with_layer(mut self, layer: LayerOptions) -> Self {
        self.layer = layer;
        self
    }

    /// Add a guard condition checked when the push comes due
    pub fn with_guard<F>(mut self, guard: F) -> Self
    where
        F: FnOnce(&Actor) -> anyhow::Result<bool> + Send + 'static,
    {
        self.guard = Some(Box::new(guard));
        self
    }

    fn due_at(&self, now_ms: f64) -> f64 {
        if self.delay_ms.is_finite() && self.delay_ms > 0.0 {
            now_ms + self.delay_ms
        } else {
            now_ms
        }
    }
}

#[derive(Default)]
struct SettleState {
    reason: Option<SettleReason>,
    /// Set once the driver starts firing; cancel can no longer win after this
    claimed: bool,
    callbacks: SmallVec<[SettleCallback; 1]>,
    sender: Option<oneshot::Sender<SettleReason>>,
}

/// Shared between a queue entry and its handle
#[derive(Default)]
struct SettleSlot {
    state: Mutex<SettleState>,
}

impl SettleSlot {
    fn lock(&self) -> MutexGuard<'_, SettleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reason(&self) -> Option<SettleReason> {
        self.lock().reason
    }

    /// Take ownership of firing; false if settled or already claimed
    fn claim(&self) -> bool {
        let mut state = self.lock();
        if state.reason.is_some() || state.claimed {
            return false;
        }
        state.claimed = true;
        true
    }

    /// Settle unless already settled or claimed by the driver
    fn cancel(&self) -> bool {
        self.finish(SettleReason::Canceled, false)
    }

    /// First settle wins; returns false if already settled
    fn settle(&self, reason: SettleReason) -> bool {
        self.finish(reason, true)
    }

    fn finish(&self, reason: SettleReason, ignore_claim: bool) -> bool {
        let (callbacks, sender) = {
            let mut state = self.lock();
            if state.reason.is_some() || (state.claimed && !ignore_claim) {
                return false;
            }
            state.reason = Some(reason);
            (std::mem::take(&mut state.callbacks), state.sender.take())
        };
        for callback in callbacks {
            callback(reason);
        }
        if let Some(sender) = sender {
            let _ = sender.send(reason);
        }
        true
    }

    fn on_settle(&self, callback: SettleCallback) {
        let settled = {
            let mut state = self.lock();
            match state.reason {
                Some(reason) => Some((reason, callback)),
                None => {
                    state.callbacks.push(callback);
                    None
                }
            }
        };
        if let Some((reason, callback)) = settled {
            callback(reason);
        }
    }
}

/// Caller's side of a deferred push
pub struct PushHandle {
    slot: Arc<SettleSlot>,
    receiver: Option<oneshot::Receiver<SettleReason>>,
}

impl PushHandle {
    /// Cancel if still pending; returns whether this call settled it.
    /// Once the push has started firing this returns false and the push
    /// settles with its own outcome.
    pub fn cancel(&self) -> bool {
        let canceled = self.slot.cancel();
        if canceled {
            tracing::debug!("deferred push canceled");
        }
        canceled
    }

    pub fn is_pending(&self) -> bool {
        self.slot.reason().is_none()
    }

    /// Outcome, once settled
    pub fn reason(&self) -> Option<SettleReason> {
        self.slot.reason()
    }

    /// Run `callback` once settled (immediately if already settled)
    pub fn on_settle<F>(&self, callback: F)
    where
        F: FnOnce(SettleReason) + Send + 'static,
    {
        self.slot.on_settle(Box::new(callback));
    }

    /// Wait for the outcome
    pub async fn settled(&mut self) -> SettleReason {
        if let Some(receiver) = self.receiver.take() {
            if let Ok(reason) = receiver.await {
                return reason;
            }
        }
        self.slot.reason().unwrap_or(SettleReason::Missing)
    }
}

impl std::fmt::Debug for PushHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushHandle")
            .field("reason", &self.slot.reason())
            .finish()
    }
}

/// A due deferred push, ready for the driver to evaluate
pub(crate) struct DuePush {
    pub layer_id: String,
    pub pose: Pose,
    pub options: LayerOptions,
    pub guard: Option<Guard>,
    slot: Arc<SettleSlot>,
}

impl DuePush {
    pub fn settle(&self, reason: SettleReason) {
        if self.slot.settle(reason) {
            tracing::debug!(layer = %self.layer_id, ?reason, "deferred push settled");
        }
    }

    pub fn is_settled(&self) -> bool {
        self.slot.reason().is_some()
    }

    /// Start firing; from here on `cancel()` on the handle is refused.
    /// False if the push already settled.
    pub fn claim(&self) -> bool {
        self.slot.claim()
    }
}

struct Entry {
    layer_id: String,
    pose: Pose,
    options: LayerOptions,
    guard: Option<Guard>,
    due_ms: f64,
    slot: Arc<SettleSlot>,
}

/// Per-actor queue of pending deferred pushes, one per layer id
#[derive(Default)]
pub struct DeferredQueue {
    entries: SlotMap<DeferredId, Entry>,
    by_layer: FxHashMap<String, DeferredId>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a push; a pending deferral for the same layer id is canceled
    pub fn schedule(
        &mut self,
        layer_id: &str,
        pose: Pose,
        options: DeferredOptions,
        now_ms: f64,
    ) -> PushHandle {
        if let Some(previous) = self.by_layer.remove(layer_id) {
            if let Some(entry) = self.entries.remove(previous) {
                if entry.slot.settle(SettleReason::Canceled) {
                    tracing::debug!(layer = layer_id, "superseded pending deferred push");
                }
            }
        }

        let (sender, receiver) = oneshot::channel();
        let slot = Arc::new(SettleSlot::default());
        slot.lock().sender = Some(sender);

        let due_ms = options.due_at(now_ms);
        let key = self.entries.insert(Entry {
            layer_id: layer_id.to_string(),
            pose,
            options: options.layer,
            guard: options.guard,
            due_ms,
            slot: Arc::clone(&slot),
        });
        self.by_layer.insert(layer_id.to_string(), key);
        tracing::debug!(layer = layer_id, due_ms, "deferred push scheduled");

        PushHandle {
            slot,
            receiver: Some(receiver),
        }
    }

    /// Remove and return entries due at `now_ms`, oldest due first.
    /// Entries canceled through their handle are dropped here.
    pub(crate) fn take_due(&mut self, now_ms: f64) -> Vec<DuePush> {
        let ready: SmallVec<[DeferredId; 4]> = self
            .entries
            .iter()
            .filter(|(_, e)| e.due_ms <= now_ms || e.slot.reason().is_some())
            .map(|(k, _)| k)
            .collect();

        let mut due = Vec::new();
        for key in ready {
            let Some(entry) = self.entries.remove(key) else {
                continue;
            };
            if self.by_layer.get(&entry.layer_id) == Some(&key) {
                self.by_layer.remove(&entry.layer_id);
            }
            if entry.slot.reason().is_some() {
                continue;
            }
            due.push((
                entry.due_ms,
                DuePush {
                    layer_id: entry.layer_id,
                    pose: entry.pose,
                    options: entry.options,
                    guard: entry.guard,
                    slot: entry.slot,
                },
            ));
        }
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        due.into_iter().map(|(_, push)| push).collect()
    }

    /// Pending entries that have not been canceled
    pub fn pending(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.slot.reason().is_none())
            .count()
    }

    pub fn is_pending(&self, layer_id: &str) -> bool {
        self.by_layer
            .get(layer_id)
            .and_then(|k| self.entries.get(*k))
            .is_some_and(|e| e.slot.reason().is_none())
    }

    /// Settle everything still pending with `reason`
    pub fn settle_all(&mut self, reason: SettleReason) {
        self.by_layer.clear();
        for (_, entry) in self.entries.drain() {
            entry.slot.settle(reason);
        }
    }
}

impl Drop for DeferredQueue {
    fn drop(&mut self) {
        self.settle_all(SettleReason::Missing);
    }
}

impl std::fmt::Debug for DeferredQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("pending", &self.pending())
            .finish()
    }
}
